use super::{InstructionInfo as I, OperandShape as S};
use crate::disasm::overrides::Override::ReflexiveCancellation;
use crate::disasm::registers::{
    AUX_FLAG, CARRY_FLAG, FLAGS, OVERFLOW_FLAG, PARITY_FLAG, SIGN_FLAG, STACK_CONTENTS, ZERO_FLAG,
};
use crate::model::InstructionClass::*;

const TARGET: S = S::SOURCE_OPERANDS;
const MOVE: S = S::ALL_OPERANDS;
const UPDATE: S = S::ALL_OPERANDS.union(S::DESTINATION_IS_IMPLIED_SOURCE);
const COMPARE: S = UPDATE.union(S::DESTINATION_IS_UNAFFECTED);
const UNARY: S = S::DESTINATION_OPERANDS.union(S::DESTINATION_IS_IMPLIED_SOURCE);
const WRITE_ONLY: S = S::DESTINATION_OPERANDS;

const ARITHMETIC_FLAGS: &[&str] =
    &[ZERO_FLAG, CARRY_FLAG, OVERFLOW_FLAG, PARITY_FLAG, SIGN_FLAG, AUX_FLAG];
const CONDITION_FLAGS: &[&str] = &[ZERO_FLAG, CARRY_FLAG, OVERFLOW_FLAG, PARITY_FLAG, SIGN_FLAG];
const MULTIPLY_RESULT: &[&str] = &["eax", "edx", CARRY_FLAG, OVERFLOW_FLAG];
const CALL_CLOBBERED: &[&str] = &["eax", "ecx", "edx"];

pub(super) static INSTRUCTIONS: &[I] = &[
    I::exact("nop", Noop, S::NONE),
    I::prefix("int", Interrupt, S::SOURCE_OPERANDS),
    I::exact("ud2", Interrupt, S::NONE),
    I::exact("hlt", Interrupt, S::NONE),
    I::prefix("sysenter", Interrupt, S::NONE),
    I::prefix("call", Branch, TARGET)
        .reads(&["esp"])
        .writes(CALL_CLOBBERED)
        .passes(&[STACK_CONTENTS]),
    I::prefix("ret", Return, S::NONE).reads(&["esp"]).passes(&["eax"]),
    I::prefix("iret", Return, S::NONE).reads(&["esp"]),
    I::prefix("jmp", Branch, TARGET),
    I::exact("jecxz", Branch, TARGET).reads(&["ecx"]),
    I::exact("jcxz", Branch, TARGET).reads(&["cx"]),
    I::prefix("j", Branch, TARGET).reads(CONDITION_FLAGS),
    I::prefix("loop", Branch, TARGET).reads(&["ecx"]).writes(&["ecx"]),
    I::exact("pushad", StackPush, S::NONE)
        .reads(&["eax", "ecx", "edx", "ebx", "esp", "ebp", "esi", "edi"]),
    I::exact("pushfd", StackPush, S::NONE).reads(&[FLAGS]),
    I::exact("pushf", StackPush, S::NONE).reads(&[FLAGS]),
    I::prefix("push", StackPush, S::SOURCE_OPERANDS),
    I::exact("popad", StackPop, S::NONE)
        .writes(&["edi", "esi", "ebp", "esp", "ebx", "edx", "ecx", "eax"]),
    I::exact("popfd", StackPop, S::NONE).writes(&[FLAGS]),
    I::exact("popf", StackPop, S::NONE).writes(&[FLAGS]),
    I::exact("popcnt", Calculation, MOVE).writes(ARITHMETIC_FLAGS),
    I::prefix("pop", StackPop, WRITE_ONLY),
    I::exact("leave", DataMove, S::NONE).reads(&["ebp"]).writes(&["esp", "ebp"]),
    I::prefix("xchg", DataExchange, S::ALL_OPERANDS),
    I::prefix("cmpxchg", Calculation, UPDATE).reads(&["eax"]).writes(&["eax", ZERO_FLAG]),
    I::prefix("xadd", Calculation, UPDATE).writes(ARITHMETIC_FLAGS),
    I::exact("movsb", BlockDataMove, S::NONE)
        .reads(&["esi"])
        .writes(&["esi", "edi"])
        .writes_through(&["edi"]),
    I::exact("movsw", BlockDataMove, S::NONE)
        .reads(&["esi"])
        .writes(&["esi", "edi"])
        .writes_through(&["edi"]),
    I::exact("movsd", BlockDataMove, S::NONE)
        .reads(&["esi"])
        .writes(&["esi", "edi"])
        .writes_through(&["edi"]),
    I::prefix("stos", BlockDataMove, S::NONE)
        .reads(&["eax"])
        .writes(&["edi"])
        .writes_through(&["edi"]),
    I::prefix("lods", BlockDataMove, S::NONE).reads(&["esi"]).writes(&["eax", "esi"]),
    I::prefix("scas", Calculation, S::NONE).reads(&["eax", "edi"]).writes(ARITHMETIC_FLAGS),
    I::prefix("cmps", Calculation, S::NONE).reads(&["esi", "edi"]).writes(ARITHMETIC_FLAGS),
    I::prefix("cmov", DataMove, UPDATE).reads(CONDITION_FLAGS),
    I::prefix("mov", DataMove, MOVE),
    I::prefix("lea", DataMove, MOVE),
    I::prefix("cmp", Calculation, COMPARE).writes(ARITHMETIC_FLAGS),
    I::prefix("test", Calculation, COMPARE).writes(ARITHMETIC_FLAGS),
    I::prefix("xor", Calculation, UPDATE)
        .writes(ARITHMETIC_FLAGS)
        .overrides(&[ReflexiveCancellation]),
    I::prefix("pxor", Calculation, UPDATE).overrides(&[ReflexiveCancellation]),
    I::prefix("sub", Calculation, UPDATE)
        .writes(ARITHMETIC_FLAGS)
        .overrides(&[ReflexiveCancellation]),
    I::prefix("sbb", Calculation, UPDATE).reads(&[CARRY_FLAG]).writes(ARITHMETIC_FLAGS),
    I::prefix("adc", Calculation, UPDATE).reads(&[CARRY_FLAG]).writes(ARITHMETIC_FLAGS),
    I::prefix("add", Calculation, UPDATE).writes(ARITHMETIC_FLAGS),
    I::prefix("and", Calculation, UPDATE).writes(ARITHMETIC_FLAGS),
    I::prefix("or", Calculation, UPDATE).writes(ARITHMETIC_FLAGS),
    I::prefix("inc", Calculation, UNARY).writes(ARITHMETIC_FLAGS),
    I::prefix("dec", Calculation, UNARY).writes(ARITHMETIC_FLAGS),
    I::prefix("neg", Calculation, UNARY).writes(ARITHMETIC_FLAGS),
    I::prefix("not", Calculation, UNARY),
    I::prefix("bswap", Calculation, UNARY),
    I::exact("sahf", Calculation, S::NONE).reads(&["ah"]).writes(ARITHMETIC_FLAGS),
    I::prefix("sh", Calculation, UPDATE).writes(ARITHMETIC_FLAGS),
    I::prefix("sa", Calculation, UPDATE).writes(ARITHMETIC_FLAGS),
    I::prefix("ro", Calculation, UPDATE).writes(&[CARRY_FLAG, OVERFLOW_FLAG]),
    I::prefix("rc", Calculation, UPDATE).reads(&[CARRY_FLAG]).writes(&[CARRY_FLAG, OVERFLOW_FLAG]),
    I::prefix("imul", Calculation, UPDATE).reads(&["eax"]).writes(MULTIPLY_RESULT),
    I::prefix("mul", Calculation, UPDATE).reads(&["eax"]).writes(MULTIPLY_RESULT),
    I::prefix("idiv", Calculation, TARGET).reads(&["eax", "edx"]).writes(&["eax", "edx"]),
    I::prefix("div", Calculation, TARGET).reads(&["eax", "edx"]).writes(&["eax", "edx"]),
    I::exact("cdq", Calculation, S::NONE).reads(&["eax"]).writes(&["edx"]),
    I::exact("cwde", Calculation, S::NONE).reads(&["ax"]).writes(&["eax"]),
    I::exact("cbw", Calculation, S::NONE).reads(&["al"]).writes(&["ax"]),
    I::prefix("set", Calculation, WRITE_ONLY).reads(CONDITION_FLAGS),
    I::prefix("bt", Calculation, COMPARE).writes(&[CARRY_FLAG]),
    I::exact("clc", Calculation, S::NONE).writes(&[CARRY_FLAG]),
    I::exact("stc", Calculation, S::NONE).writes(&[CARRY_FLAG]),
    I::exact("cmc", Calculation, S::NONE).reads(&[CARRY_FLAG]).writes(&[CARRY_FLAG]),
    I::exact("lahf", DataMove, S::NONE).reads(ARITHMETIC_FLAGS).writes(&["ah"]),
    I::exact("rdtsc", DataMove, S::NONE).writes(&["eax", "edx"]),
    I::exact("cpuid", DataMove, S::NONE).reads(&["eax"]).writes(&["eax", "ebx", "ecx", "edx"]),
];
