use super::{InstructionInfo as I, OperandShape as S};
use crate::disasm::overrides::Override::ReflexiveCancellation;
use crate::disasm::registers::{
    AUX_FLAG, CARRY_FLAG, FLAGS, OVERFLOW_FLAG, PARITY_FLAG, SIGN_FLAG, ZERO_FLAG,
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
const MULTIPLY_RESULT: &[&str] = &["rax", "rdx", CARRY_FLAG, OVERFLOW_FLAG];

// Microsoft x64 calling convention.
const ARGUMENT_REGISTERS: &[&str] = &["rcx", "rdx", "r8", "r9"];
const CALL_CLOBBERED: &[&str] = &["rax", "rcx", "rdx", "r8", "r9", "r10", "r11"];

pub(super) static INSTRUCTIONS: &[I] = &[
    I::exact("nop", Noop, S::NONE),
    I::prefix("int", Interrupt, S::SOURCE_OPERANDS),
    I::exact("ud2", Interrupt, S::NONE),
    I::exact("hlt", Interrupt, S::NONE),
    I::exact("syscall", Interrupt, S::NONE).reads(&["rax"]).passes(ARGUMENT_REGISTERS),
    I::prefix("call", Branch, TARGET)
        .reads(&["rsp"])
        .writes(CALL_CLOBBERED)
        .passes(ARGUMENT_REGISTERS),
    I::prefix("ret", Return, S::NONE).reads(&["rsp"]).passes(&["rax"]),
    I::prefix("iret", Return, S::NONE).reads(&["rsp"]),
    I::prefix("jmp", Branch, TARGET),
    I::exact("jrcxz", Branch, TARGET).reads(&["rcx"]),
    I::exact("jecxz", Branch, TARGET).reads(&["ecx"]),
    I::prefix("j", Branch, TARGET).reads(CONDITION_FLAGS),
    I::prefix("loop", Branch, TARGET).reads(&["rcx"]).writes(&["rcx"]),
    I::exact("pushfq", StackPush, S::NONE).reads(&[FLAGS]),
    I::exact("pushf", StackPush, S::NONE).reads(&[FLAGS]),
    I::prefix("push", StackPush, S::SOURCE_OPERANDS),
    I::exact("popfq", StackPop, S::NONE).writes(&[FLAGS]),
    I::exact("popf", StackPop, S::NONE).writes(&[FLAGS]),
    I::exact("popcnt", Calculation, MOVE).writes(ARITHMETIC_FLAGS),
    I::prefix("pop", StackPop, WRITE_ONLY),
    I::exact("leave", DataMove, S::NONE).reads(&["rbp"]).writes(&["rsp", "rbp"]),
    I::prefix("xchg", DataExchange, S::ALL_OPERANDS),
    I::prefix("cmpxchg", Calculation, UPDATE).reads(&["rax"]).writes(&["rax", ZERO_FLAG]),
    I::prefix("xadd", Calculation, UPDATE).writes(ARITHMETIC_FLAGS),
    I::exact("movsb", BlockDataMove, S::NONE)
        .reads(&["rsi"])
        .writes(&["rsi", "rdi"])
        .writes_through(&["rdi"]),
    I::exact("movsq", BlockDataMove, S::NONE)
        .reads(&["rsi"])
        .writes(&["rsi", "rdi"])
        .writes_through(&["rdi"]),
    I::prefix("stos", BlockDataMove, S::NONE)
        .reads(&["rax"])
        .writes(&["rdi"])
        .writes_through(&["rdi"]),
    I::prefix("lods", BlockDataMove, S::NONE).reads(&["rsi"]).writes(&["rax", "rsi"]),
    I::prefix("scas", Calculation, S::NONE).reads(&["rax", "rdi"]).writes(ARITHMETIC_FLAGS),
    I::prefix("cmps", Calculation, S::NONE).reads(&["rsi", "rdi"]).writes(ARITHMETIC_FLAGS),
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
    I::prefix("imul", Calculation, UPDATE).reads(&["rax"]).writes(MULTIPLY_RESULT),
    I::prefix("mul", Calculation, UPDATE).reads(&["rax"]).writes(MULTIPLY_RESULT),
    I::prefix("idiv", Calculation, TARGET).reads(&["rax", "rdx"]).writes(&["rax", "rdx"]),
    I::prefix("div", Calculation, TARGET).reads(&["rax", "rdx"]).writes(&["rax", "rdx"]),
    I::exact("cqo", Calculation, S::NONE).reads(&["rax"]).writes(&["rdx"]),
    I::exact("cdq", Calculation, S::NONE).reads(&["eax"]).writes(&["edx"]),
    I::exact("cdqe", Calculation, S::NONE).reads(&["eax"]).writes(&["rax"]),
    I::prefix("set", Calculation, WRITE_ONLY).reads(CONDITION_FLAGS),
    I::prefix("bt", Calculation, COMPARE).writes(&[CARRY_FLAG]),
    I::exact("clc", Calculation, S::NONE).writes(&[CARRY_FLAG]),
    I::exact("stc", Calculation, S::NONE).writes(&[CARRY_FLAG]),
    I::exact("cmc", Calculation, S::NONE).reads(&[CARRY_FLAG]).writes(&[CARRY_FLAG]),
    I::exact("lahf", DataMove, S::NONE).reads(ARITHMETIC_FLAGS).writes(&["ah"]),
    I::exact("rdtsc", DataMove, S::NONE).writes(&["rax", "rdx"]),
    I::exact("cpuid", DataMove, S::NONE).reads(&["rax"]).writes(&["rax", "rbx", "rcx", "rdx"]),
];
