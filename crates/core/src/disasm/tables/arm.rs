use super::{InstructionInfo as I, OperandShape as S};
use crate::disasm::overrides::Override::{self, *};
use crate::disasm::registers::{CARRY_FLAG, FLAGS, OVERFLOW_FLAG, SIGN_FLAG, ZERO_FLAG};
use crate::model::InstructionClass::*;

const TARGET: S = S::SOURCE_OPERANDS;
const MOVE: S = S::ALL_OPERANDS;
const UPDATE: S = S::ALL_OPERANDS.union(S::DESTINATION_IS_IMPLIED_SOURCE);
const COMPARE: S = UPDATE.union(S::DESTINATION_IS_UNAFFECTED);
const UNARY: S = S::DESTINATION_OPERANDS.union(S::DESTINATION_IS_IMPLIED_SOURCE);
const LOAD: S = S::DESTINATION_REGISTER.union(S::SOURCE_OPERANDS);
const LOAD_PAIR: S = LOAD.union(S::DUAL_INITIAL_OPERANDS);
const STORE: S =
    S::SOURCE_REGISTER.union(S::DESTINATION_POINTER).union(S::OPERAND_ORDER_REVERSED);
const STORE_PAIR: S = STORE.union(S::DUAL_INITIAL_OPERANDS);
const LOAD_MULTIPLE: S = S::SOURCE_REGISTER
    .union(S::DESTINATION_REGISTER)
    .union(S::OPERAND_ORDER_REVERSED);
const STORE_MULTIPLE: S = S::DESTINATION_POINTER.union(S::SOURCE_REGISTER);

const CONDITION_FLAGS: &[&str] = &[ZERO_FLAG, CARRY_FLAG, OVERFLOW_FLAG, SIGN_FLAG];
const ARGUMENT_REGISTERS: &[&str] = &["r0", "r1", "r2", "r3"];
const CALL_CLOBBERED: &[&str] = &["r0", "r1", "r2", "r3", "r12", "lr"];

const LOAD_OVERRIDES: &[Override] = &[ImplicitBranch, BlockMove];

pub(super) static INSTRUCTIONS: &[I] = &[
    I::exact("nop", Noop, S::NONE),
    I::prefix("it", Noop, S::NONE),
    I::prefix("dmb", Noop, S::NONE),
    I::prefix("dsb", Noop, S::NONE),
    I::prefix("isb", Noop, S::NONE),
    I::prefix("bkpt", Interrupt, S::NONE),
    I::prefix("svc", Interrupt, S::NONE).passes(ARGUMENT_REGISTERS),
    I::prefix("udf", Interrupt, S::NONE),
    I::exact("bl", Branch, TARGET)
        .conditional()
        .writes(CALL_CLOBBERED)
        .passes(ARGUMENT_REGISTERS)
        .overrides(&[ImplicitReturn]),
    I::prefix("blx", Branch, TARGET)
        .writes(CALL_CLOBBERED)
        .passes(ARGUMENT_REGISTERS)
        .overrides(&[ImplicitReturn]),
    I::prefix("bx", Branch, TARGET).overrides(&[ImplicitReturn]),
    I::prefix("bic", Calculation, UPDATE),
    I::prefix("bfi", Calculation, UPDATE),
    I::prefix("bfc", Calculation, UNARY),
    I::prefix("cbnz", Branch, TARGET),
    I::prefix("cbz", Branch, TARGET),
    I::prefix("tbb", Branch, TARGET),
    I::prefix("tbh", Branch, TARGET),
    I::prefix("b", Branch, TARGET).overrides(&[ImplicitReturn]),
    I::prefix("push", StackPush, S::SOURCE_REGISTER),
    I::prefix("pop", StackPop, S::DESTINATION_REGISTER).overrides(&[ImplicitBranch]),
    I::prefix("ldm", DataMove, LOAD_MULTIPLE).overrides(LOAD_OVERRIDES),
    I::prefix("stm", DataMove, STORE_MULTIPLE).overrides(&[BlockMove]),
    I::prefix("ldrsb", DataMove, LOAD).overrides(LOAD_OVERRIDES),
    I::prefix("ldrsh", DataMove, LOAD).overrides(LOAD_OVERRIDES),
    I::prefix("ldrexd", DataMove, LOAD_PAIR),
    I::prefix("ldrex", DataMove, LOAD),
    I::prefix("ldrd", DataMove, LOAD_PAIR).overrides(LOAD_OVERRIDES),
    I::prefix("ldrb", DataMove, LOAD).overrides(LOAD_OVERRIDES),
    I::prefix("ldrh", DataMove, LOAD).overrides(LOAD_OVERRIDES),
    I::prefix("ldr", DataMove, LOAD).overrides(LOAD_OVERRIDES),
    I::prefix("strd", DataMove, STORE_PAIR).overrides(&[BlockMove]),
    I::prefix("strb", DataMove, STORE).overrides(&[BlockMove]),
    I::prefix("strh", DataMove, STORE).overrides(&[BlockMove]),
    I::prefix("str", DataMove, STORE).overrides(&[BlockMove]),
    I::prefix("movw", DataMove, MOVE),
    I::prefix("movt", Calculation, UPDATE),
    I::prefix("mov", DataMove, MOVE).overrides(&[ImplicitBranch]),
    I::prefix("mvn", DataMove, MOVE),
    I::prefix("adr", DataMove, MOVE).reads(&["pc"]),
    I::prefix("mrs", DataMove, S::DESTINATION_REGISTER).reads(&[FLAGS]),
    I::prefix("msr", DataMove, S::SOURCE_REGISTER).writes(&[FLAGS]),
    I::prefix("cmp", Calculation, COMPARE).writes(CONDITION_FLAGS),
    I::prefix("cmn", Calculation, COMPARE).writes(CONDITION_FLAGS),
    I::prefix("tst", Calculation, COMPARE).writes(CONDITION_FLAGS),
    I::prefix("teq", Calculation, COMPARE).writes(CONDITION_FLAGS),
    I::prefix("eor", Calculation, UPDATE).overrides(&[ReflexiveCancellation]),
    I::prefix("sub", Calculation, UPDATE).overrides(&[ReflexiveCancellation]),
    I::prefix("sbc", Calculation, UPDATE).reads(&[CARRY_FLAG]),
    I::prefix("rsb", Calculation, UPDATE),
    I::prefix("rsc", Calculation, UPDATE).reads(&[CARRY_FLAG]),
    I::prefix("add", Calculation, UPDATE),
    I::prefix("adc", Calculation, UPDATE).reads(&[CARRY_FLAG]),
    I::prefix("and", Calculation, UPDATE),
    I::prefix("orr", Calculation, UPDATE),
    I::prefix("orn", Calculation, UPDATE),
    I::prefix("lsl", Calculation, UPDATE),
    I::prefix("lsr", Calculation, UPDATE),
    I::prefix("asr", Calculation, UPDATE),
    I::prefix("ror", Calculation, UPDATE),
    I::prefix("rrx", Calculation, UPDATE).reads(&[CARRY_FLAG]),
    I::prefix("mul", Calculation, UPDATE),
    I::prefix("mla", Calculation, UPDATE),
    I::prefix("mls", Calculation, UPDATE),
    I::prefix("umull", Calculation, LOAD_PAIR),
    I::prefix("smull", Calculation, LOAD_PAIR),
    I::prefix("umlal", Calculation, LOAD_PAIR.union(S::DESTINATION_IS_IMPLIED_SOURCE)),
    I::prefix("smlal", Calculation, LOAD_PAIR.union(S::DESTINATION_IS_IMPLIED_SOURCE)),
    I::prefix("sdiv", Calculation, MOVE),
    I::prefix("udiv", Calculation, MOVE),
    I::prefix("uxt", Calculation, MOVE),
    I::prefix("sxt", Calculation, MOVE),
    I::prefix("ubfx", Calculation, MOVE),
    I::prefix("sbfx", Calculation, MOVE),
    I::prefix("clz", Calculation, MOVE),
    I::prefix("rev", Calculation, MOVE),
];
