use triage_core::disasm::registers::{
    CARRY_FLAG, FLAGS, OVERFLOW_FLAG, STACK_CONTENTS, ZERO_FLAG,
};
use triage_core::{
    classify, disassemble, Architecture, DisassemblyError, Instruction, InstructionClass,
    OperandSet, ProcessorFlags,
};

fn x86(line: &str) -> Instruction {
    disassemble(line, None, Architecture::X86, false, &ProcessorFlags::unknown())
        .expect("x86 line should disassemble")
}

fn names(set: &OperandSet) -> Vec<&str> {
    set.names()
}

#[test]
fn load_from_frame_slot_tracks_slot_as_one_operand() {
    let instr = x86("00401000 8b45f8          mov     eax,dword ptr [ebp-8]");

    assert_eq!(instr.address, 0x401000);
    assert_eq!(instr.mnemonic(), "mov");
    assert_eq!(instr.opcode(), "8b45f8");
    assert_eq!(instr.class, InstructionClass::DataMove);
    assert_eq!(names(&instr.destination), vec!["eax"]);
    assert!(instr.source.contains("ebp"));
    assert!(instr.source.contains("ebp-8"));
    assert!(instr.compound.contains("ebp-8"));
    assert!(instr.destination_pointer.is_empty());
    assert!(!instr.flags_modified);
}

#[test]
fn store_to_frame_slot_splits_pointer_and_slot() {
    let instr = x86("00401000 8945f8          mov     dword ptr [ebp-8],eax");

    assert!(instr.destination.contains("ebp-8"));
    assert_eq!(names(&instr.destination_pointer), vec!["ebp"]);
    assert_eq!(names(&instr.source), vec!["eax"]);
}

#[test]
fn load_through_plain_register_is_not_compound() {
    let instr = x86("00401000 8b08            mov     ecx,dword ptr [eax]");

    assert_eq!(names(&instr.destination), vec!["ecx"]);
    assert_eq!(names(&instr.source), vec!["eax"]);
    assert!(instr.compound.is_empty());
}

#[test]
fn reflexive_xor_drops_its_sources() {
    let instr = x86("00401000 33c0            xor     eax,eax");

    assert_eq!(instr.class, InstructionClass::Calculation);
    assert!(instr.source.is_empty(), "xor eax,eax reads nothing: {}", instr.source);
    assert!(instr.destination.contains("eax"));
    assert!(instr.destination.contains(ZERO_FLAG));
    assert!(instr.flags_modified);
}

#[test]
fn xor_of_different_registers_keeps_both_sources() {
    let instr = x86("00401000 33c3            xor     eax,ebx");

    assert!(instr.source.contains("eax"));
    assert!(instr.source.contains("ebx"));
}

#[test]
fn register_with_immediate_is_not_reflexive() {
    for line in [
        "00401000 83e808          sub     eax,8",
        "00401000 35ff000000      xor     eax,0ffh",
        "00401000 83f001          xor     eax,1",
    ] {
        let instr = x86(line);
        assert_eq!(names(&instr.source), vec!["eax"], "{line}");
        assert!(instr.destination.contains("eax"), "{line}");
    }

    let instr = x86("00401000 83ec20          sub     esp,20h");
    assert_eq!(names(&instr.source), vec!["esp"]);
}

#[test]
fn reflexive_sub_drops_its_sources() {
    let instr = x86("00401000 2bc9            sub     ecx,ecx");
    assert!(instr.source.is_empty(), "{}", instr.source);

    let instr = x86("00401000 2b08            sub     ecx,dword ptr [eax]");
    assert!(instr.source.contains("ecx"));
    assert!(instr.source.contains("eax"));
}

#[test]
fn popcnt_is_a_calculation_not_a_pop() {
    let instr = x86("00401000 f30fb8c1        popcnt  eax,ecx");

    assert_eq!(instr.class, InstructionClass::Calculation);
    assert_eq!(names(&instr.source), vec!["ecx"]);
    assert!(instr.destination.contains("eax"));
    assert!(!instr.source.contains(STACK_CONTENTS));

    let instr = x86("00401000 9d              popf");
    assert_eq!(instr.class, InstructionClass::StackPop);
    assert!(instr.destination.contains(FLAGS));
}

#[test]
fn tab_separated_fields_are_accepted() {
    let instr = x86("00401000\t8b08\tmov\tecx,dword ptr [eax]");

    assert_eq!(instr.mnemonic(), "mov");
    assert_eq!(names(&instr.destination), vec!["ecx"]);
    assert_eq!(names(&instr.source), vec!["eax"]);

    let instr = x86("00401000\tf00fb10a\tlock\tcmpxchg dword ptr [edx],ecx");
    assert_eq!(instr.root_mnemonic(), "cmpxchg");
    assert_eq!(instr.class, InstructionClass::Calculation);
}

#[test]
fn compare_reads_both_operands_and_writes_only_flags() {
    let instr = x86("00401000 3bc1            cmp     eax,ecx");

    assert!(instr.source.contains("eax"));
    assert!(instr.source.contains("ecx"));
    assert!(!instr.destination.contains("eax"));
    assert!(instr.destination.contains(CARRY_FLAG));
    assert!(instr.flags_modified);
}

#[test]
fn lock_prefix_stays_with_mnemonic() {
    let instr = x86("00401000 f00fb111        lock cmpxchg dword ptr [ecx],edx");

    assert_eq!(instr.mnemonic(), "lock cmpxchg");
    assert_eq!(instr.root_mnemonic(), "cmpxchg");
    assert_eq!(instr.class, InstructionClass::Calculation);
    assert!(instr.source.contains("eax"));
    assert!(instr.source.contains("edx"));
    assert!(instr.source.contains("ecx"));
    assert!(instr.destination_pointer.contains("ecx"));
}

#[test]
fn call_clobbers_scratch_registers_and_passes_stack() {
    let instr = x86("00401000 e82f020000      call    app!parse_header (00401234)");

    assert_eq!(instr.class, InstructionClass::Branch);
    assert!(instr.class.terminates_block());
    assert_eq!(names(&instr.source), vec!["esp"]);
    assert_eq!(names(&instr.destination), vec!["eax", "ecx", "edx"]);
    assert_eq!(names(&instr.passed_or_returned), vec![STACK_CONTENTS]);
}

#[test]
fn ret_returns_eax() {
    let instr = x86("00401000 c3              ret");

    assert_eq!(instr.class, InstructionClass::Return);
    assert!(instr.passed_or_returned.contains("eax"));
    assert!(instr.arguments().is_empty());
}

#[test]
fn unknown_mnemonic_is_unknown_and_clobbers_flags() {
    let instr = x86("00401000 d9e8            fld1");

    assert_eq!(instr.class, InstructionClass::Unknown);
    assert!(instr.source.is_empty());
    assert!(instr.destination.is_empty());
    assert!(instr.flags_modified);
}

#[test]
fn nop_never_modifies_flags() {
    let instr = x86("00401000 90              nop");

    assert_eq!(instr.class, InstructionClass::Noop);
    assert!(!instr.flags_modified);
}

#[test]
fn classification_is_idempotent() {
    let mut instr = x86("00401000 0345f8          add     eax,dword ptr [ebp-8]");
    let first = instr.clone();

    classify(&mut instr, Architecture::X86, &ProcessorFlags::unknown());

    assert_eq!(instr, first);
}

#[test]
fn synthetic_instruction_classifies_without_address() {
    let mut instr = Instruction::synthetic("MOV", "EAX, EBX");
    classify(&mut instr, Architecture::X86, &ProcessorFlags::unknown());

    assert_eq!(instr.text(), "mov eax, ebx");
    assert_eq!(instr.class, InstructionClass::DataMove);
    assert_eq!(names(&instr.destination), vec!["eax"]);
    assert_eq!(names(&instr.source), vec!["ebx"]);
}

#[test]
fn x64_backtick_address_and_argument_registers() {
    let line = "00007ff6`12340000 ff15aa000000 call qword ptr [app!free (00007ff6`1234a000)]";
    let instr = disassemble(line, None, Architecture::X64, false, &ProcessorFlags::unknown())
        .expect("x64 call");

    assert_eq!(instr.address, 0x7ff6_1234_0000);
    assert_eq!(instr.class, InstructionClass::Branch);
    for reg in ["rcx", "rdx", "r8", "r9"] {
        assert!(instr.passed_or_returned.contains(reg), "missing {reg}");
    }
    assert!(instr.destination.contains("rax"));
}

#[test]
fn x64_load_through_register() {
    let instr = disassemble(
        "00007ff6`12340010 488b4108        mov     rax,qword ptr [rcx+8]",
        None,
        Architecture::X64,
        false,
        &ProcessorFlags::unknown(),
    )
    .expect("x64 mov");

    assert_eq!(names(&instr.destination), vec!["rax"]);
    assert_eq!(names(&instr.source), vec!["rcx"]);
}

fn arm(line: &str, flags_valid: bool, flags: ProcessorFlags) -> Instruction {
    disassemble(line, None, Architecture::Arm, flags_valid, &flags)
        .expect("arm line should disassemble")
}

#[test]
fn arm_push_expands_register_ranges() {
    let instr = arm("00401000 b5f0     push        {r4-r7,lr}", false, ProcessorFlags::unknown());

    assert_eq!(instr.class, InstructionClass::StackPush);
    assert_eq!(names(&instr.source), vec!["lr", "r4", "r5", "r6", "r7"]);
    assert!(instr.destination.is_empty());
}

#[test]
fn arm_thumb_bit_is_dropped_from_address() {
    let instr = arm("00401001 4770     bx          lr", false, ProcessorFlags::unknown());

    assert_eq!(instr.address, 0x401000);
}

#[test]
fn arm_branch_through_link_register_is_return() {
    let instr = arm("00401000 4770     bx          lr", false, ProcessorFlags::unknown());

    assert_eq!(instr.class, InstructionClass::Return);
    assert_eq!(names(&instr.source), vec!["lr"]);
    assert_eq!(names(&instr.passed_or_returned), vec!["r0", "r1"]);
}

#[test]
fn arm_pop_into_pc_is_branch_reading_stack() {
    let instr = arm("00401000 bd10     pop         {r4,pc}", false, ProcessorFlags::unknown());

    assert_eq!(instr.class, InstructionClass::Branch);
    assert!(instr.destination.contains("r4"));
    assert!(instr.destination.contains("pc"));
    assert!(instr.source.contains(STACK_CONTENTS));
}

#[test]
fn arm_load_with_offset_is_compound_source() {
    let instr = arm("00401000 6848     ldr         r0,[r1,#4]", false, ProcessorFlags::unknown());

    assert_eq!(instr.class, InstructionClass::DataMove);
    assert_eq!(names(&instr.destination), vec!["r0"]);
    assert!(instr.source.contains("r1"));
    assert!(instr.source.contains("r1,#4"));
    assert!(instr.compound.contains("r1,#4"));
}

#[test]
fn arm_store_writes_through_base_register() {
    let instr = arm("00401000 6048     str         r0,[r1]", false, ProcessorFlags::unknown());

    assert_eq!(names(&instr.source), vec!["r0"]);
    assert_eq!(names(&instr.destination_pointer), vec!["r1"]);
}

#[test]
fn arm_flag_setting_suffix() {
    let instr = arm("00401000 1840     adds        r0,r0,r1", false, ProcessorFlags::unknown());

    assert_eq!(instr.class, InstructionClass::Calculation);
    assert!(instr.source.contains(FLAGS));
    assert!(instr.destination.contains(FLAGS));
    assert!(instr.destination.contains("r0"));
    assert!(instr.flags_modified);
}

#[test]
fn arm_condition_not_met_is_noop() {
    let flags = ProcessorFlags { zero: false, ..ProcessorFlags::known() };
    let instr = arm("00401000 0001a001 moveq       r0,r1", true, flags);

    assert_eq!(instr.class, InstructionClass::Noop);
    assert!(!instr.flags_modified);
}

#[test]
fn arm_condition_met_executes() {
    let flags = ProcessorFlags { zero: true, ..ProcessorFlags::known() };
    let instr = arm("00401000 0001a001 moveq       r0,r1", true, flags);

    assert_eq!(instr.class, InstructionClass::DataMove);
    assert!(instr.source.contains("r1"));
    assert!(instr.source.contains(ZERO_FLAG));
}

#[test]
fn arm_condition_with_unknown_flags_is_unpredictable() {
    let instr = arm("00401000 0001a001 moveq       r0,r1", false, ProcessorFlags::unknown());

    assert_eq!(instr.class, InstructionClass::UnpredictableConditionalExecution);
    assert!(instr.destination.contains("r0"));
}

#[test]
fn arm_immediate_operand_is_not_reflexive() {
    let instr = arm("00401000 3801     sub         r0,r0,#1", false, ProcessorFlags::unknown());
    assert!(instr.source.contains("r0"), "{}", instr.source);

    let instr = arm("00401000 4040     eor         r0,r0,r0", false, ProcessorFlags::unknown());
    assert!(instr.source.is_empty(), "{}", instr.source);

    let instr = arm("00401000 1a40     sub         r0,r1,r1", false, ProcessorFlags::unknown());
    assert!(instr.source.is_empty(), "{}", instr.source);
    assert!(instr.destination.contains("r0"));
}

#[test]
fn arm_conditional_branch_keeps_its_executed_class() {
    let instr = arm("00401000 d1fe     bne         00401010", false, ProcessorFlags::unknown());
    assert_eq!(instr.class, InstructionClass::UnpredictableConditionalExecution);
    assert_eq!(instr.unconditional_class, InstructionClass::Branch);
    assert!(instr.ends_block());

    let flags = ProcessorFlags { zero: true, ..ProcessorFlags::known() };
    let instr = arm("00401000 d1fe     bne         00401010", true, flags);
    assert_eq!(instr.class, InstructionClass::Noop);
    assert!(!instr.ends_block());

    let instr = arm("00401000 0001a001 moveq       r0,r1", false, ProcessorFlags::unknown());
    assert_eq!(instr.unconditional_class, InstructionClass::DataMove);
    assert!(!instr.ends_block());
}

#[test]
fn arm_conditional_call_is_not_a_plain_branch() {
    let instr = arm("00401000 1b00f000 blne        00402000", false, ProcessorFlags::unknown());
    assert_eq!(instr.unconditional_class, InstructionClass::Branch);
    assert!(instr.destination.contains("r0"), "calls clobber r0: {}", instr.destination);
    assert!(instr.source.contains(ZERO_FLAG));

    let flags = ProcessorFlags { zero: false, ..ProcessorFlags::known() };
    let instr = arm("00401000 0b00f000 bleq        00402000", true, flags);
    assert_eq!(instr.class, InstructionClass::Noop);

    // `blt` is `b` with the `lt` condition, not `bl`.
    let instr = arm("00401000 dbfe     blt         00401010", false, ProcessorFlags::unknown());
    assert!(instr.source.contains(OVERFLOW_FLAG));
    assert!(instr.destination.is_empty());
}

#[test]
fn rejects_lines_without_instruction() {
    let err = disassemble(
        "00401000 ??              ???",
        None,
        Architecture::X86,
        false,
        &ProcessorFlags::unknown(),
    )
    .unwrap_err();
    assert!(matches!(err, DisassemblyError::UnexpectedContinuation(_)));

    let err = disassemble("00401000", None, Architecture::X86, false, &ProcessorFlags::unknown())
        .unwrap_err();
    assert!(matches!(err, DisassemblyError::MissingField(_)));

    let err = disassemble(
        "zz401000 90              nop",
        None,
        Architecture::X86,
        false,
        &ProcessorFlags::unknown(),
    )
    .unwrap_err();
    assert_eq!(err, DisassemblyError::InvalidAddress("zz401000".into()));
}

#[test]
fn rejects_memory_that_cannot_be_disassembled() {
    let err = disassemble(
        "00401000 ?? Memory access error: disassembly not possible",
        None,
        Architecture::X86,
        false,
        &ProcessorFlags::unknown(),
    )
    .unwrap_err();

    assert_eq!(err, DisassemblyError::NotDisassemblable(0x401000));
}

#[test]
fn rejects_next_address_that_does_not_advance() {
    let err = disassemble(
        "00401000 90              nop",
        Some(0x401000),
        Architecture::X86,
        false,
        &ProcessorFlags::unknown(),
    )
    .unwrap_err();

    assert_eq!(err, DisassemblyError::NoProgress(0x401000));
}
