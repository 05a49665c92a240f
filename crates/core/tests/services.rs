use triage_core::config::AnalysisConfig;
use triage_core::db::TriageDb;
use triage_core::hash::Frame;
use triage_core::services::{
    build_basic_block, resolve_frames, run_and_record, run_triage, DebuggerHost, HostError,
    ListingHost, TriageError,
};
use triage_core::{Architecture, DisassemblyError, InstructionClass, ProcessorFlags, TaintStatus};

const X86_LISTING: &str = "
app!crash_here:
00401000 8b08            mov     ecx,dword ptr [eax]
00401002 8bd1            mov     edx,ecx
00401004 c3              ret
00401005 90              nop
";

fn x86_host(listing: &str) -> ListingHost {
    ListingHost::parse(listing, Architecture::X86, ProcessorFlags::unknown()).expect("listing")
}

#[test]
fn listing_host_serves_lines_in_order() {
    let host = x86_host(X86_LISTING);

    assert_eq!(host.len(), 4);
    assert_eq!(host.first_address(), Some(0x401000));

    let line = host.disassemble(0x401002).expect("line");
    assert!(line.text.contains("mov     edx,ecx"));
    assert_eq!(line.next_address, Some(0x401004));

    let last = host.disassemble(0x401005).expect("last line");
    assert_eq!(last.next_address, None);

    assert!(matches!(host.disassemble(0x401001), Err(HostError::NoInstruction(0x401001))));
}

#[test]
fn listing_labels_become_symbols() {
    let listing = "
app!crash_here:
00401000 8b08            mov     ecx,dword ptr [eax]
app!crash_here+0x2:
00401002 8bd1            mov     edx,ecx
app!other:
00401010 c3              ret
";
    let host = x86_host(listing);

    assert_eq!(host.resolve_symbol(0x401004), Some(("app!crash_here".to_string(), 4)));
    assert_eq!(host.resolve_symbol(0x401010), Some(("app!other".to_string(), 0)));
    assert_eq!(host.resolve_symbol(0x400000), None);

    let frames = resolve_frames(&host, &[0x401004, 0x10]);
    assert_eq!(frames, vec![Frame::resolved("app!crash_here", 4), Frame::unknown()]);
}

#[test]
fn listing_rejects_garbage_lines() {
    let err = ListingHost::parse(
        "00401000 90 nop\nnot an instruction:\n",
        Architecture::X86,
        ProcessorFlags::unknown(),
    )
    .unwrap_err();

    match err {
        HostError::InvalidListingLine { line_no, line } => {
            assert_eq!(line_no, 2);
            assert_eq!(line, "not an instruction:");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn with_symbol_adds_symbols() {
    let host = x86_host(X86_LISTING).with_symbol(0x401004, "app!epilogue");
    assert_eq!(host.resolve_symbol(0x401005), Some(("app!epilogue".to_string(), 1)));
}

#[test]
fn block_ends_after_return() {
    let host = x86_host(X86_LISTING);
    let block = build_basic_block(&host, 0x401000, &AnalysisConfig::default()).expect("block");

    assert_eq!(block.len(), 3);
    assert_eq!(block[2].class, InstructionClass::Return);
}

#[test]
fn block_respects_instruction_limit() {
    let host = x86_host(X86_LISTING);
    let config = AnalysisConfig { max_block_instructions: 2, ..AnalysisConfig::default() };
    let block = build_basic_block(&host, 0x401000, &config).expect("block");

    assert_eq!(block.len(), 2);
}

#[test]
fn block_ends_where_listing_ends() {
    let host = x86_host("00401000 8bd1 mov edx,ecx\n00401002 8bc2 mov eax,edx\n");
    let block = build_basic_block(&host, 0x401000, &AnalysisConfig::default()).expect("block");

    assert_eq!(block.len(), 2);
    assert_eq!(block[1].next_address, None);
}

#[test]
fn block_is_truncated_at_undecodable_instruction() {
    let listing = "
00401000 8b08            mov     ecx,dword ptr [eax]
00401002 8bd1            mov     edx,ecx
00401004 ??              ???
00401005 c3              ret
";
    let host = x86_host(listing);
    let block = build_basic_block(&host, 0x401000, &AnalysisConfig::default()).expect("block");

    assert_eq!(block.len(), 2);
}

#[test]
fn faulting_instruction_must_disassemble() {
    let host = x86_host("00401004 ??              ???\n");

    let err = build_basic_block(&host, 0x401004, &AnalysisConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        TriageError::Disassembly {
            address: 0x401004,
            source: DisassemblyError::UnexpectedContinuation(_)
        }
    ));

    let err = build_basic_block(&host, 0x500000, &AnalysisConfig::default()).unwrap_err();
    assert!(matches!(err, TriageError::Host(HostError::NoInstruction(0x500000))));
}

#[test]
fn flags_stay_valid_until_first_flag_write() {
    let listing = "
00401000 6808     ldr         r0,[r1]
00401002 0001a001 moveq       r2,r0
00401006 2800     cmp         r0,#0
00401008 0001a001 moveq       r3,r0
0040100c 4770     bx          lr
";
    let flags = ProcessorFlags { zero: false, ..ProcessorFlags::known() };
    let host = ListingHost::parse(listing, Architecture::Arm, flags).expect("arm listing");
    let block = build_basic_block(&host, 0x401000, &AnalysisConfig::default()).expect("block");

    assert_eq!(block.len(), 5);
    assert!(block[1].flags_valid);
    assert_eq!(block[1].class, InstructionClass::Noop);
    assert!(block[2].flags_modified);
    assert!(!block[3].flags_valid);
    assert_eq!(block[3].class, InstructionClass::UnpredictableConditionalExecution);
    assert_eq!(block[4].class, InstructionClass::Return);
}

#[test]
fn block_ends_at_branch_that_may_have_run() {
    let listing = "
00401000 6808     ldr         r0,[r1]
00401002 d1fe     bne         00401010
00401004 6802     ldr         r2,[r0]
00401006 4770     bx          lr
";
    let host = ListingHost::parse(listing, Architecture::Arm, ProcessorFlags::unknown())
        .expect("arm listing");
    let block = build_basic_block(&host, 0x401000, &AnalysisConfig::default()).expect("block");

    assert_eq!(block.len(), 2);
    assert_eq!(block[1].class, InstructionClass::UnpredictableConditionalExecution);
    assert!(block[1].ends_block());

    let flags = ProcessorFlags { zero: true, ..ProcessorFlags::known() };
    let host = ListingHost::parse(listing, Architecture::Arm, flags).expect("arm listing");
    let block = build_basic_block(&host, 0x401000, &AnalysisConfig::default()).expect("block");

    assert_eq!(block.len(), 4);
    assert_eq!(block[1].class, InstructionClass::Noop);
    assert_eq!(block[3].class, InstructionClass::Return);
}

#[test]
fn triage_reports_tainted_path_and_bucket() {
    let host = x86_host(X86_LISTING);
    let frames = vec![Frame::resolved("app!crash_here", 0), Frame::resolved("app!main", 0x42)];
    let report =
        run_triage(&host, 0x401000, &frames, &AnalysisConfig::default()).expect("triage");

    assert_eq!(report.architecture, Architecture::X86);
    assert_eq!(report.fault_address, 0x401000);
    assert_eq!(report.status, TaintStatus::Completed);
    assert!(report.succeeded);
    assert_eq!(report.instructions.len(), 3);

    let fault = report.faulting_instruction().expect("fault");
    assert_eq!(fault.tainted_input.names(), vec!["eax"]);

    let tainted: Vec<u64> = report.tainted_instructions().map(|i| i.address).collect();
    assert_eq!(tainted, vec![0x401002, 0x401004]);

    assert!(report.final_taint.contains("edx"));
    assert_eq!(report.stack_hash.frames.len(), 2);
}

#[test]
fn triage_report_serializes_to_json() {
    let host = x86_host(X86_LISTING);
    let report =
        run_triage(&host, 0x401000, &[], &AnalysisConfig::default()).expect("triage");

    let json = serde_json::to_value(&report).expect("json");
    assert_eq!(json["architecture"], "x86");
    assert_eq!(json["status"]["kind"], "completed");
    assert_eq!(json["instructions"][0]["tainted_input"][0], "eax");
    assert_eq!(json["stack_hash"]["mode"], "sha256");
}

#[test]
fn run_and_record_stores_the_crash() {
    let host = x86_host(X86_LISTING);
    let db = TriageDb::open_in_memory().expect("db");
    let frames = vec![Frame::resolved("app!crash_here", 0)];

    let (report, id) =
        run_and_record(&host, 0x401000, &frames, &AnalysisConfig::default(), &db).expect("record");
    assert_eq!(id, 1);

    let crashes =
        db.crashes_in_bucket(report.stack_hash.major, report.stack_hash.minor).expect("query");
    assert_eq!(crashes.len(), 1);
    assert_eq!(crashes[0].fault_address, 0x401000);
    assert_eq!(crashes[0].tainted_inputs, vec!["eax".to_string()]);
    assert_eq!(crashes[0].status, "completed");
}
