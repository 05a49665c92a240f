use std::fs;

use crash_triage::commands::parse_bucket;
use crash_triage::{
    level_from_verbosity, load_config, load_listing, parse_address_arg, parse_architecture,
    parse_flags, parse_frames_file,
};
use log::LevelFilter;
use tempfile::tempdir;
use triage_core::config::AnalysisConfig;
use triage_core::hash::Frame;
use triage_core::Architecture;

#[test]
fn verbosity_maps_to_levels() {
    assert_eq!(level_from_verbosity(0), LevelFilter::Warn);
    assert_eq!(level_from_verbosity(1), LevelFilter::Info);
    assert_eq!(level_from_verbosity(2), LevelFilter::Debug);
    assert_eq!(level_from_verbosity(7), LevelFilter::Trace);
}

#[test]
fn parses_flag_lists() {
    let flags = parse_flags("z, C").expect("flags");
    assert!(flags.valid);
    assert!(flags.zero);
    assert!(flags.carry);
    assert!(!flags.sign);

    let none = parse_flags("none").expect("none");
    assert!(none.valid);
    assert!(!none.zero && !none.carry && !none.overflow);

    let err = parse_flags("z,q").unwrap_err();
    assert!(err.to_string().contains("Unknown flag 'q'"));
}

#[test]
fn parses_addresses() {
    assert_eq!(parse_address_arg("0x401000").expect("hex"), 0x401000);
    assert_eq!(parse_address_arg("401000").expect("bare"), 0x401000);
    assert_eq!(parse_address_arg("00007ff6`12340000").expect("backtick"), 0x7ff6_1234_0000);

    let err = parse_address_arg("zz").unwrap_err();
    assert!(err.to_string().contains("Invalid address 'zz'"));
}

#[test]
fn parses_architectures() {
    assert_eq!(parse_architecture("AMD64").expect("x64"), Architecture::X64);
    assert_eq!(parse_architecture("thumb").expect("arm"), Architecture::Arm);
    assert!(parse_architecture("sparc").is_err());
}

#[test]
fn load_config_defaults_without_path() {
    let config = load_config(None).expect("defaults");
    assert_eq!(config, AnalysisConfig::default());

    let dir = tempdir().expect("tempdir");
    let missing = dir.path().join("missing.yaml");
    let err = load_config(Some(missing.to_str().expect("utf8 path"))).unwrap_err();
    assert!(err.to_string().contains("Failed to load analysis config from"));
}

#[test]
fn frames_file_skips_comments_and_blanks() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("frames.txt");
    fs::write(&path, "# top of stack\n\napp!crash+0x10\n?\n  app!main  \n").expect("write");

    let frames = parse_frames_file(&path).expect("frames");
    assert_eq!(
        frames,
        vec![Frame::resolved("app!crash", 0x10), Frame::unknown(), Frame::resolved("app!main", 0)]
    );
}

#[test]
fn frames_file_errors_name_the_line() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("frames.txt");
    fs::write(&path, "app!crash\n+0x10\n").expect("write");

    let err = parse_frames_file(&path).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("frames.txt:2"), "{message}");
    assert!(message.contains("Invalid frame"), "{message}");
}

#[test]
fn load_listing_rejects_empty_files() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("empty.lst");
    fs::write(&path, "").expect("write");

    let err = load_listing(path.to_str().expect("utf8 path"), &AnalysisConfig::default())
        .unwrap_err();
    assert!(err.to_string().contains("contains no instructions"));
}

#[test]
fn bucket_labels_parse() {
    assert_eq!(parse_bucket("0x0000000a.0x0000000b").expect("bucket"), (0xa, 0xb));
    assert_eq!(parse_bucket("dead.BEEF").expect("no prefix"), (0xdead, 0xbeef));

    let err = parse_bucket("0x1").unwrap_err();
    assert!(err.to_string().contains("must be MAJOR.MINOR"));
    let err = parse_bucket("0x1.0xzz").unwrap_err();
    assert!(err.to_string().contains("Invalid bucket"));
}
