//! Helpers shared by the `crash-triage` binary and its tests.

pub mod commands;

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use log::LevelFilter;
use triage_core::config::AnalysisConfig;
use triage_core::hash::Frame;
use triage_core::model::{Architecture, ProcessorFlags};
use triage_core::services::ListingHost;

/// Map a `-v` count to a log level: warn, info, debug, then trace.
pub fn level_from_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Install `env_logger` at the level implied by `verbosity`. `RUST_LOG` still
/// takes precedence when set.
pub fn init_logging(verbosity: u8) {
    let _ = env_logger::Builder::new()
        .filter_level(level_from_verbosity(verbosity))
        .parse_default_env()
        .format_timestamp(None)
        .try_init();
}

/// Load the analysis config from `path`, or use defaults.
pub fn load_config(path: Option<&str>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => AnalysisConfig::load(path)
            .with_context(|| format!("Failed to load analysis config from {path}")),
        None => Ok(AnalysisConfig::default()),
    }
}

/// Parse an address given on the command line (`0x` prefix optional).
pub fn parse_address_arg(text: &str) -> Result<u64> {
    let digits: String = text.trim().chars().filter(|c| *c != '`').collect();
    let digits = digits.strip_prefix("0x").unwrap_or(digits.as_str());
    u64::from_str_radix(digits, 16).map_err(|_| anyhow!("Invalid address '{text}'"))
}

/// Parse an architecture name given on the command line.
pub fn parse_architecture(text: &str) -> Result<Architecture> {
    text.parse::<Architecture>().map_err(|err| anyhow!(err))
}

/// Build a flags snapshot from a compact list such as `z,c` or `none`.
///
/// Letters: `z` zero, `c` carry, `v` overflow, `n`/`s` sign, `p` parity,
/// `a` aux. `none` means valid with every flag clear.
pub fn parse_flags(text: &str) -> Result<ProcessorFlags> {
    let mut flags = ProcessorFlags::known();
    let text = text.trim();
    if text.eq_ignore_ascii_case("none") || text.is_empty() {
        return Ok(flags);
    }
    for part in text.split(',') {
        match part.trim().to_ascii_lowercase().as_str() {
            "z" | "zero" => flags.zero = true,
            "c" | "carry" => flags.carry = true,
            "v" | "o" | "overflow" => flags.overflow = true,
            "n" | "s" | "sign" => flags.sign = true,
            "p" | "parity" => flags.parity = true,
            "a" | "aux" => flags.aux = true,
            other => return Err(anyhow!("Unknown flag '{other}' (expected z, c, v, n, p or a)")),
        }
    }
    Ok(flags)
}

/// Load a listing file into a host using the config's architecture and
/// flags.
pub fn load_listing(path: &str, config: &AnalysisConfig) -> Result<ListingHost> {
    let host = ListingHost::load(path, config.architecture, config.flags)
        .with_context(|| format!("Failed to load listing {path}"))?;
    if host.is_empty() {
        return Err(anyhow!("Listing {path} contains no instructions"));
    }
    Ok(host)
}

/// Read a frames file: one `module!symbol+0xdisp` per line, `?` for an
/// unresolved frame. Blank lines and `#` comments are skipped.
pub fn parse_frames_file(path: &Path) -> Result<Vec<Frame>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read frames file {}", path.display()))?;
    let mut frames = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let frame = line
            .parse::<Frame>()
            .with_context(|| format!("{}:{}", path.display(), line_no + 1))?;
        frames.push(frame);
    }
    Ok(frames)
}
