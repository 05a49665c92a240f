use std::path::Path;

use anyhow::{anyhow, Result};
use triage_core::hash::{HashMode, StackHash};

use crate::{load_config, parse_frames_file};

/// Hash a frames file.
pub fn stack_hash_command(
    frames: &str,
    mode: Option<&str>,
    config_path: Option<&str>,
    json: bool,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(mode) = mode {
        config.hash_mode = mode.parse::<HashMode>().map_err(|err| anyhow!(err))?;
    }
    let frames = parse_frames_file(Path::new(frames))?;
    let hash = config.stack_hasher().hash(&frames);

    if json {
        println!("{}", serde_json::to_string_pretty(&hash)?);
        return Ok(());
    }
    print_stack_hash(&hash);
    Ok(())
}

pub fn print_stack_hash(hash: &StackHash) {
    println!("Stack hash ({}): {hash}", hash.mode);
    for (index, frame) in hash.frames.iter().enumerate() {
        let marker = if frame.excluded { " (excluded)" } else { "" };
        if frame.displacement == 0 {
            println!("  {index:02} {}{marker}", frame.name);
        } else {
            println!("  {index:02} {}+{:#x}{marker}", frame.name, frame.displacement);
        }
    }
}
