use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use crash_triage::commands::{
    buckets_command, classify_command, stack_hash_command, taint_command, triage_command,
};
use crash_triage::init_logging;

/// Crash triage assistant CLI.
///
/// This CLI is a thin wrapper around `triage-core` (exposed in code as `triage_core`).
/// All substantive logic lives in the library so it can be tested thoroughly
/// and reused from other frontends.
#[derive(Parser, Debug)]
#[command(
    name = "crash-triage",
    version,
    about = "Classify faulting instructions, track taint and bucket crashes",
    long_about = None
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify one or more lines of disassembly.
    ///
    /// Each line is `address opcode mnemonic arguments`, as printed by the
    /// debugger, or just `mnemonic arguments` with `--bare`.
    Classify {
        /// Architecture: x86, x64 or arm.
        #[arg(long, default_value = "x86")]
        arch: String,

        /// Known processor flags, e.g. `z,c` or `none`. Omit when unknown.
        #[arg(long)]
        flags: Option<String>,

        /// Lines hold only the mnemonic and arguments.
        #[arg(long, default_value_t = false)]
        bare: bool,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Disassembly lines to classify.
        #[arg(required = true)]
        lines: Vec<String>,
    },

    /// Build the faulting basic block from a listing and propagate taint.
    Taint {
        /// Disassembly listing file.
        #[arg(long)]
        listing: String,

        /// Analysis config (.json, .yaml or .yml).
        #[arg(long)]
        config: Option<String>,

        /// Faulting address. Defaults to the first instruction in the listing.
        #[arg(long)]
        start: Option<String>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Compute the stack hash of a frames file.
    ///
    /// One frame per line: `module!symbol+0xdisp`, or `?` for an unresolved
    /// frame.
    StackHash {
        /// Frames file.
        #[arg(long)]
        frames: String,

        /// Hash mode: custom_v1, custom_v2 or sha256. Overrides the config.
        #[arg(long)]
        mode: Option<String>,

        /// Analysis config (.json, .yaml or .yml).
        #[arg(long)]
        config: Option<String>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Full triage: taint the faulting block and bucket the crash.
    Triage {
        /// Disassembly listing file.
        #[arg(long)]
        listing: String,

        /// Frames file for the stack hash.
        #[arg(long)]
        frames: String,

        /// Analysis config (.json, .yaml or .yml).
        #[arg(long)]
        config: Option<String>,

        /// Faulting address. Defaults to the first instruction in the listing.
        #[arg(long)]
        start: Option<String>,

        /// Record the crash in this SQLite database.
        #[arg(long)]
        db: Option<String>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List crash buckets recorded in a database.
    Buckets {
        /// Crash database path.
        #[arg(long)]
        db: String,

        /// Show the crashes in one bucket (`0xMAJOR.0xMINOR`).
        #[arg(long)]
        bucket: Option<String>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Classify { arch, flags, bare, json, lines } => {
            classify_command(&arch, flags.as_deref(), bare, &lines, json)?
        }
        Command::Taint { listing, config, start, json } => {
            taint_command(&listing, config.as_deref(), start.as_deref(), json)?
        }
        Command::StackHash { frames, mode, config, json } => {
            stack_hash_command(&frames, mode.as_deref(), config.as_deref(), json)?
        }
        Command::Triage { listing, frames, config, start, db, json } => triage_command(
            &listing,
            &frames,
            config.as_deref(),
            start.as_deref(),
            db.as_deref(),
            json,
        )?,
        Command::Buckets { db, bucket, json } => {
            buckets_command(&db, bucket.as_deref(), json)?
        }
    }

    Ok(())
}
