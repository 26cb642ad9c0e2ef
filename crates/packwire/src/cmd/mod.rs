use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod dump;
pub mod encode;
pub mod ids;
pub mod version;

/// Default cap on bytes `dump` will read: 16 MiB.
pub const DEFAULT_MAX_BYTES: u64 = 16 * 1024 * 1024;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the builtin type ids.
    Ids(IdsArgs),
    /// Decode one heterogeneous map and print it.
    Dump(DumpArgs),
    /// Encode a JSON object as a heterogeneous map.
    Encode(EncodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Ids(args) => ids::run(args, format),
        Command::Dump(args) => dump::run(args, format),
        Command::Encode(args) => encode::run(args),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug, Default)]
pub struct IdsArgs {}

#[derive(Args, Debug)]
pub struct DumpArgs {
    /// Input file, or `-` for stdin.
    pub input: PathBuf,
    /// Input is hex text rather than raw bytes.
    #[arg(long)]
    pub hex: bool,
    /// Maximum encoded bytes to read.
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_BYTES)]
    pub max_bytes: u64,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// JSON object to encode.
    #[arg(long, value_name = "OBJECT")]
    pub json: String,
    /// Print hex text instead of writing raw bytes.
    #[arg(long)]
    pub hex: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
