mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "packwire", version, about = "Inspect and produce packwire payloads")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        env = "PACKWIRE_LOG",
        default_value = "warn",
        global = true
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dump_subcommand() {
        let cli = Cli::try_parse_from(["packwire", "dump", "payload.bin", "--max-bytes", "64"])
            .expect("dump args should parse");

        let Command::Dump(args) = cli.command else {
            panic!("expected dump");
        };
        assert_eq!(args.max_bytes, 64);
        assert!(!args.hex);
    }

    #[test]
    fn dump_defaults_max_bytes() {
        let cli = Cli::try_parse_from(["packwire", "dump", "-", "--hex"])
            .expect("dump args should parse");
        let Command::Dump(args) = cli.command else {
            panic!("expected dump");
        };
        assert_eq!(args.max_bytes, cmd::DEFAULT_MAX_BYTES);
        assert!(args.hex);
    }

    #[test]
    fn encode_requires_json() {
        let err = Cli::try_parse_from(["packwire", "encode", "--hex"])
            .expect_err("missing --json should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "packwire",
            "ids",
            "--format",
            "pretty",
            "--log-level",
            "debug",
        ])
        .expect("global flags should parse");
        assert!(matches!(cli.command, Command::Ids(_)));
        assert!(matches!(cli.format, Some(OutputFormat::Pretty)));
        assert_eq!(cli.log_level, LogLevel::Debug);
    }
}
