mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "soakstation",
    version,
    about = "Mira SoakStation protocol tooling"
)]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    match cmd::run(cli.command, format) {
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
    use crate::cmd::EncodeCommand;

    #[test]
    fn parses_decode_chunks() {
        let cli = Cli::try_parse_from(["soakstation", "decode", "41070a0101", "8101726400"])
            .expect("decode args should parse");
        let Command::Decode(args) = cli.command else {
            panic!("expected decode");
        };
        assert_eq!(args.chunks.len(), 2);
    }

    #[test]
    fn encode_options_may_follow_subcommand() {
        let cli = Cli::try_parse_from([
            "soakstation",
            "encode",
            "client-details",
            "--slot",
            "2",
            "--client-id",
            "0x3039",
            "--client-slot",
            "1",
        ])
        .expect("encode args should parse");

        let Command::Encode(args) = cli.command else {
            panic!("expected encode");
        };
        assert_eq!(args.client_id, Some(12345));
        assert_eq!(args.client_slot, Some(1));
        assert!(matches!(args.command, EncodeCommand::ClientDetails { slot: 2 }));
    }

    #[test]
    fn crc_requires_client_id() {
        let err = Cli::try_parse_from(["soakstation", "crc", "01070a"])
            .expect_err("missing client id should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
