use clap::{Args, Subcommand};
use soakstation_frame::DEFAULT_CHUNK_SIZE;

use crate::exit::{hex_error, CliResult};
use crate::output::OutputFormat;

pub mod crc;
pub mod decode;
pub mod encode;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Reassemble notification chunks and decode the packets.
    Decode(DecodeArgs),
    /// Encode a command into CRC-terminated wire chunks.
    Encode(EncodeArgs),
    /// Compute the CRC of a payload for a client id.
    Crc(CrcArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Decode(args) => decode::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Crc(args) => crc::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Notification chunks as hex, in arrival order.
    #[arg(required = true, value_name = "HEX")]
    pub chunks: Vec<String>,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Client id salting the CRC (decimal or 0x-prefixed hex).
    #[arg(long, env = "SOAKSTATION_CLIENT_ID", value_parser = parse_u32, global = true)]
    pub client_id: Option<u32>,
    /// Slot assigned to the client at pairing.
    #[arg(long, env = "SOAKSTATION_CLIENT_SLOT", value_parser = parse_u8, global = true)]
    pub client_slot: Option<u8>,
    /// Largest chunk handed to the transport.
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE, global = true)]
    pub chunk_size: usize,
    #[command(subcommand)]
    pub command: EncodeCommand,
}

#[derive(Subcommand, Debug)]
pub enum EncodeCommand {
    /// Request the live outlet and timer state.
    DeviceState,
    DeviceSettings,
    OutletSettings,
    Nickname,
    TechnicalInfo,
    /// Request the occupied client slots.
    ClientSlots,
    ClientDetails {
        #[arg(long, value_parser = parse_u8)]
        slot: u8,
    },
    /// Request the stored preset slots.
    PresetSlots,
    PresetDetails {
        #[arg(long, value_parser = parse_u8)]
        slot: u8,
    },
    StartPreset {
        #[arg(long, value_parser = parse_u8)]
        slot: u8,
    },
    /// Remove a paired client.
    Unpair {
        #[arg(long, value_parser = parse_u8)]
        slot: u8,
    },
    /// Switch outlets and set the target temperature.
    Control {
        #[arg(long)]
        outlet1: bool,
        #[arg(long)]
        outlet2: bool,
        /// Target temperature in °C.
        #[arg(long, default_value_t = 38.0)]
        temperature: f64,
    },
    /// Register a new client. Generates an id when none is given.
    Pair {
        /// Display name, at most 20 UTF-8 bytes.
        #[arg(long)]
        name: String,
        /// Client id to register.
        #[arg(long, value_parser = parse_u32)]
        id: Option<u32>,
    },
}

#[derive(Args, Debug)]
pub struct CrcArgs {
    /// Payload as hex.
    #[arg(value_name = "HEX")]
    pub payload: String,
    /// Client id salting the CRC (decimal or 0x-prefixed hex).
    #[arg(long, value_parser = parse_u32)]
    pub client_id: u32,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_u32(input: &str) -> Result<u32, String> {
    let input = input.trim();
    let parsed = match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(digits) => u32::from_str_radix(digits, 16),
        None => input.parse(),
    };
    parsed.map_err(|err| format!("invalid number {input:?}: {err}"))
}

pub fn parse_u8(input: &str) -> Result<u8, String> {
    let value = parse_u32(input)?;
    u8::try_from(value).map_err(|_| format!("{value} does not fit in one byte"))
}

/// Decode hex, tolerating a `0x` prefix and `:`, `-` or whitespace separators.
pub fn parse_hex(context: &str, input: &str) -> CliResult<Vec<u8>> {
    let input = input.trim();
    let input = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);
    let digits: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':' && *c != '-')
        .collect();
    hex::decode(digits).map_err(|err| hex_error(context, err))
}
