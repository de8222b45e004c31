use serde::Serialize;
use soakstation_frame::{chunk, CRC_SIZE};
use soakstation_protocol::Command;
use soakstation_session::generate_client_id;
use tracing::debug;

use crate::cmd::{EncodeArgs, EncodeCommand};
use crate::exit::{protocol_error, CliError, CliResult, SUCCESS};
use crate::output::{print_record, OutputFormat};

#[derive(Serialize)]
struct EncodedOutput {
    command: &'static str,
    opcode: String,
    client_id: u32,
    client_slot: u8,
    crc_salt: String,
    frame: String,
    crc: String,
    chunks: Vec<String>,
}

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    if args.chunk_size == 0 {
        return Err(CliError::usage("--chunk-size must be at least 1"));
    }

    let command = build_command(args.command);
    let (client_id, client_slot) = match &command {
        Command::Pair { client_id, .. } => (*client_id, 0),
        _ => (
            args.client_id.ok_or_else(|| {
                CliError::usage("--client-id (or SOAKSTATION_CLIENT_ID) is required")
            })?,
            args.client_slot.ok_or_else(|| {
                CliError::usage("--client-slot (or SOAKSTATION_CLIENT_SLOT) is required")
            })?,
        ),
    };

    let wire = command
        .encode(client_id, client_slot)
        .map_err(|err| protocol_error("encode", err))?;
    debug!(command = command.name(), frame = %hex::encode(&wire), "encoded");

    let crc_start = wire.len().saturating_sub(CRC_SIZE);
    print_record(
        &EncodedOutput {
            command: command.name(),
            opcode: format!("{:#04x}", command.opcode()),
            client_id,
            client_slot,
            crc_salt: format!("{:#010x}", command.crc_client_id(client_id)),
            frame: hex::encode(&wire),
            crc: hex::encode(&wire[crc_start..]),
            chunks: chunk(&wire, args.chunk_size)
                .into_iter()
                .map(hex::encode)
                .collect(),
        },
        format,
    )?;
    Ok(SUCCESS)
}

fn build_command(command: EncodeCommand) -> Command {
    match command {
        EncodeCommand::DeviceState => Command::RequestDeviceState,
        EncodeCommand::DeviceSettings => Command::RequestDeviceSettings,
        EncodeCommand::OutletSettings => Command::RequestOutletSettings,
        EncodeCommand::Nickname => Command::RequestNickname,
        EncodeCommand::TechnicalInfo => Command::RequestTechnicalInfo,
        EncodeCommand::ClientSlots => Command::RequestClientSlots,
        EncodeCommand::ClientDetails { slot } => Command::RequestClientDetails { client_slot: slot },
        EncodeCommand::PresetSlots => Command::RequestPresetSlots,
        EncodeCommand::PresetDetails { slot } => Command::RequestPresetDetails { preset_slot: slot },
        EncodeCommand::StartPreset { slot } => Command::StartPreset { preset_slot: slot },
        EncodeCommand::Unpair { slot } => Command::UnpairClient { client_slot: slot },
        EncodeCommand::Control {
            outlet1,
            outlet2,
            temperature,
        } => Command::ControlOutlets {
            outlet1,
            outlet2,
            temperature,
        },
        EncodeCommand::Pair { name, id } => Command::Pair {
            client_id: id.unwrap_or_else(generate_client_id),
            client_name: name,
        },
    }
}
