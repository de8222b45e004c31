use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use soakstation_frame::Packet;
use soakstation_protocol::Event;

use crate::exit::{json_error, CliResult};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// A reassembled packet and its decoded event.
#[derive(Serialize)]
pub struct PacketOutput<'a> {
    pub opcode: String,
    pub length: u8,
    pub payload: String,
    #[serde(flatten)]
    pub event: &'a Event,
}

impl<'a> PacketOutput<'a> {
    pub fn new(packet: &Packet, event: &'a Event) -> Self {
        Self {
            opcode: format!("{:#04x}", packet.opcode),
            length: packet.payload_length,
            payload: hex::encode(&packet.payload),
            event,
        }
    }
}

pub fn print_packets(packets: &[PacketOutput<'_>], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            for packet in packets {
                let line = serde_json::to_string(packet).map_err(|e| json_error("decode", e))?;
                println!("{line}");
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["SLOT", "OPCODE", "LENGTH", "TYPE", "FIELDS"]);
            for packet in packets {
                table.add_row(vec![
                    packet.event.client_slot.to_string(),
                    packet.opcode.clone(),
                    packet.length.to_string(),
                    packet.event.notification.kind().to_string(),
                    fields(packet.event)?,
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for packet in packets {
                println!(
                    "slot={} opcode={} length={} type={} fields={}",
                    packet.event.client_slot,
                    packet.opcode,
                    packet.length,
                    packet.event.notification.kind(),
                    fields(packet.event)?
                );
            }
        }
    }
    Ok(())
}

/// Print a flat record: one JSON object, a two-column table or `key: value` lines.
pub fn print_record<T: Serialize>(record: &T, format: OutputFormat) -> CliResult<()> {
    let value = serde_json::to_value(record).map_err(|e| json_error("output", e))?;

    match format {
        OutputFormat::Json => println!("{value}"),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"]);
            for (key, value) in entries(&value) {
                table.add_row(vec![key, value]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for (key, value) in entries(&value) {
                println!("{key}: {value}");
            }
        }
    }
    Ok(())
}

fn fields(event: &Event) -> CliResult<String> {
    let mut value =
        serde_json::to_value(&event.notification).map_err(|e| json_error("decode", e))?;
    if let Some(map) = value.as_object_mut() {
        map.remove("type");
    }
    Ok(value.to_string())
}

fn entries(value: &serde_json::Value) -> Vec<(String, String)> {
    let Some(map) = value.as_object() else {
        return vec![(String::new(), value.to_string())];
    };
    map.iter()
        .map(|(key, value)| {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Array(items) => items
                    .iter()
                    .map(|item| item.as_str().map_or_else(|| item.to_string(), str::to_string))
                    .collect::<Vec<_>>()
                    .join(" "),
                other => other.to_string(),
            };
            (key.clone(), text)
        })
        .collect()
}
