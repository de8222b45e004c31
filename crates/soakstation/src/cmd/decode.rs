use soakstation_frame::Reassembler;
use soakstation_protocol::Event;
use tracing::{debug, warn};

use crate::cmd::{parse_hex, DecodeArgs};
use crate::exit::{CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_packets, OutputFormat, PacketOutput};

/// Feed chunks through the reassembler in order and print every packet.
///
/// Exits with `DATA_INVALID` when a chunk was dropped or input ended
/// mid-packet; the packets that did decode are still printed.
pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let chunks = args
        .chunks
        .iter()
        .map(|chunk| parse_hex("decode", chunk))
        .collect::<CliResult<Vec<_>>>()?;

    let mut reassembler = Reassembler::new();
    let mut packets = Vec::new();
    let mut dropped = 0usize;

    for (index, chunk) in chunks.iter().enumerate() {
        match reassembler.push(chunk) {
            Ok(Some(packet)) => {
                let event = Event::from_packet(&packet);
                packets.push((packet, event));
            }
            Ok(None) => debug!(index, "chunk buffered"),
            Err(err) => {
                dropped += 1;
                warn!(index, error = %err, "chunk dropped");
            }
        }
    }

    if let Some(pending) = reassembler.pending() {
        warn!(
            expected = pending.expected_length(),
            received = pending.accumulated().len(),
            "input ended mid-packet"
        );
    }

    let outputs: Vec<PacketOutput<'_>> = packets
        .iter()
        .map(|(packet, event)| PacketOutput::new(packet, event))
        .collect();
    print_packets(&outputs, format)?;

    if dropped > 0 || !reassembler.is_idle() {
        return Ok(DATA_INVALID);
    }
    Ok(SUCCESS)
}
