use serde::Serialize;
use soakstation_frame::{append_crc, crc16};

use crate::cmd::{parse_hex, CrcArgs};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_record, OutputFormat};

#[derive(Serialize)]
struct CrcOutput {
    payload: String,
    client_id: u32,
    crc: String,
    framed: String,
}

pub fn run(args: CrcArgs, format: OutputFormat) -> CliResult<i32> {
    let payload = parse_hex("crc", &args.payload)?;

    let mut salted = payload.clone();
    salted.extend_from_slice(&args.client_id.to_be_bytes());

    print_record(
        &CrcOutput {
            payload: hex::encode(&payload),
            client_id: args.client_id,
            crc: format!("{:04x}", crc16(&salted)),
            framed: hex::encode(append_crc(&payload, args.client_id)),
        },
        format,
    )?;
    Ok(SUCCESS)
}
