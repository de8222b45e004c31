use bytes::{BufMut, Bytes, BytesMut};
use soakstation_frame::Frame;

use crate::constants::{
    opcode, CLIENT_DETAILS_BASE, CLIENT_SLOTS_ARG, MAGIC_CLIENT_ID, OUTLET_RUNNING,
    OUTLET_STOPPED, PRESET_DETAILS_BASE, PRESET_SLOTS_ARG, TECHNICAL_INFO_ARG, TIMER_PAUSED,
    TIMER_RUNNING,
};
use crate::error::{ProtocolError, Result};
use crate::temperature::encode_temperature;

/// Size of the zero-padded client name field in pairing requests.
pub const CLIENT_NAME_LEN: usize = 20;

/// Outbound requests understood by the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Ask for the live outlet/timer state.
    RequestDeviceState,
    RequestDeviceSettings,
    RequestOutletSettings,
    RequestNickname,
    RequestTechnicalInfo,
    /// Ask for the bitmap of occupied client slots.
    RequestClientSlots,
    RequestClientDetails { client_slot: u8 },
    /// Ask for the bitmap of stored presets.
    RequestPresetSlots,
    RequestPresetDetails { preset_slot: u8 },
    StartPreset { preset_slot: u8 },
    UnpairClient { client_slot: u8 },
    /// Set both outlets and the target temperature in one go.
    ///
    /// The timer runs when either outlet is on, otherwise it is paused.
    ControlOutlets {
        outlet1: bool,
        outlet2: bool,
        temperature: f64,
    },
    /// Register `client_id` under `client_name`.
    ///
    /// Sent from slot 0 and salted with [`MAGIC_CLIENT_ID`], since the
    /// client has no slot or id on the device yet.
    Pair { client_id: u32, client_name: String },
}

impl Command {
    /// Opcode carried in the frame header.
    pub fn opcode(&self) -> u8 {
        match self {
            Command::RequestDeviceState => opcode::DEVICE_STATE,
            Command::RequestDeviceSettings => opcode::DEVICE_SETTINGS,
            Command::RequestOutletSettings => opcode::OUTLET_SETTINGS,
            Command::RequestNickname => opcode::NICKNAME,
            Command::RequestTechnicalInfo => opcode::TECHNICAL_INFO,
            Command::RequestClientSlots | Command::RequestClientDetails { .. } => opcode::CLIENTS,
            Command::RequestPresetSlots | Command::RequestPresetDetails { .. } => opcode::PRESET,
            Command::StartPreset { .. } => opcode::START_PRESET,
            Command::UnpairClient { .. } | Command::Pair { .. } => opcode::PAIRING,
            Command::ControlOutlets { .. } => opcode::CONTROL_OUTLETS,
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::RequestDeviceState => "request_device_state",
            Command::RequestDeviceSettings => "request_device_settings",
            Command::RequestOutletSettings => "request_outlet_settings",
            Command::RequestNickname => "request_nickname",
            Command::RequestTechnicalInfo => "request_technical_info",
            Command::RequestClientSlots => "request_client_slots",
            Command::RequestClientDetails { .. } => "request_client_details",
            Command::RequestPresetSlots => "request_preset_slots",
            Command::RequestPresetDetails { .. } => "request_preset_details",
            Command::StartPreset { .. } => "start_preset",
            Command::UnpairClient { .. } => "unpair_client",
            Command::ControlOutlets { .. } => "control_outlets",
            Command::Pair { .. } => "pair",
        }
    }

    /// Whether this is a pairing request.
    pub fn is_pairing(&self) -> bool {
        matches!(self, Command::Pair { .. })
    }

    /// Argument bytes following the length byte.
    pub fn args(&self) -> Result<Bytes> {
        let args = match self {
            Command::RequestDeviceState
            | Command::RequestDeviceSettings
            | Command::RequestOutletSettings
            | Command::RequestNickname => Bytes::new(),
            Command::RequestTechnicalInfo => Bytes::from_static(&[TECHNICAL_INFO_ARG]),
            Command::RequestClientSlots => Bytes::from_static(&[CLIENT_SLOTS_ARG]),
            Command::RequestClientDetails { client_slot } => {
                Bytes::copy_from_slice(&[CLIENT_DETAILS_BASE.wrapping_add(*client_slot)])
            }
            Command::RequestPresetSlots => Bytes::from_static(&[PRESET_SLOTS_ARG]),
            Command::RequestPresetDetails { preset_slot } => {
                Bytes::copy_from_slice(&[PRESET_DETAILS_BASE.wrapping_add(*preset_slot)])
            }
            Command::StartPreset { preset_slot } => Bytes::copy_from_slice(&[*preset_slot]),
            Command::UnpairClient { client_slot } => Bytes::copy_from_slice(&[*client_slot]),
            Command::ControlOutlets {
                outlet1,
                outlet2,
                temperature,
            } => {
                let [temp_hi, temp_lo] = encode_temperature(*temperature);
                let timer = if *outlet1 || *outlet2 {
                    TIMER_RUNNING
                } else {
                    TIMER_PAUSED
                };
                Bytes::copy_from_slice(&[
                    timer,
                    temp_hi,
                    temp_lo,
                    outlet_byte(*outlet1),
                    outlet_byte(*outlet2),
                ])
            }
            Command::Pair {
                client_id,
                client_name,
            } => {
                let name = encode_client_name(client_name)?;
                let mut buf = BytesMut::with_capacity(4 + CLIENT_NAME_LEN);
                buf.put_u32(*client_id);
                buf.put_slice(&name);
                buf.freeze()
            }
        };
        Ok(args)
    }

    /// Build the logical frame sent from `client_slot`.
    ///
    /// Pairing requests always originate from slot 0.
    pub fn frame(&self, client_slot: u8) -> Result<Frame> {
        let slot = if self.is_pairing() { 0 } else { client_slot };
        Ok(Frame::new(slot, self.opcode(), self.args()?)?)
    }

    /// Client id used to salt the CRC.
    pub fn crc_client_id(&self, client_id: u32) -> u32 {
        if self.is_pairing() {
            MAGIC_CLIENT_ID
        } else {
            client_id
        }
    }

    /// Build the CRC-terminated wire bytes, ready for chunking.
    pub fn encode(&self, client_id: u32, client_slot: u8) -> Result<Bytes> {
        let frame = self.frame(client_slot)?;
        Ok(frame.encode(self.crc_client_id(client_id)))
    }
}

fn outlet_byte(on: bool) -> u8 {
    if on {
        OUTLET_RUNNING
    } else {
        OUTLET_STOPPED
    }
}

/// UTF-8 encode a client name into its fixed, zero-padded field.
pub fn encode_client_name(name: &str) -> Result<[u8; CLIENT_NAME_LEN]> {
    let bytes = name.as_bytes();
    if bytes.len() > CLIENT_NAME_LEN {
        return Err(ProtocolError::ClientNameTooLong { len: bytes.len() });
    }
    let mut field = [0u8; CLIENT_NAME_LEN];
    field[..bytes.len()].copy_from_slice(bytes);
    Ok(field)
}
