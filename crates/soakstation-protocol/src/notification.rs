//! Decoding of complete inbound payloads.
//!
//! Dispatch is by payload length first, then by the leading byte where one
//! length carries several record types:
//!
//! | length | leading byte      | record             |
//! |--------|-------------------|--------------------|
//! | 1      | any               | status             |
//! | 2      | any               | client slots       |
//! | 4      | any               | device settings    |
//! | 10     | any               | device state       |
//! | 11     | `0x01`, `0x80`    | controls operated  |
//! | 11     | `0x00`, `0x04`, `0x08` | outlet settings |
//! | 16     | `0x00`            | technical info     |
//! | 16     | other             | nickname           |
//! | 20     | any               | client details     |
//! | 24     | any               | preset details     |
//!
//! Anything else decodes to [`Notification::Unrecognized`].

use std::fmt;

use serde::Serialize;
use soakstation_frame::Packet;
use tracing::trace;

use crate::bits::bits_to_list;
use crate::constants::{
    OUTLET_RUNNING, STATUS_FAILURE, STATUS_SUCCESS, TIMER_PAUSED, TIMER_RUNNING, TIMER_STOPPED,
};
use crate::temperature::decode_temperature;

/// Shower timer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerState {
    Stopped,
    Running,
    Paused,
    /// A state byte outside the known set.
    Unknown(u8),
}

impl From<u8> for TimerState {
    fn from(value: u8) -> Self {
        match value {
            TIMER_STOPPED => TimerState::Stopped,
            TIMER_RUNNING => TimerState::Running,
            TIMER_PAUSED => TimerState::Paused,
            other => TimerState::Unknown(other),
        }
    }
}

impl fmt::Display for TimerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerState::Stopped => f.write_str("stopped"),
            TimerState::Running => f.write_str("running"),
            TimerState::Paused => f.write_str("paused"),
            TimerState::Unknown(value) => write!(f, "unknown({value:#04x})"),
        }
    }
}

/// Interpretation of a status byte outside of pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutcome {
    Success,
    Failure,
    Other(u8),
}

/// Single-byte acknowledgement. During pairing the byte is the assigned slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusEvent {
    pub status: u8,
}

impl StatusEvent {
    /// Classify the status byte.
    pub fn outcome(&self) -> StatusOutcome {
        match self.status {
            STATUS_FAILURE => StatusOutcome::Failure,
            STATUS_SUCCESS => StatusOutcome::Success,
            other => StatusOutcome::Other(other),
        }
    }
}

/// Occupied client (or preset) slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotsEvent {
    pub slots: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceSettingsEvent {
    pub outlets_enabled: Vec<u8>,
    pub default_preset_slot: u8,
    pub controller_settings: Vec<u8>,
}

/// Live outlet and timer state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceStateEvent {
    pub timer_state: TimerState,
    pub target_temperature: f64,
    pub actual_temperature: f64,
    pub outlet1: bool,
    pub outlet2: bool,
    pub remaining_seconds: u16,
    pub update_counter: u8,
}

/// Device state pushed after the physical controls (or a command) changed it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlsOperatedEvent {
    pub change_made: bool,
    #[serde(flatten)]
    pub state: DeviceStateEvent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutletSettingsEvent {
    pub outlet_flag: u8,
    pub min_duration_seconds: u8,
    pub max_temperature: f64,
    pub min_temperature: f64,
    pub update_counter: u8,
}

/// `major.minor` firmware version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SoftwareVersion {
    pub major: u16,
    pub minor: u16,
}

impl fmt::Display for SoftwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TechnicalInfoEvent {
    /// The eight big-endian words as sent.
    pub raw: [u16; 8],
    pub valve_version: SoftwareVersion,
    pub bluetooth_version: SoftwareVersion,
    pub ui_version: SoftwareVersion,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NicknameEvent {
    pub nickname: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientDetailsEvent {
    pub client_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresetDetailsEvent {
    pub preset_slot: u8,
    pub target_temperature: f64,
    pub duration_seconds: u8,
    pub outlets_enabled: Vec<u8>,
    pub name: String,
}

/// A decoded payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    Status(StatusEvent),
    Slots(SlotsEvent),
    DeviceSettings(DeviceSettingsEvent),
    DeviceState(DeviceStateEvent),
    ControlsOperated(ControlsOperatedEvent),
    OutletSettings(OutletSettingsEvent),
    TechnicalInfo(TechnicalInfoEvent),
    Nickname(NicknameEvent),
    ClientDetails(ClientDetailsEvent),
    PresetDetails(PresetDetailsEvent),
    /// No record matches the length/discriminator pair.
    Unrecognized {
        payload_length: u8,
        discriminator: Option<u8>,
    },
}

impl Notification {
    /// Short record name for logs and tables.
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::Status(_) => "status",
            Notification::Slots(_) => "slots",
            Notification::DeviceSettings(_) => "device_settings",
            Notification::DeviceState(_) => "device_state",
            Notification::ControlsOperated(_) => "controls_operated",
            Notification::OutletSettings(_) => "outlet_settings",
            Notification::TechnicalInfo(_) => "technical_info",
            Notification::Nickname(_) => "nickname",
            Notification::ClientDetails(_) => "client_details",
            Notification::PresetDetails(_) => "preset_details",
            Notification::Unrecognized { .. } => "unrecognized",
        }
    }

    /// Whether the payload matched a known record.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Notification::Unrecognized { .. })
    }
}

/// A decoded notification together with the slot it was addressed to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub client_slot: u8,
    #[serde(flatten)]
    pub notification: Notification,
}

impl Event {
    /// Decode a reassembled packet.
    pub fn from_packet(packet: &Packet) -> Self {
        Self {
            client_slot: packet.client_slot,
            notification: decode(packet.payload_length, &packet.payload),
        }
    }
}

/// Decode a complete payload.
///
/// Total over all inputs: a payload whose size differs from
/// `payload_length`, or whose shape is unknown, yields `Unrecognized`.
pub fn decode(payload_length: u8, payload: &[u8]) -> Notification {
    if payload.len() != payload_length as usize {
        return unrecognized(payload_length, payload);
    }

    match payload_length {
        1 => Notification::Status(StatusEvent { status: payload[0] }),
        2 => Notification::Slots(SlotsEvent {
            slots: bits_to_list(be16(payload, 0), 16),
        }),
        4 => Notification::DeviceSettings(DeviceSettingsEvent {
            outlets_enabled: bits_to_list(payload[1] as u16, 8),
            default_preset_slot: payload[2],
            controller_settings: bits_to_list(payload[3] as u16, 8),
        }),
        10 => Notification::DeviceState(device_state(payload)),
        11 => match payload[0] {
            0x01 | 0x80 => Notification::ControlsOperated(ControlsOperatedEvent {
                change_made: payload[0] == 0x01,
                state: device_state(&payload[1..]),
            }),
            0x00 | 0x04 | 0x08 => Notification::OutletSettings(OutletSettingsEvent {
                outlet_flag: payload[0],
                min_duration_seconds: payload[4],
                max_temperature: temperature_at(payload, 5),
                min_temperature: temperature_at(payload, 7),
                update_counter: payload[10],
            }),
            _ => unrecognized(payload_length, payload),
        },
        16 if payload[0] == 0 => Notification::TechnicalInfo(technical_info(payload)),
        16 => Notification::Nickname(NicknameEvent {
            nickname: decode_text(payload),
        }),
        20 => Notification::ClientDetails(ClientDetailsEvent {
            client_name: decode_text(payload),
        }),
        24 => Notification::PresetDetails(PresetDetailsEvent {
            preset_slot: payload[0],
            target_temperature: temperature_at(payload, 1),
            duration_seconds: payload[4],
            outlets_enabled: bits_to_list(payload[5] as u16, 8),
            name: decode_text(&payload[8..]),
        }),
        _ => unrecognized(payload_length, payload),
    }
}

// Layout: timer, target temp (2), actual temp (2), outlet 1, outlet 2,
// remaining seconds (2), update counter. Callers guarantee 10 bytes.
fn device_state(p: &[u8]) -> DeviceStateEvent {
    DeviceStateEvent {
        timer_state: TimerState::from(p[0]),
        target_temperature: temperature_at(p, 1),
        actual_temperature: temperature_at(p, 3),
        outlet1: p[5] == OUTLET_RUNNING,
        outlet2: p[6] == OUTLET_RUNNING,
        remaining_seconds: be16(p, 7),
        update_counter: p[9],
    }
}

fn technical_info(p: &[u8]) -> TechnicalInfoEvent {
    let mut raw = [0u16; 8];
    for (i, word) in raw.iter_mut().enumerate() {
        *word = be16(p, i * 2);
    }
    let version = |major: usize, minor: usize| SoftwareVersion {
        major: raw[major],
        minor: raw[minor],
    };

    TechnicalInfoEvent {
        raw,
        valve_version: version(0, 1),
        bluetooth_version: version(2, 3),
        ui_version: version(6, 7),
    }
}

fn unrecognized(payload_length: u8, payload: &[u8]) -> Notification {
    trace!(
        payload_length,
        payload = %hex::encode(payload),
        "unrecognized notification"
    );
    Notification::Unrecognized {
        payload_length,
        discriminator: payload.first().copied(),
    }
}

fn be16(p: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([p[offset], p[offset + 1]])
}

fn temperature_at(p: &[u8], offset: usize) -> f64 {
    decode_temperature([p[offset], p[offset + 1]])
}

fn decode_text(bytes: &[u8]) -> String {
    let end = bytes
        .iter()
        .rposition(|&b| b != 0)
        .map_or(0, |last| last + 1);
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
