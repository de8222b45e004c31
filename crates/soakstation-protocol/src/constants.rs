//! Protocol constants shared by commands and notifications.

/// Client id used to salt the CRC of pairing requests, before a client id
/// has been registered with the device.
pub const MAGIC_CLIENT_ID: u32 = 0x54D2_EE63;

/// Status byte reported when a command failed.
pub const STATUS_FAILURE: u8 = 0x00;
/// Status byte reported when a command succeeded.
pub const STATUS_SUCCESS: u8 = 0x01;

/// Timer state: stopped.
pub const TIMER_STOPPED: u8 = 0x00;
/// Timer state: running.
pub const TIMER_RUNNING: u8 = 0x01;
/// Timer state: paused.
pub const TIMER_PAUSED: u8 = 0x03;

/// Outlet state byte when water is flowing.
pub const OUTLET_RUNNING: u8 = 0x64;
/// Outlet state byte when the outlet is closed.
pub const OUTLET_STOPPED: u8 = 0x00;

/// Command opcodes.
pub mod opcode {
    pub const DEVICE_STATE: u8 = 0x07;
    pub const OUTLET_SETTINGS: u8 = 0x10;
    pub const PRESET: u8 = 0x30;
    pub const TECHNICAL_INFO: u8 = 0x32;
    pub const DEVICE_SETTINGS: u8 = 0x3E;
    pub const NICKNAME: u8 = 0x44;
    pub const CLIENTS: u8 = 0x6B;
    pub const CONTROL_OUTLETS: u8 = 0x87;
    pub const START_PRESET: u8 = 0xB1;
    /// Pairing and unpairing share one opcode; the argument length differs.
    pub const PAIRING: u8 = 0xEB;
}

/// Argument selecting the client slot bitmap.
pub const CLIENT_SLOTS_ARG: u8 = 0x00;
/// Added to a client slot to request that client's details.
pub const CLIENT_DETAILS_BASE: u8 = 0x10;
/// Added to a preset slot to request that preset's details.
pub const PRESET_DETAILS_BASE: u8 = 0x40;
/// Argument selecting the preset slot bitmap.
pub const PRESET_SLOTS_ARG: u8 = 0x80;
/// Argument selecting the technical information block.
pub const TECHNICAL_INFO_ARG: u8 = 0x01;
