//! Typed commands and notifications for the SoakStation protocol.
//!
//! - [`command`] builds the opcode payloads for every outbound request
//! - [`notification`] decodes complete inbound payloads into events
//! - [`temperature`] converts between °C and device tenths

pub mod bits;
pub mod command;
pub mod constants;
pub mod error;
pub mod notification;
pub mod temperature;

pub use command::{encode_client_name, Command, CLIENT_NAME_LEN};
pub use constants::{
    MAGIC_CLIENT_ID, OUTLET_RUNNING, OUTLET_STOPPED, STATUS_FAILURE, STATUS_SUCCESS,
    TIMER_PAUSED, TIMER_RUNNING, TIMER_STOPPED,
};
pub use error::{ProtocolError, Result};
pub use notification::{
    decode, ClientDetailsEvent, ControlsOperatedEvent, DeviceSettingsEvent, DeviceStateEvent,
    Event, NicknameEvent, Notification, OutletSettingsEvent, PresetDetailsEvent, SlotsEvent,
    SoftwareVersion, StatusEvent, StatusOutcome, TechnicalInfoEvent, TimerState,
};
pub use temperature::{decode_temperature, encode_temperature, MAX_TEMPERATURE};
