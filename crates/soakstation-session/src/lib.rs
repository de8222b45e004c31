//! Connection session for SoakStation controllers.
//!
//! A [`Session`] owns one transport link and runs as a single task: inbound
//! chunks are reassembled and decoded in arrival order, outbound commands
//! are written one exchange at a time. Callers talk to it through a
//! cloneable [`SessionHandle`].

pub mod config;
pub mod error;
pub mod model;
pub mod pairing;
pub mod retry;
pub mod session;
pub mod sink;

pub use config::{RetryConfig, SessionConfig};
pub use error::{Result, SessionError};
pub use model::{DeviceModel, ModelSink};
pub use pairing::{
    generate_client_id, ClientIdentity, Pairing, PairingRequest, PairingState, CLIENT_ID_RANGE,
};
pub use retry::connect_with_retry;
pub use session::{DeviceInfo, Session, SessionHandle};
pub use sink::{event_channel, Discard, EventSink};
