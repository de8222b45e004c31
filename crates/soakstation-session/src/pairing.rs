//! Client registration.
//!
//! A client registers by sending its id and display name from slot 0. The
//! device answers with a single status byte which, unless it is the failure
//! sentinel, is the slot assigned to the client.

use std::ops::RangeInclusive;

use rand::Rng;
use serde::Serialize;
use soakstation_protocol::{encode_client_name, Command, Event, Notification, STATUS_FAILURE};
use tracing::{debug, info, warn};

use crate::error::{Result, SessionError};

/// Range generated client ids are drawn from. Low values are reserved.
pub const CLIENT_ID_RANGE: RangeInclusive<u32> = 10_000..=65_535;

/// Pick a random client id from [`CLIENT_ID_RANGE`].
pub fn generate_client_id() -> u32 {
    rand::thread_rng().gen_range(CLIENT_ID_RANGE)
}

/// Credentials of a registered client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClientIdentity {
    /// Id chosen by the client, used to salt every CRC.
    pub client_id: u32,
    /// Slot assigned by the device.
    pub client_slot: u8,
}

impl ClientIdentity {
    pub fn new(client_id: u32, client_slot: u8) -> Self {
        Self {
            client_id,
            client_slot,
        }
    }
}

/// Parameters of a pairing exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingRequest {
    /// Id to register; generated when `None`.
    pub client_id: Option<u32>,
    /// Display name, at most 20 UTF-8 bytes.
    pub client_name: String,
}

impl PairingRequest {
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            client_id: None,
            client_name: client_name.into(),
        }
    }

    pub fn with_client_id(mut self, client_id: u32) -> Self {
        self.client_id = Some(client_id);
        self
    }

    /// Reject names that do not fit the pairing frame.
    pub fn validate(&self) -> Result<()> {
        encode_client_name(&self.client_name)?;
        Ok(())
    }
}

/// Where a pairing exchange stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingState {
    Idle,
    AwaitingResponse { client_id: u32 },
    Paired(ClientIdentity),
    TimedOut,
    Failed,
}

impl PairingState {
    pub fn is_awaiting(&self) -> bool {
        matches!(self, PairingState::AwaitingResponse { .. })
    }
}

/// Pairing state machine.
///
/// Holds no I/O: the session feeds it events and timeouts.
#[derive(Debug, Clone)]
pub struct Pairing {
    state: PairingState,
}

impl Default for Pairing {
    fn default() -> Self {
        Self::new()
    }
}

impl Pairing {
    pub fn new() -> Self {
        Self {
            state: PairingState::Idle,
        }
    }

    pub fn state(&self) -> PairingState {
        self.state
    }

    /// Start an exchange and return the command to send.
    ///
    /// Fails without changing state if the name is too long or another
    /// exchange is still awaiting its answer.
    pub fn begin(&mut self, request: &PairingRequest) -> Result<Command> {
        if self.state.is_awaiting() {
            return Err(SessionError::PairingInProgress);
        }
        request.validate()?;

        let client_id = request.client_id.unwrap_or_else(generate_client_id);
        self.state = PairingState::AwaitingResponse { client_id };
        debug!(client_id, name = %request.client_name, "pairing started");

        Ok(Command::Pair {
            client_id,
            client_name: request.client_name.clone(),
        })
    }

    /// Feed a decoded event.
    ///
    /// Returns the outcome once the exchange completes. Anything other than
    /// a status record leaves the exchange waiting.
    pub fn on_event(&mut self, event: &Event) -> Option<Result<ClientIdentity>> {
        let PairingState::AwaitingResponse { client_id } = self.state else {
            return None;
        };
        let Notification::Status(status) = &event.notification else {
            debug!(kind = event.notification.kind(), "ignoring non-status event while pairing");
            return None;
        };

        if status.status == STATUS_FAILURE {
            warn!(client_id, "pairing rejected");
            self.state = PairingState::Failed;
            return Some(Err(SessionError::PairingRejected));
        }

        let identity = ClientIdentity::new(client_id, status.status);
        info!(client_id, client_slot = identity.client_slot, "paired");
        self.state = PairingState::Paired(identity);
        Some(Ok(identity))
    }

    /// Abandon the exchange after its deadline passed.
    pub fn on_timeout(&mut self) {
        if self.state.is_awaiting() {
            warn!("pairing timed out");
            self.state = PairingState::TimedOut;
        }
    }

    /// Abandon the exchange because the request never reached the device.
    pub fn abort(&mut self) {
        if self.state.is_awaiting() {
            self.state = PairingState::Failed;
        }
    }
}
