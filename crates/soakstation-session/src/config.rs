use std::time::Duration;

use soakstation_frame::DEFAULT_CHUNK_SIZE;

/// Default time to wait for the answer to a request.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default time to wait for the device to answer a pairing request.
pub const DEFAULT_PAIRING_TIMEOUT: Duration = Duration::from_secs(5);

/// Default capacity of channels created by [`event_channel`](crate::event_channel).
pub const DEFAULT_EVENT_BUFFER: usize = 64;

/// Queue depth for requests waiting on the session task.
pub(crate) const COMMAND_BUFFER: usize = 32;

/// Connect retry policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total connect attempts before giving up. Zero behaves like one.
    pub attempts: u32,
    /// Delay after the first failed attempt.
    pub initial_delay: Duration,
    /// Upper bound for the doubling delay.
    pub max_delay: Duration,
    /// Pause between disconnecting and connecting again on reconnect.
    pub reconnect_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 10,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(1),
            reconnect_delay: Duration::from_secs(1),
        }
    }
}

impl RetryConfig {
    /// Delay to wait after `failures` consecutive failed attempts (1-based).
    pub fn delay_after(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1).min(16);
        self.initial_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Largest chunk handed to the transport.
    pub chunk_size: usize,
    /// Deadline for [`SessionHandle::request`](crate::SessionHandle::request).
    pub response_timeout: Duration,
    /// Deadline for [`SessionHandle::pair`](crate::SessionHandle::pair).
    pub pairing_timeout: Duration,
    /// Capacity used by [`event_channel`](crate::event_channel).
    pub event_buffer: usize,
    pub retry: RetryConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            pairing_timeout: DEFAULT_PAIRING_TIMEOUT,
            event_buffer: DEFAULT_EVENT_BUFFER,
            retry: RetryConfig::default(),
        }
    }
}
