use soakstation_transport::Transport;
use tracing::{info, warn};

use crate::config::RetryConfig;
use crate::error::Result;

/// Connect `transport`, retrying failed attempts per `retry`.
///
/// Returns the last transport error once every attempt has failed.
pub async fn connect_with_retry<T: Transport>(
    transport: &mut T,
    retry: &RetryConfig,
) -> Result<()> {
    let attempts = retry.attempts.max(1);
    let mut failures = 0;

    loop {
        match transport.connect().await {
            Ok(()) => {
                info!(
                    address = %transport.address(),
                    attempt = failures + 1,
                    "connected"
                );
                return Ok(());
            }
            Err(err) => {
                failures += 1;
                if failures >= attempts {
                    warn!(
                        address = %transport.address(),
                        attempts,
                        error = %err,
                        "giving up on connect"
                    );
                    return Err(err.into());
                }
                let delay = retry.delay_after(failures);
                warn!(
                    address = %transport.address(),
                    attempt = failures,
                    ?delay,
                    error = %err,
                    "connect failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use soakstation_transport::MemoryTransport;

    use super::*;
    use crate::error::SessionError;

    #[tokio::test(start_paused = true)]
    async fn recovers_after_transient_failures() {
        let (mut transport, device) = MemoryTransport::pair("AA:BB");
        device.fail_next_connects(3);

        let started = tokio::time::Instant::now();
        connect_with_retry(&mut transport, &RetryConfig::default())
            .await
            .unwrap();

        assert!(transport.is_connected());
        assert_eq!(device.connect_count(), 1);
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_configured_attempts() {
        let (mut transport, device) = MemoryTransport::pair("AA:BB");
        device.fail_next_connects(5);
        let retry = RetryConfig {
            attempts: 3,
            ..RetryConfig::default()
        };

        let err = connect_with_retry(&mut transport, &retry).await.unwrap_err();
        assert!(matches!(err, SessionError::Transport(_)));
        assert!(!transport.is_connected());
    }
}
