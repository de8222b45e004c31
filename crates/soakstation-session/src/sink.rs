use soakstation_protocol::Event;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::SessionConfig;

/// Receiver of decoded events.
///
/// Called on the session task for every recognized event, in arrival
/// order. Implementations must not block.
pub trait EventSink: Send + 'static {
    fn deliver(&mut self, event: Event);
}

/// Drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct Discard;

impl EventSink for Discard {
    fn deliver(&mut self, _event: Event) {}
}

impl EventSink for mpsc::Sender<Event> {
    fn deliver(&mut self, event: Event) {
        match self.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                warn!(kind = event.notification.kind(), "event sink full, dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("event sink closed");
            }
        }
    }
}

impl EventSink for mpsc::UnboundedSender<Event> {
    fn deliver(&mut self, event: Event) {
        if self.send(event).is_err() {
            debug!("event sink closed");
        }
    }
}

/// Fan out to two sinks.
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn deliver(&mut self, event: Event) {
        self.0.deliver(event.clone());
        self.1.deliver(event);
    }
}

/// Bounded event channel sized by [`SessionConfig::event_buffer`].
pub fn event_channel(config: &SessionConfig) -> (mpsc::Sender<Event>, mpsc::Receiver<Event>) {
    mpsc::channel(config.event_buffer.max(1))
}

#[cfg(test)]
mod tests {
    use soakstation_protocol::{Notification, StatusEvent};

    use super::*;

    fn status(status: u8) -> Event {
        Event {
            client_slot: 1,
            notification: Notification::Status(StatusEvent { status }),
        }
    }

    #[test]
    fn bounded_sink_drops_when_full() {
        let config = SessionConfig {
            event_buffer: 1,
            ..SessionConfig::default()
        };
        let (mut tx, mut rx) = event_channel(&config);
        tx.deliver(status(1));
        tx.deliver(status(2));

        assert_eq!(rx.try_recv().unwrap(), status(1));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_sink_is_ignored() {
        let (mut tx, rx) = mpsc::unbounded_channel::<Event>();
        drop(rx);
        tx.deliver(status(1));
    }

    #[test]
    fn pair_delivers_to_both() {
        let (a, mut rx_a) = mpsc::unbounded_channel::<Event>();
        let (b, mut rx_b) = mpsc::unbounded_channel::<Event>();
        let mut sink = (a, b);
        sink.deliver(status(7));

        assert_eq!(rx_a.try_recv().unwrap(), status(7));
        assert_eq!(rx_b.try_recv().unwrap(), status(7));
    }
}
