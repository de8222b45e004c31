//! In-process loopback transport.
//!
//! [`MemoryTransport`] is the host side handed to a session; [`MemoryDevice`]
//! plays the controller: it observes every written chunk and pushes
//! notification chunks back.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::gatt::characteristic_name;
use crate::traits::{ChunkStream, Transport, DEFAULT_NOTIFY_CAPACITY};

struct Shared {
    connected: AtomicBool,
    connects: AtomicUsize,
    connect_failures: AtomicUsize,
    write_failures: AtomicUsize,
    subscriber: Mutex<Option<mpsc::Sender<Bytes>>>,
    characteristics: Mutex<HashMap<String, Bytes>>,
    writes: mpsc::UnboundedSender<Bytes>,
}

impl Shared {
    fn subscriber(&self) -> MutexGuard<'_, Option<mpsc::Sender<Bytes>>> {
        self.subscriber.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn characteristics(&self) -> MutexGuard<'_, HashMap<String, Bytes>> {
        self.characteristics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn take_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

/// Host side of an in-memory link.
pub struct MemoryTransport {
    address: String,
    shared: Arc<Shared>,
}

/// Device side of an in-memory link.
pub struct MemoryDevice {
    shared: Arc<Shared>,
    writes: mpsc::UnboundedReceiver<Bytes>,
}

impl MemoryTransport {
    /// Create a connected pair of endpoints for `address`.
    pub fn pair(address: impl Into<String>) -> (MemoryTransport, MemoryDevice) {
        let (writes_tx, writes_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            connected: AtomicBool::new(false),
            connects: AtomicUsize::new(0),
            connect_failures: AtomicUsize::new(0),
            write_failures: AtomicUsize::new(0),
            subscriber: Mutex::new(None),
            characteristics: Mutex::new(HashMap::new()),
            writes: writes_tx,
        });

        (
            MemoryTransport {
                address: address.into(),
                shared: Arc::clone(&shared),
            },
            MemoryDevice {
                shared,
                writes: writes_rx,
            },
        )
    }
}

impl Transport for MemoryTransport {
    fn address(&self) -> &str {
        &self.address
    }

    fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::SeqCst)
    }

    async fn connect(&mut self) -> Result<()> {
        if Shared::take_failure(&self.shared.connect_failures) {
            return Err(TransportError::Connect {
                address: self.address.clone(),
                reason: "device not found".to_string(),
            });
        }
        self.shared.connects.fetch_add(1, Ordering::SeqCst);
        self.shared.connected.store(true, Ordering::SeqCst);
        debug!(address = %self.address, "memory transport connected");
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.shared.connected.store(false, Ordering::SeqCst);
        self.shared.subscriber().take();
        debug!(address = %self.address, "memory transport disconnected");
        Ok(())
    }

    async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        if Shared::take_failure(&self.shared.write_failures) {
            return Err(TransportError::Write("injected write failure".to_string()));
        }
        debug!(chunk = %hex::encode(chunk), "memory transport write");
        self.shared
            .writes
            .send(Bytes::copy_from_slice(chunk))
            .map_err(|_| TransportError::Closed)
    }

    async fn subscribe(&mut self) -> Result<ChunkStream> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        let (tx, stream) = ChunkStream::channel(DEFAULT_NOTIFY_CAPACITY);
        *self.shared.subscriber() = Some(tx);
        Ok(stream)
    }

    async fn read_characteristic(&mut self, uuid: &str) -> Result<Bytes> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        debug!(
            characteristic = characteristic_name(uuid),
            uuid,
            "memory transport read"
        );
        self.shared
            .characteristics()
            .get(uuid)
            .cloned()
            .ok_or_else(|| TransportError::UnknownCharacteristic(uuid.to_string()))
    }
}

impl MemoryDevice {
    /// Push one notification chunk to the subscribed host.
    ///
    /// Returns `false` when nobody is subscribed or the queue is full.
    pub fn notify(&self, chunk: impl Into<Bytes>) -> bool {
        match self.shared.subscriber().as_ref() {
            Some(tx) => tx.try_send(chunk.into()).is_ok(),
            None => false,
        }
    }

    /// Wait for the next chunk written by the host.
    pub async fn next_write(&mut self) -> Option<Bytes> {
        self.writes.recv().await
    }

    /// Take a written chunk if one is already queued.
    pub fn try_next_write(&mut self) -> Option<Bytes> {
        self.writes.try_recv().ok()
    }

    /// Drain every chunk written so far.
    pub fn drain_writes(&mut self) -> Vec<Bytes> {
        let mut out = Vec::new();
        while let Some(chunk) = self.try_next_write() {
            out.push(chunk);
        }
        out
    }

    /// Expose a readable characteristic.
    pub fn set_characteristic(&self, uuid: &str, value: impl Into<Bytes>) {
        self.shared
            .characteristics()
            .insert(uuid.to_string(), value.into());
    }

    /// Make the next `count` connect attempts fail.
    pub fn fail_next_connects(&self, count: usize) {
        self.shared.connect_failures.store(count, Ordering::SeqCst);
    }

    /// Make the next `count` chunk writes fail.
    pub fn fail_next_writes(&self, count: usize) {
        self.shared.write_failures.store(count, Ordering::SeqCst);
    }

    /// Simulate the device dropping the link.
    pub fn drop_link(&self) {
        self.shared.connected.store(false, Ordering::SeqCst);
        self.shared.subscriber().take();
    }

    /// Number of successful connects so far.
    pub fn connect_count(&self) -> usize {
        self.shared.connects.load(Ordering::SeqCst)
    }

    /// Whether a host currently listens for notifications.
    pub fn is_subscribed(&self) -> bool {
        self.shared.subscriber().is_some()
    }
}

impl std::fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTransport")
            .field("address", &self.address)
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gatt::UUID_MANUFACTURER;

    #[tokio::test]
    async fn write_requires_connection() {
        let (mut transport, _device) = MemoryTransport::pair("AA:BB");
        let err = transport.write_chunk(b"x").await.unwrap_err();
        assert!(matches!(err, TransportError::NotConnected));
    }

    #[tokio::test]
    async fn writes_reach_device_in_order() {
        let (mut transport, mut device) = MemoryTransport::pair("AA:BB");
        transport.connect().await.unwrap();

        transport.write_chunk(b"one").await.unwrap();
        transport.write_chunk(b"two").await.unwrap();

        assert_eq!(device.next_write().await.unwrap().as_ref(), b"one");
        assert_eq!(device.next_write().await.unwrap().as_ref(), b"two");
        assert!(device.try_next_write().is_none());
    }

    #[tokio::test]
    async fn notifications_reach_subscriber() {
        let (mut transport, device) = MemoryTransport::pair("AA:BB");
        assert!(!device.notify(&b"early"[..]));

        transport.connect().await.unwrap();
        let mut stream = transport.subscribe().await.unwrap();
        assert!(device.is_subscribed());
        assert!(device.notify(&b"\x41\x07\x01\x01"[..]));

        assert_eq!(stream.next_chunk().await.unwrap().as_ref(), b"\x41\x07\x01\x01");
    }

    #[tokio::test]
    async fn disconnect_ends_stream() {
        let (mut transport, device) = MemoryTransport::pair("AA:BB");
        transport.connect().await.unwrap();
        let mut stream = transport.subscribe().await.unwrap();

        transport.disconnect().await.unwrap();
        assert!(!device.is_subscribed());
        assert!(stream.next_chunk().await.is_none());
    }

    #[tokio::test]
    async fn injected_connect_failures_are_consumed() {
        let (mut transport, device) = MemoryTransport::pair("AA:BB");
        device.fail_next_connects(2);

        assert!(transport.connect().await.is_err());
        assert!(transport.connect().await.is_err());
        transport.connect().await.unwrap();
        assert_eq!(device.connect_count(), 1);
    }

    #[tokio::test]
    async fn reads_characteristics() {
        let (mut transport, device) = MemoryTransport::pair("AA:BB");
        device.set_characteristic(UUID_MANUFACTURER, &b"Kohler Mira"[..]);
        transport.connect().await.unwrap();

        let value = transport.read_characteristic(UUID_MANUFACTURER).await.unwrap();
        assert_eq!(value.as_ref(), b"Kohler Mira");

        let err = transport.read_characteristic("missing").await.unwrap_err();
        assert!(matches!(err, TransportError::UnknownCharacteristic(_)));
    }
}
