use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::Result;

/// Default capacity of the inbound chunk queue.
pub const DEFAULT_NOTIFY_CAPACITY: usize = 256;

/// A link to one SoakStation device.
///
/// Implementations deliver inbound notification chunks in arrival order,
/// at most once per physical chunk. Writes are fire-and-forget: a returned
/// `Ok` means the chunk was handed to the link, not that the device
/// acknowledged it.
pub trait Transport: Send + 'static {
    /// Device address this transport talks to.
    fn address(&self) -> &str;

    /// Whether the link is currently established.
    fn is_connected(&self) -> bool;

    /// Establish the link.
    fn connect(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Tear down the link. Any active [`ChunkStream`] terminates.
    fn disconnect(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Send one chunk (at most one transport MTU) to the device.
    fn write_chunk(&mut self, chunk: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Start receiving notification chunks.
    ///
    /// Subscribing again replaces the previous stream.
    fn subscribe(&mut self) -> impl Future<Output = Result<ChunkStream>> + Send;

    /// Read a GATT characteristic by UUID.
    fn read_characteristic(&mut self, uuid: &str) -> impl Future<Output = Result<Bytes>> + Send;
}

/// Ordered, single-consumer stream of inbound notification chunks.
///
/// Yields `None` once the producing side (the link) is gone.
#[derive(Debug)]
pub struct ChunkStream {
    rx: mpsc::Receiver<Bytes>,
}

impl ChunkStream {
    /// Wrap an existing receiver.
    pub fn new(rx: mpsc::Receiver<Bytes>) -> Self {
        Self { rx }
    }

    /// Create a producer handle and its stream.
    pub fn channel(capacity: usize) -> (mpsc::Sender<Bytes>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self::new(rx))
    }

    /// Wait for the next chunk.
    pub async fn next_chunk(&mut self) -> Option<Bytes> {
        self.rx.recv().await
    }
}

impl futures_core::Stream for ChunkStream {
    type Item = Bytes;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use futures_util::StreamExt;

    use super::*;

    #[tokio::test]
    async fn stream_preserves_arrival_order() {
        let (tx, mut stream) = ChunkStream::channel(8);
        tx.send(Bytes::from_static(b"\x41\x07\x0a")).await.unwrap();
        tx.send(Bytes::from_static(b"second")).await.unwrap();
        drop(tx);

        assert_eq!(stream.next().await.unwrap().as_ref(), b"\x41\x07\x0a");
        assert_eq!(stream.next_chunk().await.unwrap().as_ref(), b"second");
        assert!(stream.next().await.is_none());
    }
}
