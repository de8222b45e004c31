//! Transport abstraction for the SoakStation protocol.
//!
//! The device speaks over two BLE GATT characteristics: one accepting
//! write-without-response chunks, one delivering notifications. This crate
//! models that as the [`Transport`] trait:
//! - `connect` / `disconnect` manage the link
//! - `write_chunk` sends one transport-sized fragment
//! - `subscribe` yields a [`ChunkStream`] of inbound notification chunks
//!
//! This is the lowest layer of soakstation. A real BLE stack plugs in by
//! implementing [`Transport`]; [`MemoryTransport`] is an in-process loopback
//! used by tests and tooling.

pub mod error;
pub mod gatt;
pub mod memory;
pub mod traits;

pub use error::{Result, TransportError};
pub use memory::{MemoryDevice, MemoryTransport};
pub use traits::{ChunkStream, Transport};
