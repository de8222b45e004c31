//! The session task.
//!
//! ```text
//! SessionHandle ─┐
//! SessionHandle ─┼─► mpsc::Sender<Request> ─► session task ─► Transport
//! SessionHandle ─┘                                 ▲
//!                         ChunkStream ─► Reassembler ─► decode ─► EventSink
//! ```
//!
//! The protocol has no correlation ids, so the task runs at most one
//! request/response exchange at a time: while an exchange waits for its
//! answer, queued requests stay queued. Inbound chunks are processed in
//! arrival order on the same task.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use soakstation_frame::{chunk, Reassembler};
use soakstation_protocol::{Command, DeviceStateEvent, Event, Notification};
use soakstation_transport::gatt::{UUID_DEVICE_NAME, UUID_MANUFACTURER, UUID_MODEL_NUMBER};
use soakstation_transport::{ChunkStream, Transport, TransportError};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{SessionConfig, COMMAND_BUFFER};
use crate::error::{Result, SessionError};
use crate::pairing::{ClientIdentity, Pairing, PairingRequest};
use crate::retry::connect_with_retry;
use crate::sink::EventSink;

/// Identification strings read from the standard GATT characteristics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub name: String,
    pub manufacturer: String,
    pub model_number: String,
}

/// Session builder.
///
/// ```ignore
/// let handle = Session::new(transport, sink)
///     .with_identity(ClientIdentity::new(12345, 1))
///     .start()
///     .await?;
/// let state = handle.request_device_state().await?;
/// ```
pub struct Session<T, S> {
    transport: T,
    sink: S,
    identity: Option<ClientIdentity>,
    config: SessionConfig,
}

impl<T: Transport, S: EventSink> Session<T, S> {
    pub fn new(transport: T, sink: S) -> Self {
        Self {
            transport,
            sink,
            identity: None,
            config: SessionConfig::default(),
        }
    }

    /// Use credentials from an earlier pairing.
    pub fn with_identity(mut self, identity: ClientIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Connect, subscribe to notifications and spawn the session task.
    pub async fn start(self) -> Result<SessionHandle> {
        let Session {
            mut transport,
            sink,
            identity,
            config,
        } = self;

        connect_with_retry(&mut transport, &config.retry).await?;
        let inbound = transport.subscribe().await?;

        let address: Arc<str> = Arc::from(transport.address());
        let (requests_tx, requests_rx) = mpsc::channel(COMMAND_BUFFER);
        let (identity_tx, identity_rx) = watch::channel(identity);
        let cancel = CancellationToken::new();

        let actor = Actor {
            transport,
            sink,
            config,
            identity,
            identity_tx,
            reassembler: Reassembler::new(),
            pairing: Pairing::new(),
            inbound: Some(inbound),
            pending: None,
            requests: requests_rx,
            cancel: cancel.clone(),
        };
        tokio::spawn(actor.run());

        Ok(SessionHandle {
            address,
            requests: requests_tx,
            identity: identity_rx,
            cancel,
        })
    }
}

enum Request {
    Send {
        command: Command,
        reply: oneshot::Sender<Result<()>>,
    },
    Exchange {
        command: Command,
        reply: oneshot::Sender<Result<Event>>,
    },
    Pair {
        request: PairingRequest,
        reply: oneshot::Sender<Result<ClientIdentity>>,
    },
    DeviceInfo {
        reply: oneshot::Sender<Result<DeviceInfo>>,
    },
    Reconnect {
        reply: oneshot::Sender<Result<()>>,
    },
}

/// Cloneable handle to a running session.
///
/// Every method queues a request for the session task. Requests are
/// served in order; one waiting for a response holds back the rest.
#[derive(Clone)]
pub struct SessionHandle {
    address: Arc<str>,
    requests: mpsc::Sender<Request>,
    identity: watch::Receiver<Option<ClientIdentity>>,
    cancel: CancellationToken,
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("address", &self.address)
            .field("identity", &self.identity())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl SessionHandle {
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Current client credentials, if paired.
    pub fn identity(&self) -> Option<ClientIdentity> {
        *self.identity.borrow()
    }

    /// Observe identity changes.
    pub fn watch_identity(&self) -> watch::Receiver<Option<ClientIdentity>> {
        self.identity.clone()
    }

    /// Whether the session task has stopped.
    pub fn is_closed(&self) -> bool {
        self.requests.is_closed()
    }

    /// Write a command without waiting for an answer.
    pub async fn send(&self, command: Command) -> Result<()> {
        self.call(|reply| Request::Send { command, reply }).await
    }

    /// Write a command and wait for the next packet.
    ///
    /// Whatever packet arrives first is the answer, recognized or not.
    pub async fn request(&self, command: Command) -> Result<Event> {
        self.call(|reply| Request::Exchange { command, reply }).await
    }

    /// Register as a new client and adopt the assigned identity.
    ///
    /// A name longer than 20 bytes is rejected before anything is queued.
    pub async fn pair(&self, request: PairingRequest) -> Result<ClientIdentity> {
        request.validate()?;
        self.call(|reply| Request::Pair { request, reply }).await
    }

    /// Read name, manufacturer and model number.
    pub async fn device_info(&self) -> Result<DeviceInfo> {
        self.call(|reply| Request::DeviceInfo { reply }).await
    }

    /// Drop the link and connect again. Any partial packet is discarded.
    pub async fn reconnect(&self) -> Result<()> {
        self.call(|reply| Request::Reconnect { reply }).await
    }

    /// Request the live device state.
    pub async fn request_device_state(&self) -> Result<DeviceStateEvent> {
        let event = self.request(Command::RequestDeviceState).await?;
        match event.notification {
            Notification::DeviceState(state) => Ok(state),
            Notification::ControlsOperated(operated) => Ok(operated.state),
            other => Err(SessionError::UnexpectedResponse(other.kind().to_string())),
        }
    }

    /// Switch outlets and set the target temperature.
    pub async fn control_outlets(
        &self,
        outlet1: bool,
        outlet2: bool,
        temperature: f64,
    ) -> Result<()> {
        self.send(Command::ControlOutlets {
            outlet1,
            outlet2,
            temperature,
        })
        .await
    }

    /// Stop the session task and wait until it has released the transport.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.requests.closed().await;
    }

    async fn call<R>(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<R>>) -> Request,
    ) -> Result<R> {
        let (reply, rx) = oneshot::channel();
        self.requests
            .send(make(reply))
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)?
    }
}

enum Waiter {
    Response(oneshot::Sender<Result<Event>>),
    Pairing(oneshot::Sender<Result<ClientIdentity>>),
}

impl Waiter {
    fn fail(self, err: SessionError) {
        match self {
            Waiter::Response(reply) => {
                let _ = reply.send(Err(err));
            }
            Waiter::Pairing(reply) => {
                let _ = reply.send(Err(err));
            }
        }
    }
}

struct Pending {
    waiter: Waiter,
    deadline: Instant,
    timeout: Duration,
}

struct Actor<T, S> {
    transport: T,
    sink: S,
    config: SessionConfig,
    identity: Option<ClientIdentity>,
    identity_tx: watch::Sender<Option<ClientIdentity>>,
    reassembler: Reassembler,
    pairing: Pairing,
    inbound: Option<ChunkStream>,
    pending: Option<Pending>,
    requests: mpsc::Receiver<Request>,
    cancel: CancellationToken,
}

impl<T: Transport, S: EventSink> Actor<T, S> {
    async fn run(mut self) {
        debug!(address = %self.transport.address(), "session started");

        loop {
            let deadline = self.pending.as_ref().map(|pending| pending.deadline);

            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => break,

                chunk = next_chunk(&mut self.inbound) => match chunk {
                    Some(chunk) => self.on_chunk(&chunk),
                    None => self.on_link_lost(),
                },

                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.on_deadline();
                }

                request = self.requests.recv(), if self.pending.is_none() => match request {
                    Some(request) => self.handle(request).await,
                    None => break,
                },
            }
        }

        self.stop().await;
    }

    async fn handle(&mut self, request: Request) {
        match request {
            Request::Send { command, reply } => {
                let _ = reply.send(self.send_command(&command).await);
            }
            Request::Exchange { command, reply } => match self.send_command(&command).await {
                Ok(()) => self.await_response(Waiter::Response(reply), self.config.response_timeout),
                Err(err) => {
                    let _ = reply.send(Err(err));
                }
            },
            Request::Pair { request, reply } => {
                let command = match self.pairing.begin(&request) {
                    Ok(command) => command,
                    Err(err) => {
                        let _ = reply.send(Err(err));
                        return;
                    }
                };
                match self.send_command(&command).await {
                    Ok(()) => {
                        self.await_response(Waiter::Pairing(reply), self.config.pairing_timeout)
                    }
                    Err(err) => {
                        self.pairing.abort();
                        let _ = reply.send(Err(err));
                    }
                }
            }
            Request::DeviceInfo { reply } => {
                let _ = reply.send(self.device_info().await);
            }
            Request::Reconnect { reply } => {
                let _ = reply.send(self.reconnect().await);
            }
        }
    }

    async fn send_command(&mut self, command: &Command) -> Result<()> {
        let wire = if command.is_pairing() {
            command.encode(0, 0)?
        } else {
            let identity = self.identity.ok_or(SessionError::NotPaired)?;
            command.encode(identity.client_id, identity.client_slot)?
        };

        self.ensure_connected().await?;
        debug!(command = command.name(), frame = %hex::encode(&wire), "sending command");
        self.write_frame(&wire).await
    }

    async fn write_frame(&mut self, wire: &Bytes) -> Result<()> {
        for piece in chunk(wire, self.config.chunk_size) {
            self.transport.write_chunk(piece).await?;
        }
        Ok(())
    }

    fn await_response(&mut self, waiter: Waiter, timeout: Duration) {
        self.pending = Some(Pending {
            waiter,
            deadline: Instant::now() + timeout,
            timeout,
        });
    }

    fn on_chunk(&mut self, chunk: &[u8]) {
        debug!(chunk = %hex::encode(chunk), "chunk received");

        let packet = match self.reassembler.push(chunk) {
            Ok(Some(packet)) => packet,
            Ok(None) => return,
            Err(err) => {
                warn!(error = %err, "dropping inbound packet");
                return;
            }
        };

        let event = Event::from_packet(&packet);
        self.complete(&event);

        if event.notification.is_recognized() {
            self.sink.deliver(event);
        }
    }

    /// Hand `event` to the waiting exchange, if any.
    fn complete(&mut self, event: &Event) {
        let Some(Pending {
            waiter,
            deadline,
            timeout,
        }) = self.pending.take()
        else {
            return;
        };

        match waiter {
            Waiter::Response(reply) => {
                let _ = reply.send(Ok(event.clone()));
            }
            Waiter::Pairing(reply) => match self.pairing.on_event(event) {
                Some(outcome) => {
                    if let Ok(identity) = &outcome {
                        self.identity = Some(*identity);
                        self.identity_tx.send_replace(Some(*identity));
                    }
                    let _ = reply.send(outcome);
                }
                None => {
                    self.pending = Some(Pending {
                        waiter: Waiter::Pairing(reply),
                        deadline,
                        timeout,
                    });
                }
            },
        }
    }

    fn on_deadline(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        warn!(timeout = ?pending.timeout, "no response before deadline");

        self.reassembler.reset();
        if let Waiter::Pairing(_) = pending.waiter {
            self.pairing.on_timeout();
        }
        pending.waiter.fail(SessionError::Timeout(pending.timeout));
    }

    fn on_link_lost(&mut self) {
        warn!(address = %self.transport.address(), "notification stream ended");
        self.inbound = None;
        self.reassembler.reset();

        if let Some(pending) = self.pending.take() {
            self.pairing.abort();
            pending
                .waiter
                .fail(SessionError::Transport(TransportError::NotConnected));
        }
    }

    async fn ensure_connected(&mut self) -> Result<()> {
        if self.transport.is_connected() && self.inbound.is_some() {
            return Ok(());
        }

        self.reassembler.reset();
        if !self.transport.is_connected() {
            connect_with_retry(&mut self.transport, &self.config.retry).await?;
        }
        self.inbound = Some(self.transport.subscribe().await?);
        Ok(())
    }

    async fn reconnect(&mut self) -> Result<()> {
        info!(address = %self.transport.address(), "reconnecting");

        self.inbound = None;
        self.reassembler.reset();
        if let Err(err) = self.transport.disconnect().await {
            debug!(error = %err, "disconnect before reconnect failed");
        }

        tokio::time::sleep(self.config.retry.reconnect_delay).await;
        self.ensure_connected().await
    }

    async fn device_info(&mut self) -> Result<DeviceInfo> {
        self.ensure_connected().await?;
        Ok(DeviceInfo {
            name: self.read_text(UUID_DEVICE_NAME).await?,
            manufacturer: self.read_text(UUID_MANUFACTURER).await?,
            model_number: self.read_text(UUID_MODEL_NUMBER).await?,
        })
    }

    async fn read_text(&mut self, uuid: &str) -> Result<String> {
        let raw = self.transport.read_characteristic(uuid).await?;
        Ok(String::from_utf8_lossy(&raw)
            .trim_end_matches('\0')
            .to_string())
    }

    async fn stop(mut self) {
        if let Some(pending) = self.pending.take() {
            pending.waiter.fail(SessionError::Closed);
        }
        self.inbound = None;
        if let Err(err) = self.transport.disconnect().await {
            debug!(error = %err, "disconnect on shutdown failed");
        }
        info!(address = %self.transport.address(), "session stopped");
    }
}

async fn next_chunk(inbound: &mut Option<ChunkStream>) -> Option<Bytes> {
    match inbound {
        Some(stream) => stream.next_chunk().await,
        None => std::future::pending().await,
    }
}
