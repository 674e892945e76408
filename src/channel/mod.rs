//! Command channel between the local operator and a remote command source
//!
//! The channel owns the message shape and the encode/decode contract.
//! Inbound payloads land in a latest-value [`CommandInbox`] that the tick
//! loop drains at a fixed point each cycle; outbound sends are
//! fire-and-forget and silently dropped while no transport is open.

pub mod inbox;
pub mod transport;
pub mod wire;

pub use inbox::{CommandInbox, PendingCommands};
pub use wire::ControlMessage;

use crate::error::ChannelError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Duplex command transport endpoint
#[derive(Debug)]
pub struct CommandChannel {
    inbox: Arc<CommandInbox>,
    outbound: Mutex<Option<mpsc::UnboundedSender<String>>>,
    open: Arc<AtomicBool>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl CommandChannel {
    /// A channel with no transport: sends are dropped, inbound payloads can
    /// still be injected with [`CommandChannel::deliver`]
    pub fn detached() -> Self {
        CommandChannel {
            inbox: Arc::new(CommandInbox::new()),
            outbound: Mutex::new(None),
            open: Arc::new(AtomicBool::new(false)),
            reader: Mutex::new(None),
        }
    }

    /// Decode one inbound payload into the inbox.
    ///
    /// Bad payloads are logged and discarded; the error is returned for
    /// diagnostics only and never affects the pending commands.
    pub fn deliver(&self, payload: &str) -> Result<(), ChannelError> {
        accept_payload(&self.inbox, payload)
    }

    /// Drain the commands received since the last call
    pub fn receive(&self) -> PendingCommands {
        self.inbox.take()
    }

    /// Fire-and-forget send; dropped if the transport is not open
    pub fn send(&self, msg: &ControlMessage) {
        if let Err(e) = self.try_send(msg) {
            debug!("Outbound command dropped: {}", e);
        }
    }

    /// Send, reporting whether the command was handed to the transport
    pub fn try_send(&self, msg: &ControlMessage) -> Result<(), ChannelError> {
        if !self.is_open() {
            return Err(ChannelError::TransportUnavailable);
        }

        let outbound = self.outbound.lock().unwrap_or_else(|e| e.into_inner());
        let sender = outbound.as_ref().ok_or(ChannelError::TransportUnavailable)?;
        if sender.send(msg.encode()).is_err() {
            self.open.store(false, Ordering::Release);
            return Err(ChannelError::TransportUnavailable);
        }
        trace!("Sent {:?}", msg);
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Stop the transport tasks; later sends are dropped
    pub fn close(&self) {
        self.open.store(false, Ordering::Release);
        self.outbound
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(reader) = self.reader.lock().unwrap_or_else(|e| e.into_inner()).take() {
            reader.abort();
        }
    }
}

impl Drop for CommandChannel {
    fn drop(&mut self) {
        self.close();
    }
}

fn accept_payload(inbox: &CommandInbox, payload: &str) -> Result<(), ChannelError> {
    match ControlMessage::decode(payload) {
        Ok(msg) => {
            trace!("Received {:?}", msg);
            inbox.post(&msg);
            Ok(())
        }
        Err(e) => {
            warn!("Discarding inbound payload: {}", e);
            Err(e)
        }
    }
}
