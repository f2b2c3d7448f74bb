mod mock;
mod serial;

pub use mock::MockTransport;
pub use serial::SerialTransport;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::errors::ModbusError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Events emitted on a transport's broadcast channel. Subscribing returns a
/// fresh `broadcast::Receiver`; unsubscribing is simply dropping it — the
/// idiomatic Rust analogue of an explicit `addEventListener`/
/// `removeEventListener` pair.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    Open,
    Close,
    StateChange(ConnectionState),
    Message(Vec<u8>),
    Error(String),
}

/// Message-port-like contract decoupling the engine from concrete I/O.
/// `connect`/`disconnect` are idempotent; `post_message` is fire-and-forget
/// and only fails synchronously when the transport is not connected.
#[async_trait]
pub trait Transport: Send + Sync {
    fn is_connected(&self) -> bool;

    fn state(&self) -> ConnectionState;

    async fn connect(&self) -> Result<(), ModbusError>;

    async fn disconnect(&self) -> Result<(), ModbusError>;

    fn post_message(&self, bytes: Vec<u8>) -> Result<(), ModbusError>;

    fn subscribe(&self) -> broadcast::Receiver<TransportEvent>;
}
