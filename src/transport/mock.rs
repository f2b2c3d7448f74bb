use std::collections::HashMap;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::config::types::Protocol;
use crate::errors::{ErrorContext, ModbusError, Phase};

use super::{ConnectionState, Transport, TransportEvent};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// A controllable transport double for tests: `program_response` keys an
/// auto-reply by the exact outgoing request bytes, optionally delayed
/// before it is published as a `Message` event, or replaced by a forced
/// error.
pub struct MockTransport {
    state: StdMutex<ConnectionState>,
    sent: StdMutex<Vec<Vec<u8>>>,
    responses: StdMutex<HashMap<Vec<u8>, ProgrammedReply>>,
    events: broadcast::Sender<TransportEvent>,
}

#[derive(Clone)]
enum ProgrammedReply {
    Bytes(Vec<u8>, Option<Duration>),
    Error(String),
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: StdMutex::new(ConnectionState::Disconnected),
            sent: StdMutex::new(Vec::new()),
            responses: StdMutex::new(HashMap::new()),
            events,
        }
    }

    /// Registers a response to emit the next time `request` is sent
    /// verbatim, after an optional delay.
    pub fn program_response(&self, request: Vec<u8>, response: Vec<u8>, delay: Option<Duration>) {
        self.responses
            .lock()
            .expect("responses mutex poisoned")
            .insert(request, ProgrammedReply::Bytes(response, delay));
    }

    /// Registers an error to raise on the transport's event stream the next
    /// time `request` is sent verbatim, instead of a reply.
    pub fn program_error(&self, request: Vec<u8>, message: impl Into<String>) {
        self.responses
            .lock()
            .expect("responses mutex poisoned")
            .insert(request, ProgrammedReply::Error(message.into()));
    }

    pub fn sent_messages(&self) -> Vec<Vec<u8>> {
        self.sent.lock().expect("sent mutex poisoned").clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    fn state(&self) -> ConnectionState {
        *self.state.lock().expect("state mutex poisoned")
    }

    async fn connect(&self) -> Result<(), ModbusError> {
        if self.is_connected() {
            return Ok(());
        }
        *self.state.lock().expect("state mutex poisoned") = ConnectionState::Connected;
        let _ = self.events.send(TransportEvent::Open);
        let _ = self
            .events
            .send(TransportEvent::StateChange(ConnectionState::Connected));
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), ModbusError> {
        if !self.is_connected() {
            return Ok(());
        }
        *self.state.lock().expect("state mutex poisoned") = ConnectionState::Disconnected;
        let _ = self.events.send(TransportEvent::Close);
        let _ = self
            .events
            .send(TransportEvent::StateChange(ConnectionState::Disconnected));
        Ok(())
    }

    fn post_message(&self, bytes: Vec<u8>) -> Result<(), ModbusError> {
        if !self.is_connected() {
            return Err(ModbusError::NotConnected {
                context: ErrorContext::new(0, Protocol::Rtu, Phase::Send),
            });
        }
        self.sent
            .lock()
            .expect("sent mutex poisoned")
            .push(bytes.clone());

        let reply = self
            .responses
            .lock()
            .expect("responses mutex poisoned")
            .get(&bytes)
            .cloned();

        if let Some(reply) = reply {
            let events = self.events.clone();
            tokio::spawn(async move {
                match reply {
                    ProgrammedReply::Bytes(response, delay) => {
                        if let Some(delay) = delay {
                            tokio::time::sleep(delay).await;
                        }
                        let _ = events.send(TransportEvent::Message(response));
                    }
                    ProgrammedReply::Error(message) => {
                        let _ = events.send(TransportEvent::Error(message));
                    }
                }
            });
        }

        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_then_post_message_delivers_programmed_reply() {
        let transport = MockTransport::new();
        transport.connect().await.unwrap();
        let mut events = transport.subscribe();

        transport.program_response(vec![1, 2, 3], vec![4, 5, 6], None);
        transport.post_message(vec![1, 2, 3]).unwrap();

        loop {
            match events.recv().await.unwrap() {
                TransportEvent::Message(bytes) => {
                    assert_eq!(bytes, vec![4, 5, 6]);
                    break;
                }
                _ => continue,
            }
        }
        assert_eq!(transport.sent_messages(), vec![vec![1, 2, 3]]);
    }

    #[tokio::test]
    async fn post_message_fails_when_disconnected() {
        let transport = MockTransport::new();
        let err = transport.post_message(vec![1]).unwrap_err();
        assert!(matches!(err, ModbusError::NotConnected { .. }));
    }

    #[tokio::test]
    async fn connect_and_disconnect_are_idempotent() {
        let transport = MockTransport::new();
        transport.connect().await.unwrap();
        transport.connect().await.unwrap();
        assert!(transport.is_connected());
        transport.disconnect().await.unwrap();
        transport.disconnect().await.unwrap();
        assert!(!transport.is_connected());
    }
}
