use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use serialport::SerialPort;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::config::types::{Protocol, RtsType};
use crate::config::SerialConfig;
use crate::errors::{ErrorContext, ModbusError, Phase};

use super::{ConnectionState, Transport, TransportEvent};

const EVENT_CHANNEL_CAPACITY: usize = 256;
const READ_CHUNK_SIZE: usize = 256;
/// Poll interval used by the blocking reader thread so it notices a
/// `disconnect()` promptly instead of blocking forever on `read`.
const READER_POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// Real serial-port transport, built on the `serialport` crate. A background
/// thread performs blocking reads and republishes each chunk as a
/// `TransportEvent::Message`; writes happen inline on the caller's task.
pub struct SerialTransport {
    config: SerialConfig,
    writer: StdMutex<Option<Box<dyn SerialPort>>>,
    state: StdMutex<ConnectionState>,
    reader_running: Arc<AtomicBool>,
    events: broadcast::Sender<TransportEvent>,
}

impl SerialTransport {
    pub fn new(config: SerialConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            config,
            writer: StdMutex::new(None),
            state: StdMutex::new(ConnectionState::Disconnected),
            reader_running: Arc::new(AtomicBool::new(false)),
            events,
        }
    }

    fn set_state(&self, state: ConnectionState) {
        *self.state.lock().expect("state mutex poisoned") = state;
        let _ = self.events.send(TransportEvent::StateChange(state));
    }

    fn open_port(&self) -> Result<Box<dyn SerialPort>, serialport::Error> {
        serialport::new(&self.config.device, self.config.baud_rate)
            .data_bits(self.config.data_bits.into())
            .parity(self.config.parity.into())
            .stop_bits(self.config.stop_bits.into())
            .timeout(READER_POLL_TIMEOUT)
            .open()
    }

    fn not_connected_error(&self) -> ModbusError {
        ModbusError::NotConnected {
            context: ErrorContext::new(0, Protocol::Rtu, Phase::Send),
        }
    }
}

#[async_trait]
impl Transport for SerialTransport {
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
        self.set_state(ConnectionState::Connecting);

        let port = self.open_port().map_err(|source| {
            self.set_state(ConnectionState::Error);
            ModbusError::TransportError {
                details: format!("failed to open {}: {source}", self.config.device),
                context: ErrorContext::new(0, Protocol::Rtu, Phase::Send),
                source: None,
            }
        })?;
        let reader_port = port.try_clone().map_err(|source| {
            ModbusError::TransportError {
                details: format!("failed to clone serial handle: {source}"),
                context: ErrorContext::new(0, Protocol::Rtu, Phase::Send),
                source: None,
            }
        })?;

        *self.writer.lock().expect("writer mutex poisoned") = Some(port);
        self.reader_running.store(true, Ordering::SeqCst);

        let events = self.events.clone();
        let running = self.reader_running.clone();
        std::thread::spawn(move || reader_loop(reader_port, events, running));

        self.set_state(ConnectionState::Connected);
        let _ = self.events.send(TransportEvent::Open);
        debug!(device = %self.config.device, "serial transport connected");
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), ModbusError> {
        if !self.is_connected() {
            return Ok(());
        }
        self.reader_running.store(false, Ordering::SeqCst);
        *self.writer.lock().expect("writer mutex poisoned") = None;
        self.set_state(ConnectionState::Disconnected);
        let _ = self.events.send(TransportEvent::Close);
        Ok(())
    }

    fn post_message(&self, bytes: Vec<u8>) -> Result<(), ModbusError> {
        let mut guard = self.writer.lock().expect("writer mutex poisoned");
        let Some(port) = guard.as_mut() else {
            return Err(self.not_connected_error());
        };

        let rts_delay = Duration::from_micros(self.config.rts_delay_us);
        if self.config.rts_type != RtsType::None {
            let _ = port.write_request_to_send(self.config.rts_type.to_signal_level(true));
            if !rts_delay.is_zero() {
                std::thread::sleep(rts_delay);
            }
        }

        let write_result = port.write_all(&bytes).and_then(|_| {
            if self.config.flush_after_write {
                port.flush()
            } else {
                Ok(())
            }
        });

        if self.config.rts_type != RtsType::None {
            if !rts_delay.is_zero() {
                std::thread::sleep(rts_delay);
            }
            let _ = port.write_request_to_send(self.config.rts_type.to_signal_level(false));
        }

        write_result.map_err(|source| {
            let _ = self.events.send(TransportEvent::Error(source.to_string()));
            ModbusError::TransportSendError {
                details: source.to_string(),
                context: ErrorContext::new(0, Protocol::Rtu, Phase::Send),
            }
        })
    }

    fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
        self.events.subscribe()
    }
}

fn reader_loop(
    mut port: Box<dyn SerialPort>,
    events: broadcast::Sender<TransportEvent>,
    running: Arc<AtomicBool>,
) {
    let mut buffer = [0u8; READ_CHUNK_SIZE];
    while running.load(Ordering::SeqCst) {
        match port.read(&mut buffer) {
            Ok(0) => continue,
            Ok(n) => {
                let _ = events.send(TransportEvent::Message(buffer[..n].to_vec()));
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
            Err(e) => {
                warn!(error = %e, "serial reader loop stopping after I/O error");
                let _ = events.send(TransportEvent::Error(e.to_string()));
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_disconnected() {
        let transport = SerialTransport::new(SerialConfig::default());
        assert_eq!(transport.state(), ConnectionState::Disconnected);
        assert!(!transport.is_connected());
    }

    #[test]
    fn post_message_fails_fast_when_not_connected() {
        let transport = SerialTransport::new(SerialConfig::default());
        let err = transport.post_message(vec![1, 2, 3]).unwrap_err();
        assert!(matches!(err, ModbusError::NotConnected { .. }));
    }
}
