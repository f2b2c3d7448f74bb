use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::kinds::Phase;
use crate::config::types::Protocol;

/// Snapshot of where in a transaction a `ModbusError` was raised, attached
/// to every variant that can occur mid-transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    pub unit_id: u8,
    pub function_code: Option<u8>,
    pub address: Option<u16>,
    pub protocol: Protocol,
    /// Deadline that was in effect when this phase ran, if any.
    pub timeout: Option<Duration>,
    pub phase: Phase,
}

impl ErrorContext {
    pub fn new(unit_id: u8, protocol: Protocol, phase: Phase) -> Self {
        Self {
            timestamp_ms: now_ms(),
            unit_id,
            function_code: None,
            address: None,
            protocol,
            timeout: None,
            phase,
        }
    }

    pub fn with_function_code(mut self, function_code: u8) -> Self {
        self.function_code = Some(function_code);
        self
    }

    pub fn with_address(mut self, address: u16) -> Self {
        self.address = Some(address);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl std::fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unit={} protocol={} phase={}",
            self.unit_id, self.protocol, self.phase
        )?;
        if let Some(fc) = self.function_code {
            write!(f, " fc={fc:#04x}")?;
        }
        if let Some(addr) = self.address {
            write!(f, " addr={addr}")?;
        }
        if let Some(timeout) = self.timeout {
            write!(f, " timeout={timeout:?}")?;
        }
        Ok(())
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
