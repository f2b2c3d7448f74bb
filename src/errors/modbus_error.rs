use std::time::Duration;

use thiserror::Error;

use super::context::ErrorContext;
use super::kinds::{Direction, ErrorKind, ExceptionCode};

/// The sum type returned by every fallible operation in this crate.
#[derive(Debug, Error)]
pub enum ModbusError {
    #[error("transport is not connected ({context})")]
    NotConnected { context: ErrorContext },

    #[error("invalid argument: {details} ({context})")]
    InvalidArgument {
        details: String,
        context: ErrorContext,
    },

    #[error("unsupported function code {function_code:#04x} ({context})")]
    UnsupportedFunctionCode {
        function_code: u8,
        context: ErrorContext,
    },

    #[error("function code {function_code:#04x} is registered for {direction} only ({context})")]
    WrongDirection {
        function_code: u8,
        direction: Direction,
        context: ErrorContext,
    },

    #[error("transaction timed out after {elapsed:?} ({context})")]
    Timeout {
        elapsed: Duration,
        context: ErrorContext,
    },

    #[error("checksum mismatch: expected {expected:#06x}, got {actual:#06x} ({context})")]
    ChecksumError {
        expected: u32,
        actual: u32,
        context: ErrorContext,
    },

    #[error("malformed frame: {details} ({context})")]
    FrameError {
        details: String,
        context: ErrorContext,
    },

    #[error("slave returned exception {code} ({context})")]
    ModbusException {
        code: ExceptionCode,
        context: ErrorContext,
    },

    #[error("echo mismatch: sent and received frames differ ({context})")]
    EchoMismatch { context: ErrorContext },

    #[error("failed to send request: {details} ({context})")]
    TransportSendError {
        details: String,
        context: ErrorContext,
    },

    #[error("transport error: {details} ({context})")]
    TransportError {
        details: String,
        context: ErrorContext,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("scheduler queue is full (limit={limit})")]
    QueueFull { limit: usize },

    #[error("scheduler is not running")]
    SchedulerNotRunning,

    #[error("scheduler was stopped while this request was pending")]
    SchedulerStopped,
}

impl ModbusError {
    /// Coarse classification used by the retry wrapper's
    /// `retryable_errors` filter.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotConnected { .. } => ErrorKind::NotConnected,
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::UnsupportedFunctionCode { .. } => ErrorKind::UnsupportedFunctionCode,
            Self::WrongDirection { .. } => ErrorKind::WrongDirection,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::ChecksumError { .. } => ErrorKind::ChecksumError,
            Self::FrameError { .. } => ErrorKind::FrameError,
            Self::ModbusException { .. } => ErrorKind::ModbusException,
            Self::EchoMismatch { .. } => ErrorKind::EchoMismatch,
            Self::TransportSendError { .. } => ErrorKind::TransportSendError,
            Self::TransportError { .. } => ErrorKind::TransportError,
            Self::QueueFull { .. } => ErrorKind::QueueFull,
            Self::SchedulerNotRunning => ErrorKind::SchedulerNotRunning,
            Self::SchedulerStopped => ErrorKind::SchedulerStopped,
        }
    }

    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Self::NotConnected { context }
            | Self::InvalidArgument { context, .. }
            | Self::UnsupportedFunctionCode { context, .. }
            | Self::WrongDirection { context, .. }
            | Self::Timeout { context, .. }
            | Self::ChecksumError { context, .. }
            | Self::FrameError { context, .. }
            | Self::ModbusException { context, .. }
            | Self::EchoMismatch { context }
            | Self::TransportSendError { context, .. }
            | Self::TransportError { context, .. } => Some(context),
            Self::QueueFull { .. } | Self::SchedulerNotRunning | Self::SchedulerStopped => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::Protocol;
    use crate::errors::kinds::Phase;

    fn context() -> ErrorContext {
        ErrorContext::new(1, Protocol::Rtu, Phase::Receive)
    }

    #[test]
    fn kind_maps_each_variant() {
        assert_eq!(
            ModbusError::NotConnected { context: context() }.kind(),
            ErrorKind::NotConnected
        );
        assert_eq!(ModbusError::QueueFull { limit: 10 }.kind(), ErrorKind::QueueFull);
        assert_eq!(ModbusError::SchedulerStopped.kind(), ErrorKind::SchedulerStopped);
    }

    #[test]
    fn wrong_direction_reports_the_registered_direction() {
        let err = ModbusError::WrongDirection {
            function_code: 0x05,
            direction: Direction::Write,
            context: context(),
        };
        assert_eq!(err.kind(), ErrorKind::WrongDirection);
    }

    #[test]
    fn context_is_absent_for_scheduler_lifecycle_errors() {
        assert!(ModbusError::SchedulerNotRunning.context().is_none());
        assert!(ModbusError::QueueFull { limit: 1 }.context().is_none());
    }
}
