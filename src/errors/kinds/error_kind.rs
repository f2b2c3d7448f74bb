/// Coarse classification of `ModbusError`, used by the retry wrapper to
/// decide whether an attempt is worth repeating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotConnected,
    InvalidArgument,
    UnsupportedFunctionCode,
    WrongDirection,
    Timeout,
    ChecksumError,
    FrameError,
    ModbusException,
    EchoMismatch,
    TransportSendError,
    TransportError,
    QueueFull,
    SchedulerNotRunning,
    SchedulerStopped,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::NotConnected => "not_connected",
            Self::InvalidArgument => "invalid_argument",
            Self::UnsupportedFunctionCode => "unsupported_function_code",
            Self::WrongDirection => "wrong_direction",
            Self::Timeout => "timeout",
            Self::ChecksumError => "checksum_error",
            Self::FrameError => "frame_error",
            Self::ModbusException => "modbus_exception",
            Self::EchoMismatch => "echo_mismatch",
            Self::TransportSendError => "transport_send_error",
            Self::TransportError => "transport_error",
            Self::QueueFull => "queue_full",
            Self::SchedulerNotRunning => "scheduler_not_running",
            Self::SchedulerStopped => "scheduler_stopped",
        };
        write!(f, "{label}")
    }
}
