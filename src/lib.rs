pub mod client;
pub mod codec;
pub mod config;
pub mod correlator;
pub mod errors;
pub mod handlers;
pub mod logging;
pub mod retry;
pub mod scheduler;
pub mod transport;
mod utils;

pub use client::ModbusClient;
pub use config::{ClientConfig, LoggingConfig, RetryConfig, SchedulerConfig, SerialConfig};
pub use config::{DataBits, Parity, Priority, Protocol, RtsType, StopBits};
pub use errors::{ErrorContext, ErrorKind, ExceptionCode, ModbusError};
pub use handlers::{Request, ResponseData, ResponseEnvelope};
pub use scheduler::{QueuedRequest, Scheduler, SchedulerStats};
pub use transport::{ConnectionState, MockTransport, SerialTransport, Transport, TransportEvent};
