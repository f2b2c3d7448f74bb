mod client;
mod logging;
mod retry;
mod scheduler;
mod serial;
pub mod types;

pub use client::Config as ClientConfig;
pub use logging::Config as LoggingConfig;
pub use retry::Config as RetryConfig;
pub use scheduler::Config as SchedulerConfig;
pub use serial::Config as SerialConfig;
pub use types::{DataBits, Parity, Priority, Protocol, RtsType, StopBits};
