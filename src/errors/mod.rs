mod context;
mod kinds;
mod modbus_error;

pub use context::ErrorContext;
pub use kinds::{Direction, ErrorKind, ExceptionCode, Phase};
pub use modbus_error::ModbusError;

pub type Result<T> = std::result::Result<T, ModbusError>;
