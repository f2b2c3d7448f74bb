mod data_bits;
mod parity;
mod priority;
mod protocol;
mod rts_type;
mod stop_bits;

pub use data_bits::*;
pub use parity::*;
pub use priority::*;
pub use protocol::*;
pub use rts_type::*;
pub use stop_bits::*;
