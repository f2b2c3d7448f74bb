mod ascii;
mod crc;
mod frame;
mod lrc;
mod pdu;
mod rtu;

pub use ascii::AsciiDecoder;
pub use crc::crc16;
pub use frame::DecodedFrame;
pub use lrc::lrc;
pub use pdu::Pdu;
pub use rtu::RtuDecoder;
