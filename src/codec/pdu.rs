use super::crc::crc16;
use super::lrc::lrc;

/// Function code + address/quantity/value payload, with no unit id and no
/// checksum — the part of a request that is identical across RTU and ASCII.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pdu {
    pub unit_id: u8,
    pub function_code: u8,
    pub payload: Vec<u8>,
}

impl Pdu {
    pub fn new(unit_id: u8, function_code: u8, payload: Vec<u8>) -> Self {
        Self {
            unit_id,
            function_code,
            payload,
        }
    }

    fn frame_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(2 + self.payload.len());
        bytes.push(self.unit_id);
        bytes.push(self.function_code);
        bytes.extend_from_slice(&self.payload);
        bytes
    }

    /// `[unitId, fc, ...payload, crcLo, crcHi]`.
    pub fn encode_rtu(&self) -> Vec<u8> {
        let mut frame = self.frame_bytes();
        let crc = crc16(&frame);
        frame.push((crc & 0xFF) as u8);
        frame.push((crc >> 8) as u8);
        frame
    }

    /// `":" hex(pdu ++ lrc) "\r\n"`, hex digits uppercase.
    pub fn encode_ascii(&self) -> Vec<u8> {
        let mut frame = self.frame_bytes();
        frame.push(lrc(&frame));
        let mut encoded = Vec::with_capacity(1 + frame.len() * 2 + 2);
        encoded.push(b':');
        for byte in frame {
            encoded.extend_from_slice(format!("{byte:02X}").as_bytes());
        }
        encoded.extend_from_slice(b"\r\n");
        encoded
    }
}
