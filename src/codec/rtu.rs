use tracing::trace;

use super::crc::crc16;
use super::frame::DecodedFrame;

/// Minimum bytes needed before any candidate frame can be examined: unit,
/// fc, one payload byte, crcLo, crcHi.
const MIN_FRAME_LEN: usize = 5;

fn expected_response_len(function_code: u8, byte_count: u8) -> Option<usize> {
    match function_code {
        0x01 | 0x02 | 0x03 | 0x04 => Some(3 + byte_count as usize + 2),
        0x05 | 0x06 | 0x0F | 0x10 => Some(8),
        _ => None,
    }
}

/// Tolerant streaming decoder for one RTU transaction: bytes may arrive in
/// any chunking, noise may precede a valid frame, and a CRC failure causes a
/// one-byte skip rather than a surfaced error (see crate docs on checksum
/// handling).
pub struct RtuDecoder {
    buffer: Vec<u8>,
    expected_unit: u8,
    expected_function: u8,
}

impl RtuDecoder {
    pub fn new(expected_unit: u8, expected_function: u8) -> Self {
        Self {
            buffer: Vec::new(),
            expected_unit,
            expected_function: expected_function & 0x7F,
        }
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Attempts to extract a matching frame from the bytes fed so far.
    /// Returns `None` when more bytes are needed; call again after the next
    /// `feed`.
    pub fn try_extract(&mut self) -> Option<DecodedFrame> {
        loop {
            if self.buffer.len() < MIN_FRAME_LEN {
                return None;
            }

            let unit = self.buffer[0];
            let fc_byte = self.buffer[1];
            let fc_base = fc_byte & 0x7F;
            let is_exception = fc_byte & 0x80 != 0;

            if unit != self.expected_unit || fc_base != self.expected_function {
                trace!(unit, fc_byte, "rtu decoder: skipping non-matching byte");
                self.buffer.remove(0);
                continue;
            }

            if is_exception {
                let frame = &self.buffer[..MIN_FRAME_LEN];
                let calculated = crc16(&frame[..3]);
                let received = u16::from_le_bytes([frame[3], frame[4]]);
                if calculated != received {
                    self.buffer.remove(0);
                    continue;
                }
                let exception_code = frame[2];
                let decoded = DecodedFrame::Exception {
                    unit_id: unit,
                    function_code: fc_base,
                    exception_code,
                };
                self.buffer.drain(..MIN_FRAME_LEN);
                return Some(decoded);
            }

            let byte_count = self.buffer[2];
            let Some(expected_len) = expected_response_len(fc_base, byte_count) else {
                self.buffer.remove(0);
                continue;
            };

            if self.buffer.len() < expected_len {
                return None;
            }

            let frame = &self.buffer[..expected_len];
            let calculated = crc16(&frame[..expected_len - 2]);
            let received = u16::from_le_bytes([frame[expected_len - 2], frame[expected_len - 1]]);
            if calculated != received {
                self.buffer.remove(0);
                continue;
            }

            let payload = frame[2..expected_len - 2].to_vec();
            let decoded = DecodedFrame::Response {
                unit_id: unit,
                function_code: fc_base,
                payload,
            };
            self.buffer.drain(..expected_len);
            return Some(decoded);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::pdu::Pdu;

    fn read_holding_response(unit: u8, registers: &[u16]) -> Vec<u8> {
        let mut payload = vec![(registers.len() * 2) as u8];
        for reg in registers {
            payload.extend_from_slice(&reg.to_be_bytes());
        }
        Pdu::new(unit, 0x03, payload).encode_rtu()
    }

    #[test]
    fn decodes_a_frame_delivered_in_one_chunk() {
        let frame = read_holding_response(1, &[0x1234, 0x5678]);
        let mut decoder = RtuDecoder::new(1, 0x03);
        decoder.feed(&frame);
        let decoded = decoder.try_extract().expect("frame decoded");
        assert_eq!(
            decoded,
            DecodedFrame::Response {
                unit_id: 1,
                function_code: 0x03,
                payload: vec![0x04, 0x12, 0x34, 0x56, 0x78],
            }
        );
    }

    #[test]
    fn decodes_a_frame_split_across_chunks() {
        let frame = read_holding_response(1, &[0x1234, 0x5678]);
        let mut decoder = RtuDecoder::new(1, 0x03);
        decoder.feed(&frame[..3]);
        assert!(decoder.try_extract().is_none());
        decoder.feed(&frame[3..]);
        assert!(decoder.try_extract().is_some());
    }

    #[test]
    fn ignores_leading_noise() {
        let frame = read_holding_response(1, &[0x1234]);
        let mut decoder = RtuDecoder::new(1, 0x03);
        decoder.feed(&[0xAA, 0xBB, 0xCC]);
        decoder.feed(&frame);
        assert!(decoder.try_extract().is_some());
    }

    #[test]
    fn corrupted_crc_is_skipped_without_surfacing_an_error() {
        let mut frame = read_holding_response(1, &[0x1234]);
        let last = frame.len() - 1;
        frame[last] ^= 0xFF;
        let mut decoder = RtuDecoder::new(1, 0x03);
        decoder.feed(&frame);
        assert!(decoder.try_extract().is_none());
    }

    #[test]
    fn decodes_exception_response() {
        let frame = Pdu::new(1, 0x83, vec![0x02]).encode_rtu();
        let mut decoder = RtuDecoder::new(1, 0x03);
        decoder.feed(&frame);
        let decoded = decoder.try_extract().expect("exception decoded");
        assert_eq!(
            decoded,
            DecodedFrame::Exception {
                unit_id: 1,
                function_code: 0x03,
                exception_code: 2,
            }
        );
    }
}
