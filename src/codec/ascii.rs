use tracing::trace;

use super::frame::DecodedFrame;
use super::lrc::lrc;

/// Tolerant streaming decoder for one ASCII transaction. Accumulates raw
/// bytes into a text buffer, locates a `:`…`\r\n` envelope, and validates
/// the enclosed hex payload against its LRC.
pub struct AsciiDecoder {
    buffer: Vec<u8>,
    expected_unit: u8,
    expected_function: u8,
}

impl AsciiDecoder {
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

    pub fn try_extract(&mut self) -> Option<DecodedFrame> {
        loop {
            let start = self.buffer.iter().position(|&b| b == b':')?;
            if start > 0 {
                self.buffer.drain(..start);
            }

            let Some(crlf_rel) = self
                .buffer
                .windows(2)
                .position(|window| window == b"\r\n")
            else {
                // No terminator yet; keep waiting unless the buffer holds a
                // second ':' that should become the new search start (stray
                // noise between frames).
                if let Some(next_colon) = self.buffer[1..].iter().position(|&b| b == b':') {
                    self.buffer.drain(..1 + next_colon);
                    continue;
                }
                return None;
            };

            let hex = self.buffer[1..crlf_rel].to_vec();
            let frame_end = crlf_rel + 2;

            if hex.len() % 2 != 0 || hex.len() < 6 || !hex.iter().all(u8::is_ascii_hexdigit) {
                trace!("ascii decoder: malformed envelope, skipping past ':'");
                self.buffer.drain(..1);
                continue;
            }

            let bytes = match hex_decode(&hex) {
                Some(bytes) => bytes,
                None => {
                    self.buffer.drain(..1);
                    continue;
                }
            };

            let (body, checksum) = bytes.split_at(bytes.len() - 1);
            if lrc(body) != checksum[0] {
                self.buffer.drain(..1);
                continue;
            }

            let unit = body[0];
            let fc_byte = body[1];
            let fc_base = fc_byte & 0x7F;
            if unit != self.expected_unit || fc_base != self.expected_function {
                self.buffer.drain(..1);
                continue;
            }

            if fc_byte & 0x80 != 0 && body.len() < 3 {
                trace!("ascii decoder: exception frame too short, skipping past ':'");
                self.buffer.drain(..1);
                continue;
            }

            let decoded = if fc_byte & 0x80 != 0 {
                DecodedFrame::Exception {
                    unit_id: unit,
                    function_code: fc_base,
                    exception_code: body[2],
                }
            } else {
                DecodedFrame::Response {
                    unit_id: unit,
                    function_code: fc_base,
                    payload: body[2..].to_vec(),
                }
            };

            self.buffer.drain(..frame_end);
            return Some(decoded);
        }
    }
}

fn hex_decode(hex: &[u8]) -> Option<Vec<u8>> {
    let text = std::str::from_utf8(hex).ok()?;
    hex::decode(text).ok()
}
