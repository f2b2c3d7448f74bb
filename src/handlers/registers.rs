/// Packs a `u16` sequence big-endian, as FC 16 requests and FC 3/4 responses
/// require.
pub fn pack_registers(values: &[u16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(values.len() * 2);
    for value in values {
        bytes.extend_from_slice(&value.to_be_bytes());
    }
    bytes
}

/// Unpacks a big-endian `u16` sequence. `bytes.len()` must be even.
pub fn unpack_registers(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
        .collect()
}
