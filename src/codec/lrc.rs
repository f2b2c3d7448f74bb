/// Computes the Modbus ASCII LRC: the two's complement of the sum of all
/// bytes, truncated to 8 bits.
pub fn lrc(data: &[u8]) -> u8 {
    let sum = data.iter().fold(0u8, |acc, &byte| acc.wrapping_add(byte));
    (!sum).wrapping_add(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_of_frame_plus_lrc_is_zero() {
        let frame = [0x01, 0x03, 0x00, 0x00, 0x00, 0x0A];
        let checksum = lrc(&frame);
        let total = frame
            .iter()
            .fold(checksum, |acc, &byte| acc.wrapping_add(byte));
        assert_eq!(total, 0);
    }

    #[test]
    fn empty_input_is_zero() {
        assert_eq!(lrc(&[]), 0);
    }
}
