/// Packs a boolean sequence into bytes, LSB-first within each byte, as the
/// wire format for FC 15 requests and FC 1/2 responses requires.
pub fn pack_bits(bits: &[bool]) -> Vec<u8> {
    let byte_count = bits.len().div_ceil(8);
    let mut bytes = vec![0u8; byte_count];
    for (i, &bit) in bits.iter().enumerate() {
        if bit {
            bytes[i / 8] |= 1 << (i % 8);
        }
    }
    bytes
}

/// Unpacks `quantity` bits from `bytes`, LSB-first, discarding any trailing
/// padding bits in the last byte.
pub fn unpack_bits(bytes: &[u8], quantity: usize) -> Vec<bool> {
    (0..quantity)
        .map(|i| bytes[i / 8] & (1 << (i % 8)) != 0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_arbitrary_bit_sequences() {
        for len in [0usize, 1, 7, 8, 9, 16, 17] {
            let bits: Vec<bool> = (0..len).map(|i| i % 3 == 0).collect();
            let packed = pack_bits(&bits);
            let unpacked = unpack_bits(&packed, bits.len());
            assert_eq!(unpacked, bits);
        }
    }

    #[test]
    fn known_byte_unpacks_lsb_first() {
        // 0xAB = 1010_1011 -> bit0=1,bit1=1,bit2=0,bit3=1,bit4=0,bit5=1,bit6=0,bit7=1
        let bits = unpack_bits(&[0xAB], 8);
        assert_eq!(
            bits,
            vec![true, true, false, true, false, true, false, true]
        );
    }
}
