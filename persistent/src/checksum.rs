//! One's complement checksum (RFC 1071) for block record slots

/// Fold `data` into a running 32-bit one's complement sum.
pub fn partial_checksum(data: &[u8], initial: u32) -> u32 {
    let mut sum = initial;
    let mut chunks = data.chunks_exact(2);

    for word in &mut chunks {
        sum = sum.wrapping_add(u16::from_be_bytes([word[0], word[1]]) as u32);
    }

    // Odd trailing byte is padded with zero
    if let [last] = chunks.remainder() {
        sum = sum.wrapping_add((*last as u32) << 8);
    }

    sum
}

/// Fold carries and complement.
pub fn finalize_checksum(sum: u32) -> u16 {
    let mut s = sum;
    while s >> 16 != 0 {
        s = (s & 0xFFFF) + (s >> 16);
    }
    !(s as u16)
}

pub fn calculate_checksum(data: &[u8]) -> u16 {
    finalize_checksum(partial_checksum(data, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_zeros() {
        assert_eq!(calculate_checksum(&[0u8; 16]), 0xFFFF);
    }

    #[test]
    fn test_split_computation_matches() {
        let data = [0x53, 0x45, 0x41, 0x4c, 0x01, 0x00, 0x04, 0x00, 0x07];
        let split = finalize_checksum(partial_checksum(&data[4..], partial_checksum(&data[..4], 0)));
        assert_eq!(split, calculate_checksum(&data));
    }

    #[test]
    fn test_detects_single_bit_flip() {
        let mut data = [0x12u8, 0x34, 0x56, 0x78, 0x9a];
        let before = calculate_checksum(&data);
        data[2] ^= 0x01;
        assert_ne!(before, calculate_checksum(&data));
    }
}
