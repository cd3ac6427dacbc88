//! Bit-level block interleaving
//!
//! A buffer of `N` bytes is viewed as an 8 × N bit matrix. Bit `j` of byte
//! `i` moves to stream bit `j·N + i`, so a burst of up to `N` adjacent
//! corrupted bits in the interleaved buffer touches each original byte at
//! most once.

/// Spread the bits of `data` across the whole buffer
pub fn interleave(data: &[u8]) -> Vec<u8> {
    let n = data.len();
    let mut out = vec![0u8; n];
    for (i, &byte) in data.iter().enumerate() {
        for j in 0..8 {
            if byte & (1 << j) != 0 {
                let pos = j * n + i;
                out[pos / 8] |= 1 << (pos % 8);
            }
        }
    }
    out
}

/// Exact inverse of [`interleave`]
pub fn deinterleave(data: &[u8]) -> Vec<u8> {
    let n = data.len();
    let mut out = vec![0u8; n];
    for (i, byte) in out.iter_mut().enumerate() {
        for j in 0..8 {
            let pos = j * n + i;
            if data[pos / 8] & (1 << (pos % 8)) != 0 {
                *byte |= 1 << j;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let data: Vec<u8> = (0..37u8).map(|b| b.wrapping_mul(73)).collect();
        assert_eq!(deinterleave(&interleave(&data)), data);
        assert!(interleave(&[]).is_empty());
    }

    #[test]
    fn test_single_byte_is_identity() {
        assert_eq!(interleave(&[0b1010_0110]), vec![0b1010_0110]);
    }

    #[test]
    fn test_low_bits_gather_in_front() {
        // bit 0 of every byte lands in the first N stream bits
        let interleaved = interleave(&[1u8; 8]);
        assert_eq!(interleaved, vec![0xFF, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_burst_spreads_across_bytes() {
        let data = [0u8; 8];
        let mut interleaved = interleave(&data);
        // an 8-bit burst wipes one whole interleaved byte
        interleaved[3] = 0xFF;
        let restored = deinterleave(&interleaved);
        assert!(restored.iter().all(|b| b.count_ones() == 1));
    }
}
