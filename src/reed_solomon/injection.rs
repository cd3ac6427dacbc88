//! Synthetic corruption for exercising the codec and voters
//!
//! All injectors are seeded so a failing test reproduces exactly. They model
//! independent bit flips only, not any particular radiation environment.

use super::types::SymbolWidth;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Flip each bit of `data` independently with probability `rate`
///
/// Returns the number of bits flipped.
pub fn inject_bit_errors(data: &mut [u8], rate: f64, seed: u64) -> usize {
    let rate = rate.clamp(0.0, 1.0);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut flipped = 0;
    for byte in data.iter_mut() {
        for bit in 0..8 {
            if rng.random_bool(rate) {
                *byte ^= 1 << bit;
                flipped += 1;
            }
        }
    }
    flipped
}

/// Start a burst of `burst_len` consecutive bit flips at each bit position
/// with probability `rate`
///
/// Bursts may overlap and are cut off at the end of the buffer. Returns the
/// number of bursts started.
pub fn inject_burst_errors(data: &mut [u8], rate: f64, burst_len: usize, seed: u64) -> usize {
    let rate = rate.clamp(0.0, 1.0);
    let total_bits = data.len() * 8;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut bursts = 0;
    let mut bit = 0;
    while bit < total_bits {
        if rng.random_bool(rate) {
            let end = (bit + burst_len).min(total_bits);
            for pos in bit..end {
                data[pos / 8] ^= 1 << (pos % 8);
            }
            bursts += 1;
            bit = end.max(bit + 1);
        } else {
            bit += 1;
        }
    }
    bursts
}

/// Invert every bit of the symbols at `positions` in a serialized codeword
///
/// Positions outside the codeword are ignored. For 4-bit symbols only the
/// low nibble of each byte is flipped.
pub fn corrupt_symbols(codeword: &mut [u8], positions: &[usize], symbol_width: SymbolWidth) {
    let bytes_per_symbol = symbol_width.bytes_per_symbol();
    let mask = match symbol_width {
        SymbolWidth::Four => 0x0F,
        SymbolWidth::Eight | SymbolWidth::Sixteen => 0xFF,
    };
    for &pos in positions {
        let start = pos * bytes_per_symbol;
        if let Some(symbol) = codeword.get_mut(start..start + bytes_per_symbol) {
            for byte in symbol {
                *byte ^= mask;
            }
        }
    }
}
