//! Integration tests for the Reed-Solomon codec
//!
//! Covers clean round trips, correction up to capability, behavior beyond
//! capability and the seeded corruption utilities.

use proptest::prelude::*;
use proptest::sample::subsequence;
use radshield::reed_solomon::{
    corrupt_symbols, deinterleave, inject_bit_errors, inject_burst_errors, interleave,
};
use radshield::{CodecError, ReedSolomonCodec, SymbolWidth};

/// XOR `error` into the symbol at `position` of a serialized codeword
fn xor_symbol(codeword: &mut [u8], width: SymbolWidth, position: usize, error: u16) {
    match width {
        SymbolWidth::Four => codeword[position] ^= (error & 0x0F) as u8,
        SymbolWidth::Eight => codeword[position] ^= error as u8,
        SymbolWidth::Sixteen => {
            let [lo, hi] = error.to_le_bytes();
            codeword[2 * position] ^= lo;
            codeword[2 * position + 1] ^= hi;
        }
    }
}

fn positions(total: usize, count: usize) -> impl Strategy<Value = Vec<usize>> {
    subsequence((0..total).collect::<Vec<_>>(), count)
}

proptest! {
    /// Property: decoding an untouched codeword returns the value
    #[test]
    fn prop_clean_round_trip(value in any::<u64>(), ecc in 1usize..=16) {
        let codec = ReedSolomonCodec::<u64>::with_parity(SymbolWidth::Eight, ecc).unwrap();
        let codeword = codec.encode(&value);
        prop_assert_eq!(codeword.len(), codec.encoded_len());
        prop_assert_eq!(codec.decode(&codeword).unwrap(), value);
        prop_assert!(codec.is_correctable(&codeword));
    }

    /// Property: clean round trip for float payloads over 16-bit symbols
    #[test]
    fn prop_clean_round_trip_f64(value in any::<f64>()) {
        let codec = ReedSolomonCodec::<f64>::with_parity(SymbolWidth::Sixteen, 4).unwrap();
        let decoded = codec.decode(&codec.encode(&value)).unwrap();
        prop_assert_eq!(decoded.to_bits(), value.to_bits());
    }

    /// Property: exactly t symbol errors over GF(2^8) are always corrected
    #[test]
    fn prop_corrects_t_errors_gf256(
        value in any::<u64>(),
        hits in positions(16, 4),
        errors in proptest::collection::vec(1u16..=255, 4),
    ) {
        let codec = ReedSolomonCodec::<u64>::with_parity(SymbolWidth::Eight, 8).unwrap();
        let mut codeword = codec.encode(&value);
        for (&pos, &err) in hits.iter().zip(&errors) {
            xor_symbol(&mut codeword, SymbolWidth::Eight, pos, err);
        }

        let report = codec.decode_with_report(&codeword).unwrap();
        prop_assert_eq!(report.value, value);
        prop_assert_eq!(report.corrected_positions, hits);
    }

    /// Property: exactly t symbol errors over GF(2^16) are always corrected
    #[test]
    fn prop_corrects_t_errors_gf65536(
        value in any::<u64>(),
        hits in positions(10, 3),
        errors in proptest::collection::vec(1u16..=u16::MAX, 3),
    ) {
        let codec = ReedSolomonCodec::<u64>::with_parity(SymbolWidth::Sixteen, 6).unwrap();
        let mut codeword = codec.encode(&value);
        for (&pos, &err) in hits.iter().zip(&errors) {
            xor_symbol(&mut codeword, SymbolWidth::Sixteen, pos, err);
        }
        prop_assert_eq!(codec.decode(&codeword).unwrap(), value);
    }

    /// Property: exactly t symbol errors over GF(2^4) are always corrected
    #[test]
    fn prop_corrects_t_errors_gf16(
        value in any::<u32>(),
        hits in positions(14, 3),
        errors in proptest::collection::vec(1u16..16, 3),
    ) {
        let codec = ReedSolomonCodec::<u32>::with_parity(SymbolWidth::Four, 6).unwrap();
        let mut codeword = codec.encode(&value);
        for (&pos, &err) in hits.iter().zip(&errors) {
            xor_symbol(&mut codeword, SymbolWidth::Four, pos, err);
        }
        prop_assert_eq!(codec.decode(&codeword).unwrap(), value);
    }

    /// Property: beyond t errors, decode succeeds exactly when
    /// is_correctable says so, and failure is always Uncorrectable
    #[test]
    fn prop_beyond_capability_is_consistent(
        value in any::<u64>(),
        extra in 1usize..=4,
        seed in any::<u64>(),
    ) {
        let codec = ReedSolomonCodec::<u64>::with_parity(SymbolWidth::Eight, 8).unwrap();
        let mut codeword = codec.encode(&value);
        let count = codec.correction_capability() + extra;
        let hits: Vec<usize> = (0..count)
            .map(|i| (seed as usize).wrapping_add(i * 3) % codec.total_symbols())
            .collect();
        for (i, &pos) in hits.iter().enumerate() {
            xor_symbol(&mut codeword, SymbolWidth::Eight, pos, (i as u16 % 255) + 1);
        }

        let correctable = codec.is_correctable(&codeword);
        match codec.decode(&codeword) {
            Ok(_) => prop_assert!(correctable),
            Err(err) => {
                prop_assert!(!correctable);
                prop_assert_eq!(err, CodecError::Uncorrectable);
            }
        }
    }
}

#[test]
fn test_byte_value_with_two_flipped_symbols() {
    let codec = ReedSolomonCodec::<u8>::with_parity(SymbolWidth::Eight, 8).unwrap();
    let mut codeword = codec.encode(&200);
    assert_eq!(codeword.len(), 9);

    corrupt_symbols(&mut codeword, &[0, 5], SymbolWidth::Eight);
    assert_ne!(codeword[0], 200);

    let report = codec.decode_with_report(&codeword).unwrap();
    assert_eq!(report.value, 200);
    assert_eq!(report.corrected_positions, vec![0, 5]);
}

#[test]
fn test_parity_only_errors_leave_value_intact() {
    let codec = ReedSolomonCodec::<u32>::with_parity(SymbolWidth::Eight, 6).unwrap();
    let mut codeword = codec.encode(&0xAABBCCDD);
    corrupt_symbols(&mut codeword, &[4, 9], SymbolWidth::Eight);
    let report = codec.decode_with_report(&codeword).unwrap();
    assert_eq!(report.value, 0xAABBCCDD);
    assert_eq!(report.corrected_positions, vec![4, 9]);
}

#[test]
fn test_scrub_then_clean() {
    let codec = ReedSolomonCodec::<i64>::with_parity(SymbolWidth::Sixteen, 4).unwrap();
    let clean = codec.encode(&-123_456_789);
    let mut codeword = clean.clone();
    corrupt_symbols(&mut codeword, &[1, 4], SymbolWidth::Sixteen);

    assert_eq!(codec.scrub(&mut codeword), Ok(2));
    assert_eq!(codeword, clean);
    assert_eq!(codec.scrub(&mut codeword), Ok(0));
}

#[test]
fn test_codecs_share_field_tables() {
    let a = ReedSolomonCodec::<u16>::with_parity(SymbolWidth::Eight, 4).unwrap();
    let b = ReedSolomonCodec::<u64>::with_parity(SymbolWidth::Eight, 10).unwrap();
    assert_eq!(a.decode(&a.encode(&7)).unwrap(), 7);
    assert_eq!(b.decode(&b.encode(&7)).unwrap(), 7);
}

#[test]
fn test_configuration_errors() {
    assert_eq!(
        ReedSolomonCodec::<u32>::with_parity(SymbolWidth::Eight, 0).unwrap_err(),
        CodecError::NoParity
    );
    assert!(matches!(
        ReedSolomonCodec::<[u8; 200]>::with_parity(SymbolWidth::Eight, 60),
        Err(CodecError::CodewordTooLong { symbols: 260, max: 255 })
    ));

    let codec = ReedSolomonCodec::<u32>::with_parity(SymbolWidth::Eight, 4).unwrap();
    assert_eq!(
        codec.decode(&[0u8; 3]),
        Err(CodecError::LengthMismatch {
            expected: 8,
            actual: 3
        })
    );
    assert!(!codec.is_correctable(&[0u8; 3]));
}

#[test]
fn test_overhead_and_capability() {
    let codec = ReedSolomonCodec::<u32>::with_parity(SymbolWidth::Eight, 8).unwrap();
    assert_eq!(codec.data_symbols(), 4);
    assert_eq!(codec.total_symbols(), 12);
    assert_eq!(codec.correction_capability(), 4);
    assert!((codec.overhead_percent() - 200.0).abs() < 1e-9);

    let codec = ReedSolomonCodec::<u32>::with_parity(SymbolWidth::Four, 4).unwrap();
    assert_eq!(codec.data_symbols(), 8);
    assert_eq!(codec.encoded_len(), 12);
}

#[test]
fn test_sparse_bit_errors_are_corrected() {
    let codec = ReedSolomonCodec::<u64>::with_parity(SymbolWidth::Eight, 8).unwrap();
    let value = 0x0F1E_2D3C_4B5A_6978u64;

    let mut recovered = 0;
    for seed in 0..50 {
        let mut codeword = codec.encode(&value);
        let flipped = inject_bit_errors(&mut codeword, 0.01, seed);
        match codec.decode(&codeword) {
            Ok(decoded) => {
                // at most 4 corrupted bytes is guaranteed to come back intact
                if flipped <= 4 {
                    assert_eq!(decoded, value, "seed {}", seed);
                }
                if decoded == value {
                    recovered += 1;
                }
            }
            Err(err) => assert_eq!(err, CodecError::Uncorrectable),
        }
    }
    assert!(recovered >= 45, "recovered only {} of 50", recovered);
}

#[test]
fn test_interleaving_spreads_a_burst() {
    let codec = ReedSolomonCodec::<[u8; 8]>::with_parity(SymbolWidth::Eight, 8).unwrap();
    let codeword = codec.encode(&[1, 2, 3, 4, 5, 6, 7, 8]);
    let n = codeword.len();

    // a run of n adjacent stored bits, the longest burst one pass absorbs
    let mut stored = interleave(&codeword);
    for pos in 13..13 + n {
        stored[pos / 8] ^= 1 << (pos % 8);
    }

    let received = deinterleave(&stored);
    for (before, after) in codeword.iter().zip(&received) {
        assert_eq!((before ^ after).count_ones(), 1);
    }
}

#[test]
fn test_burst_injection_confined_to_buffer() {
    let mut data = vec![0u8; 16];
    let bursts = inject_burst_errors(&mut data, 0.02, 6, 3);
    let flipped: u32 = data.iter().map(|b| b.count_ones()).sum();
    assert!(flipped as usize <= bursts * 6);

    let mut again = vec![0u8; 16];
    assert_eq!(inject_burst_errors(&mut again, 0.02, 6, 3), bursts);
    assert_eq!(again, data);
}
