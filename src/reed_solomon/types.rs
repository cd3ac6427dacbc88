//! Configuration and result types for the Reed-Solomon codec

use super::error::CodecError;
use crate::galois::{FieldParams, GF16, GF256, GF65536};

/// Width of one code symbol and the field it lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolWidth {
    /// GF(2^4); every byte becomes two symbols, low nibble first
    Four,
    /// GF(2^8); one symbol per byte
    Eight,
    /// GF(2^16); one symbol per two bytes, little-endian
    Sixteen,
}

impl SymbolWidth {
    pub fn field(&self) -> FieldParams {
        match self {
            SymbolWidth::Four => GF16,
            SymbolWidth::Eight => GF256,
            SymbolWidth::Sixteen => GF65536,
        }
    }

    pub fn bits(&self) -> u8 {
        self.field().bits
    }

    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            4 => Some(SymbolWidth::Four),
            8 => Some(SymbolWidth::Eight),
            16 => Some(SymbolWidth::Sixteen),
            _ => None,
        }
    }

    /// Bytes used to store one symbol in a serialized codeword
    pub fn bytes_per_symbol(&self) -> usize {
        match self {
            SymbolWidth::Four | SymbolWidth::Eight => 1,
            SymbolWidth::Sixteen => 2,
        }
    }

    /// Number of symbols needed to carry `data_len` bytes of payload
    pub fn symbols_for(&self, data_len: usize) -> usize {
        match self {
            SymbolWidth::Four => data_len * 2,
            SymbolWidth::Eight => data_len,
            SymbolWidth::Sixteen => data_len.div_ceil(2),
        }
    }

    /// Longest codeword, in symbols, the field supports
    pub fn max_codeword_symbols(&self) -> usize {
        self.field().order() - 1
    }

    /// Split payload bytes into symbols, zero padded to `symbol_count`
    pub(crate) fn bytes_to_symbols(&self, bytes: &[u8], symbol_count: usize) -> Vec<u16> {
        let mut symbols = Vec::with_capacity(symbol_count);
        match self {
            SymbolWidth::Four => {
                for &b in bytes {
                    symbols.push((b & 0x0F) as u16);
                    symbols.push((b >> 4) as u16);
                }
            }
            SymbolWidth::Eight => symbols.extend(bytes.iter().map(|&b| b as u16)),
            SymbolWidth::Sixteen => {
                symbols.extend(bytes.chunks(2).map(|pair| {
                    let high = pair.get(1).copied().unwrap_or(0);
                    u16::from_le_bytes([pair[0], high])
                }));
            }
        }
        symbols.resize(symbol_count, 0);
        symbols
    }

    /// Reassemble `data_len` payload bytes from data symbols
    pub(crate) fn symbols_to_bytes(&self, symbols: &[u16], data_len: usize) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(data_len + 1);
        match self {
            SymbolWidth::Four => {
                for pair in symbols.chunks(2) {
                    let low = pair[0] as u8 & 0x0F;
                    let high = pair.get(1).copied().unwrap_or(0) as u8 & 0x0F;
                    bytes.push(low | (high << 4));
                }
            }
            SymbolWidth::Eight => bytes.extend(symbols.iter().map(|&s| s as u8)),
            SymbolWidth::Sixteen => {
                for &s in symbols {
                    bytes.extend_from_slice(&s.to_le_bytes());
                }
            }
        }
        bytes.truncate(data_len);
        bytes
    }

    /// Serialize symbols into codeword bytes
    pub(crate) fn write_symbols(&self, symbols: &[u16]) -> Vec<u8> {
        match self {
            SymbolWidth::Four | SymbolWidth::Eight => symbols.iter().map(|&s| s as u8).collect(),
            SymbolWidth::Sixteen => symbols.iter().flat_map(|s| s.to_le_bytes()).collect(),
        }
    }

    /// Parse codeword bytes back into symbols
    ///
    /// Bits above the symbol width in a 4-bit codeword byte carry no
    /// information and are dropped.
    pub(crate) fn read_symbols(&self, bytes: &[u8]) -> Vec<u16> {
        match self {
            SymbolWidth::Four => bytes.iter().map(|&b| (b & 0x0F) as u16).collect(),
            SymbolWidth::Eight => bytes.iter().map(|&b| b as u16).collect(),
            SymbolWidth::Sixteen => bytes
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect(),
        }
    }
}

/// Parameters of a Reed-Solomon code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    pub symbol_width: SymbolWidth,
    /// Parity symbols appended to each codeword
    pub ecc_symbols: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            symbol_width: SymbolWidth::Eight,
            ecc_symbols: 8,
        }
    }
}

impl CodecConfig {
    pub fn new(symbol_width: SymbolWidth, ecc_symbols: usize) -> Self {
        Self {
            symbol_width,
            ecc_symbols,
        }
    }

    /// Read `--width` and `--ecc`, falling back to the defaults
    pub fn from_args(matches: &clap::ArgMatches) -> Self {
        let defaults = Self::default();
        let symbol_width = matches
            .get_one::<u8>("width")
            .and_then(|bits| SymbolWidth::from_bits(*bits))
            .unwrap_or(defaults.symbol_width);
        let ecc_symbols = matches
            .get_one::<usize>("ecc")
            .copied()
            .unwrap_or(defaults.ecc_symbols);

        Self::new(symbol_width, ecc_symbols)
    }

    /// Symbol errors the code can always correct, floor(ecc / 2)
    pub fn correction_capability(&self) -> usize {
        self.ecc_symbols / 2
    }

    /// Check the code fits in the field for a payload of `data_len` bytes
    pub fn validate(&self, data_len: usize) -> Result<(), CodecError> {
        if self.ecc_symbols == 0 {
            return Err(CodecError::NoParity);
        }
        if data_len == 0 {
            return Err(CodecError::EmptyPayload);
        }
        let total = self.symbol_width.symbols_for(data_len) + self.ecc_symbols;
        let max = self.symbol_width.max_codeword_symbols();
        if total > max {
            return Err(CodecError::CodewordTooLong { symbols: total, max });
        }
        Ok(())
    }
}

/// A successful decode together with what had to be fixed
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeReport<T> {
    pub value: T,
    /// Codeword symbol positions that were corrected, ascending
    pub corrected_positions: Vec<usize>,
}

impl<T> DecodeReport<T> {
    pub fn corrected_symbols(&self) -> usize {
        self.corrected_positions.len()
    }

    pub fn was_clean(&self) -> bool {
        self.corrected_positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_counts() {
        assert_eq!(SymbolWidth::Four.symbols_for(3), 6);
        assert_eq!(SymbolWidth::Eight.symbols_for(3), 3);
        assert_eq!(SymbolWidth::Sixteen.symbols_for(3), 2);
    }

    #[test]
    fn test_symbol_packing_round_trip() {
        let payload = [0xABu8, 0x01, 0xFE];
        for width in [SymbolWidth::Four, SymbolWidth::Eight, SymbolWidth::Sixteen] {
            let count = width.symbols_for(payload.len());
            let symbols = width.bytes_to_symbols(&payload, count);
            assert_eq!(width.symbols_to_bytes(&symbols, payload.len()), payload);
            assert_eq!(width.read_symbols(&width.write_symbols(&symbols)), symbols);
        }
    }

    #[test]
    fn test_from_bits() {
        assert_eq!(SymbolWidth::from_bits(16), Some(SymbolWidth::Sixteen));
        assert_eq!(SymbolWidth::from_bits(12), None);
    }

    #[test]
    fn test_nibble_order() {
        assert_eq!(SymbolWidth::Four.bytes_to_symbols(&[0xAB], 2), vec![0xB, 0xA]);
    }

    #[test]
    fn test_validate() {
        assert_eq!(
            CodecConfig::new(SymbolWidth::Eight, 0).validate(4),
            Err(CodecError::NoParity)
        );
        assert_eq!(
            CodecConfig::new(SymbolWidth::Four, 6).validate(4),
            Ok(())
        );
        assert_eq!(
            CodecConfig::new(SymbolWidth::Four, 8).validate(8),
            Err(CodecError::CodewordTooLong { symbols: 24, max: 15 })
        );
        assert_eq!(CodecConfig::default().correction_capability(), 4);
    }
}
