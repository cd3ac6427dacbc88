//! Systematic Reed-Solomon codec for fixed-size values
//!
//! ## Layout
//!
//! ```text
//! [ data symbols (value bytes, zero padded) | parity symbols ]
//!   data_symbols                              ecc_symbols
//! ```
//!
//! The data symbols are the value's bytes unchanged, so an uncorrupted
//! codeword can be read without decoding.
//!
//! ## Decode pipeline
//!
//! syndromes → (all zero: done) → Berlekamp-Massey → Chien search →
//! Forney → apply corrections → re-check syndromes.
//!
//! A codeword is declared uncorrectable when the locator degree exceeds
//! `t = floor(ecc / 2)`, when the Chien search finds a root count different
//! from the locator degree, when Forney's denominator vanishes, or when the
//! corrected codeword still has nonzero syndromes.

use super::error::{CodecError, CodecResult};
use super::types::{CodecConfig, DecodeReport, SymbolWidth};
use crate::domain::Protectable;
use crate::galois::{shared_field, GaloisField};
use log::{debug, trace};
use std::marker::PhantomData;
use std::sync::Arc;

/// Reed-Solomon encoder/decoder for values of type `T`
pub struct ReedSolomonCodec<T> {
    config: CodecConfig,
    field: Arc<GaloisField>,
    generator: Vec<u16>,
    data_symbols: usize,
    _value: PhantomData<fn() -> T>,
}

impl<T> Clone for ReedSolomonCodec<T> {
    fn clone(&self) -> Self {
        Self {
            config: self.config,
            field: Arc::clone(&self.field),
            generator: self.generator.clone(),
            data_symbols: self.data_symbols,
            _value: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for ReedSolomonCodec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReedSolomonCodec")
            .field("config", &self.config)
            .field("data_symbols", &self.data_symbols)
            .finish()
    }
}

impl<T: Protectable> ReedSolomonCodec<T> {
    /// Build a codec; field tables are shared with every other codec over
    /// the same symbol width
    pub fn new(config: CodecConfig) -> CodecResult<Self> {
        config.validate(T::SIZE)?;

        let field = shared_field(config.symbol_width.field())?;
        let generator = field.rs_generator_poly(config.ecc_symbols);
        let data_symbols = config.symbol_width.symbols_for(T::SIZE);

        debug!(
            "Reed-Solomon codec: {} data + {} parity symbols over GF(2^{})",
            data_symbols,
            config.ecc_symbols,
            field.bits()
        );

        Ok(Self {
            config,
            field,
            generator,
            data_symbols,
            _value: PhantomData,
        })
    }

    /// Codec with `ecc_symbols` parity symbols of the given width
    pub fn with_parity(symbol_width: SymbolWidth, ecc_symbols: usize) -> CodecResult<Self> {
        Self::new(CodecConfig::new(symbol_width, ecc_symbols))
    }

    pub fn config(&self) -> CodecConfig {
        self.config
    }

    pub fn data_symbols(&self) -> usize {
        self.data_symbols
    }

    pub fn ecc_symbols(&self) -> usize {
        self.config.ecc_symbols
    }

    pub fn total_symbols(&self) -> usize {
        self.data_symbols + self.config.ecc_symbols
    }

    /// Serialized codeword length in bytes
    pub fn encoded_len(&self) -> usize {
        self.total_symbols() * self.config.symbol_width.bytes_per_symbol()
    }

    /// Symbol errors that are always corrected
    pub fn correction_capability(&self) -> usize {
        self.config.correction_capability()
    }

    /// Storage overhead relative to the raw value, in percent
    pub fn overhead_percent(&self) -> f64 {
        (self.encoded_len() as f64 / T::SIZE as f64 - 1.0) * 100.0
    }

    /// Encode a value into a systematic codeword
    pub fn encode(&self, value: &T) -> Vec<u8> {
        let width = self.config.symbol_width;
        let mut symbols = width.bytes_to_symbols(&value.to_bytes(), self.data_symbols);
        let parity = self.field.rs_remainder(&symbols, &self.generator);
        symbols.extend(parity);
        width.write_symbols(&symbols)
    }

    /// Recover the value, correcting up to `t` symbol errors
    pub fn decode(&self, codeword: &[u8]) -> CodecResult<T> {
        self.decode_with_report(codeword).map(|report| report.value)
    }

    /// Recover the value and report which symbols were corrected
    pub fn decode_with_report(&self, codeword: &[u8]) -> CodecResult<DecodeReport<T>> {
        let mut symbols = self.read_codeword(codeword)?;
        let corrected_positions = self.correct_symbols(&mut symbols)?;

        let width = self.config.symbol_width;
        let bytes = width.symbols_to_bytes(&symbols[..self.data_symbols], T::SIZE);
        Ok(DecodeReport {
            value: T::read_bytes(&bytes),
            corrected_positions,
        })
    }

    /// Whether `decode` would succeed on this codeword
    pub fn is_correctable(&self, codeword: &[u8]) -> bool {
        match self.read_codeword(codeword) {
            Ok(mut symbols) => self.correct_symbols(&mut symbols).is_ok(),
            Err(_) => false,
        }
    }

    /// Rewrite a codeword in place with all correctable errors removed
    ///
    /// Returns the number of symbols fixed. The codeword is left untouched if
    /// it is uncorrectable.
    pub fn scrub(&self, codeword: &mut [u8]) -> CodecResult<usize> {
        let mut symbols = self.read_codeword(codeword)?;
        let corrected = self.correct_symbols(&mut symbols)?;
        if !corrected.is_empty() {
            codeword.copy_from_slice(&self.config.symbol_width.write_symbols(&symbols));
        }
        Ok(corrected.len())
    }

    fn read_codeword(&self, codeword: &[u8]) -> CodecResult<Vec<u16>> {
        let expected = self.encoded_len();
        if codeword.len() != expected {
            return Err(CodecError::LengthMismatch {
                expected,
                actual: codeword.len(),
            });
        }
        Ok(self.config.symbol_width.read_symbols(codeword))
    }

    /// Run the decode pipeline over symbols, fixing them in place
    fn correct_symbols(&self, symbols: &mut [u16]) -> CodecResult<Vec<usize>> {
        let gf = &self.field;
        let nsym = self.config.ecc_symbols;

        let syndromes = gf.rs_syndromes(symbols, nsym);
        if syndromes.iter().all(|&s| s == 0) {
            return Ok(Vec::new());
        }

        let locator = gf.berlekamp_massey(&syndromes);
        let degree = locator.len() - 1;
        if degree > self.correction_capability() {
            trace!("locator degree {} exceeds capability", degree);
            return Err(CodecError::Uncorrectable);
        }

        let positions = gf.chien_search(&locator, symbols.len());
        if positions.len() != degree {
            trace!(
                "Chien search found {} roots for a degree {} locator",
                positions.len(),
                degree
            );
            return Err(CodecError::Uncorrectable);
        }

        let magnitudes = gf
            .forney(&syndromes, &locator, &positions, symbols.len())
            .ok_or(CodecError::Uncorrectable)?;

        let original: Vec<u16> = positions.iter().map(|&p| symbols[p]).collect();
        for (&pos, &magnitude) in positions.iter().zip(&magnitudes) {
            symbols[pos] ^= magnitude;
        }

        let mask = gf.mask();
        let in_field = positions.iter().all(|&p| symbols[p] <= mask);
        if !in_field || gf.rs_syndromes(symbols, nsym).iter().any(|&s| s != 0) {
            for (&pos, &value) in positions.iter().zip(&original) {
                symbols[pos] = value;
            }
            return Err(CodecError::Uncorrectable);
        }

        debug!("corrected {} symbol(s) at {:?}", positions.len(), positions);
        Ok(positions)
    }
}
