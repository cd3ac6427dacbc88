//! Error types for Reed-Solomon coding

use crate::galois::FieldError;
use thiserror::Error;

/// Errors raised while building a codec or decoding a codeword
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The code was configured without parity symbols
    #[error("Reed-Solomon code needs at least one parity symbol")]
    NoParity,

    /// The protected type has no bytes to encode
    #[error("cannot encode a zero-sized value")]
    EmptyPayload,

    /// Data plus parity does not fit in the field
    #[error("codeword of {symbols} symbols exceeds the field limit of {max}")]
    CodewordTooLong { symbols: usize, max: usize },

    /// Codeword length does not match the code
    #[error("expected a {expected}-byte codeword, got {actual} bytes")]
    LengthMismatch { expected: usize, actual: usize },

    /// More symbol errors than the code can locate
    #[error("codeword is uncorrectable")]
    Uncorrectable,

    #[error(transparent)]
    Field(#[from] FieldError),
}

/// Type alias for Result with CodecError
pub type CodecResult<T> = std::result::Result<T, CodecError>;
