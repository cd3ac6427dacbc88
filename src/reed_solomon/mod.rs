//! Reed-Solomon error correction for fixed-size values
//!
//! A value of type `T` is split into symbols over GF(2^4), GF(2^8) or
//! GF(2^16), parity symbols are appended, and up to `floor(ecc / 2)` symbol
//! errors are corrected on decode. Field tables are shared between every
//! codec over the same symbol width.

pub mod codec;
pub mod error;
pub mod injection;
pub mod interleave;
pub mod types;

pub use codec::ReedSolomonCodec;
pub use error::{CodecError, CodecResult};
pub use injection::{corrupt_symbols, inject_bit_errors, inject_burst_errors};
pub use interleave::{deinterleave, interleave};
pub use types::{CodecConfig, DecodeReport, SymbolWidth};
