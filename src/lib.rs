//! Protection of in-memory values against single-event upsets
//!
//! Four layers, leaves first:
//!
//! - [`galois`]: GF(2^m) arithmetic and the Reed-Solomon polynomial
//!   primitives
//! - [`reed_solomon`]: systematic Reed-Solomon codec for fixed-size values
//! - [`tmr`]: triple modular redundancy voters
//! - [`hardening`]: budgeted assignment of protection levels and the
//!   [`ProtectedValue`] wrapper that applies them
//!
//! Values opt in through [`Protectable`], an explicit little-endian byte
//! representation.
//!
//! ```
//! use radshield::{HealthWeightedTmr, ReedSolomonCodec, SymbolWidth};
//!
//! let codec = ReedSolomonCodec::<u32>::with_parity(SymbolWidth::Eight, 4).unwrap();
//! let mut codeword = codec.encode(&0xC0FFEE);
//! codeword[1] ^= 0x5A;
//! assert_eq!(codec.decode(&codeword).unwrap(), 0xC0FFEE);
//!
//! let voter = HealthWeightedTmr::new(42i64);
//! voter.inject_fault(0, |bytes| bytes[0] = 0xFF);
//! assert_eq!(voter.get(), 42);
//! ```

pub mod domain;
pub mod galois;
pub mod hardening;
pub mod reed_solomon;
pub mod tmr;

pub use domain::{Approximable, Protectable};
pub use galois::{shared_field, FieldError, FieldParams, GaloisField};
pub use hardening::{
    HardeningConfig, HardeningPlan, HardeningStrategy, MissionEnvironment, NetworkComponent,
    ProtectedValue, ProtectionLevel, SelectiveHardening,
};
pub use reed_solomon::{CodecConfig, CodecError, ReedSolomonCodec, SymbolWidth};
pub use tmr::{ApproximateTmr, HealthWeightedTmr, HistoryWeightedTmr, VoterConfig};
