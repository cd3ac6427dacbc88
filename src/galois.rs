//! Galois Field GF(2^m) arithmetic
//!
//! Table-driven arithmetic over binary extension fields of order 2 to 16 bits.
//! Elements are stored as `u16` regardless of the field width.
//!
//! ## Tables
//!
//! `exp[i] = α^i` is built by repeated multiply-by-α with reduction modulo the
//! primitive polynomial; `log` is its inverse. The exponential table is stored
//! twice over so that `log[a] + log[b]` never needs a modulo on the hot path.
//!
//! Tables are immutable once built. Use [`shared_field`] to obtain a
//! process-wide instance keyed by `(bits, polynomial)` that is built lazily on
//! first use and shared by every codec working in the same field.
//!
//! ## Standard fields
//!
//! - **GF(2^4)**: 0x13 (x⁴ + x + 1)
//! - **GF(2^8)**: 0x11D (x⁸ + x⁴ + x³ + x² + 1)
//! - **GF(2^10)**: 0x409 (x¹⁰ + x³ + 1)
//! - **GF(2^16)**: 0x1100B (x¹⁶ + x¹² + x³ + x + 1)

pub mod poly;

use log::debug;
use parking_lot::RwLock;
use rustc_hash::FxHashMap as HashMap;
use std::sync::{Arc, OnceLock};
use thiserror::Error;

/// Field parameters for GF(2^4)
pub const GF16: FieldParams = FieldParams::new(4, 0x13);
/// Field parameters for GF(2^8)
pub const GF256: FieldParams = FieldParams::new(8, 0x11D);
/// Field parameters for GF(2^10)
pub const GF1024: FieldParams = FieldParams::new(10, 0x409);
/// Field parameters for GF(2^16)
pub const GF65536: FieldParams = FieldParams::new(16, 0x1100B);

/// Errors raised by field construction and checked arithmetic
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("unsupported field width {0} (expected 2..=16 bits)")]
    UnsupportedWidth(u8),

    #[error("polynomial {poly:#x} does not have degree {bits}")]
    DegreeMismatch { bits: u8, poly: u32 },

    #[error("polynomial {poly:#x} is not primitive over GF(2^{bits})")]
    NotPrimitive { bits: u8, poly: u32 },

    #[error("division by zero in GF(2^{0})")]
    DivisionByZero(u8),

    #[error("zero has no multiplicative inverse in GF(2^{0})")]
    ZeroInverse(u8),

    #[error("element {value} is outside GF(2^{bits})")]
    OutOfRange { bits: u8, value: u16 },
}

/// Width and primitive polynomial identifying a binary extension field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldParams {
    pub bits: u8,
    pub primitive_poly: u32,
}

impl FieldParams {
    pub const fn new(bits: u8, primitive_poly: u32) -> Self {
        Self {
            bits,
            primitive_poly,
        }
    }

    /// Number of elements, 2^m
    pub const fn order(&self) -> usize {
        1 << self.bits
    }
}

/// Precomputed exponential and logarithm tables for one GF(2^m)
pub struct GaloisField {
    params: FieldParams,
    /// α^i for i in 0..2(2^m - 1)
    exp: Vec<u16>,
    /// log_α(a); entry 0 is unused
    log: Vec<u16>,
}

impl std::fmt::Debug for GaloisField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GaloisField")
            .field("bits", &self.params.bits)
            .field("primitive_poly", &format_args!("{:#x}", self.params.primitive_poly))
            .finish()
    }
}

impl GaloisField {
    /// Build the tables for GF(2^bits) reduced by `primitive_poly`
    pub fn new(bits: u8, primitive_poly: u32) -> Result<Self, FieldError> {
        Self::with_params(FieldParams::new(bits, primitive_poly))
    }

    pub fn with_params(params: FieldParams) -> Result<Self, FieldError> {
        let bits = params.bits;
        if !(2..=16).contains(&bits) {
            return Err(FieldError::UnsupportedWidth(bits));
        }

        let order = params.order();
        let poly = params.primitive_poly;
        if poly >> bits != 1 {
            return Err(FieldError::DegreeMismatch { bits, poly });
        }

        let limit = order - 1;
        let mut exp = vec![0u16; limit * 2];
        let mut log = vec![0u16; order];
        let mut seen = vec![false; order];

        let mut x = 1u32;
        for (i, slot) in exp.iter_mut().take(limit).enumerate() {
            // A repeat before 2^m - 1 steps means α does not generate the group
            if seen[x as usize] {
                return Err(FieldError::NotPrimitive { bits, poly });
            }
            seen[x as usize] = true;
            *slot = x as u16;
            log[x as usize] = i as u16;

            x <<= 1;
            if x & order as u32 != 0 {
                x ^= poly;
            }
        }
        if x != 1 {
            return Err(FieldError::NotPrimitive { bits, poly });
        }

        exp.copy_within(0..limit, limit);

        debug!("built GF(2^{}) tables for polynomial {:#x}", bits, poly);
        Ok(Self { params, exp, log })
    }

    pub fn params(&self) -> FieldParams {
        self.params
    }

    pub fn bits(&self) -> u8 {
        self.params.bits
    }

    /// Number of elements, 2^m
    pub fn order(&self) -> usize {
        self.params.order()
    }

    /// Multiplicative group order, 2^m - 1
    #[inline]
    pub fn limit(&self) -> usize {
        self.params.order() - 1
    }

    /// Largest element value, 2^m - 1
    #[inline]
    pub fn mask(&self) -> u16 {
        self.limit() as u16
    }

    pub fn contains(&self, value: u16) -> bool {
        (value as usize) < self.order()
    }

    /// Reject a value that does not belong to this field
    pub fn check(&self, value: u16) -> Result<u16, FieldError> {
        if self.contains(value) {
            Ok(value)
        } else {
            Err(FieldError::OutOfRange {
                bits: self.bits(),
                value,
            })
        }
    }

    /// α^power, power taken modulo 2^m - 1
    #[inline]
    pub fn exp(&self, power: usize) -> u16 {
        self.exp[power % self.limit()]
    }

    /// Discrete logarithm of a nonzero element
    ///
    /// # Panics
    /// Panics if `a` is zero.
    #[inline]
    pub fn log(&self, a: u16) -> usize {
        assert!(a != 0, "log of zero in GF(2^{})", self.bits());
        self.log[a as usize] as usize
    }

    /// α^-power
    #[inline]
    pub fn exp_neg(&self, power: usize) -> u16 {
        let limit = self.limit();
        self.exp[(limit - power % limit) % limit]
    }

    /// Addition is XOR
    #[inline]
    pub fn add(&self, a: u16, b: u16) -> u16 {
        a ^ b
    }

    /// Subtraction is identical to addition
    #[inline]
    pub fn sub(&self, a: u16, b: u16) -> u16 {
        a ^ b
    }

    #[inline]
    pub fn mul(&self, a: u16, b: u16) -> u16 {
        if a == 0 || b == 0 {
            return 0;
        }
        self.exp[self.log[a as usize] as usize + self.log[b as usize] as usize]
    }

    /// Divide `a` by `b`
    ///
    /// # Panics
    /// Panics if `b` is zero. Use [`GaloisField::checked_div`] where the
    /// divisor is not known to be nonzero.
    #[inline]
    pub fn div(&self, a: u16, b: u16) -> u16 {
        if b == 0 {
            panic!("Division by zero in GF(2^{})", self.bits());
        }
        if a == 0 {
            return 0;
        }
        let limit = self.limit();
        self.exp[self.log[a as usize] as usize + limit - self.log[b as usize] as usize]
    }

    pub fn checked_div(&self, a: u16, b: u16) -> Result<u16, FieldError> {
        if b == 0 {
            return Err(FieldError::DivisionByZero(self.bits()));
        }
        Ok(self.div(a, b))
    }

    /// Multiplicative inverse
    ///
    /// # Panics
    /// Panics if `a` is zero.
    #[inline]
    pub fn inverse(&self, a: u16) -> u16 {
        if a == 0 {
            panic!("Cannot invert zero in GF(2^{})", self.bits());
        }
        let limit = self.limit();
        self.exp[limit - self.log[a as usize] as usize]
    }

    pub fn checked_inverse(&self, a: u16) -> Result<u16, FieldError> {
        if a == 0 {
            return Err(FieldError::ZeroInverse(self.bits()));
        }
        Ok(self.inverse(a))
    }

    /// Raise `a` to `exponent`; 0^0 is taken as 1
    #[inline]
    pub fn pow(&self, a: u16, exponent: u32) -> u16 {
        if exponent == 0 {
            return 1;
        }
        if a == 0 {
            return 0;
        }
        let log_a = self.log[a as usize] as u64;
        self.exp[((log_a * exponent as u64) % self.limit() as u64) as usize]
    }
}

/// Process-wide registry of field tables keyed by parameters
static FIELDS: OnceLock<RwLock<HashMap<FieldParams, Arc<GaloisField>>>> = OnceLock::new();

/// Get the shared tables for a field, building them on first use
pub fn shared_field(params: FieldParams) -> Result<Arc<GaloisField>, FieldError> {
    let registry = FIELDS.get_or_init(|| RwLock::new(HashMap::default()));

    if let Some(field) = registry.read().get(&params) {
        return Ok(Arc::clone(field));
    }

    let mut fields = registry.write();
    // Another thread may have won the race between the two locks
    if let Some(field) = fields.get(&params) {
        return Ok(Arc::clone(field));
    }
    let field = Arc::new(GaloisField::with_params(params)?);
    fields.insert(params, Arc::clone(&field));
    Ok(field)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_galois_field_basic_operations() {
        let gf = GaloisField::with_params(GF256).unwrap();

        assert_eq!(gf.add(5, 3), 5 ^ 3);
        assert_eq!(gf.sub(5, 3), 5 ^ 3);

        assert_eq!(gf.mul(1, 42), 42);
        assert_eq!(gf.mul(42, 1), 42);
        assert_eq!(gf.mul(0, 42), 0);

        for a in 1..=255u16 {
            let inv_a = gf.inverse(a);
            assert_eq!(gf.mul(a, inv_a), 1, "Failed for a = {}", a);
        }
    }

    #[test]
    fn test_known_gf256_products() {
        let gf = GaloisField::with_params(GF256).unwrap();

        // Reference values for the 0x11D field
        assert_eq!(gf.mul(2, 0x80), 0x1D);
        assert_eq!(gf.mul(0x1D, gf.inverse(0x1D)), 1);
        assert_eq!(gf.exp(8), 0x1D);
        assert_eq!(gf.log(0x1D), 8);
    }

    #[test]
    fn test_galois_field_division() {
        let gf = GaloisField::with_params(GF16).unwrap();

        for a in 1..16u16 {
            for b in 1..16u16 {
                let quotient = gf.div(a, b);
                assert_eq!(gf.mul(quotient, b), a, "Failed for a = {}, b = {}", a, b);
            }
        }
        assert_eq!(gf.div(0, 7), 0);
    }

    #[test]
    fn test_galois_field_power() {
        let gf = GaloisField::with_params(GF256).unwrap();

        assert_eq!(gf.pow(2, 0), 1);
        assert_eq!(gf.pow(2, 1), 2);
        assert_eq!(gf.pow(0, 5), 0);
        assert_eq!(gf.pow(0, 0), 1);
        assert_eq!(gf.pow(3, 255), 1);
        assert_eq!(gf.pow(7, 3), gf.mul(7, gf.mul(7, 7)));
    }

    #[test]
    fn test_checked_operations() {
        let gf = GaloisField::with_params(GF16).unwrap();
        assert_eq!(gf.checked_div(3, 0), Err(FieldError::DivisionByZero(4)));
        assert_eq!(gf.checked_inverse(0), Err(FieldError::ZeroInverse(4)));
        assert_eq!(gf.checked_div(6, 3), Ok(gf.div(6, 3)));
        assert!(gf.check(15).is_ok());
        assert!(gf.check(16).is_err());
    }

    #[test]
    #[should_panic(expected = "Division by zero")]
    fn test_division_by_zero_panics() {
        let gf = GaloisField::with_params(GF16).unwrap();
        gf.div(1, 0);
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert_eq!(
            GaloisField::new(1, 0x3).unwrap_err(),
            FieldError::UnsupportedWidth(1)
        );
        assert_eq!(
            GaloisField::new(8, 0x1D).unwrap_err(),
            FieldError::DegreeMismatch { bits: 8, poly: 0x1D }
        );
        // x^4 + x^3 + x^2 + x + 1 is irreducible but α has order 5
        assert_eq!(
            GaloisField::new(4, 0x1F).unwrap_err(),
            FieldError::NotPrimitive { bits: 4, poly: 0x1F }
        );
    }

    #[test]
    fn test_standard_fields_build() {
        for params in [GF16, GF256, GF1024, GF65536] {
            let gf = GaloisField::with_params(params).unwrap();
            assert_eq!(gf.order(), params.order());
            assert_eq!(gf.exp(0), 1);
            assert_eq!(gf.exp(gf.limit()), 1);
        }
    }

    #[test]
    fn test_shared_field_is_reused() {
        let a = shared_field(GF256).unwrap();
        let b = shared_field(GF256).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(shared_field(FieldParams::new(4, 0x1F)).is_err());
    }
}
