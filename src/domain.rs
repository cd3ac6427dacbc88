//! Core value types for protected storage
//!
//! Every primitive in this crate stores values through an explicit, symmetric
//! byte representation instead of reinterpreting raw memory. A type opts in by
//! implementing [`Protectable`]; the approximate voter additionally needs
//! [`Approximable`].
//!
//! ## Byte layout
//!
//! - Integers and floats: little-endian, `size_of::<T>()` bytes
//! - `[T; N]`: elements back to back, element 0 first
//!
//! The layout is independent of the host platform, so checksums and codewords
//! computed on one machine verify on another.

/// A fixed-size value with an explicit byte representation
pub trait Protectable: Copy + PartialEq + std::fmt::Debug + Send + Sync + 'static {
    /// Length of the byte representation
    const SIZE: usize;

    /// Write exactly `SIZE` bytes into the front of `out`
    ///
    /// # Panics
    /// Panics if `out` is shorter than `SIZE`.
    fn write_bytes(&self, out: &mut [u8]);

    /// Rebuild a value from the first `SIZE` bytes of `bytes`
    ///
    /// # Panics
    /// Panics if `bytes` is shorter than `SIZE`.
    fn read_bytes(bytes: &[u8]) -> Self;

    fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![0u8; Self::SIZE];
        self.write_bytes(&mut out);
        out
    }

    /// Bit-for-bit equality of the byte representations
    ///
    /// Unlike `==`, a NaN matches an identical NaN and `-0.0` differs from
    /// `0.0`.
    fn same_bits(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

/// Lossy representations used by approximate redundancy
///
/// Both operations must be idempotent: applying one twice gives the same
/// result as applying it once.
pub trait Approximable: Protectable {
    /// Drop low-order bits of precision
    fn reduce_precision(&self) -> Self;

    /// Clamp into a conservative range
    fn limit_range(&self) -> Self;
}

macro_rules! impl_protectable_num {
    ($($t:ty),* $(,)?) => {
        $(
            impl Protectable for $t {
                const SIZE: usize = std::mem::size_of::<$t>();

                #[inline]
                fn write_bytes(&self, out: &mut [u8]) {
                    out[..Self::SIZE].copy_from_slice(&self.to_le_bytes());
                }

                #[inline]
                fn read_bytes(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$t>()];
                    raw.copy_from_slice(&bytes[..Self::SIZE]);
                    <$t>::from_le_bytes(raw)
                }
            }
        )*
    };
}

impl_protectable_num!(u8, u16, u32, u64, u128, i8, i16, i32, i64, i128, f32, f64);

/// Low bits cleared by `reduce_precision` for an integer of `size` bytes
const fn integer_precision_shift(size: usize) -> u32 {
    if size <= 2 {
        2
    } else {
        3
    }
}

macro_rules! impl_approximable_unsigned {
    ($($t:ty),* $(,)?) => {
        $(
            impl Approximable for $t {
                fn reduce_precision(&self) -> Self {
                    let shift = integer_precision_shift(Self::SIZE);
                    (*self >> shift) << shift
                }

                fn limit_range(&self) -> Self {
                    (*self).min(<$t>::MAX / 2)
                }
            }
        )*
    };
}

macro_rules! impl_approximable_signed {
    ($($t:ty),* $(,)?) => {
        $(
            impl Approximable for $t {
                fn reduce_precision(&self) -> Self {
                    let shift = integer_precision_shift(Self::SIZE);
                    (*self >> shift) << shift
                }

                fn limit_range(&self) -> Self {
                    let limit = <$t>::MAX / 2;
                    (*self).clamp(-limit, limit)
                }
            }
        )*
    };
}

impl_approximable_unsigned!(u8, u16, u32, u64, u128);
impl_approximable_signed!(i8, i16, i32, i64, i128);

/// Magnitude bound applied by `limit_range` to floating point values
pub const FLOAT_RANGE_LIMIT: f64 = 1e6;

/// Mantissa bits cleared by `reduce_precision` on floating point values
const FLOAT_PRECISION_BITS: u32 = 5;

impl Approximable for f32 {
    fn reduce_precision(&self) -> Self {
        f32::from_bits(self.to_bits() & !((1u32 << FLOAT_PRECISION_BITS) - 1))
    }

    fn limit_range(&self) -> Self {
        let limit = FLOAT_RANGE_LIMIT as f32;
        // NaN stays NaN; clamp would propagate it anyway
        self.clamp(-limit, limit)
    }
}

impl Approximable for f64 {
    fn reduce_precision(&self) -> Self {
        f64::from_bits(self.to_bits() & !((1u64 << FLOAT_PRECISION_BITS) - 1))
    }

    fn limit_range(&self) -> Self {
        self.clamp(-FLOAT_RANGE_LIMIT, FLOAT_RANGE_LIMIT)
    }
}

impl<T: Protectable, const N: usize> Protectable for [T; N] {
    const SIZE: usize = T::SIZE * N;

    fn write_bytes(&self, out: &mut [u8]) {
        for (item, chunk) in self.iter().zip(out[..Self::SIZE].chunks_exact_mut(T::SIZE)) {
            item.write_bytes(chunk);
        }
    }

    fn read_bytes(bytes: &[u8]) -> Self {
        std::array::from_fn(|i| T::read_bytes(&bytes[i * T::SIZE..(i + 1) * T::SIZE]))
    }
}

impl<T: Approximable, const N: usize> Approximable for [T; N] {
    fn reduce_precision(&self) -> Self {
        self.map(|item| item.reduce_precision())
    }

    fn limit_range(&self) -> Self {
        self.map(|item| item.limit_range())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_layout_is_little_endian() {
        assert_eq!(0x1234_5678u32.to_bytes(), vec![0x78, 0x56, 0x34, 0x12]);
        assert_eq!(u32::read_bytes(&[0x78, 0x56, 0x34, 0x12]), 0x1234_5678);
        assert_eq!((-2i16).to_bytes(), vec![0xFE, 0xFF]);
    }

    #[test]
    fn test_float_bytes_preserve_bits() {
        let value = -1.5e-3f64;
        assert_eq!(f64::read_bytes(&value.to_bytes()).to_bits(), value.to_bits());
    }

    #[test]
    fn test_array_layout() {
        let record = [1u16, 0x0203];
        assert_eq!(<[u16; 2]>::SIZE, 4);
        assert_eq!(record.to_bytes(), vec![1, 0, 3, 2]);
        assert_eq!(<[u16; 2]>::read_bytes(&[1, 0, 3, 2]), record);
    }

    #[test]
    fn test_integer_reduce_precision() {
        assert_eq!(0xFFu8.reduce_precision(), 0xFC);
        assert_eq!(0xFFFFu16.reduce_precision(), 0xFFFC);
        assert_eq!(47u32.reduce_precision(), 40);
        assert_eq!((-1i32).reduce_precision(), -8);
    }

    #[test]
    fn test_limit_range() {
        assert_eq!(u8::MAX.limit_range(), 127);
        assert_eq!(10u8.limit_range(), 10);
        assert_eq!(i32::MIN.limit_range(), -(i32::MAX / 2));
        assert_eq!(5e7f64.limit_range(), 1e6);
        assert_eq!((-5e7f32).limit_range(), -1e6);
    }

    #[test]
    fn test_approximations_are_idempotent() {
        for value in [0.1f32, -3.75, 123456.7, 9e9] {
            assert_eq!(
                value.reduce_precision().reduce_precision().to_bits(),
                value.reduce_precision().to_bits()
            );
            assert_eq!(value.limit_range().limit_range(), value.limit_range());
        }
        let record = [300i16, -7];
        assert_eq!(record.reduce_precision(), record.reduce_precision().reduce_precision());
    }
}
