//! Runtime-selected protection for a single value
//!
//! | Level               | Wrapper                                            |
//! |---------------------|----------------------------------------------------|
//! | `None`              | plain value                                        |
//! | `ChecksumOnly`      | [`Checksummed`], detection only                    |
//! | `ApproximateTmr`    | [`ApproximateTmr`] `[Reduced, Reduced, Exact]`     |
//! | `HealthWeightedTmr` | [`HistoryWeightedTmr`]                             |
//! | `FullTmr`           | [`HealthWeightedTmr`] verifying on every read      |
//! | `Adaptive`          | resolved from the [`MissionEnvironment`]           |

use super::error::RecoverError;
use super::level::{MissionEnvironment, ProtectionLevel};
use crate::domain::Approximable;
use crate::tmr::{
    ApproximateTmr, ApproximationKind, Checksummed, HealthWeightedTmr, HistoryWeightedTmr,
    VoterConfig,
};

const APPROXIMATE_LAYOUT: [ApproximationKind; 3] = [
    ApproximationKind::ReducedPrecision,
    ApproximationKind::ReducedPrecision,
    ApproximationKind::Exact,
];

/// A value wrapped in the primitive its protection level calls for
#[derive(Debug)]
pub enum ProtectedValue<T> {
    Unprotected(T),
    Checksummed(Checksummed<T>),
    Approximate(ApproximateTmr<T>),
    HistoryWeighted(HistoryWeightedTmr<T>),
    HealthWeighted(HealthWeightedTmr<T>),
}

impl<T: Approximable> ProtectedValue<T> {
    pub fn protect(value: T, level: ProtectionLevel, environment: &MissionEnvironment) -> Self {
        match level.resolve(environment) {
            ProtectionLevel::None => ProtectedValue::Unprotected(value),
            ProtectionLevel::ChecksumOnly => ProtectedValue::Checksummed(Checksummed::new(value)),
            ProtectionLevel::ApproximateTmr => {
                ProtectedValue::Approximate(ApproximateTmr::with_kinds(value, APPROXIMATE_LAYOUT))
            }
            ProtectionLevel::HealthWeightedTmr => {
                ProtectedValue::HistoryWeighted(HistoryWeightedTmr::new(value))
            }
            // resolve never yields Adaptive
            ProtectionLevel::FullTmr | ProtectionLevel::Adaptive => ProtectedValue::HealthWeighted(
                HealthWeightedTmr::with_config(value, VoterConfig::always_verify()),
            ),
        }
    }

    /// Read the value back; only checksum-only protection can fail
    pub fn recover(&mut self) -> Result<T, RecoverError> {
        Ok(match self {
            ProtectedValue::Unprotected(value) => *value,
            ProtectedValue::Checksummed(guarded) => guarded.get()?,
            ProtectedValue::Approximate(voter) => voter.get(),
            ProtectedValue::HistoryWeighted(voter) => voter.get(),
            ProtectedValue::HealthWeighted(voter) => voter.get(),
        })
    }

    pub fn set(&mut self, value: T) {
        match self {
            ProtectedValue::Unprotected(stored) => *stored = value,
            ProtectedValue::Checksummed(guarded) => guarded.set(value),
            ProtectedValue::Approximate(voter) => voter.set(value),
            ProtectedValue::HistoryWeighted(voter) => voter.set(value),
            ProtectedValue::HealthWeighted(voter) => voter.set(value),
        }
    }

    /// Restore redundant copies from the voted value
    ///
    /// Returns whether the stored value is now consistent. A checksum-only
    /// value cannot be repaired and reports whether it still verifies.
    pub fn repair(&mut self) -> bool {
        match self {
            ProtectedValue::Unprotected(_) => true,
            ProtectedValue::Checksummed(guarded) => guarded.verify(),
            ProtectedValue::Approximate(voter) => voter.repair(),
            ProtectedValue::HistoryWeighted(voter) => voter.repair(),
            ProtectedValue::HealthWeighted(voter) => voter.repair(),
        }
    }

    /// Concrete level this value is stored under
    pub fn level(&self) -> ProtectionLevel {
        match self {
            ProtectedValue::Unprotected(_) => ProtectionLevel::None,
            ProtectedValue::Checksummed(_) => ProtectionLevel::ChecksumOnly,
            ProtectedValue::Approximate(_) => ProtectionLevel::ApproximateTmr,
            ProtectedValue::HistoryWeighted(_) => ProtectionLevel::HealthWeightedTmr,
            ProtectedValue::HealthWeighted(_) => ProtectionLevel::FullTmr,
        }
    }

    /// Corrupt the stored bytes of one copy; copy 0 for single-copy levels
    ///
    /// Returns `false` if there is no such copy.
    pub fn inject_fault(&mut self, copy: usize, fault: impl FnOnce(&mut [u8])) -> bool {
        match self {
            ProtectedValue::Unprotected(value) if copy == 0 => {
                let mut bytes = value.to_bytes();
                fault(&mut bytes);
                *value = T::read_bytes(&bytes);
                true
            }
            ProtectedValue::Checksummed(guarded) if copy == 0 => {
                guarded.inject_fault(fault);
                true
            }
            ProtectedValue::Unprotected(_) | ProtectedValue::Checksummed(_) => false,
            ProtectedValue::Approximate(voter) => voter.inject_fault(copy, fault),
            ProtectedValue::HistoryWeighted(voter) => voter.inject_fault(copy, fault),
            ProtectedValue::HealthWeighted(voter) => voter.inject_fault(copy, fault),
        }
    }
}
