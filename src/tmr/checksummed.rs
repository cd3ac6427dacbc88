//! Single copy guarded by a CRC-32 tag
//!
//! Detection only: a mismatch is reported, never corrected.

use super::copies::checksum_of;
use crate::domain::Protectable;
use thiserror::Error;

/// A stored value no longer matches the checksum recorded when it was written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("CRC-32 mismatch: recorded {expected:#010x}, computed {actual:#010x}")]
pub struct ChecksumMismatch {
    pub expected: u32,
    pub actual: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Checksummed<T> {
    value: T,
    checksum: u32,
}

impl<T: Protectable> Checksummed<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            checksum: checksum_of(&value),
        }
    }

    pub fn get(&self) -> Result<T, ChecksumMismatch> {
        let actual = checksum_of(&self.value);
        if actual == self.checksum {
            Ok(self.value)
        } else {
            Err(ChecksumMismatch {
                expected: self.checksum,
                actual,
            })
        }
    }

    pub fn set(&mut self, value: T) {
        *self = Self::new(value);
    }

    pub fn verify(&self) -> bool {
        self.get().is_ok()
    }

    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    /// Corrupt the stored bytes without updating the checksum
    pub fn inject_fault(&mut self, fault: impl FnOnce(&mut [u8])) {
        let mut bytes = self.value.to_bytes();
        fault(&mut bytes);
        self.value = T::read_bytes(&bytes);
    }
}
