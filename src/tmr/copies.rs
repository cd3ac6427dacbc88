//! Triplicated storage with per-copy CRC-32 tags

use super::COPIES;
use crate::domain::Protectable;

/// CRC-32 of a value's byte representation
pub fn checksum_of<T: Protectable>(value: &T) -> u32 {
    crc32fast::hash(&value.to_bytes())
}

/// Three stored copies and the checksum recorded when each was written
#[derive(Debug, Clone)]
pub(crate) struct CopySet<T> {
    pub copies: [T; COPIES],
    pub checksums: [u32; COPIES],
}

impl<T: Protectable> CopySet<T> {
    pub fn new(value: T) -> Self {
        let checksum = checksum_of(&value);
        Self {
            copies: [value; COPIES],
            checksums: [checksum; COPIES],
        }
    }

    pub fn from_copies(copies: [T; COPIES]) -> Self {
        Self {
            checksums: copies.map(|copy| checksum_of(&copy)),
            copies,
        }
    }

    pub fn store(&mut self, index: usize, value: T) {
        self.copies[index] = value;
        self.checksums[index] = checksum_of(&value);
    }

    pub fn write_all(&mut self, value: T) {
        for index in 0..COPIES {
            self.store(index, value);
        }
    }

    /// Recompute each copy's checksum against the recorded tag
    pub fn verify(&self) -> [bool; COPIES] {
        std::array::from_fn(|i| checksum_of(&self.copies[i]) == self.checksums[i])
    }

    /// Mutate the bytes of one stored copy without updating its tag
    pub fn inject_fault(&mut self, index: usize, fault: impl FnOnce(&mut [u8])) -> bool {
        match self.copies.get_mut(index) {
            Some(copy) => {
                let mut bytes = copy.to_bytes();
                fault(&mut bytes);
                *copy = T::read_bytes(&bytes);
                true
            }
            None => false,
        }
    }
}
