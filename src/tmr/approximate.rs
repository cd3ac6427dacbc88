//! Approximate TMR
//!
//! The three copies are stored under different lossy representations. To
//! vote, every copy is projected through all approximations in use so that
//! copies derived from the same value compare equal:
//!
//! ```text
//! project(x) = custom(reduce(limit(reduce(x))))
//! ```
//!
//! with each stage present only if some copy uses it. Reduction is applied on
//! both sides of the range limit because clamping can land on a value that
//! still has low-order bits set.
//!
//! Of the copies in the winning group the one with the highest fidelity is
//! returned, so an intact `Exact` copy always wins over a reduced one.

use super::copies::CopySet;
use super::vote::{vote, CopyVerdict, VoteOutcome};
use super::{count_errors, VoterState, VoterStats, COPIES};
use crate::domain::Approximable;
use log::debug;

/// Representation a copy is stored under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApproximationKind {
    Exact,
    /// Low-order bits cleared
    ReducedPrecision,
    /// Clamped into a conservative range
    RangeLimited,
    /// Caller-supplied transform
    Custom,
}

impl ApproximationKind {
    /// Lower is closer to the original value
    pub fn fidelity_rank(&self) -> u8 {
        match self {
            ApproximationKind::Exact => 0,
            ApproximationKind::RangeLimited => 1,
            ApproximationKind::ReducedPrecision => 2,
            ApproximationKind::Custom => 3,
        }
    }
}

/// Default layout: one exact copy and two cheaper representations
pub const DEFAULT_KINDS: [ApproximationKind; COPIES] = [
    ApproximationKind::Exact,
    ApproximationKind::ReducedPrecision,
    ApproximationKind::RangeLimited,
];

/// Three copies under different approximations
#[derive(Debug, Clone)]
pub struct ApproximateTmr<T> {
    store: CopySet<T>,
    kinds: [ApproximationKind; COPIES],
    custom: Option<fn(T) -> T>,
    stats: VoterStats,
    error_counters: [u64; COPIES],
    state: VoterState,
}

impl<T: Approximable> ApproximateTmr<T> {
    pub fn new(value: T) -> Self {
        Self::with_kinds(value, DEFAULT_KINDS)
    }

    pub fn with_kinds(value: T, kinds: [ApproximationKind; COPIES]) -> Self {
        Self::build(value, kinds, None)
    }

    /// Copies tagged `Custom` are stored through `transform`, which should be
    /// idempotent
    pub fn with_custom(value: T, kinds: [ApproximationKind; COPIES], transform: fn(T) -> T) -> Self {
        Self::build(value, kinds, Some(transform))
    }

    fn build(value: T, kinds: [ApproximationKind; COPIES], custom: Option<fn(T) -> T>) -> Self {
        let mut voter = Self {
            store: CopySet::new(value),
            kinds,
            custom,
            stats: VoterStats::default(),
            error_counters: [0; COPIES],
            state: VoterState::Consistent,
        };
        voter.store_all(value);
        voter
    }

    /// Value as stored under a given approximation
    pub fn approximate(&self, kind: ApproximationKind, value: T) -> T {
        match kind {
            ApproximationKind::Exact => value,
            ApproximationKind::ReducedPrecision => value.reduce_precision(),
            ApproximationKind::RangeLimited => value.limit_range(),
            ApproximationKind::Custom => self.custom.map_or(value, |f| f(value)),
        }
    }

    fn uses(&self, kind: ApproximationKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// Common representation all copies of one value map to
    pub fn project(&self, value: T) -> T {
        let reduce = self.uses(ApproximationKind::ReducedPrecision);
        let mut x = value;
        if reduce {
            x = x.reduce_precision();
        }
        if self.uses(ApproximationKind::RangeLimited) {
            x = x.limit_range();
            if reduce {
                x = x.reduce_precision();
            }
        }
        if self.uses(ApproximationKind::Custom) {
            if let Some(f) = self.custom {
                x = f(x);
            }
        }
        x
    }

    fn store_all(&mut self, value: T) {
        for copy in 0..COPIES {
            let stored = self.approximate(self.kinds[copy], value);
            self.store.store(copy, stored);
        }
    }

    pub fn get(&mut self) -> T {
        self.get_with_outcome().value
    }

    /// Vote in projected space and return the best stored copy of the winner
    pub fn get_with_outcome(&mut self) -> VoteOutcome<T> {
        let valid = self.store.verify();
        let projected = self.store.copies.map(|copy| self.project(copy));
        let kinds = self.kinds;

        let mut outcome = vote(&projected, valid, &[1.0; COPIES], |candidates, _| {
            candidates
                .iter()
                .copied()
                .find(|&i| kinds[i] == ApproximationKind::Exact)
                .unwrap_or(candidates[0])
        });

        if !outcome.is_disagreement() {
            let group = (0..COPIES).filter(|&i| {
                outcome.verdicts[i] == CopyVerdict::Agreed
                    || (i == outcome.source && outcome.verdicts[i] != CopyVerdict::Dissented)
            });
            if let Some(best) = group.min_by_key(|&i| self.kinds[i].fidelity_rank()) {
                outcome.source = best;
            }
        }
        outcome.value = self.store.copies[outcome.source];

        count_errors(&mut self.error_counters, &outcome.verdicts);
        self.stats.record(&outcome);
        self.state = VoterState::after(outcome.decision);
        if outcome.is_disagreement() {
            debug!(
                "approximate copies disagree, falling back to copy {} ({:?})",
                outcome.source, self.kinds[outcome.source]
            );
        }
        outcome
    }

    pub fn set(&mut self, value: T) {
        self.store_all(value);
        self.stats.writes += 1;
        self.state = VoterState::Consistent;
    }

    /// Re-derive every copy from the voted value; `false` if there was no
    /// majority
    pub fn repair(&mut self) -> bool {
        let outcome = self.get_with_outcome();
        if outcome.is_disagreement() {
            return false;
        }
        self.store_all(outcome.value);
        self.stats.repairs += 1;
        self.state = VoterState::Consistent;
        true
    }

    /// Whether every copy still matches its checksum
    pub fn verify(&self) -> bool {
        self.store.verify().iter().all(|&ok| ok)
    }

    pub fn kinds(&self) -> [ApproximationKind; COPIES] {
        self.kinds
    }

    /// Stored copies, as approximated
    pub fn copies(&self) -> [T; COPIES] {
        self.store.copies
    }

    pub fn stats(&self) -> VoterStats {
        self.stats
    }

    pub fn error_counters(&self) -> [u64; COPIES] {
        self.error_counters
    }

    pub fn state(&self) -> VoterState {
        self.state
    }

    pub fn inject_fault(&mut self, copy: usize, fault: impl FnOnce(&mut [u8])) -> bool {
        self.store.inject_fault(copy, fault)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tmr::VoteDecision;
    use ApproximationKind::*;

    #[test]
    fn test_copies_stored_approximated() {
        let voter = ApproximateTmr::new(0xFFFF_FFFFu32);
        assert_eq!(voter.copies(), [0xFFFF_FFFF, 0xFFFF_FFF8, 0x7FFF_FFFF]);
    }

    #[test]
    fn test_clean_read_returns_exact_copy() {
        let mut voter = ApproximateTmr::new(0xFFFF_FFFFu32);
        let outcome = voter.get_with_outcome();
        assert_eq!(outcome.decision, VoteDecision::Unanimous);
        assert_eq!(outcome.value, 0xFFFF_FFFF);
        assert_eq!(outcome.source, 0);
    }

    #[test]
    fn test_float_copies_agree() {
        let mut voter = ApproximateTmr::new(2.5e7f32);
        assert_eq!(voter.get_with_outcome().decision, VoteDecision::Unanimous);
        assert_eq!(voter.get(), 2.5e7);
    }

    #[test]
    fn test_corrupt_exact_copy_falls_back_to_approximation() {
        let mut voter = ApproximateTmr::with_kinds(1003u32, [ReducedPrecision, ReducedPrecision, Exact]);
        voter.inject_fault(2, |bytes| bytes[2] ^= 0x01);

        let outcome = voter.get_with_outcome();
        assert_eq!(outcome.decision, VoteDecision::Majority);
        assert_eq!(outcome.value, 1000);
        assert_eq!(outcome.verdicts[2], CopyVerdict::ChecksumFailed);

        assert!(voter.repair());
        assert!(voter.verify());
        assert_eq!(voter.copies(), [1000, 1000, 1000]);
    }

    #[test]
    fn test_total_disagreement_prefers_exact() {
        let mut voter = ApproximateTmr::with_kinds(8u8, [ReducedPrecision, Exact, RangeLimited]);
        voter.inject_fault(0, |bytes| bytes[0] = 0x40);
        voter.inject_fault(2, |bytes| bytes[0] = 0x20);
        // copies 0 and 2 fail their checksum, copy 1 is salvaged
        assert_eq!(voter.get(), 8);

        let mut voter = ApproximateTmr::with_kinds(8u8, [ReducedPrecision, Exact, RangeLimited]);
        voter.inject_fault(0, |bytes| bytes[0] = 0x40);
        voter.inject_fault(1, |bytes| bytes[0] = 0x10);
        voter.inject_fault(2, |bytes| bytes[0] = 0x20);
        let outcome = voter.get_with_outcome();
        assert!(outcome.is_disagreement());
        assert_eq!(outcome.source, 1);
        assert!(!voter.repair());
        assert_eq!(voter.stats().disagreements, 2);
    }

    #[test]
    fn test_custom_transform() {
        fn even(x: u16) -> u16 {
            x & !1
        }
        let mut voter = ApproximateTmr::with_custom(301u16, [Exact, Custom, Custom], even);
        assert_eq!(voter.copies(), [301, 300, 300]);
        assert_eq!(voter.get_with_outcome().decision, VoteDecision::Unanimous);
        assert_eq!(voter.get(), 301);
    }
}
