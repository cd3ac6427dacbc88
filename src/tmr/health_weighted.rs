//! Health-weighted TMR with CRC-tagged copies
//!
//! All mutable state lives behind one `parking_lot::Mutex`, held for the
//! duration of a vote and, when due, a checksum pass over the three copies.
//! Between checksum passes the integrity flags from the last pass are reused;
//! a copy corrupted in the meantime is still caught by the majority vote.

use super::config::VoterConfig;
use super::copies::CopySet;
use super::vote::{most_trusted, vote, weighted_choice, VoteOutcome};
use super::{count_errors, VoterState, VoterStats, COPIES};
use crate::domain::Protectable;
use log::{debug, trace};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Instant;

struct Inner<T> {
    store: CopySet<T>,
    valid: [bool; COPIES],
    health: [f64; COPIES],
    last_verified: Option<Instant>,
    stats: VoterStats,
    error_counters: [u64; COPIES],
    state: VoterState,
    rng: StdRng,
}

impl<T: Protectable> Inner<T> {
    fn verify_if_due(&mut self, config: &VoterConfig) {
        let due = match self.last_verified {
            None => true,
            Some(at) => at.elapsed() >= config.verification_interval,
        };
        if due {
            self.valid = self.store.verify();
            self.last_verified = Some(Instant::now());
        }
    }

    fn vote(&mut self, config: &VoterConfig) -> VoteOutcome<T> {
        self.verify_if_due(config);
        let rng = &mut self.rng;
        let outcome = vote(&self.store.copies, self.valid, &self.health, |candidates, health| {
            weighted_choice(candidates, health, rng)
        });

        config.policy.apply(&mut self.health, &outcome.verdicts);
        count_errors(&mut self.error_counters, &outcome.verdicts);
        self.stats.record(&outcome);
        self.state = VoterState::after(outcome.decision);

        if outcome.is_disagreement() {
            debug!(
                "all copies disagree, took copy {} (health {:?})",
                outcome.source, self.health
            );
        } else if outcome.is_correction() {
            trace!("outvoted copies: {:?}", outcome.verdicts);
        }
        outcome
    }

    fn write_all(&mut self, value: T) {
        self.store.write_all(value);
        self.valid = [true; COPIES];
        self.last_verified = Some(Instant::now());
        self.state = VoterState::Consistent;
    }
}

/// Three CRC-tagged copies reconciled by a health-weighted vote
pub struct HealthWeightedTmr<T> {
    inner: Mutex<Inner<T>>,
    config: VoterConfig,
}

impl<T: Protectable> HealthWeightedTmr<T> {
    pub fn new(value: T) -> Self {
        Self::with_config(value, VoterConfig::default())
    }

    pub fn with_config(value: T, config: VoterConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            inner: Mutex::new(Inner {
                store: CopySet::new(value),
                valid: [true; COPIES],
                health: [config.policy.ceiling; COPIES],
                last_verified: None,
                stats: VoterStats::default(),
                error_counters: [0; COPIES],
                state: VoterState::Consistent,
                rng,
            }),
            config,
        }
    }

    /// Voted value
    pub fn get(&self) -> T {
        self.inner.lock().vote(&self.config).value
    }

    /// Voted value together with how it was reached
    pub fn get_with_outcome(&self) -> VoteOutcome<T> {
        self.inner.lock().vote(&self.config)
    }

    /// Overwrite all copies and restore full trust
    pub fn set(&self, value: T) {
        let mut inner = self.inner.lock();
        inner.write_all(value);
        inner.health = [self.config.policy.ceiling; COPIES];
        inner.stats.writes += 1;
    }

    /// Write the voted value back to every copy
    ///
    /// Returns `false` and leaves the copies alone when the vote had no
    /// majority, since arbitration is only a guess.
    pub fn repair(&self) -> bool {
        let mut inner = self.inner.lock();
        let outcome = inner.vote(&self.config);
        if outcome.is_disagreement() {
            return false;
        }
        inner.write_all(outcome.value);
        inner.stats.repairs += 1;
        true
    }

    /// Copy the most trusted intact copy over the other two
    ///
    /// Re-verifies every checksum first. Returns `false` if no copy is
    /// intact.
    pub fn regenerate(&self) -> bool {
        let mut inner = self.inner.lock();
        inner.valid = inner.store.verify();
        inner.last_verified = Some(Instant::now());

        let candidates: Vec<usize> = (0..COPIES).filter(|&i| inner.valid[i]).collect();
        if candidates.is_empty() {
            return false;
        }
        let source = most_trusted(&candidates, &inner.health);
        let value = inner.store.copies[source];
        inner.write_all(value);
        inner.stats.repairs += 1;
        true
    }

    /// Force a checksum pass and return which copies are intact
    pub fn verify(&self) -> [bool; COPIES] {
        let mut inner = self.inner.lock();
        inner.valid = inner.store.verify();
        inner.last_verified = Some(Instant::now());
        inner.valid
    }

    pub fn health_scores(&self) -> [f64; COPIES] {
        self.inner.lock().health
    }

    pub fn stats(&self) -> VoterStats {
        self.inner.lock().stats
    }

    /// Times each copy was outvoted or failed its checksum
    pub fn error_counters(&self) -> [u64; COPIES] {
        self.inner.lock().error_counters
    }

    pub fn state(&self) -> VoterState {
        self.inner.lock().state
    }

    pub fn config(&self) -> &VoterConfig {
        &self.config
    }

    /// Corrupt the bytes of one copy without touching its checksum
    ///
    /// Returns `false` if `copy` is out of range.
    pub fn inject_fault(&self, copy: usize, fault: impl FnOnce(&mut [u8])) -> bool {
        self.inner.lock().store.inject_fault(copy, fault)
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for HealthWeightedTmr<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("HealthWeightedTmr")
            .field("copies", &inner.store.copies)
            .field("health", &inner.health)
            .field("state", &inner.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tmr::VoteDecision;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn seeded(value: u32) -> HealthWeightedTmr<u32> {
        HealthWeightedTmr::with_config(value, VoterConfig::always_verify().with_seed(1))
    }

    #[test]
    fn test_clean_read() {
        let voter = seeded(42);
        assert_eq!(voter.get(), 42);
        assert_eq!(voter.state(), VoterState::Consistent);
        assert_eq!(voter.stats().disagreements, 0);
        assert_eq!(voter.health_scores(), [1.0; 3]);
    }

    #[test]
    fn test_checksum_failure_penalized() {
        let voter = seeded(42);
        voter.inject_fault(0, |bytes| bytes[0] = 0xFF);

        let outcome = voter.get_with_outcome();
        assert_eq!(outcome.value, 42);
        assert_eq!(outcome.decision, VoteDecision::Majority);

        let health = voter.health_scores();
        assert!((health[0] - 0.7).abs() < 1e-12);
        assert_eq!(voter.error_counters(), [1, 0, 0]);
        assert_eq!(voter.stats().checksum_failures, 1);
        assert_eq!(voter.state(), VoterState::Recovering);
    }

    #[test]
    fn test_first_read_verifies_even_with_long_interval() {
        let config = VoterConfig {
            verification_interval: Duration::from_secs(3600),
            ..VoterConfig::default()
        };
        let voter = HealthWeightedTmr::with_config(9u64, config);
        voter.inject_fault(2, |bytes| bytes[7] ^= 0x40);
        assert_eq!(
            voter.get_with_outcome().verdicts[2],
            crate::tmr::CopyVerdict::ChecksumFailed
        );
    }

    #[test]
    fn test_repair_restores_copies() {
        let voter = seeded(42);
        voter.inject_fault(1, |bytes| bytes[1] ^= 0x10);
        assert!(voter.repair());
        assert_eq!(voter.verify(), [true; 3]);
        assert_eq!(voter.state(), VoterState::Consistent);
        assert_eq!(voter.get_with_outcome().decision, VoteDecision::Unanimous);
        assert_eq!(voter.stats().repairs, 1);
    }

    #[test]
    fn test_repair_refuses_to_guess() {
        let voter = seeded(0);
        voter.inject_fault(0, |bytes| bytes[0] = 1);
        voter.inject_fault(1, |bytes| bytes[0] = 2);
        voter.inject_fault(2, |bytes| bytes[0] = 3);
        // all three fail their checksum and all differ
        assert!(!voter.repair());
        assert_eq!(voter.state(), VoterState::Disagreeing);
        assert_eq!(voter.stats().disagreements, 1);
    }

    #[test]
    fn test_regenerate_uses_trusted_copy() {
        let voter = seeded(77);
        voter.inject_fault(0, |bytes| bytes[0] ^= 1);
        voter.inject_fault(1, |bytes| bytes[0] ^= 2);
        assert!(voter.regenerate());
        assert_eq!(voter.get(), 77);
        assert_eq!(voter.verify(), [true; 3]);

        voter.inject_fault(0, |bytes| bytes[0] ^= 1);
        voter.inject_fault(1, |bytes| bytes[0] ^= 2);
        voter.inject_fault(2, |bytes| bytes[0] ^= 4);
        assert!(!voter.regenerate());
    }

    #[test]
    fn test_set_resets_health() {
        let voter = seeded(5);
        voter.inject_fault(2, |bytes| bytes[0] ^= 0xAA);
        voter.get();
        assert!(voter.health_scores()[2] < 1.0);
        voter.set(6);
        assert_eq!(voter.health_scores(), [1.0; 3]);
        assert_eq!(voter.get(), 6);
        assert_eq!(voter.stats().writes, 1);
    }

    #[test]
    fn test_shared_across_threads() {
        let voter = Arc::new(seeded(1000));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let voter = Arc::clone(&voter);
                thread::spawn(move || (0..50).all(|_| voter.get() == 1000))
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert_eq!(voter.stats().reads, 200);
    }
}
