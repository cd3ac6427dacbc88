//! History-weighted TMR
//!
//! Like the health-weighted voter but single-owner and deterministic: every
//! read verifies checksums, and a total disagreement resolves to the most
//! trusted copy. Each copy keeps a rolling window of its last
//! [`HISTORY_LEN`] outcomes; a copy that was wrong in at least two of its
//! last three outcomes loses an extra `trend_penalty` on top of the usual
//! deduction.

use super::copies::CopySet;
use super::vote::{most_trusted, vote, CopyVerdict, HealthPolicy, VoteOutcome};
use super::{count_errors, VoterState, VoterStats, COPIES};
use crate::domain::Protectable;
use log::debug;
use std::collections::VecDeque;

/// Outcomes remembered per copy
pub const HISTORY_LEN: usize = 10;

/// Outcomes inspected for a trend
const TREND_WINDOW: usize = 3;

/// Wrong outcomes within the window that trigger the trend penalty
const TREND_THRESHOLD: usize = 2;

/// Three CRC-tagged copies with per-copy outcome history
#[derive(Debug, Clone)]
pub struct HistoryWeightedTmr<T> {
    store: CopySet<T>,
    health: [f64; COPIES],
    /// `true` marks an outcome where the copy was wrong, newest at the back
    history: [VecDeque<bool>; COPIES],
    policy: HealthPolicy,
    stats: VoterStats,
    error_counters: [u64; COPIES],
    state: VoterState,
}

impl<T: Protectable> HistoryWeightedTmr<T> {
    pub fn new(value: T) -> Self {
        Self::with_policy(value, HealthPolicy::default())
    }

    pub fn with_policy(value: T, policy: HealthPolicy) -> Self {
        Self {
            store: CopySet::new(value),
            health: [policy.ceiling; COPIES],
            history: std::array::from_fn(|_| VecDeque::with_capacity(HISTORY_LEN)),
            policy,
            stats: VoterStats::default(),
            error_counters: [0; COPIES],
            state: VoterState::Consistent,
        }
    }

    pub fn get(&mut self) -> T {
        self.get_with_outcome().value
    }

    pub fn get_with_outcome(&mut self) -> VoteOutcome<T> {
        let valid = self.store.verify();
        let outcome = vote(&self.store.copies, valid, &self.health, most_trusted);

        self.policy.apply(&mut self.health, &outcome.verdicts);
        self.record_history(&outcome.verdicts);
        count_errors(&mut self.error_counters, &outcome.verdicts);
        self.stats.record(&outcome);
        self.state = VoterState::after(outcome.decision);

        if outcome.is_disagreement() {
            debug!(
                "all copies disagree, trusting copy {} (health {:?})",
                outcome.source, self.health
            );
        }
        outcome
    }

    fn record_history(&mut self, verdicts: &[CopyVerdict; COPIES]) {
        for (copy, verdict) in verdicts.iter().enumerate() {
            let wrong = match verdict {
                CopyVerdict::Agreed => false,
                CopyVerdict::Dissented | CopyVerdict::ChecksumFailed => true,
                CopyVerdict::Selected | CopyVerdict::Unjudged => continue,
            };

            let history = &mut self.history[copy];
            if history.len() == HISTORY_LEN {
                history.pop_front();
            }
            history.push_back(wrong);

            if wrong && Self::is_trending_wrong(history) {
                self.policy.penalize_trend(&mut self.health[copy]);
            }
        }
    }

    fn is_trending_wrong(history: &VecDeque<bool>) -> bool {
        history.iter().rev().take(TREND_WINDOW).filter(|&&w| w).count() >= TREND_THRESHOLD
    }

    /// Overwrite all copies, restore full trust and forget history
    pub fn set(&mut self, value: T) {
        self.store.write_all(value);
        self.health = [self.policy.ceiling; COPIES];
        for history in &mut self.history {
            history.clear();
        }
        self.stats.writes += 1;
        self.state = VoterState::Consistent;
    }

    /// Write the voted value back to every copy; `false` if there was no
    /// majority
    pub fn repair(&mut self) -> bool {
        let outcome = self.get_with_outcome();
        if outcome.is_disagreement() {
            return false;
        }
        self.store.write_all(outcome.value);
        self.stats.repairs += 1;
        self.state = VoterState::Consistent;
        true
    }

    /// Copy the most trusted intact copy over the others; `false` if none is
    /// intact
    pub fn regenerate(&mut self) -> bool {
        let valid = self.store.verify();
        let candidates: Vec<usize> = (0..COPIES).filter(|&i| valid[i]).collect();
        if candidates.is_empty() {
            return false;
        }
        let value = self.store.copies[most_trusted(&candidates, &self.health)];
        self.store.write_all(value);
        self.stats.repairs += 1;
        self.state = VoterState::Consistent;
        true
    }

    pub fn verify(&self) -> [bool; COPIES] {
        self.store.verify()
    }

    pub fn health_scores(&self) -> [f64; COPIES] {
        self.health
    }

    /// Outcome history of one copy, oldest first; `true` means wrong
    pub fn history(&self, copy: usize) -> Option<Vec<bool>> {
        self.history
            .get(copy)
            .map(|history| history.iter().copied().collect())
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
