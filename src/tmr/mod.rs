//! Triple modular redundancy
//!
//! Three voters share the same reconciliation core ([`vote::vote`]) and
//! differ in how they track trust:
//!
//! - [`HealthWeightedTmr`]: thread-safe, CRC-tagged copies with health
//!   scores and throttled re-verification
//! - [`HistoryWeightedTmr`]: single-owner, adds a rolling per-copy history
//!   and penalizes copies that keep being wrong
//! - [`ApproximateTmr`]: copies stored under lossy approximations, compared
//!   in a common projection
//!
//! None of them fails on disagreement. The worst case returns a best-effort
//! value and increments [`VoterStats::disagreements`].

pub mod approximate;
pub mod checksummed;
pub mod config;
mod copies;
pub mod health_weighted;
pub mod history_weighted;
pub mod vote;

pub use approximate::{ApproximateTmr, ApproximationKind};
pub use checksummed::{ChecksumMismatch, Checksummed};
pub use config::{VoterConfig, DEFAULT_VERIFICATION_INTERVAL};
pub use copies::checksum_of;
pub use health_weighted::HealthWeightedTmr;
pub use history_weighted::{HistoryWeightedTmr, HISTORY_LEN};
pub use vote::{CopyVerdict, HealthPolicy, PolicyError, VoteDecision, VoteOutcome};

/// Number of stored copies
pub const COPIES: usize = 3;

/// Where a voter stands after its most recent operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoterState {
    /// Last read found every copy intact and equal
    #[default]
    Consistent,
    /// Last read had no majority and arbitrated between copies
    Disagreeing,
    /// Last read outvoted or discarded a copy that has not been repaired yet
    Recovering,
}

impl VoterState {
    pub(crate) fn after(decision: VoteDecision) -> Self {
        match decision {
            VoteDecision::Unanimous => VoterState::Consistent,
            VoteDecision::Majority | VoteDecision::Salvaged => VoterState::Recovering,
            VoteDecision::Arbitrated => VoterState::Disagreeing,
        }
    }
}

/// Operation counters shared by all voters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoterStats {
    pub reads: u64,
    pub writes: u64,
    /// Copies found failing their checksum, summed over reads
    pub checksum_failures: u64,
    /// Reads where every candidate copy differed
    pub disagreements: u64,
    /// Reads where a minority copy was outvoted or discarded
    pub corrections: u64,
    /// Successful repair or regenerate calls
    pub repairs: u64,
}

impl VoterStats {
    pub(crate) fn record<T>(&mut self, outcome: &VoteOutcome<T>) {
        self.reads += 1;
        self.checksum_failures += outcome.checksum_failures() as u64;
        if outcome.is_disagreement() {
            self.disagreements += 1;
        }
        if outcome.is_correction() {
            self.corrections += 1;
        }
    }
}

/// Bump the error counter of every copy the vote showed to be wrong
pub(crate) fn count_errors(counters: &mut [u64; COPIES], verdicts: &[CopyVerdict; COPIES]) {
    for (counter, verdict) in counters.iter_mut().zip(verdicts) {
        if verdict.is_wrong() {
            *counter += 1;
        }
    }
}
