//! Pure voting over three copies
//!
//! [`vote`] is a function of the copies, their integrity flags and their
//! health. It takes no locks and reads no clock; the stateful voters wrap it
//! and feed the outcome back into their health scores through
//! [`HealthPolicy::apply`].

use super::COPIES;
use crate::domain::Protectable;
use rand::Rng;

/// How a read was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDecision {
    /// All three copies are intact and equal
    Unanimous,
    /// Two or more candidate copies agreed; the rest were outvoted or failed
    /// their checksum
    Majority,
    /// Only one copy passed its checksum
    Salvaged,
    /// Every candidate held a different value; one was picked
    Arbitrated,
}

/// What the vote concluded about a single copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyVerdict {
    Agreed,
    Dissented,
    ChecksumFailed,
    /// Picked without agreement, by salvage or arbitration
    Selected,
    /// Neither confirmed nor refuted
    Unjudged,
}

impl CopyVerdict {
    /// Whether the copy was shown to be wrong
    pub fn is_wrong(&self) -> bool {
        matches!(self, CopyVerdict::Dissented | CopyVerdict::ChecksumFailed)
    }
}

/// Result of one vote
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoteOutcome<T> {
    pub value: T,
    /// Copy the value was taken from
    pub source: usize,
    pub decision: VoteDecision,
    pub verdicts: [CopyVerdict; COPIES],
}

impl<T> VoteOutcome<T> {
    /// True when no copy held a majority
    pub fn is_disagreement(&self) -> bool {
        self.decision == VoteDecision::Arbitrated
    }

    /// True when a minority copy was outvoted or discarded
    pub fn is_correction(&self) -> bool {
        matches!(self.decision, VoteDecision::Majority | VoteDecision::Salvaged)
    }

    pub fn checksum_failures(&self) -> usize {
        self.verdicts
            .iter()
            .filter(|v| **v == CopyVerdict::ChecksumFailed)
            .count()
    }
}

/// Reconcile three copies
///
/// Copies agree when their byte representations are identical, so a flipped
/// sign bit on a zero is caught and identical NaNs agree.
///
/// Copies with `valid[i] == false` are excluded unless none is valid, in
/// which case all three take part (and keep their `ChecksumFailed`
/// verdicts). When every candidate differs, `select` is called with the
/// candidate indices and the health scores; an index it returns that is not
/// a candidate is replaced by the first candidate.
pub fn vote<T, F>(
    copies: &[T; COPIES],
    valid: [bool; COPIES],
    health: &[f64; COPIES],
    select: F,
) -> VoteOutcome<T>
where
    T: Protectable,
    F: FnOnce(&[usize], &[f64; COPIES]) -> usize,
{
    let mut verdicts = valid.map(|ok| {
        if ok {
            CopyVerdict::Unjudged
        } else {
            CopyVerdict::ChecksumFailed
        }
    });

    let mut candidates: Vec<usize> = (0..COPIES).filter(|&i| valid[i]).collect();
    let salvage_all = candidates.is_empty();
    if salvage_all {
        candidates = (0..COPIES).collect();
    }

    let majority = candidates.iter().copied().find(|&i| {
        candidates
            .iter()
            .filter(|&&j| copies[j].same_bits(&copies[i]))
            .count()
            >= 2
    });

    if let Some(source) = majority {
        let value = copies[source];
        if !salvage_all {
            for &i in &candidates {
                verdicts[i] = if copies[i].same_bits(&value) {
                    CopyVerdict::Agreed
                } else {
                    CopyVerdict::Dissented
                };
            }
        }
        let unanimous = verdicts.iter().all(|v| *v == CopyVerdict::Agreed);
        return VoteOutcome {
            value,
            source,
            decision: if unanimous {
                VoteDecision::Unanimous
            } else {
                VoteDecision::Majority
            },
            verdicts,
        };
    }

    let (source, decision) = if candidates.len() == 1 {
        (candidates[0], VoteDecision::Salvaged)
    } else {
        let picked = select(&candidates, health);
        let picked = if candidates.contains(&picked) {
            picked
        } else {
            candidates[0]
        };
        (picked, VoteDecision::Arbitrated)
    };

    if !salvage_all {
        verdicts[source] = CopyVerdict::Selected;
    }
    VoteOutcome {
        value: copies[source],
        source,
        decision,
        verdicts,
    }
}

/// Pick a candidate with probability proportional to its health
pub fn weighted_choice<R: Rng + ?Sized>(
    candidates: &[usize],
    health: &[f64; COPIES],
    rng: &mut R,
) -> usize {
    let total: f64 = candidates.iter().map(|&i| health[i].max(0.0)).sum();
    if candidates.is_empty() || total <= 0.0 || !total.is_finite() {
        return candidates.first().copied().unwrap_or(0);
    }

    let mut target = rng.random::<f64>() * total;
    for &i in candidates {
        let weight = health[i].max(0.0);
        if target < weight {
            return i;
        }
        target -= weight;
    }
    candidates[candidates.len() - 1]
}

/// Candidate with the highest health, lowest index on ties
pub fn most_trusted(candidates: &[usize], health: &[f64; COPIES]) -> usize {
    candidates
        .iter()
        .copied()
        .reduce(|best, i| if health[i] > health[best] { i } else { best })
        .unwrap_or(0)
}

/// Health adjustments applied after each vote
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthPolicy {
    /// Added to each copy that agreed with the majority
    pub reward: f64,
    /// Subtracted from a copy that was outvoted
    pub dissent_penalty: f64,
    /// Subtracted from a copy that failed its checksum
    pub checksum_penalty: f64,
    /// Extra deduction when a copy keeps being wrong
    pub trend_penalty: f64,
    pub floor: f64,
    pub ceiling: f64,
}

impl Default for HealthPolicy {
    fn default() -> Self {
        Self {
            reward: 0.05,
            dissent_penalty: 0.2,
            checksum_penalty: 0.3,
            trend_penalty: 0.1,
            floor: 0.1,
            ceiling: 1.0,
        }
    }
}

impl HealthPolicy {
    /// Bounds must satisfy `0 < floor <= ceiling <= 1` and every adjustment
    /// must be finite and non-negative
    pub fn validate(&self) -> Result<(), PolicyError> {
        let adjustments = [
            ("reward", self.reward),
            ("dissent_penalty", self.dissent_penalty),
            ("checksum_penalty", self.checksum_penalty),
            ("trend_penalty", self.trend_penalty),
        ];
        for (name, value) in adjustments {
            if !value.is_finite() || value < 0.0 {
                return Err(PolicyError::InvalidAdjustment { name, value });
            }
        }
        if !(self.floor > 0.0 && self.floor <= self.ceiling && self.ceiling <= 1.0) {
            return Err(PolicyError::InvalidBounds {
                floor: self.floor,
                ceiling: self.ceiling,
            });
        }
        Ok(())
    }

    pub fn clamp(&self, health: f64) -> f64 {
        health.clamp(self.floor, self.ceiling)
    }

    /// Adjust health scores from a vote's verdicts
    pub fn apply(&self, health: &mut [f64; COPIES], verdicts: &[CopyVerdict; COPIES]) {
        for (score, verdict) in health.iter_mut().zip(verdicts) {
            let delta = match verdict {
                CopyVerdict::Agreed => self.reward,
                CopyVerdict::Dissented => -self.dissent_penalty,
                CopyVerdict::ChecksumFailed => -self.checksum_penalty,
                CopyVerdict::Selected | CopyVerdict::Unjudged => 0.0,
            };
            *score = self.clamp(*score + delta);
        }
    }

    /// Apply the trend deduction to one score
    pub fn penalize_trend(&self, health: &mut f64) {
        *health = self.clamp(*health - self.trend_penalty);
    }
}

/// Rejected health policy
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PolicyError {
    #[error("health adjustment {name} must be finite and non-negative, got {value}")]
    InvalidAdjustment { name: &'static str, value: f64 },

    #[error("health bounds must satisfy 0 < floor <= ceiling <= 1, got [{floor}, {ceiling}]")]
    InvalidBounds { floor: f64, ceiling: f64 },
}
