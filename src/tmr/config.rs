//! Configuration for the stateful voters

use super::vote::{HealthPolicy, PolicyError};
use std::time::Duration;

/// Default spacing between full checksum re-verifications
pub const DEFAULT_VERIFICATION_INTERVAL: Duration = Duration::from_secs(5);

/// Configuration for health-tracking voters
#[derive(Debug, Clone)]
pub struct VoterConfig {
    /// Minimum time between checksum re-verifications on read
    /// (zero = verify every read)
    pub verification_interval: Duration,
    pub policy: HealthPolicy,
    /// Seed for arbitration between fully disagreeing copies
    /// (`None` = seeded from the OS)
    pub seed: Option<u64>,
}

impl Default for VoterConfig {
    fn default() -> Self {
        Self {
            verification_interval: DEFAULT_VERIFICATION_INTERVAL,
            policy: HealthPolicy::default(),
            seed: None,
        }
    }
}

impl VoterConfig {
    pub fn new(verification_interval: Duration, policy: HealthPolicy) -> Result<Self, PolicyError> {
        policy.validate()?;
        Ok(Self {
            verification_interval,
            policy,
            seed: None,
        })
    }

    /// Verify checksums on every read
    pub fn always_verify() -> Self {
        Self {
            verification_interval: Duration::ZERO,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = VoterConfig::default();
        assert_eq!(config.verification_interval, Duration::from_secs(5));
        assert_eq!(config.policy, HealthPolicy::default());
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_new_validates_policy() {
        let bad = HealthPolicy {
            ceiling: 1.5,
            ..Default::default()
        };
        assert!(VoterConfig::new(Duration::ZERO, bad).is_err());
        let config = VoterConfig::new(Duration::from_millis(10), HealthPolicy::default())
            .unwrap()
            .with_seed(3);
        assert_eq!(config.seed, Some(3));
    }
}
