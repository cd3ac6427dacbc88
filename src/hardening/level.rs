//! Protection levels and their cost model

use std::fmt;

/// Protection applied to one component, cheapest first
///
/// `Adaptive` sorts last but is not part of the escalation ladder: it
/// defers the choice to [`MissionEnvironment`] when the value is wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ProtectionLevel {
    #[default]
    None,
    ChecksumOnly,
    ApproximateTmr,
    HealthWeightedTmr,
    FullTmr,
    Adaptive,
}

impl ProtectionLevel {
    /// The escalation ladder, weakest first
    pub const LADDER: [ProtectionLevel; 5] = [
        ProtectionLevel::None,
        ProtectionLevel::ChecksumOnly,
        ProtectionLevel::ApproximateTmr,
        ProtectionLevel::HealthWeightedTmr,
        ProtectionLevel::FullTmr,
    ];

    /// Resource cost before the complexity factor
    pub fn base_cost(&self) -> f64 {
        match self {
            ProtectionLevel::None => 0.0,
            ProtectionLevel::ChecksumOnly => 0.05,
            ProtectionLevel::ApproximateTmr => 0.15,
            ProtectionLevel::HealthWeightedTmr => 0.25,
            ProtectionLevel::FullTmr | ProtectionLevel::Adaptive => 0.33,
        }
    }

    /// Cost for a component of the given complexity, `base × (1 + complexity)`
    pub fn cost(&self, complexity: f64) -> f64 {
        self.base_cost() * (1.0 + complexity)
    }

    /// Fraction of the baseline error rate removed
    pub fn error_reduction(&self) -> f64 {
        match self {
            ProtectionLevel::None => 0.0,
            ProtectionLevel::ChecksumOnly => 0.3,
            ProtectionLevel::ApproximateTmr => 0.7,
            ProtectionLevel::HealthWeightedTmr | ProtectionLevel::Adaptive => 0.9,
            ProtectionLevel::FullTmr => 0.99,
        }
    }

    /// One step up the ladder, saturating at `FullTmr`
    pub fn escalate(&self) -> Self {
        match self {
            ProtectionLevel::None => ProtectionLevel::ChecksumOnly,
            ProtectionLevel::ChecksumOnly => ProtectionLevel::ApproximateTmr,
            ProtectionLevel::ApproximateTmr => ProtectionLevel::HealthWeightedTmr,
            ProtectionLevel::HealthWeightedTmr | ProtectionLevel::FullTmr => ProtectionLevel::FullTmr,
            ProtectionLevel::Adaptive => ProtectionLevel::Adaptive,
        }
    }

    /// One step down the ladder, saturating at `None`
    pub fn deescalate(&self) -> Self {
        match self {
            ProtectionLevel::None | ProtectionLevel::ChecksumOnly => ProtectionLevel::None,
            ProtectionLevel::ApproximateTmr => ProtectionLevel::ChecksumOnly,
            ProtectionLevel::HealthWeightedTmr => ProtectionLevel::ApproximateTmr,
            ProtectionLevel::FullTmr => ProtectionLevel::HealthWeightedTmr,
            ProtectionLevel::Adaptive => ProtectionLevel::Adaptive,
        }
    }

    /// Concrete level to apply, resolving `Adaptive` against the environment
    pub fn resolve(&self, environment: &MissionEnvironment) -> Self {
        match self {
            ProtectionLevel::Adaptive => environment.recommended_level(),
            level => *level,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProtectionLevel::None => "No Protection",
            ProtectionLevel::ChecksumOnly => "Checksum Only",
            ProtectionLevel::ApproximateTmr => "Approximate TMR",
            ProtectionLevel::HealthWeightedTmr => "Health-Weighted TMR",
            ProtectionLevel::FullTmr => "Full TMR",
            ProtectionLevel::Adaptive => "Adaptive",
        }
    }
}

impl fmt::Display for ProtectionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Radiation environment the `Adaptive` level is resolved against
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MissionEnvironment {
    /// Upsets per bit per second
    pub seu_rate: f64,
}

impl Default for MissionEnvironment {
    fn default() -> Self {
        // low Earth orbit, quiet sun
        Self { seu_rate: 1e-6 }
    }
}

impl MissionEnvironment {
    pub fn new(seu_rate: f64) -> Self {
        Self { seu_rate }
    }

    /// Baseline tier for the current upset rate
    pub fn recommended_level(&self) -> ProtectionLevel {
        match self.seu_rate {
            rate if rate < 1e-7 => ProtectionLevel::ChecksumOnly,
            rate if rate < 1e-5 => ProtectionLevel::ApproximateTmr,
            rate if rate < 1e-3 => ProtectionLevel::HealthWeightedTmr,
            // also NaN: assume the worst
            _ => ProtectionLevel::FullTmr,
        }
    }
}
