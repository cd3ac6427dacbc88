//! Configuration for selective hardening

use super::error::HardeningError;
use super::metrics::MetricWeights;
use std::fmt;

/// How protection levels are assigned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HardeningStrategy {
    /// Bands relative to `criticality_threshold`
    FixedThreshold,
    /// Greedy packing of the most critical components into the budget
    #[default]
    ResourceConstrained,
    /// Bands from the rank of each component's group
    LayerwiseImportance,
    /// Resource-constrained start, then adjusted from observed errors
    AdaptiveRuntime,
}

impl HardeningStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            HardeningStrategy::FixedThreshold => "Fixed Threshold",
            HardeningStrategy::ResourceConstrained => "Resource Constrained",
            HardeningStrategy::LayerwiseImportance => "Layerwise Importance",
            HardeningStrategy::AdaptiveRuntime => "Adaptive Runtime",
        }
    }
}

impl fmt::Display for HardeningStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Configuration for [`SelectiveHardening`](super::SelectiveHardening)
#[derive(Debug, Clone, PartialEq)]
pub struct HardeningConfig {
    pub strategy: HardeningStrategy,
    /// Score at or above which `FixedThreshold` assigns `FullTmr`
    pub criticality_threshold: f64,
    /// Total cost allowed, as a fraction of available resources
    pub resource_budget: f64,
    pub metric_weights: MetricWeights,
}

impl Default for HardeningConfig {
    fn default() -> Self {
        Self {
            strategy: HardeningStrategy::default(),
            criticality_threshold: 0.7,
            resource_budget: 0.3,
            metric_weights: MetricWeights::default(),
        }
    }
}

impl HardeningConfig {
    pub fn new(strategy: HardeningStrategy, resource_budget: f64) -> Self {
        Self {
            strategy,
            resource_budget,
            ..Self::default()
        }
    }

    pub fn with_threshold(mut self, criticality_threshold: f64) -> Self {
        self.criticality_threshold = criticality_threshold;
        self
    }

    pub fn with_weights(mut self, metric_weights: MetricWeights) -> Self {
        self.metric_weights = metric_weights;
        self
    }

    pub fn validate(&self) -> Result<(), HardeningError> {
        if !(0.0..=1.0).contains(&self.resource_budget) {
            return Err(HardeningError::InvalidBudget(self.resource_budget));
        }
        if !(0.0..=1.0).contains(&self.criticality_threshold) {
            return Err(HardeningError::InvalidThreshold(self.criticality_threshold));
        }
        self.metric_weights.validate()
    }
}
