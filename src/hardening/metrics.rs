//! Criticality metrics and how they combine into a score

use super::error::HardeningError;

/// Per-component estimates of corruption impact, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CriticalityMetrics {
    /// Sensitivity of the output to bit flips in this value
    pub sensitivity: f64,
    /// How often the value is used
    pub activation_frequency: f64,
    /// Influence on the final output
    pub output_influence: f64,
    /// Implementation complexity; also scales protection cost
    pub complexity: f64,
    pub memory_usage: f64,
}

impl CriticalityMetrics {
    pub fn new(
        sensitivity: f64,
        activation_frequency: f64,
        output_influence: f64,
        complexity: f64,
        memory_usage: f64,
    ) -> Self {
        Self {
            sensitivity,
            activation_frequency,
            output_influence,
            complexity,
            memory_usage,
        }
    }

    /// Same value on every axis
    pub fn uniform(level: f64) -> Self {
        Self::new(level, level, level, level, level)
    }

    /// Weighted sum with the weights renormalized to sum to 1
    pub fn score(&self, weights: &MetricWeights) -> f64 {
        let w = weights.normalized();
        w.sensitivity * self.sensitivity
            + w.activation_frequency * self.activation_frequency
            + w.output_influence * self.output_influence
            + w.complexity * self.complexity
            + w.memory_usage * self.memory_usage
    }
}

/// Relative importance of each metric
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricWeights {
    pub sensitivity: f64,
    pub activation_frequency: f64,
    pub output_influence: f64,
    pub complexity: f64,
    pub memory_usage: f64,
}

impl Default for MetricWeights {
    fn default() -> Self {
        Self {
            sensitivity: 0.35,
            activation_frequency: 0.2,
            output_influence: 0.3,
            complexity: 0.1,
            memory_usage: 0.05,
        }
    }
}

impl MetricWeights {
    fn entries(&self) -> [(&'static str, f64); 5] {
        [
            ("sensitivity", self.sensitivity),
            ("activation_frequency", self.activation_frequency),
            ("output_influence", self.output_influence),
            ("complexity", self.complexity),
            ("memory_usage", self.memory_usage),
        ]
    }

    pub fn validate(&self) -> Result<(), HardeningError> {
        for (name, value) in self.entries() {
            if !value.is_finite() || value < 0.0 {
                return Err(HardeningError::InvalidWeight { name, value });
            }
        }
        Ok(())
    }

    /// Weights scaled to sum to 1; defaults if the sum is not positive
    pub fn normalized(&self) -> Self {
        let sum: f64 = self.entries().iter().map(|(_, w)| w).sum();
        if !(sum.is_finite() && sum > 0.0) {
            return Self::default().normalized();
        }
        Self {
            sensitivity: self.sensitivity / sum,
            activation_frequency: self.activation_frequency / sum,
            output_influence: self.output_influence / sum,
            complexity: self.complexity / sum,
            memory_usage: self.memory_usage / sum,
        }
    }
}
