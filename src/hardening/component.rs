//! Components submitted for hardening

use super::level::ProtectionLevel;
use super::metrics::{CriticalityMetrics, MetricWeights};

/// A value that may receive protection, e.g. one network weight
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkComponent {
    /// Unique identifier
    pub id: String,
    /// Parent group, e.g. the layer the weight belongs to
    pub group: String,
    pub value: f64,
    pub criticality: CriticalityMetrics,
}

impl NetworkComponent {
    pub fn new(
        id: impl Into<String>,
        group: impl Into<String>,
        value: f64,
        criticality: CriticalityMetrics,
    ) -> Self {
        Self {
            id: id.into(),
            group: group.into(),
            value,
            criticality,
        }
    }

    /// Resource cost of protecting this component at `level`
    pub fn cost_at(&self, level: ProtectionLevel) -> f64 {
        level.cost(self.criticality.complexity)
    }
}

/// A component together with its criticality score
#[derive(Debug, Clone, PartialEq)]
pub struct RankedComponent {
    pub component: NetworkComponent,
    pub score: f64,
}

impl RankedComponent {
    pub fn new(component: NetworkComponent, weights: &MetricWeights) -> Self {
        let score = component.criticality.score(weights);
        Self { component, score }
    }

    pub fn id(&self) -> &str {
        &self.component.id
    }
}
