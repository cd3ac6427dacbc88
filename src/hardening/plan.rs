//! Result of a hardening analysis

use super::component::RankedComponent;
use super::config::HardeningStrategy;
use super::level::ProtectionLevel;
use rustc_hash::FxHashMap as HashMap;
use std::collections::BTreeMap;
use std::fmt;

/// Baseline upset probability per unit of sensitivity
pub const BASE_ERROR_RATE: f64 = 0.01;

/// Components shown in the report
const REPORT_TOP: usize = 10;

/// Protection assignments for a set of components
#[derive(Debug, Clone, PartialEq)]
pub struct HardeningPlan {
    pub strategy: HardeningStrategy,
    pub resource_budget: f64,
    /// Components by descending score; ties keep input order
    pub ranked_components: Vec<RankedComponent>,
    /// Mean score of each group
    pub group_criticality: HashMap<String, f64>,
    pub protection_map: HashMap<String, ProtectionLevel>,
    /// Σ cost of the assigned levels
    pub resource_usage: f64,
    pub expected_error_rate: f64,
    pub baseline_error_rate: f64,
}

impl HardeningPlan {
    pub(crate) fn new(
        strategy: HardeningStrategy,
        resource_budget: f64,
        ranked_components: Vec<RankedComponent>,
        group_criticality: HashMap<String, f64>,
        protection_map: HashMap<String, ProtectionLevel>,
    ) -> Self {
        let mut plan = Self {
            strategy,
            resource_budget,
            ranked_components,
            group_criticality,
            protection_map,
            resource_usage: 0.0,
            expected_error_rate: 0.0,
            baseline_error_rate: 0.0,
        };
        plan.recompute();
        plan
    }

    /// Refresh resource usage and error rates from the protection map
    pub fn recompute(&mut self) {
        let mut usage = 0.0;
        let mut baseline = 0.0;
        let mut expected = 0.0;
        for ranked in &self.ranked_components {
            let component = &ranked.component;
            let level = self.level_of(&component.id);
            let rate = component.criticality.sensitivity * BASE_ERROR_RATE;

            usage += component.cost_at(level);
            baseline += rate;
            expected += rate * (1.0 - level.error_reduction());
        }
        self.resource_usage = usage;
        self.baseline_error_rate = baseline;
        self.expected_error_rate = expected;
    }

    /// Assigned level, `None` for unknown ids
    pub fn level_of(&self, id: &str) -> ProtectionLevel {
        self.protection_map.get(id).copied().unwrap_or_default()
    }

    /// Components protected above `None`
    pub fn protected_count(&self) -> usize {
        self.protection_map
            .values()
            .filter(|level| **level > ProtectionLevel::None)
            .count()
    }

    pub fn level_histogram(&self) -> BTreeMap<ProtectionLevel, usize> {
        let mut histogram = BTreeMap::new();
        for level in self.protection_map.values() {
            *histogram.entry(*level).or_insert(0) += 1;
        }
        histogram
    }

    /// Budget left over, never negative
    pub fn remaining_budget(&self) -> f64 {
        (self.resource_budget - self.resource_usage).max(0.0)
    }
}

impl fmt::Display for HardeningPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Selective Hardening Protection Report")?;
        writeln!(f, "-------------------------------------")?;
        writeln!(f)?;
        writeln!(f, "Strategy: {}", self.strategy)?;
        writeln!(
            f,
            "Resource Usage: {:.2}% (budget {:.2}%)",
            self.resource_usage * 100.0,
            self.resource_budget * 100.0
        )?;
        writeln!(
            f,
            "Expected Error Rate: {:.6} (Baseline: {:.6})",
            self.expected_error_rate, self.baseline_error_rate
        )?;
        writeln!(f)?;

        writeln!(f, "Protection Level Distribution:")?;
        for (level, count) in self.level_histogram() {
            writeln!(f, "  {}: {} components", level, count)?;
        }
        writeln!(f)?;

        writeln!(f, "Group Criticality Scores:")?;
        let groups: BTreeMap<_, _> = self.group_criticality.iter().collect();
        for (group, score) in groups {
            writeln!(f, "  {}: {:.4}", group, score)?;
        }
        writeln!(f)?;

        writeln!(f, "Top {} Most Critical Components:", REPORT_TOP)?;
        for ranked in self.ranked_components.iter().take(REPORT_TOP) {
            writeln!(
                f,
                "  {} (Group: {}, Criticality: {:.4}, Protection: {})",
                ranked.id(),
                ranked.component.group,
                ranked.score,
                self.level_of(ranked.id())
            )?;
        }
        Ok(())
    }
}
