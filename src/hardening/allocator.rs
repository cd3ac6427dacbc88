//! Assignment of protection levels within a resource budget
//!
//! Every strategy starts from the same ranking: components are scored in
//! parallel and stably sorted by descending score, so equal scores keep
//! their input order. A component id that appears more than once is only
//! considered at its first occurrence.
//!
//! ## Greedy packing
//!
//! `ResourceConstrained` first fixes how many components get any protection
//! at all: the longest ranked prefix whose `ChecksumOnly` costs fit the
//! budget. It then walks that prefix in rank order, giving each component the
//! strongest level that still leaves room for the `ChecksumOnly` cost of
//! every covered component after it. Raising the budget can therefore never
//! shrink the protected set, and the total never exceeds the budget.
//!
//! Components are ordered by raw score, not score per unit cost, so the
//! packing can be visibly worse than an optimal knapsack.

use super::component::{NetworkComponent, RankedComponent};
use super::config::{HardeningConfig, HardeningStrategy};
use super::error::HardeningError;
use super::level::ProtectionLevel;
use super::plan::HardeningPlan;
use log::{debug, trace};
use rayon::prelude::*;
use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};

/// Slack for floating point accumulation when comparing against the budget
const BUDGET_EPSILON: f64 = 1e-12;

/// Levels tried by the greedy strategy, strongest first
const GREEDY_LEVELS: [ProtectionLevel; 4] = [
    ProtectionLevel::FullTmr,
    ProtectionLevel::HealthWeightedTmr,
    ProtectionLevel::ApproximateTmr,
    ProtectionLevel::ChecksumOnly,
];

/// Band multipliers of the criticality threshold for `FixedThreshold`
const THRESHOLD_BANDS: [(f64, ProtectionLevel); 4] = [
    (1.0, ProtectionLevel::FullTmr),
    (0.8, ProtectionLevel::HealthWeightedTmr),
    (0.6, ProtectionLevel::ApproximateTmr),
    (0.4, ProtectionLevel::ChecksumOnly),
];

/// Group percentiles for `LayerwiseImportance`
const PERCENTILE_BANDS: [(f64, ProtectionLevel); 4] = [
    (0.8, ProtectionLevel::FullTmr),
    (0.6, ProtectionLevel::HealthWeightedTmr),
    (0.4, ProtectionLevel::ApproximateTmr),
    (0.2, ProtectionLevel::ChecksumOnly),
];

/// Individual score above which a layerwise band is raised one step
const ESCALATION_SCORE: f64 = 0.8;

/// Observed correction rate below which the adaptive strategy escalates
const ESCALATE_BELOW_RATE: f64 = 0.8;
/// Observed correction rate above which the adaptive strategy relaxes
const RELAX_ABOVE_RATE: f64 = 0.95;
/// Relaxing also requires fewer errors than this
const RELAX_MAX_ERRORS: u32 = 3;

fn fits(used: f64, cost: f64, budget: f64) -> bool {
    used + cost <= budget + BUDGET_EPSILON
}

/// Selective-hardening allocator
///
/// A pure function of its configuration and inputs; safe to share across
/// threads.
#[derive(Debug, Clone)]
pub struct SelectiveHardening {
    config: HardeningConfig,
}

impl SelectiveHardening {
    pub fn new(config: HardeningConfig) -> Result<Self, HardeningError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &HardeningConfig {
        &self.config
    }

    /// Rank components and assign a protection level to each
    pub fn analyze(&self, components: &[NetworkComponent]) -> HardeningPlan {
        let ranked = self.rank(components);
        let group_criticality = group_means(&ranked);
        let budget = self.config.resource_budget;

        let protection_map = match self.config.strategy {
            HardeningStrategy::FixedThreshold => self.assign_fixed_threshold(&ranked),
            HardeningStrategy::ResourceConstrained | HardeningStrategy::AdaptiveRuntime => {
                assign_greedy(&ranked, budget)
            }
            HardeningStrategy::LayerwiseImportance => {
                assign_layerwise(&ranked, &group_criticality, budget)
            }
        };

        let plan = HardeningPlan::new(
            self.config.strategy,
            budget,
            ranked,
            group_criticality,
            protection_map,
        );
        debug!(
            "{} plan: {} of {} components protected, usage {:.4} of {:.4}",
            plan.strategy,
            plan.protected_count(),
            plan.ranked_components.len(),
            plan.resource_usage,
            budget
        );
        plan
    }

    /// Adjust an adaptive plan from observed error and correction counts
    ///
    /// Components without errors are left alone. A component whose
    /// correction rate exceeds 0.95 with fewer than 3 errors drops one level;
    /// one whose rate is below 0.8 rises one level if the extra cost fits
    /// the budget. Relaxations are applied first so the budget they free can
    /// fund escalations, which are then granted in rank order. `Adaptive`
    /// assignments are never changed. Plans from other strategies are
    /// returned unchanged.
    pub fn update_adaptive(
        &self,
        prior: &HardeningPlan,
        error_counts: &HashMap<String, u32>,
        correction_counts: &HashMap<String, u32>,
    ) -> HardeningPlan {
        let mut plan = prior.clone();
        if self.config.strategy != HardeningStrategy::AdaptiveRuntime {
            return plan;
        }

        let observed: Vec<(usize, f64, u32)> = plan
            .ranked_components
            .iter()
            .enumerate()
            .filter_map(|(index, ranked)| {
                let errors = error_counts.get(ranked.id()).copied().unwrap_or(0);
                if errors == 0 {
                    return None;
                }
                let corrections = correction_counts.get(ranked.id()).copied().unwrap_or(0);
                Some((index, corrections as f64 / errors as f64, errors))
            })
            .collect();

        for &(index, rate, errors) in &observed {
            let id = plan.ranked_components[index].id().to_owned();
            let level = plan.level_of(&id);
            if level == ProtectionLevel::Adaptive || level == ProtectionLevel::None {
                continue;
            }
            if rate > RELAX_ABOVE_RATE && errors < RELAX_MAX_ERRORS {
                trace!("{}: relaxing {} (correction rate {:.2})", id, level, rate);
                plan.protection_map.insert(id, level.deescalate());
            }
        }
        plan.recompute();

        let budget = self.config.resource_budget;
        let mut usage = plan.resource_usage;
        for &(index, rate, _) in &observed {
            let component = &plan.ranked_components[index].component;
            let level = plan.level_of(&component.id);
            if rate >= ESCALATE_BELOW_RATE
                || level == ProtectionLevel::Adaptive
                || level == ProtectionLevel::FullTmr
            {
                continue;
            }

            let next = level.escalate();
            let extra = component.cost_at(next) - component.cost_at(level);
            if fits(usage, extra, budget) {
                trace!("{}: escalating to {} (correction rate {:.2})", component.id, next, rate);
                usage += extra;
                let id = component.id.clone();
                plan.protection_map.insert(id, next);
            } else {
                debug!(
                    "{}: correction rate {:.2} calls for {} but the budget is spent",
                    component.id, rate, next
                );
            }
        }

        plan.recompute();
        plan
    }

    fn rank(&self, components: &[NetworkComponent]) -> Vec<RankedComponent> {
        let mut seen = HashSet::default();
        let unique: Vec<&NetworkComponent> = components
            .iter()
            .filter(|component| {
                let first = seen.insert(component.id.as_str());
                if !first {
                    debug!("ignoring duplicate component id {}", component.id);
                }
                first
            })
            .collect();

        let weights = &self.config.metric_weights;
        let mut ranked: Vec<RankedComponent> = unique
            .par_iter()
            .map(|component| RankedComponent::new((*component).clone(), weights))
            .collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked
    }

    fn assign_fixed_threshold(&self, ranked: &[RankedComponent]) -> HashMap<String, ProtectionLevel> {
        let threshold = self.config.criticality_threshold;
        let budget = self.config.resource_budget;
        let mut used = 0.0;
        let mut map = HashMap::default();

        for ranked in ranked {
            let mut level = THRESHOLD_BANDS
                .iter()
                .find(|(factor, _)| ranked.score >= threshold * factor)
                .map_or(ProtectionLevel::None, |(_, level)| *level);

            while level > ProtectionLevel::None && !fits(used, ranked.component.cost_at(level), budget) {
                level = level.deescalate();
            }
            used += ranked.component.cost_at(level);
            map.insert(ranked.component.id.clone(), level);
        }
        map
    }
}

/// Mean score per group
fn group_means(ranked: &[RankedComponent]) -> HashMap<String, f64> {
    let mut sums: HashMap<&str, (f64, usize)> = HashMap::default();
    for ranked in ranked {
        let entry = sums.entry(ranked.component.group.as_str()).or_insert((0.0, 0));
        entry.0 += ranked.score;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(group, (sum, count))| (group.to_owned(), sum / count as f64))
        .collect()
}

/// Walk components in rank order, giving each the strongest level that still
/// leaves the `ChecksumOnly` cost of every later covered component in reserve
fn assign_greedy(ranked: &[RankedComponent], budget: f64) -> HashMap<String, ProtectionLevel> {
    let mut map: HashMap<String, ProtectionLevel> = ranked
        .iter()
        .map(|r| (r.component.id.clone(), ProtectionLevel::None))
        .collect();

    let floor_costs: Vec<f64> = ranked
        .iter()
        .map(|r| r.component.cost_at(ProtectionLevel::ChecksumOnly))
        .collect();

    let mut covered = 0;
    let mut reserved = 0.0;
    for &cost in &floor_costs {
        if !fits(reserved, cost, budget) {
            break;
        }
        reserved += cost;
        covered += 1;
    }

    let mut used = 0.0;
    for (ranked, &floor_cost) in ranked.iter().zip(&floor_costs).take(covered) {
        reserved -= floor_cost;
        let available = budget - reserved;
        let level = GREEDY_LEVELS
            .iter()
            .copied()
            .find(|level| fits(used, ranked.component.cost_at(*level), available))
            .unwrap_or(ProtectionLevel::ChecksumOnly);
        used += ranked.component.cost_at(level);
        map.insert(ranked.component.id.clone(), level);
    }
    map
}

fn assign_layerwise(
    ranked: &[RankedComponent],
    group_criticality: &HashMap<String, f64>,
    budget: f64,
) -> HashMap<String, ProtectionLevel> {
    let mut groups: Vec<(&String, &f64)> = group_criticality.iter().collect();
    groups.sort_by(|a, b| b.1.total_cmp(a.1).then_with(|| a.0.cmp(b.0)));
    let total = groups.len() as f64;
    let percentile: HashMap<&str, f64> = groups
        .iter()
        .enumerate()
        .map(|(pos, (group, _))| (group.as_str(), 1.0 - pos as f64 / total))
        .collect();

    let mut used = 0.0;
    let mut map = HashMap::default();
    for ranked in ranked {
        let component = &ranked.component;
        let group_rank = percentile.get(component.group.as_str()).copied().unwrap_or(0.0);
        let band = PERCENTILE_BANDS
            .iter()
            .find(|(cutoff, _)| group_rank >= *cutoff)
            .map_or(ProtectionLevel::None, |(_, level)| *level);

        let mut candidates = Vec::with_capacity(2);
        if ranked.score > ESCALATION_SCORE && band < ProtectionLevel::FullTmr {
            candidates.push(band.escalate());
        }
        candidates.push(band);

        let level = candidates
            .into_iter()
            .find(|level| fits(used, component.cost_at(*level), budget))
            .unwrap_or(ProtectionLevel::None);
        used += component.cost_at(level);
        map.insert(component.id.clone(), level);
    }
    map
}
