//! Selective hardening: deciding which values get which protection
//!
//! Components carry five criticality metrics that combine into a score.
//! [`SelectiveHardening::analyze`] ranks them and assigns a
//! [`ProtectionLevel`] to each under a resource budget; the resulting
//! [`HardeningPlan`] maps ids to levels, and [`ProtectedValue::protect`]
//! wraps a value in the matching primitive.

pub mod allocator;
pub mod component;
pub mod config;
pub mod error;
pub mod level;
pub mod metrics;
pub mod plan;
pub mod protected;

pub use allocator::SelectiveHardening;
pub use component::{NetworkComponent, RankedComponent};
pub use config::{HardeningConfig, HardeningStrategy};
pub use error::{HardeningError, RecoverError};
pub use level::{MissionEnvironment, ProtectionLevel};
pub use metrics::{CriticalityMetrics, MetricWeights};
pub use plan::HardeningPlan;
pub use protected::ProtectedValue;
