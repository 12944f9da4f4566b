//! Policy flags handed to the recommendation consumer.
//!
//! The only numeric rule applied here is the dumping check; how flags
//! combine into measures is decided downstream.

use crate::error::EngineError;
use crate::trend::TrendReport;
use crate::types::{PolicyFlags, TrackedMetric};

/// Reference-country goods priced below everyone else's.
pub fn is_dumping(price_ratio: Option<f64>) -> bool {
    matches!(price_ratio, Some(r) if r.is_finite() && r < 1.0)
}

pub fn derive_flags(trends: &TrendReport, latest_price_ratio: Option<f64>) -> Result<PolicyFlags, EngineError> {
    Ok(PolicyFlags {
        share_unfriendly_trend: trends.get(TrackedMetric::ShareUnfriendly)?.label,
        reference_country_share_trend: trends.get(TrackedMetric::ShareReferenceCountry)?.label,
        dumping_flag: is_dumping(latest_price_ratio),
        import_total_trend: trends.get(TrackedMetric::ImportTotal)?.label,
    })
}
