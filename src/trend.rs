//! Trend analyzer: first/last deltas, CAGR and a dead-band label per metric.

use crate::error::EngineError;
use crate::types::{ImportMetricsSnapshot, TrackedMetric, TrendLabel, TrendResult};
use serde::Serialize;
use std::collections::BTreeMap;

pub const DEFAULT_EPSILON: f64 = 0.02;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendReport {
    /// Years of the analysed series, oldest first.
    pub years: Vec<i32>,
    pub trends: BTreeMap<TrackedMetric, TrendResult>,
}

impl TrendReport {
    pub fn get(&self, metric: TrackedMetric) -> Result<&TrendResult, EngineError> {
        self.trends
            .get(&metric)
            .ok_or(EngineError::MissingTrend(metric.name()))
    }
}

/// Classify a relative change. Undefined change is `Stable`.
pub fn classify(delta_percent: Option<f64>, epsilon: f64) -> TrendLabel {
    match delta_percent {
        Some(p) if p > epsilon => TrendLabel::Positive,
        Some(p) if p < -epsilon => TrendLabel::Negative,
        _ => TrendLabel::Stable,
    }
}

/// Trend of one series. `values` must be ordered oldest first and hold at
/// least one point.
pub fn trend_of(values: &[f64], epsilon: f64) -> TrendResult {
    let first = values.first().copied().unwrap_or(0.0);
    let last = values.last().copied().unwrap_or(0.0);
    let delta_absolute = last - first;
    let delta_percent = if first != 0.0 {
        Some(delta_absolute / first)
    } else {
        None
    };
    let periods = values.len().saturating_sub(1);
    let cagr = if first > 0.0 && last > 0.0 && periods > 0 {
        Some((last / first).powf(1.0 / periods as f64) - 1.0)
    } else {
        None
    };
    TrendResult {
        first_value: first,
        last_value: last,
        delta_absolute,
        delta_percent,
        cagr,
        label: classify(delta_percent, epsilon),
    }
}

/// Trends for the tracked metrics over the given snapshots.
///
/// Snapshots are ordered by year here, so callers may pass them in any
/// order. At least two are required.
pub fn analyze_trends<'a, I>(
    snapshots: I,
    tracked: &[TrackedMetric],
    epsilon: f64,
) -> Result<TrendReport, EngineError>
where
    I: IntoIterator<Item = &'a ImportMetricsSnapshot>,
{
    let mut ordered: Vec<&ImportMetricsSnapshot> = snapshots.into_iter().collect();
    if ordered.len() < 2 {
        return Err(EngineError::InsufficientHistory(ordered.len()));
    }
    ordered.sort_by_key(|s| s.year);

    let trends = tracked
        .iter()
        .map(|&metric| {
            let series: Vec<f64> = ordered.iter().map(|s| metric.value(s)).collect();
            (metric, trend_of(&series, epsilon))
        })
        .collect();

    Ok(TrendReport {
        years: ordered.iter().map(|s| s.year).collect(),
        trends,
    })
}
