//! End-to-end flow: normalize → yearly snapshots → trends → flags, plus the
//! optional production join.

use crate::aggregate::snapshots_by_year;
use crate::error::EngineError;
use crate::flags::derive_flags;
use crate::friendly::CountryClassifier;
use crate::normalize::{normalize, NormalizeReport, NormalizedBatch};
use crate::production::{calculate_production_metrics, ProductionReport};
use crate::settings::Settings;
use crate::trend::{analyze_trends, TrendReport};
use crate::types::{ImportMetricsSnapshot, PolicyFlags, ProductionRecord, ProductionSummary, RawTradeRow};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportAnalysis {
    pub diagnostics: NormalizeReport,
    pub snapshots: BTreeMap<i32, ImportMetricsSnapshot>,
    pub trends: TrendReport,
    pub flags: PolicyFlags,
}

impl ImportAnalysis {
    pub fn latest(&self) -> Option<&ImportMetricsSnapshot> {
        self.snapshots.values().next_back()
    }
}

/// Everything one run produces; serialized as-is to JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub commodity_code: Option<String>,
    pub imports: ImportAnalysis,
    pub production: Option<ProductionReport>,
    pub production_summary: Option<BTreeMap<String, ProductionSummary>>,
}

/// The `years_back` years ending at `through_year`, oldest first.
pub fn year_window(through_year: i32, years_back: u32) -> Vec<i32> {
    let span = years_back as i32;
    ((through_year - span + 1)..=through_year).collect()
}

pub fn analyze_imports(
    rows: &[RawTradeRow],
    years: &[i32],
    settings: &Settings,
    classifier: &dyn CountryClassifier,
) -> Result<ImportAnalysis, EngineError> {
    settings.validate()?;
    let batch = normalize(rows, &settings.reference_country, classifier);
    analyze_batch(&batch, years, settings)
}

pub fn analyze_batch(
    batch: &NormalizedBatch,
    years: &[i32],
    settings: &Settings,
) -> Result<ImportAnalysis, EngineError> {
    let snapshots = snapshots_by_year(batch, years);
    let trends = analyze_trends(snapshots.values(), &settings.trend.tracked, settings.trend.epsilon)?;
    let latest_ratio = snapshots.values().next_back().and_then(|s| s.price_ratio);
    let flags = derive_flags(&trends, latest_ratio)?;

    info!(
        years = ?trends.years,
        records = batch.records.len(),
        dumping = flags.dumping_flag,
        "import analysis complete"
    );

    Ok(ImportAnalysis {
        diagnostics: batch.report.clone(),
        snapshots,
        trends,
        flags,
    })
}

pub fn analyze_production(
    records: &[ProductionRecord],
    imports: &ImportAnalysis,
    commodity_code: Option<&str>,
    settings: &Settings,
) -> Result<ProductionReport, EngineError> {
    let report = calculate_production_metrics(records, &imports.snapshots, commodity_code, &settings.units)?;
    info!(categories = report.by_category.len(), "production analysis complete");
    Ok(report)
}

pub fn build_report(
    commodity_code: Option<&str>,
    imports: ImportAnalysis,
    production: Option<ProductionReport>,
) -> AnalysisReport {
    let production_summary = production.as_ref().map(ProductionReport::summary);
    AnalysisReport {
        commodity_code: commodity_code.map(str::to_string),
        imports,
        production,
        production_summary,
    }
}
