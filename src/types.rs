use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tabled::Tabled;

/// One row of the trade-statistics export, exactly as read from CSV.
///
/// Every column is kept as an optional string; coercion happens in the
/// normalizer so that a malformed cell degrades a field instead of the row.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTradeRow {
    #[serde(rename = "refYear")]
    pub ref_year: Option<String>,
    #[serde(rename = "reporterDesc")]
    pub reporter_desc: Option<String>,
    #[serde(rename = "reporterISO", default)]
    pub reporter_iso: Option<String>,
    #[serde(rename = "partnerDesc", default)]
    pub partner_desc: Option<String>,
    #[serde(rename = "isFriendly", default)]
    pub is_friendly: Option<String>,
    #[serde(rename = "primaryValue")]
    pub primary_value: Option<String>,
    #[serde(rename = "qty", default)]
    pub qty: Option<String>,
    #[serde(rename = "qtyUnitCode", default)]
    pub qty_unit_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeRecord {
    pub year: i32,
    pub reporter_name: String,
    pub reporter_code: Option<String>,
    pub partner_name: String,
    pub is_friendly: bool,
    pub value: f64,
    pub quantity: Option<f64>,
    pub quantity_unit: String,
}

/// How a record was assigned to (or kept out of) the reference-country partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceMatch {
    Code,
    NameFallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    pub record: TradeRecord,
    pub is_reference_country: bool,
    pub matched_by: ReferenceMatch,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportMetricsSnapshot {
    pub year: i32,
    pub record_count: usize,
    pub import_total: f64,
    pub import_friendly: f64,
    pub import_unfriendly: f64,
    pub import_from_reference_country: f64,
    pub share_friendly: f64,
    pub share_unfriendly: f64,
    pub share_reference_country: f64,
    pub price_reference_country: Option<f64>,
    pub price_others: Option<f64>,
    pub price_ratio: Option<f64>,
    pub excluded_countries: BTreeSet<String>,
}

/// Snapshot fields that can be followed across years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedMetric {
    ImportTotal,
    ImportFriendly,
    ImportUnfriendly,
    ImportFromReferenceCountry,
    ShareFriendly,
    ShareUnfriendly,
    ShareReferenceCountry,
}

impl TrackedMetric {
    pub const CANONICAL: [TrackedMetric; 3] = [
        TrackedMetric::ImportTotal,
        TrackedMetric::ShareUnfriendly,
        TrackedMetric::ShareReferenceCountry,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TrackedMetric::ImportTotal => "import_total",
            TrackedMetric::ImportFriendly => "import_friendly",
            TrackedMetric::ImportUnfriendly => "import_unfriendly",
            TrackedMetric::ImportFromReferenceCountry => "import_from_reference_country",
            TrackedMetric::ShareFriendly => "share_friendly",
            TrackedMetric::ShareUnfriendly => "share_unfriendly",
            TrackedMetric::ShareReferenceCountry => "share_reference_country",
        }
    }

    pub fn value(self, s: &ImportMetricsSnapshot) -> f64 {
        match self {
            TrackedMetric::ImportTotal => s.import_total,
            TrackedMetric::ImportFriendly => s.import_friendly,
            TrackedMetric::ImportUnfriendly => s.import_unfriendly,
            TrackedMetric::ImportFromReferenceCountry => s.import_from_reference_country,
            TrackedMetric::ShareFriendly => s.share_friendly,
            TrackedMetric::ShareUnfriendly => s.share_unfriendly,
            TrackedMetric::ShareReferenceCountry => s.share_reference_country,
        }
    }
}

impl fmt::Display for TrackedMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendLabel {
    Positive,
    Negative,
    Stable,
}

impl fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrendLabel::Positive => "Positive",
            TrendLabel::Negative => "Negative",
            TrendLabel::Stable => "Stable",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendResult {
    pub first_value: f64,
    pub last_value: f64,
    pub delta_absolute: f64,
    pub delta_percent: Option<f64>,
    pub cagr: Option<f64>,
    pub label: TrendLabel,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FlagValue {
    Label(TrendLabel),
    Bool(bool),
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagValue::Label(l) => write!(f, "{}", l),
            FlagValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyFlags {
    pub share_unfriendly_trend: TrendLabel,
    pub reference_country_share_trend: TrendLabel,
    pub dumping_flag: bool,
    pub import_total_trend: TrendLabel,
}

impl PolicyFlags {
    /// Name/value pairs in a fixed order.
    pub fn entries(&self) -> [(&'static str, FlagValue); 4] {
        [
            ("share_unfriendly_trend", FlagValue::Label(self.share_unfriendly_trend)),
            (
                "reference_country_share_trend",
                FlagValue::Label(self.reference_country_share_trend),
            ),
            ("dumping_flag", FlagValue::Bool(self.dumping_flag)),
            ("import_total_trend", FlagValue::Label(self.import_total_trend)),
        ]
    }
}

/// Multiplier a dataset's monetary columns are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitScale {
    Units,
    Thousands,
    Millions,
    Billions,
}

impl UnitScale {
    pub fn multiplier(self) -> f64 {
        match self {
            UnitScale::Units => 1.0,
            UnitScale::Thousands => 1_000.0,
            UnitScale::Millions => 1_000_000.0,
            UnitScale::Billions => 1_000_000_000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitDeclaration {
    pub currency: String,
    pub scale: UnitScale,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProductionRow {
    pub category: Option<String>,
    pub year: Option<String>,
    pub manufacture: Option<String>,
    pub consumption: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductionRecord {
    pub category: String,
    pub year: i32,
    pub manufacture: f64,
    pub consumption: f64,
    pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductionMetrics {
    pub category: String,
    pub year: i32,
    /// Raw inputs, in the production dataset's declared unit.
    pub manufacture: f64,
    pub consumption: f64,
    /// Import value joined for this year, in the import dataset's unit.
    pub import_value: f64,
    pub self_sufficiency: f64,
    pub balance: f64,
    pub total_supply: f64,
    pub import_dependency: f64,
    pub production_share: f64,
    pub growth_rate: Option<f64>,
    pub consumption_growth_rate: Option<f64>,
    pub import_growth_rate: Option<f64>,
    pub competitiveness_index: Option<f64>,
    pub self_sufficiency_index: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductionSummary {
    pub latest_year: i32,
    pub self_sufficiency: f64,
    pub production_share: f64,
    pub import_dependency: f64,
    pub growth_rate: Option<f64>,
    pub competitiveness_index: Option<f64>,
    pub self_sufficiency_index: f64,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct SnapshotRow {
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "ImportTotal")]
    #[tabled(rename = "ImportTotal")]
    pub import_total: String,
    #[serde(rename = "ImportUnfriendly")]
    #[tabled(rename = "ImportUnfriendly")]
    pub import_unfriendly: String,
    #[serde(rename = "ImportReference")]
    #[tabled(rename = "ImportReference")]
    pub import_reference: String,
    #[serde(rename = "ShareUnfriendlyPct")]
    #[tabled(rename = "ShareUnfriendlyPct")]
    pub share_unfriendly_pct: String,
    #[serde(rename = "ShareReferencePct")]
    #[tabled(rename = "ShareReferencePct")]
    pub share_reference_pct: String,
    #[serde(rename = "PriceRatio")]
    #[tabled(rename = "PriceRatio")]
    pub price_ratio: String,
    #[serde(rename = "ExcludedCountries")]
    #[tabled(rename = "ExcludedCountries")]
    pub excluded_countries: usize,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct TrendRow {
    #[serde(rename = "Metric")]
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[serde(rename = "First")]
    #[tabled(rename = "First")]
    pub first: String,
    #[serde(rename = "Last")]
    #[tabled(rename = "Last")]
    pub last: String,
    #[serde(rename = "ChangePct")]
    #[tabled(rename = "ChangePct")]
    pub change_pct: String,
    #[serde(rename = "CagrPct")]
    #[tabled(rename = "CagrPct")]
    pub cagr_pct: String,
    #[serde(rename = "Trend")]
    #[tabled(rename = "Trend")]
    pub trend: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ProductionRow {
    #[serde(rename = "Category")]
    #[tabled(rename = "Category")]
    pub category: String,
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "SelfSufficiencyPct")]
    #[tabled(rename = "SelfSufficiencyPct")]
    pub self_sufficiency_pct: String,
    #[serde(rename = "ImportDependencyPct")]
    #[tabled(rename = "ImportDependencyPct")]
    pub import_dependency_pct: String,
    #[serde(rename = "ProductionSharePct")]
    #[tabled(rename = "ProductionSharePct")]
    pub production_share_pct: String,
    #[serde(rename = "GrowthPct")]
    #[tabled(rename = "GrowthPct")]
    pub growth_pct: String,
    #[serde(rename = "Competitiveness")]
    #[tabled(rename = "Competitiveness")]
    pub competitiveness: String,
}
