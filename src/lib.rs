//! Import trade metrics for a single tariff-code query.
//!
//! Raw trade rows are normalized, reduced into one snapshot per year,
//! compared across years to label trends, and turned into policy flags.
//! An optional production/consumption table is joined against the yearly
//! import totals to derive self-sufficiency and dependency indicators.
//! Every stage is a pure function over explicit inputs.

pub mod aggregate;
pub mod error;
pub mod flags;
pub mod friendly;
pub mod loader;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod production;
pub mod reports;
pub mod settings;
pub mod summary;
pub mod trend;
pub mod types;
pub mod util;

pub use error::{ConfigError, EngineError};
pub use pipeline::{analyze_imports, analyze_production, build_report, AnalysisReport, ImportAnalysis};
pub use settings::{load_settings, Settings};
pub use summary::render_summary;
