use crate::error::ConfigError;
use crate::types::{TrackedMetric, UnitDeclaration, UnitScale};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root settings for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub reference_country: ReferenceCountry,
    pub trend: TrendSettings,
    pub units: UnitSettings,
    pub analysis: AnalysisSettings,
}

/// The single country aggregated separately from the friendly/unfriendly split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceCountry {
    /// ISO code compared against the reporter code column when present.
    pub code: Option<String>,
    /// Substring searched in the reporter name when no code is available.
    pub name_token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSettings {
    /// Dead band around zero change inside which a metric is `Stable`.
    pub epsilon: f64,
    pub tracked: Vec<TrackedMetric>,
}

/// Declared monetary units of the two independently sourced datasets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSettings {
    pub import: UnitDeclaration,
    pub production: UnitDeclaration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Number of years in the default window.
    pub years_back: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            reference_country: ReferenceCountry {
                code: Some("CHN".to_string()),
                name_token: "China".to_string(),
            },
            trend: TrendSettings {
                epsilon: 0.02,
                tracked: TrackedMetric::CANONICAL.to_vec(),
            },
            units: UnitSettings {
                import: UnitDeclaration {
                    currency: "USD".to_string(),
                    scale: UnitScale::Units,
                },
                production: UnitDeclaration {
                    currency: "USD".to_string(),
                    scale: UnitScale::Millions,
                },
            },
            analysis: AnalysisSettings { years_back: 3 },
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.trend.epsilon.is_finite() || self.trend.epsilon < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "trend.epsilon must be a non-negative number, got {}",
                self.trend.epsilon
            )));
        }
        for metric in TrackedMetric::CANONICAL {
            if !self.trend.tracked.contains(&metric) {
                return Err(ConfigError::ValidationError(format!(
                    "trend.tracked must include '{}'",
                    metric
                )));
            }
        }
        if self.analysis.years_back < 2 {
            return Err(ConfigError::ValidationError(
                "analysis.years_back must be at least 2".to_string(),
            ));
        }
        if self.reference_country.name_token.trim().is_empty()
            && self.reference_country.code.as_deref().map_or(true, |c| c.trim().is_empty())
        {
            return Err(ConfigError::ValidationError(
                "reference_country needs a code or a name_token".to_string(),
            ));
        }
        Ok(())
    }
}

/// Loads settings from built-in defaults, an optional TOML file and
/// `TRADE_METRICS__*` environment variables, in that order of precedence.
///
/// When `path` is `None`, a `trade_metrics.toml` in the working directory is
/// picked up if it exists.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let file = match path {
        Some(p) => config::File::from(p).required(true),
        None => config::File::with_name("trade_metrics").required(false),
    };
    let builder = config::Config::builder()
        .add_source(config::Config::try_from(&Settings::default())?)
        .add_source(file)
        .add_source(
            config::Environment::with_prefix("TRADE_METRICS")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    let settings = builder.try_deserialize::<Settings>()?;
    settings.validate()?;
    Ok(settings)
}
