use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load settings: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Settings validation error: {0}")]
    ValidationError(String),
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Production input is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Duplicate production row for category '{category}' in {year}")]
    DuplicateProductionRow { category: String, year: i32 },

    #[error("Currency mismatch: imports are declared in {import}, production in {production}")]
    CurrencyMismatch { import: String, production: String },

    #[error("Trend analysis needs at least 2 yearly snapshots, got {0}")]
    InsufficientHistory(usize),

    #[error("No trend was computed for metric '{0}'")]
    MissingTrend(&'static str),
}
