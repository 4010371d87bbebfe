use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid configuration value `{field}`: {reason}")]
    Configuration { field: String, reason: String },

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to serialize configuration: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error(
        "Too many malformed pages: {skipped} of {total} skipped (tolerance {tolerance}); \
         first offender `{url}` field `{field}`"
    )]
    DataIntegrity {
        skipped: usize,
        total: usize,
        tolerance: f64,
        field: String,
        url: String,
    },

    #[error("Analysis cancelled before stage `{stage}`")]
    Cancelled { stage: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub fn configuration(field: impl Into<String>, reason: impl Into<String>) -> Self {
        EngineError::Configuration {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
