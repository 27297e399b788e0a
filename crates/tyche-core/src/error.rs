use thiserror::Error;

/// Application-wide error types for Tyche.
#[derive(Error, Debug)]
pub enum AppError {
    /// Invalid or missing configuration value.
    #[error("Config error: {0}")]
    ConfigError(String),

    /// A capture (body or sidecar) could not be read from its store.
    #[error("Capture error: {0}")]
    CaptureError(String),

    /// A capture body has a shape no lane can work with.
    #[error("Malformed capture {url}: {message}")]
    MalformedCapture { url: String, message: String },

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// A regular expression failed to compile.
    #[error("Pattern error: {0}")]
    PatternError(#[from] regex::Error),

    /// An adapter rule is missing a required field or carries a bad pattern.
    #[error("Adapter rule error ({host}): {message}")]
    RuleError { host: String, message: String },

    /// The OCR bridge failed to produce candidates.
    #[error("Vision error: {0}")]
    VisionError(String),

    /// Writing the dataset failed.
    #[error("Output error: {0}")]
    OutputError(String),

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Returns true if this error is confined to a single capture or lane.
    ///
    /// The pipeline swallows these at the lane boundary and moves on to the
    /// next lane; anything else abandons the rest of that capture's lanes.
    pub fn is_capture_local(&self) -> bool {
        match self {
            AppError::MalformedCapture { .. }
            | AppError::SerializationError(_)
            | AppError::RuleError { .. }
            | AppError::VisionError(_)
            | AppError::PatternError(_)
            | AppError::CaptureError(_) => true,
            AppError::ConfigError(_) | AppError::OutputError(_) | AppError::Generic(_) => false,
        }
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::OutputError(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::OutputError(err.to_string())
    }
}
