use thiserror::Error;

/// Top-level error type for the pizzeria ordering pipeline.
///
/// The first four variants are the failure kinds a caller is expected to
/// branch on: storage, connectivity, parse, and pricing. The remaining
/// variants exist so the `?` operator works across the config and I/O layers;
/// they report as [`ErrorKind::Storage`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PizzeriaError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Connectivity error: {0}")]
    Connectivity(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Pricing error: {0}")]
    Pricing(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Coarse classification of a [`PizzeriaError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Menu or order log missing, unreadable, or corrupt.
    Storage,
    /// Language-model endpoint unreachable, slow, or returning HTTP errors.
    Connectivity,
    /// Model reply did not contain a usable order.
    Parse,
    /// Order fields could not be priced against the menu.
    Pricing,
}

impl PizzeriaError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PizzeriaError::Connectivity(_) => ErrorKind::Connectivity,
            PizzeriaError::Parse(_) => ErrorKind::Parse,
            PizzeriaError::Pricing(_) => ErrorKind::Pricing,
            PizzeriaError::Storage(_)
            | PizzeriaError::Config(_)
            | PizzeriaError::Io(_)
            | PizzeriaError::Serialization(_) => ErrorKind::Storage,
        }
    }

    /// Whether asking the model again may succeed.
    ///
    /// Connectivity failures are transient and a parse failure usually means
    /// the model phrased its answer badly; storage and pricing problems need
    /// a human to fix the menu or the order first.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Connectivity | ErrorKind::Parse)
    }
}

impl From<toml::de::Error> for PizzeriaError {
    fn from(err: toml::de::Error) -> Self {
        PizzeriaError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for PizzeriaError {
    fn from(err: toml::ser::Error) -> Self {
        PizzeriaError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for PizzeriaError {
    fn from(err: serde_json::Error) -> Self {
        PizzeriaError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for pizzeria operations.
pub type Result<T> = std::result::Result<T, PizzeriaError>;
