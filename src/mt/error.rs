use std::path::PathBuf;

/// Error types for the catalog translation pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MtError {
    /// The source catalog does not exist
    MissingSourceFile(PathBuf),
    /// The translation provider could not be constructed (e.g. no API key)
    MissingCapability(String),
    /// The source catalog is not valid JSON
    InvalidCatalog(String),
    /// Reading or writing a catalog failed
    Io(String),
    /// A rewritten catalog no longer has the source's key paths
    StructureMismatch(String),
    /// Bad configuration (patterns, API key, config file)
    ConfigError(String),
    /// Locale code rejected before reaching the provider
    InvalidLocale(String),
    /// HTTP transport failure
    NetworkError(String),
    /// Provider returned an error or an unusable response
    TranslationError(String),
    /// A batch response did not line up with its request
    BatchShapeMismatch { expected: usize, actual: usize },
}

impl MtError {
    /// Process exit code for errors that abort a run.
    ///
    /// A missing provider gets its own code so wrapper scripts can tell
    /// "nothing was attempted" apart from a failed run.
    pub fn exit_code(&self) -> u8 {
        match self {
            MtError::MissingCapability(_) => 2,
            _ => 1,
        }
    }

    /// Whether a retry could plausibly succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            MtError::NetworkError(_)
                | MtError::TranslationError(_)
                | MtError::BatchShapeMismatch { .. }
        )
    }
}

impl std::fmt::Display for MtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MtError::MissingSourceFile(path) => {
                write!(f, "Missing source file: {}", path.display())
            }
            MtError::MissingCapability(msg) => write!(f, "Missing dependency: {}", msg),
            MtError::InvalidCatalog(msg) => write!(f, "Invalid catalog: {}", msg),
            MtError::Io(msg) => write!(f, "I/O error: {}", msg),
            MtError::StructureMismatch(msg) => write!(f, "Structure mismatch: {}", msg),
            MtError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            MtError::InvalidLocale(msg) => write!(f, "Invalid locale: {}", msg),
            MtError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            MtError::TranslationError(msg) => write!(f, "Translation error: {}", msg),
            MtError::BatchShapeMismatch { expected, actual } => write!(
                f,
                "Batch size mismatch: sent {} texts, received {}",
                expected, actual
            ),
        }
    }
}

impl std::error::Error for MtError {}

impl From<reqwest::Error> for MtError {
    fn from(e: reqwest::Error) -> Self {
        MtError::NetworkError(e.to_string())
    }
}

impl From<std::io::Error> for MtError {
    fn from(e: std::io::Error) -> Self {
        MtError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for MtError {
    fn from(e: serde_json::Error) -> Self {
        MtError::InvalidCatalog(e.to_string())
    }
}

/// Result type for MT operations
pub type MtResult<T> = Result<T, MtError>;
