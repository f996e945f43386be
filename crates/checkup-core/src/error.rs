//! Error types for checkup

/// Result type alias using [`Error`]
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Main error type for checkup
///
/// Construction-time kinds ([`Error::MalformedInstructions`],
/// [`Error::MissingSecret`], [`Error::InvalidSecret`]) abort a whole run.
/// Resolution kinds ([`Error::InvalidReference`], [`Error::ModuleNotFound`],
/// [`Error::SymbolNotFound`], [`Error::ModuleLoad`]) are only ever recorded
/// against a single check.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Instructions are not a mapping, are empty, or carry no checks
    #[error("Malformed instructions: {0}")]
    MalformedInstructions(String),

    /// A `$NAME` parameter points at an undefined environment variable
    #[error("Env variable {variable} not found")]
    MissingSecret {
        /// Name of the missing variable
        variable: String,
    },

    /// A `$NAME` parameter points at a variable whose value is not unicode
    #[error("Env variable {variable} is not valid unicode")]
    InvalidSecret {
        /// Name of the offending variable
        variable: String,
    },

    /// Reference string has no `<module>.<symbol>` shape
    #[error("Invalid reference '{0}': expected '<module>.<symbol>'")]
    InvalidReference(String),

    /// Module path is not registered or failed to load
    #[error("No module named '{0}'")]
    ModuleNotFound(String),

    /// Module exists but does not export the symbol
    #[error("Module '{module}' has no check named '{symbol}'")]
    SymbolNotFound {
        /// Resolved module path
        module: String,
        /// Missing symbol
        symbol: String,
    },

    /// Module loader for a registered path failed
    #[error("Failed to load module '{module}': {message}")]
    ModuleLoad {
        /// Module path
        module: String,
        /// Loader failure message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Runtime error
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl Error {
    /// Name of the failure kind, as rendered in a failing check's `exception`
    pub fn kind(&self) -> &'static str {
        match self {
            Error::MalformedInstructions(_) => "MalformedInstructions",
            Error::MissingSecret { .. } => "MissingSecret",
            Error::InvalidSecret { .. } => "InvalidSecret",
            Error::InvalidReference(_) => "InvalidReference",
            Error::ModuleNotFound(_) => "ModuleNotFound",
            Error::SymbolNotFound { .. } => "SymbolNotFound",
            Error::ModuleLoad { .. } => "ModuleLoad",
            Error::Config(_) => "Config",
            Error::Runtime(_) => "Runtime",
        }
    }

    /// Create a malformed-instructions error
    pub fn malformed(message: impl Into<String>) -> Self {
        Error::MalformedInstructions(message.into())
    }

    /// Create a missing-secret error
    pub fn missing_secret(variable: impl Into<String>) -> Self {
        Error::MissingSecret {
            variable: variable.into(),
        }
    }
}
