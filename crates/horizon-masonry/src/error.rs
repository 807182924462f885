//! Error types for the masonry grid.

/// Result type alias for grid operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the grid controller.
///
/// The packing algorithm itself never fails: hidden containers, empty item
/// sets and unknown filter tags all degrade to a no-op or an empty result.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A configuration value is out of range or malformed.
    #[error("Invalid value for option '{option}': {message}")]
    InvalidOption {
        option: &'static str,
        message: String,
    },

    /// A length string could not be parsed.
    #[error("Invalid length '{input}': expected pixels (e.g. 240 or \"240px\") or a percentage (e.g. \"30%\")")]
    InvalidLength { input: String },

    /// Options could not be deserialized.
    #[error("Failed to parse grid options: {0}")]
    Deserialize(#[from] serde_json::Error),

    /// The grid was torn down and no longer performs layout.
    #[error("The grid has been torn down")]
    TornDown,
}

impl Error {
    /// Create an invalid option error.
    pub fn invalid_option(option: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidOption {
            option,
            message: message.into(),
        }
    }

    /// Create an invalid length error.
    pub fn invalid_length(input: impl Into<String>) -> Self {
        Self::InvalidLength {
            input: input.into(),
        }
    }
}
