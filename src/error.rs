//! Error types.

/// Error returned by the conversion entry points and the CLI.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A custom parser was supplied without a renderer, or the reverse.
    #[error("a custom parser and a custom renderer must be supplied together")]
    IncompleteCustomProfile,

    /// Reading input or the css module map failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The css module map is not a JSON object of strings.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
