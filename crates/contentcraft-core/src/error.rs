use thiserror::Error;

/// Failure of a single generation request.
///
/// The `Display` text is what the user sees in place of the output.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// Missing credential; no request was sent
    #[error("{0}")]
    Configuration(String),

    /// Upstream rejected the request or the transport failed
    #[error("{0}")]
    Provider(String),

    #[error("{0}")]
    NoImage(String),

    #[error("{0}")]
    NoContent(String),

    #[error("{0}")]
    InvalidInput(String),
}

impl GenerationError {
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::Configuration(_) => "configuration",
            GenerationError::Provider(_) => "provider",
            GenerationError::NoImage(_) => "no_image",
            GenerationError::NoContent(_) => "no_content",
            GenerationError::InvalidInput(_) => "invalid_input",
        }
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        GenerationError::Provider(err.to_string())
    }
}
