use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Errors returned by the REST notification endpoints
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{detail}")]
    Status { status: u16, detail: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    /// HTTP status code, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Http(e) => e.status().map(|s| s.as_u16()),
            ApiError::InvalidUrl(_) => None,
        }
    }
}

/// Push transport failures. These only drive the reconnect loop.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;
