use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    // Configuration errors
    #[error("Invalid value for {name}: {value}")]
    InvalidEnvVar { name: String, value: String },

    // Network errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request failed: {0}")]
    Fetch(#[from] FetchFailure),

    #[error("Unexpected content type: {0:?}")]
    UnexpectedContentType(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // Parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Extraction errors
    #[error("Extractor failed: {0}")]
    Extractor(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type FeedResult<T> = Result<T, FeedError>;

/// Why a single GET did not produce a usable body.
///
/// Renders as the short tags `timeout`, `error`, `status_<code>` and `json`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    #[error("timeout")]
    Timeout,
    #[error("error")]
    Transport,
    #[error("status_{0}")]
    Status(u16),
    #[error("json")]
    Json,
}

impl FetchFailure {
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchFailure::Timeout
        } else {
            FetchFailure::Transport
        }
    }
}
