use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("HTTP request failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Http { url: String, status: u16 },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    Client(String),
}

impl ScanError {
    /// Short, stable code stored on a page record next to the message.
    pub fn error_code(&self) -> &'static str {
        match self {
            ScanError::Fetch(e) if e.is_timeout() => "timeout",
            ScanError::Fetch(e) if e.is_connect() => "connect",
            ScanError::Fetch(e) if e.is_redirect() => "redirect",
            ScanError::Fetch(e) if e.is_body() => "body",
            ScanError::Fetch(e) if e.is_decode() => "decode",
            ScanError::Fetch(_) => "request",
            ScanError::Http { .. } => "http",
            ScanError::Parse(_) => "parse",
            ScanError::InvalidUrl(_) => "invalid_url",
            ScanError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => "not_found",
            ScanError::Io(_) => "io",
            ScanError::Client(_) => "client",
        }
    }

    /// Only transport failures are worth another attempt. A response with a
    /// non-200 status is terminal for that link.
    pub fn is_retryable(&self) -> bool {
        match self {
            ScanError::Fetch(e) => e.is_timeout() || e.is_connect(),
            ScanError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::Interrupted | std::io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
