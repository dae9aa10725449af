use thiserror::Error;

/// Errors surfaced by dashboard operations.
///
/// Every variant is recovered at the caller boundary; none of them is fatal to
/// the session and a failed operation leaves previously committed state intact.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DashboardError {
    /// The requested time range is unusable (unparseable, in the past, or empty).
    #[error("{0}")]
    InvalidRange(String),

    /// Missing selection or bad local input.
    #[error("{0}")]
    Validation(String),

    /// The request never produced an HTTP response.
    #[error("Network error: {0}")]
    Network(String),

    /// The device is no longer bookable for the chosen range.
    #[error("{0}")]
    Conflict(String),

    /// The backend answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Server { status: u16, message: String },

    /// The backend answered but the payload did not have the expected shape.
    #[error("Invalid response format from server: {0}")]
    Decode(String),
}

impl DashboardError {
    /// Failures a user can retry by hand (catalog loads offer a retry button).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Server { .. } | Self::Decode(_))
    }

    /// Whether this error should be shown with reselection guidance.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<reqwest::Error> for DashboardError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

pub type DashboardResult<T> = std::result::Result<T, DashboardError>;
