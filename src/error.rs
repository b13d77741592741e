/// Failures surfaced by ingestion, selection and pricing.
///
/// None of these are fatal to the application: callers log them and keep running.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClubIndexError {
    /// Network error, timeout or non-2xx response while fetching the ranking payload.
    #[error("ranking fetch failed: {reason}")]
    FetchFailed { reason: String },

    /// The payload decoded (or failed to decode) into something that is not a known ranking shape.
    #[error("malformed ranking payload: {reason}")]
    MalformedPayload { reason: String },

    /// Home and away are the same club, or one of them is not in the table.
    #[error("invalid selection: {reason}")]
    InvalidSelection { reason: String },

    /// The model produced a zero or non-finite probability/odds term.
    #[error("degenerate model output: {reason}")]
    DegenerateModel { reason: String },
}

impl ClubIndexError {
    pub fn fetch_failed(reason: impl Into<String>) -> Self {
        Self::FetchFailed {
            reason: reason.into(),
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedPayload {
            reason: reason.into(),
        }
    }

    pub fn invalid_selection(reason: impl Into<String>) -> Self {
        Self::InvalidSelection {
            reason: reason.into(),
        }
    }

    pub fn degenerate(reason: impl Into<String>) -> Self {
        Self::DegenerateModel {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClubIndexError>;
