use thiserror::Error;

/// Failure talking to the pool backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("not signed in")]
    Unauthenticated,

    #[error("backend unreachable: {0}")]
    Transport(String),

    #[error("backend did not answer in time")]
    Timeout,

    /// The backend answered with an error; `message` is its own text.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("unexpected backend response: {0}")]
    Decode(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_shows_backend_text() {
        let err = ApiError::Rejected {
            status: 400,
            message: "insufficient funds for gas".into(),
        };
        assert_eq!(err.to_string(), "insufficient funds for gas");
    }
}
