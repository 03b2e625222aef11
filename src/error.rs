/// Errors that can occur while obtaining a correction from the remote service.
///
/// Every variant is recoverable: the orchestrator catches them and falls back
/// to the original text, so none of these ever reach the calling application.
#[derive(Debug, thiserror::Error)]
pub enum CorrectionError {
    #[error("correction request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("completion service error: {message}")]
    Service { message: String },

    #[error("completion service returned no text")]
    EmptyCompletion,
}

impl From<reqwest::Error> for CorrectionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CorrectionError::Timeout
        } else {
            CorrectionError::Transport(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = CorrectionError::Service {
            message: "model overloaded".to_string(),
        };
        assert!(error.to_string().contains("completion service error"));
        assert!(error.to_string().contains("model overloaded"));
    }

    #[test]
    fn test_all_error_variants_have_messages() {
        let errors = vec![
            CorrectionError::Timeout,
            CorrectionError::Service {
                message: "failed".to_string(),
            },
            CorrectionError::EmptyCompletion,
        ];

        for error in errors {
            assert!(!error.to_string().is_empty());
        }
    }
}
