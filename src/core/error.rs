use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    pub fn invalid(key: &'static str, value: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Outcome of a single fetch attempt.
#[derive(Debug, Error)]
pub enum FetchAttemptError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("invalid request: {0}")]
    Request(String),

    #[error("fetch tool exited with code {code:?}: {stderr}")]
    ToolFailed { code: Option<i32>, stderr: String },

    #[error("fetch tool unavailable: {0}")]
    ToolUnavailable(String),
}

impl FetchAttemptError {
    /// Timeouts, connection problems and non-2xx responses are worth another try.
    pub fn is_transient(&self) -> bool {
        !matches!(
            self,
            FetchAttemptError::Request(_) | FetchAttemptError::ToolUnavailable(_)
        )
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network retries exhausted after {attempts} attempt(s): {last}")]
    NetworkExhausted {
        attempts: u32,
        #[source]
        last: FetchAttemptError,
    },

    #[error("fetch failed without retry on attempt {attempts}: {source}")]
    NonRetryable {
        attempts: u32,
        #[source]
        source: FetchAttemptError,
    },
}

impl FetchError {
    pub fn attempts(&self) -> u32 {
        match self {
            FetchError::NetworkExhausted { attempts, .. } => *attempts,
            FetchError::NonRetryable { attempts, .. } => *attempts,
        }
    }
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("failed to build email: {0}")]
    Build(String),

    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("no {keyword} listings found, the page structure may have changed")]
    NoListings { keyword: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(FetchAttemptError::Timeout.is_transient());
        assert!(FetchAttemptError::Connect("reset".into()).is_transient());
        assert!(FetchAttemptError::Status(503).is_transient());
        assert!(FetchAttemptError::Status(404).is_transient());
        assert!(FetchAttemptError::ToolFailed { code: Some(28), stderr: String::new() }.is_transient());
        assert!(!FetchAttemptError::ToolUnavailable("curl".into()).is_transient());
        assert!(!FetchAttemptError::Request("bad url".into()).is_transient());
    }

    #[test]
    fn test_error_display() {
        let err = FetchError::NetworkExhausted {
            attempts: 3,
            last: FetchAttemptError::Status(502),
        };
        assert_eq!(
            err.to_string(),
            "network retries exhausted after 3 attempt(s): HTTP status 502"
        );
        assert_eq!(err.attempts(), 3);

        let err = ConfigError::Missing("SMTP_PASSWORD");
        assert_eq!(err.to_string(), "missing required environment variable SMTP_PASSWORD");
    }
}
