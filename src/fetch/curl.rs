use async_trait::async_trait;
use std::io::ErrorKind;
use std::time::Duration;
use tokio::process::Command;

use super::{polite_pause, Fetcher, BROWSER_HEADERS};
use crate::core::{FetchAttemptError, FetchConfig};

// curl exit codes, see `man curl`
const CURL_COULDNT_RESOLVE_HOST: i32 = 6;
const CURL_COULDNT_CONNECT: i32 = 7;
const CURL_HTTP_RETURNED_ERROR: i32 = 22;
const CURL_OPERATION_TIMEDOUT: i32 = 28;

/// Fallback transport that shells out to `curl`, for hosts where the native
/// client gets blocked by TLS fingerprinting.
pub struct CurlFetcher {
    program: String,
    timeout: Duration,
    user_agent: String,
    pre_request_delay: Option<(Duration, Duration)>,
}

impl CurlFetcher {
    pub fn new(config: &FetchConfig) -> Self {
        Self {
            program: config.curl_path.clone(),
            timeout: config.timeout,
            user_agent: config.user_agent.clone(),
            pre_request_delay: config.pre_request_delay,
        }
    }

    fn args(&self, url: &str) -> Vec<String> {
        let mut args = vec![
            "--silent".to_string(),
            "--show-error".to_string(),
            "--location".to_string(),
            "--compressed".to_string(),
            "--fail".to_string(),
            "--max-time".to_string(),
            self.timeout.as_secs().max(1).to_string(),
            "--user-agent".to_string(),
            self.user_agent.clone(),
        ];
        for (name, value) in BROWSER_HEADERS {
            args.push("--header".to_string());
            args.push(format!("{}: {}", name, value));
        }
        args.push(url.to_string());
        args
    }
}

#[async_trait]
impl Fetcher for CurlFetcher {
    fn name(&self) -> &'static str {
        "curl"
    }

    async fn fetch_once(&self, url: &str) -> Result<String, FetchAttemptError> {
        polite_pause(self.pre_request_delay).await;

        let output = Command::new(&self.program)
            .args(self.args(url))
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => {
                    FetchAttemptError::ToolUnavailable(format!("'{}' not found", self.program))
                }
                _ => FetchAttemptError::ToolUnavailable(format!("{}: {}", self.program, e)),
            })?;

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(classify_exit(output.status.code(), stderr))
    }
}

fn classify_exit(code: Option<i32>, stderr: String) -> FetchAttemptError {
    match code {
        Some(CURL_OPERATION_TIMEDOUT) => FetchAttemptError::Timeout,
        Some(CURL_COULDNT_RESOLVE_HOST) | Some(CURL_COULDNT_CONNECT) => {
            FetchAttemptError::Connect(stderr)
        }
        Some(CURL_HTTP_RETURNED_ERROR) => match http_status_from_stderr(&stderr) {
            Some(status) => FetchAttemptError::Status(status),
            None => FetchAttemptError::ToolFailed { code, stderr },
        },
        _ => FetchAttemptError::ToolFailed { code, stderr },
    }
}

// "curl: (22) The requested URL returned error: 503"
fn http_status_from_stderr(stderr: &str) -> Option<u16> {
    let (_, tail) = stderr.rsplit_once("error:")?;
    tail.split_whitespace().next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> FetchConfig {
        FetchConfig {
            pre_request_delay: None,
            ..FetchConfig::default()
        }
    }

    #[test]
    fn test_exit_code_classification() {
        assert!(matches!(classify_exit(Some(28), String::new()), FetchAttemptError::Timeout));
        assert!(matches!(classify_exit(Some(7), String::new()), FetchAttemptError::Connect(_)));
        assert!(matches!(
            classify_exit(Some(22), "curl: (22) The requested URL returned error: 503".into()),
            FetchAttemptError::Status(503)
        ));
        assert!(matches!(
            classify_exit(Some(22), "garbled".into()),
            FetchAttemptError::ToolFailed { code: Some(22), .. }
        ));
        assert!(matches!(
            classify_exit(None, String::new()),
            FetchAttemptError::ToolFailed { code: None, .. }
        ));
    }

    #[test]
    fn test_args_carry_headers_and_url_last() {
        let fetcher = CurlFetcher::new(&config());
        let args = fetcher.args("https://shop.test/search?q=apples");

        assert_eq!(args.last().map(String::as_str), Some("https://shop.test/search?q=apples"));
        assert!(args.contains(&"--fail".to_string()));
        assert!(args.contains(&"45".to_string()));
        assert!(args.contains(&"accept-language: en-US,en;q=0.5".to_string()));
    }

    #[tokio::test]
    async fn test_missing_binary_is_unavailable() {
        let fetcher = CurlFetcher::new(&FetchConfig {
            curl_path: "/nonexistent/bin/curl-does-not-exist".to_string(),
            ..config()
        });

        let err = tokio_test::assert_err!(fetcher.fetch_once("https://shop.test/").await);

        assert!(matches!(err, FetchAttemptError::ToolUnavailable(_)));
        assert!(!err.is_transient());
    }
}
