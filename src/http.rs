// Blocking HTTP plumbing shared by the Chroma and embedding service clients

use anyhow::{Result, anyhow};
use std::time::Duration;
use tracing::{debug, error, warn};
use url::Url;

pub(crate) const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub(crate) const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
const EXPONENTIAL_BACKOFF_BASE: u32 = 2;

pub(crate) fn build_agent(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build()
        .into()
}

/// Retries transport failures and 5xx responses with exponential backoff.
/// Client errors are returned immediately.
#[derive(Debug, Clone)]
pub(crate) struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
    /// When false a 5xx response fails on the first attempt
    pub retry_server_errors: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_RETRY_ATTEMPTS,
            base_delay: Duration::from_secs(1),
            retry_server_errors: true,
        }
    }
}

impl RetryPolicy {
    /// Same policy, but only transport failures are retried. Used for writes,
    /// where a server error may have left the request partially applied.
    pub(crate) fn transport_only(&self) -> Self {
        Self {
            retry_server_errors: false,
            ..self.clone()
        }
    }

    pub(crate) fn execute<F>(&self, target: &Url, mut request_fn: F) -> Result<String>
    where
        F: FnMut() -> Result<String, ureq::Error>,
    {
        let mut last_error = None;

        for attempt in 1..=self.attempts {
            debug!("HTTP request attempt {}/{}", attempt, self.attempts);

            match request_fn() {
                Ok(response_text) => {
                    debug!("Request succeeded on attempt {}", attempt);
                    return Ok(response_text);
                }
                Err(error) => {
                    let should_retry = match &error {
                        ureq::Error::StatusCode(status) => {
                            if *status >= 500 && !self.retry_server_errors {
                                warn!("Server error (status {}), not retrying", status);
                                return Err(anyhow!("Server error: HTTP {}", status));
                            } else if *status >= 500 {
                                warn!(
                                    "Server error (status {}), attempt {}/{}",
                                    status, attempt, self.attempts
                                );
                                true
                            } else {
                                warn!("Client error (status {}), not retrying", status);
                                return Err(anyhow!("Client error: HTTP {}", status));
                            }
                        }
                        ureq::Error::ConnectionFailed
                        | ureq::Error::HostNotFound
                        | ureq::Error::Timeout(_)
                        | ureq::Error::Io(_) => {
                            warn!(
                                "Transport error: {}, attempt {}/{}",
                                error, attempt, self.attempts
                            );
                            true
                        }
                        _ => {
                            warn!("Non-retryable error: {}", error);
                            false
                        }
                    };

                    if !should_retry {
                        return Err(anyhow!("Non-retryable error: {}", error));
                    }

                    last_error = Some(anyhow!("Request error: {}", error));

                    if attempt < self.attempts {
                        let delay = self.base_delay * EXPONENTIAL_BACKOFF_BASE.pow(attempt - 1);
                        debug!("Waiting {:?} before retry", delay);
                        std::thread::sleep(delay);
                    }
                }
            }
        }

        error!("All retry attempts failed for request to {}", target);

        Err(last_error.unwrap_or_else(|| anyhow!("Request failed after retries")))
    }
}
