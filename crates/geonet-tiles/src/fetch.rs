//! Blocking HTTP fetch with bounded retries.

use std::io::Read;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::FetchError;

/// Something that turns a URL into bytes.
///
/// The cache only ever talks to this trait, so tests can substitute an
/// in-process fake.
pub trait Fetcher: Send + Sync {
    /// Fetch the full body of `url`.
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Outcome of a single attempt, used by [`RetryPolicy::run`].
#[derive(Debug)]
pub enum Attempt {
    /// Stop retrying and report "not found".
    NotFound,
    /// Retry after a backoff delay.
    Transient(String),
}

/// Attempt count, backoff and timeout for network fetches.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, at least one is always made.
    pub attempts: u32,
    /// Delay before retry `i` (0-based) is `backoff_unit * backoff_base^i`.
    pub backoff_base: f64,
    /// Unit delay multiplied by the backoff factor.
    pub backoff_unit: Duration,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 6,
            backoff_base: 1.5,
            backoff_unit: Duration::from_secs(1),
            timeout: Duration::from_secs(180),
        }
    }
}

impl RetryPolicy {
    /// Sleep before the retry that follows failed attempt `attempt`.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        self.backoff_unit
            .mul_f64(self.backoff_base.powi(attempt as i32).max(0.0))
    }

    /// Run `op` until it succeeds, reports [`Attempt::NotFound`], or the
    /// attempt budget is spent.
    pub fn run<T>(&self, url: &str, mut op: impl FnMut() -> Result<T, Attempt>) -> Result<T, FetchError> {
        let attempts = self.attempts.max(1);
        let mut last = String::new();
        for i in 0..attempts {
            match op() {
                Ok(v) => return Ok(v),
                Err(Attempt::NotFound) => {
                    return Err(FetchError::NotFound { url: url.to_string() });
                }
                Err(Attempt::Transient(msg)) => {
                    last = msg;
                    if i + 1 < attempts {
                        let wait = self.delay(i);
                        warn!(
                            "Fetch failed ({last}), retrying in {:.1}s: {url}",
                            wait.as_secs_f64()
                        );
                        std::thread::sleep(wait);
                    } else {
                        warn!("Fetch failed ({last}), giving up: {url}");
                    }
                }
            }
        }
        Err(FetchError::Exhausted {
            url: url.to_string(),
            attempts,
            last,
        })
    }
}

/// [`Fetcher`] backed by a shared `ureq` agent.
pub struct HttpFetcher {
    agent: ureq::Agent,
    policy: RetryPolicy,
}

impl HttpFetcher {
    /// Create a fetcher using `policy` for timeouts and retries.
    pub fn new(policy: RetryPolicy) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(policy.timeout)
            .user_agent(concat!("geonet/", env!("CARGO_PKG_VERSION")))
            .build();
        Self { agent, policy }
    }

    fn attempt(&self, url: &str) -> Result<Vec<u8>, Attempt> {
        match self.agent.get(url).call() {
            Ok(resp) => {
                let mut body = Vec::new();
                resp.into_reader()
                    .read_to_end(&mut body)
                    .map_err(|e| Attempt::Transient(format!("read body: {e}")))?;
                debug!(bytes = body.len(), "Fetched {url}");
                Ok(body)
            }
            Err(ureq::Error::Status(404, _)) => Err(Attempt::NotFound),
            Err(ureq::Error::Status(code, resp)) => {
                Err(Attempt::Transient(format!("HTTP {code} {}", resp.status_text())))
            }
            Err(e) => Err(Attempt::Transient(e.to_string())),
        }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.policy.run(url, || self.attempt(url))
    }
}
