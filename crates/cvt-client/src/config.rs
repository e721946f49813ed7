//! Client configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use cvt_core::Lang;
use url::Url;

use crate::error::Result;

/// Backend address used in development.
pub const DEVELOPMENT_URL: &str = "http://localhost:4000";

/// Backend address used everywhere else.
pub const PRODUCTION_URL: &str = "http://vm0099cvt:4000";

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default number of retries for reads.
pub const DEFAULT_READ_RETRIES: u32 = 3;

/// Default base delay between read retries; doubles per attempt.
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

/// Upper bound on a single retry delay.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Container state poll interval while the log viewer is open.
pub const DEFAULT_STATE_POLL_INTERVAL: Duration = Duration::from_millis(3000);

/// Container list refresh interval.
pub const DEFAULT_LIST_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Wait before reopening a dropped log stream, unless the server sent `retry:`.
pub const DEFAULT_STREAM_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Deployment environment, selecting the default backend address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    /// Local development backend.
    Development,
    /// Deployed backend.
    #[default]
    Production,
}

impl Environment {
    /// Default backend address.
    #[must_use]
    pub const fn base_url(&self) -> &'static str {
        match self {
            Self::Development => DEVELOPMENT_URL,
            Self::Production => PRODUCTION_URL,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => f.write_str("development"),
            Self::Production => f.write_str("production"),
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

/// Settings for an [`crate::ApiClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend root, always ending with `/`.
    pub base_url: Url,
    /// Timeout of a single non-streaming request.
    pub request_timeout: Duration,
    /// Connect timeout, streams included.
    pub connect_timeout: Duration,
    /// Retries for reads, `/auth/me` excluded.
    pub read_retries: u32,
    /// First retry delay.
    pub retry_base_delay: Duration,
    /// State poll interval of the log console.
    pub state_poll_interval: Duration,
    /// Refresh interval of watched lists.
    pub list_poll_interval: Duration,
    /// Reconnection delay of the log stream.
    pub stream_retry_delay: Duration,
    /// Language of transcript notes and notifications.
    pub lang: Lang,
}

impl ClientConfig {
    /// Defaults for `env`.
    #[must_use]
    pub fn for_environment(env: Environment) -> Self {
        Self {
            base_url: normalize(Url::parse(env.base_url()).unwrap_or_else(|_| unreachable!())),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_retries: DEFAULT_READ_RETRIES,
            retry_base_delay: DEFAULT_RETRY_BASE_DELAY,
            state_poll_interval: DEFAULT_STATE_POLL_INTERVAL,
            list_poll_interval: DEFAULT_LIST_POLL_INTERVAL,
            stream_retry_delay: DEFAULT_STREAM_RETRY_DELAY,
            lang: Lang::default(),
        }
    }

    /// Defaults pointed at an explicit backend address.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClientError::InvalidUrl`] if `url` does not parse.
    pub fn with_base_url(url: &str) -> Result<Self> {
        let mut config = Self::for_environment(Environment::default());
        config.base_url = normalize(Url::parse(url)?);
        Ok(config)
    }

    /// Set the read retry policy.
    #[must_use]
    pub const fn retries(mut self, count: u32, base_delay: Duration) -> Self {
        self.read_retries = count;
        self.retry_base_delay = base_delay;
        self
    }

    /// Set the state and list poll intervals.
    #[must_use]
    pub const fn poll_intervals(mut self, state: Duration, list: Duration) -> Self {
        self.state_poll_interval = state;
        self.list_poll_interval = list;
        self
    }

    /// Set the log stream reconnection delay.
    #[must_use]
    pub const fn stream_retry(mut self, delay: Duration) -> Self {
        self.stream_retry_delay = delay;
        self
    }

    /// Set the language.
    #[must_use]
    pub const fn lang(mut self, lang: Lang) -> Self {
        self.lang = lang;
        self
    }

    /// Delay before retry number `attempt` (0-based).
    #[must_use]
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.retry_base_delay
            .saturating_mul(factor)
            .min(MAX_RETRY_DELAY)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::for_environment(Environment::default())
    }
}

fn normalize(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("development", Environment::Development ; "development")]
    #[test_case("DEV", Environment::Development ; "short uppercase")]
    #[test_case("production", Environment::Production ; "production")]
    fn parse_environment(input: &str, expected: Environment) {
        assert_eq!(input.parse::<Environment>(), Ok(expected));
    }

    #[test]
    fn environment_selects_base_url() {
        let dev = ClientConfig::for_environment(Environment::Development);
        assert_eq!(dev.base_url.as_str(), "http://localhost:4000/");
        let prod = ClientConfig::for_environment(Environment::Production);
        assert_eq!(prod.base_url.as_str(), "http://vm0099cvt:4000/");
    }

    #[test]
    fn explicit_url_gets_trailing_slash() {
        let config = ClientConfig::with_base_url("http://127.0.0.1:9000/api").expect("url");
        assert_eq!(config.base_url.as_str(), "http://127.0.0.1:9000/api/");
        assert_eq!(
            config.base_url.join("member/ls").expect("join").as_str(),
            "http://127.0.0.1:9000/api/member/ls"
        );
    }

    #[test]
    fn invalid_url_is_rejected() {
        assert!(ClientConfig::with_base_url("not a url").is_err());
    }

    #[test]
    fn retry_delay_doubles_and_caps() {
        let config = ClientConfig::default().retries(3, Duration::from_secs(1));
        assert_eq!(config.retry_delay(0), Duration::from_secs(1));
        assert_eq!(config.retry_delay(2), Duration::from_secs(4));
        assert_eq!(config.retry_delay(10), MAX_RETRY_DELAY);
    }

    #[test]
    fn stream_reconnects_after_three_seconds_by_default() {
        assert_eq!(ClientConfig::default().stream_retry_delay, Duration::from_secs(3));
        let config = ClientConfig::default().stream_retry(Duration::from_millis(50));
        assert_eq!(config.stream_retry_delay, Duration::from_millis(50));
    }
}
