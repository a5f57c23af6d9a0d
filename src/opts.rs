//! Connection options.

use std::time::Duration;

use url::Url;

use crate::error::Error;

/// Client-side options for a connection.
#[derive(Debug, Clone)]
pub struct Opts {
    /// Overlap fetching chunk k+1 with the caller's processing of chunk k.
    ///
    /// Only the tokio client prefetches; the sync client always fetches on demand.
    ///
    /// Default: `true`
    pub prefetch: bool,

    /// Delay before the first retry of a "not ready yet" start, poll or fetch.
    ///
    /// A zero delay yields to the scheduler instead of sleeping.
    ///
    /// Default: `0`
    pub retry_initial_backoff: Duration,

    /// Upper bound for the doubling retry delay.
    ///
    /// Default: `1ms`
    pub retry_max_backoff: Duration,

    /// Give up with `Error::Timeout` once a single retry loop has waited this long.
    ///
    /// Default: `None` (retry until the engine answers or the link detaches)
    pub retry_timeout: Option<Duration>,

    /// Emit a log entry with the query text before each query.
    ///
    /// Default: `true`
    pub log_queries: bool,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            prefetch: true,
            retry_initial_backoff: Duration::ZERO,
            retry_max_backoff: Duration::from_millis(1),
            retry_timeout: None,
            log_queries: true,
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, Error> {
    match value {
        "true" | "True" | "1" | "yes" | "on" => Ok(true),
        "false" | "False" | "0" | "no" | "off" => Ok(false),
        _ => Err(Error::InvalidUsage(format!("Invalid {}: {}", key, value))),
    }
}

fn parse_u64(key: &str, value: &str) -> Result<u64, Error> {
    value
        .parse()
        .map_err(|_| Error::InvalidUsage(format!("Invalid {}: {}", key, value)))
}

impl TryFrom<&Url> for Opts {
    type Error = Error;

    /// Parse an option URL.
    ///
    /// Format: `engine://[?param1=value1&param2=value2&..]`
    ///
    /// Supported query parameters:
    /// - `prefetch`: true/True/1/yes/on or false/False/0/no/off
    /// - `retry_initial_us`: initial retry delay in microseconds
    /// - `retry_max_us`: maximum retry delay in microseconds
    /// - `retry_timeout_ms`: retry deadline in milliseconds
    /// - `log_queries`: true/false as for `prefetch`
    fn try_from(url: &Url) -> Result<Self, Self::Error> {
        if url.scheme() != "engine" {
            return Err(Error::InvalidUsage(format!(
                "Invalid scheme: expected 'engine://', got '{}://'",
                url.scheme()
            )));
        }

        let mut opts = Opts::default();

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "prefetch" => opts.prefetch = parse_bool(&key, &value)?,
                "log_queries" => opts.log_queries = parse_bool(&key, &value)?,
                "retry_initial_us" => {
                    opts.retry_initial_backoff = Duration::from_micros(parse_u64(&key, &value)?);
                }
                "retry_max_us" => {
                    opts.retry_max_backoff = Duration::from_micros(parse_u64(&key, &value)?);
                }
                "retry_timeout_ms" => {
                    opts.retry_timeout = Some(Duration::from_millis(parse_u64(&key, &value)?));
                }
                _ => {
                    return Err(Error::InvalidUsage(format!("Unknown option: {}", key)));
                }
            }
        }

        if opts.retry_max_backoff < opts.retry_initial_backoff {
            return Err(Error::InvalidUsage(
                "retry_max_us must not be smaller than retry_initial_us".into(),
            ));
        }

        Ok(opts)
    }
}

impl TryFrom<&str> for Opts {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let url = Url::parse(s).map_err(|e| Error::InvalidUsage(format!("Invalid URL: {}", e)))?;
        Self::try_from(&url)
    }
}
