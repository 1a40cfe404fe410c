//! Retry decisions and delay computation.
//!
//! A finished attempt is retried when retries are enabled and either the
//! transport error's message contains one of the policy's error codes, or
//! the response status and the request method are both eligible. Once the
//! retry count has reached the limit an eligible attempt is
//! [`RetryDecision::Exhausted`] instead.

use crate::base::neterror::NetError;
use crate::http::response::Response;
use crate::options::{Options, RetryOptions};
use crate::util::contains_any;
use http::header::RETRY_AFTER;
use http::Method;
use std::time::{Duration, SystemTime};

/// Outcome of evaluating one attempt against the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Eligible and under the limit.
    Retry,
    /// Eligible, but the limit has been reached.
    Exhausted,
    /// Not eligible for a retry.
    Stop,
}

/// Evaluate an attempt that produced `response` or failed with `error`.
pub fn evaluate(
    options: &Options,
    method: &Method,
    response: Option<&Response>,
    error: Option<&NetError>,
) -> RetryDecision {
    if !options.retry_enabled() {
        return RetryDecision::Stop;
    }
    let policy = options.retry_policy();

    let eligible = match (error, response) {
        (Some(err), _) => contains_any(&policy.error_codes, &err.to_string()),
        (None, Some(res)) => {
            policy.status_codes.contains(&res.status().as_u16()) && policy.methods.contains(method)
        }
        (None, None) => false,
    };

    if !eligible {
        RetryDecision::Stop
    } else if options.retry_count() < policy.limit {
        RetryDecision::Retry
    } else {
        RetryDecision::Exhausted
    }
}

/// Check if the attempt should be retried right away.
pub fn should_retry(
    options: &Options,
    method: &Method,
    response: Option<&Response>,
    error: Option<&NetError>,
) -> bool {
    evaluate(options, method, response, error) == RetryDecision::Retry
}

/// Parse a `retry-after` value: integer seconds or an HTTP date.
///
/// A date yields `date - now`, which is negative for dates in the past.
pub fn parse_retry_after(value: &str, now: SystemTime) -> Option<time::Duration> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(seconds) = value.parse::<i64>() {
        return Some(time::Duration::seconds(seconds));
    }

    let date = httpdate::parse_http_date(value).ok()?;
    Some(time::OffsetDateTime::from(date) - time::OffsetDateTime::from(now))
}

/// The delay before `calculate_timeout` runs: the server's `retry-after`
/// when honored and valid, else the request timeout.
pub fn computed_delay(options: &Options, response: Option<&Response>) -> time::Duration {
    let fallback = time::Duration::try_from(options.request_timeout()).unwrap_or(time::Duration::MAX);
    if !options.retry_policy().retry_after {
        return fallback;
    }

    response
        .and_then(|res| res.headers().get(RETRY_AFTER))
        .and_then(|v| v.to_str().ok())
        .and_then(|v| parse_retry_after(v, SystemTime::now()))
        .unwrap_or(fallback)
}

/// The wait before the next attempt, after the policy's `calculate_timeout`.
pub fn retry_delay(
    options: &Options,
    response: Option<&Response>,
    error: Option<&NetError>,
) -> Duration {
    let policy = options.retry_policy();
    let computed = computed_delay(options, response);
    (policy.calculate_timeout)(options.retry_count(), policy, computed, error)
}

/// Use the computed delay as is; negative delays become zero.
pub fn default_calculate_timeout(
    _retries: u32,
    _policy: &RetryOptions,
    computed: time::Duration,
    _error: Option<&NetError>,
) -> Duration {
    Duration::try_from(computed).unwrap_or(Duration::ZERO)
}
