//! Retry and redirect policy records.

use crate::base::neterror::NetError;
use http::Method;
use std::fmt;
use std::sync::Arc;

/// Chooses the actual wait before a retry.
///
/// Receives the retries performed so far, the policy, the computed delay
/// (retry-after or the request timeout, possibly negative) and the error that
/// triggered the retry, if any.
pub type CalculateTimeoutFn = Arc<
    dyn Fn(u32, &RetryOptions, time::Duration, Option<&NetError>) -> std::time::Duration
        + Send
        + Sync,
>;

/// Configuration for retry behavior.
#[derive(Clone)]
pub struct RetryOptions {
    /// Maximum number of retries (default: 2)
    pub limit: u32,
    /// Only retry eligible statuses for these methods
    pub methods: Vec<Method>,
    /// Response statuses eligible for a retry
    pub status_codes: Vec<u16>,
    /// Transport errors are retried when their message contains one of these
    pub error_codes: Vec<String>,
    /// Honor the response `retry-after` header
    pub retry_after: bool,
    pub calculate_timeout: CalculateTimeoutFn,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            limit: 2,
            methods: vec![
                Method::GET,
                Method::PUT,
                Method::HEAD,
                Method::DELETE,
                Method::OPTIONS,
                Method::TRACE,
            ],
            status_codes: vec![408, 413, 429, 500, 502, 503, 504, 521, 522, 524],
            error_codes: [
                "ETIMEDOUT",
                "ECONNRESET",
                "EADDRINUSE",
                "ECONNREFUSED",
                "EPIPE",
                "ENOTFOUND",
                "ENETUNREACH",
                "EAI_AGAIN",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            retry_after: true,
            calculate_timeout: Arc::new(crate::http::retry::default_calculate_timeout),
        }
    }
}

impl RetryOptions {
    /// A policy that never retries.
    pub fn no_retry() -> Self {
        Self {
            limit: 0,
            ..Default::default()
        }
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.methods = methods.into_iter().collect();
        self
    }

    pub fn status_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.status_codes = codes.into_iter().collect();
        self
    }

    pub fn error_codes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.error_codes = codes.into_iter().map(Into::into).collect();
        self
    }

    pub fn retry_after(mut self, honor: bool) -> Self {
        self.retry_after = honor;
        self
    }

    pub fn calculate_timeout<F>(mut self, f: F) -> Self
    where
        F: Fn(u32, &RetryOptions, time::Duration, Option<&NetError>) -> std::time::Duration
            + Send
            + Sync
            + 'static,
    {
        self.calculate_timeout = Arc::new(f);
        self
    }
}

impl fmt::Debug for RetryOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryOptions")
            .field("limit", &self.limit)
            .field("methods", &self.methods)
            .field("status_codes", &self.status_codes)
            .field("error_codes", &self.error_codes)
            .field("retry_after", &self.retry_after)
            .finish_non_exhaustive()
    }
}

/// Configuration for redirect behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedirectOptions {
    /// Maximum redirects to follow; 0 means unlimited.
    pub limit: usize,
    /// Follow every redirect with GET. A 303 forces GET for anything but
    /// GET/HEAD regardless.
    pub rewrite_methods: bool,
}

impl Default for RedirectOptions {
    fn default() -> Self {
        Self {
            limit: 0,
            rewrite_methods: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryOptions::default();
        assert_eq!(policy.limit, 2);
        assert!(policy.methods.contains(&Method::TRACE));
        assert!(!policy.methods.contains(&Method::POST));
        assert!(policy.status_codes.contains(&524));
        assert_eq!(policy.error_codes.len(), 8);
        assert!(policy.retry_after);
    }

    #[test]
    fn test_default_calculate_timeout_clamps_negative() {
        let policy = RetryOptions::default();
        let f = policy.calculate_timeout.clone();
        assert_eq!(
            f(0, &policy, time::Duration::seconds(-5), None),
            std::time::Duration::ZERO
        );
        assert_eq!(
            f(0, &policy, time::Duration::seconds(3), None),
            std::time::Duration::from_secs(3)
        );
    }

    #[test]
    fn test_no_retry() {
        assert_eq!(RetryOptions::no_retry().limit, 0);
    }

    #[test]
    fn test_redirect_defaults() {
        let r = RedirectOptions::default();
        assert_eq!(r.limit, 0);
        assert!(r.rewrite_methods);
    }
}
