//! Lifecycle hooks.
//!
//! Five ordered extension points around each call. Every registered hook of
//! a point runs, in registration order, each time that point is reached:
//!
//! | Point | Fires | Receives |
//! |-------|-------|----------|
//! | `init` | once per call, before any attempt | merged [`Options`] |
//! | `before_request` | before every attempt | live [`Options`] |
//! | `after_response` | after every successful attempt | [`Response`], [`RetryTrigger`] |
//! | `before_redirect` | after a redirect decision | live [`Options`], the redirect [`Response`] |
//! | `before_retry` | after a retry decision, before the delay | live [`Options`], error, retry count |

use crate::base::neterror::NetError;
use crate::http::response::Response;
use crate::options::Options;
use std::fmt;
use std::sync::Arc;

pub type InitHook = Arc<dyn Fn(&mut Options) + Send + Sync>;

pub type BeforeRequestHook = Arc<dyn Fn(&mut Options) + Send + Sync>;

pub type BeforeRedirectHook = Arc<dyn Fn(&mut Options, &Response) + Send + Sync>;

pub type BeforeRetryHook = Arc<dyn Fn(&mut Options, Option<&NetError>, u32) + Send + Sync>;

/// May replace the response in place, or return [`AfterResponse::Retry`]
/// (usually via [`RetryTrigger::retry`]). An `Err` ends the call.
pub type AfterResponseHook =
    Arc<dyn Fn(&mut Response, &RetryTrigger) -> Result<AfterResponse, NetError> + Send + Sync>;

/// Outcome of one AfterResponse hook.
#[derive(Debug)]
pub enum AfterResponse {
    /// Hand the (possibly replaced) response to the next hook.
    Continue,
    /// Retry with these overrides merged into the live options. Remaining
    /// AfterResponse hooks are skipped.
    Retry(Options),
}

/// Retry handle bound to the attempt an AfterResponse hook is looking at.
#[derive(Debug, Clone, Copy)]
pub struct RetryTrigger {
    retries: u32,
    limit: u32,
}

impl RetryTrigger {
    pub(crate) fn new(retries: u32, limit: u32) -> Self {
        Self { retries, limit }
    }

    /// Request a retry. The overrides are merged right-biased into the live
    /// options before BeforeRetry hooks fire.
    pub fn retry(&self, overrides: Options) -> AfterResponse {
        AfterResponse::Retry(overrides)
    }

    /// Retries already performed in this call.
    pub fn retry_count(&self) -> u32 {
        self.retries
    }

    /// Whether another retry would still be under the policy limit.
    pub fn can_retry(&self) -> bool {
        self.retries < self.limit
    }
}

/// The five hook lists of a configuration record.
#[derive(Clone, Default)]
pub struct Hooks {
    pub init: Vec<InitHook>,
    pub before_request: Vec<BeforeRequestHook>,
    pub before_redirect: Vec<BeforeRedirectHook>,
    pub before_retry: Vec<BeforeRetryHook>,
    pub after_response: Vec<AfterResponseHook>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_init<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Options) + Send + Sync + 'static,
    {
        self.init.push(Arc::new(f));
        self
    }

    pub fn on_before_request<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Options) + Send + Sync + 'static,
    {
        self.before_request.push(Arc::new(f));
        self
    }

    pub fn on_before_redirect<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Options, &Response) + Send + Sync + 'static,
    {
        self.before_redirect.push(Arc::new(f));
        self
    }

    pub fn on_before_retry<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Options, Option<&NetError>, u32) + Send + Sync + 'static,
    {
        self.before_retry.push(Arc::new(f));
        self
    }

    pub fn on_after_response<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Response, &RetryTrigger) -> Result<AfterResponse, NetError>
            + Send
            + Sync
            + 'static,
    {
        self.after_response.push(Arc::new(f));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.init.is_empty()
            && self.before_request.is_empty()
            && self.before_redirect.is_empty()
            && self.before_retry.is_empty()
            && self.after_response.is_empty()
    }

    /// Right-biased merge: each list of `other` replaces ours when non-empty.
    pub(crate) fn merge(self, other: Hooks) -> Hooks {
        fn pick<T>(base: Vec<T>, over: Vec<T>) -> Vec<T> {
            if over.is_empty() {
                base
            } else {
                over
            }
        }

        Hooks {
            init: pick(self.init, other.init),
            before_request: pick(self.before_request, other.before_request),
            before_redirect: pick(self.before_redirect, other.before_redirect),
            before_retry: pick(self.before_retry, other.before_retry),
            after_response: pick(self.after_response, other.after_response),
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("init", &self.init.len())
            .field("before_request", &self.before_request.len())
            .field("before_redirect", &self.before_redirect.len())
            .field("before_retry", &self.before_retry.len())
            .field("after_response", &self.after_response.len())
            .finish()
    }
}

// The runners clone the (Arc) hook list first so hooks may take `&mut Options`.

pub(crate) fn run_init(options: &mut Options) {
    let hooks = options.hooks.init.clone();
    for hook in &hooks {
        hook(options);
    }
}

pub(crate) fn run_before_request(options: &mut Options) {
    let hooks = options.hooks.before_request.clone();
    for hook in &hooks {
        hook(options);
    }
}

pub(crate) fn run_before_redirect(options: &mut Options, response: &Response) {
    let hooks = options.hooks.before_redirect.clone();
    for hook in &hooks {
        hook(options, response);
    }
}

pub(crate) fn run_before_retry(options: &mut Options, error: Option<&NetError>) {
    let hooks = options.hooks.before_retry.clone();
    let retries = options.retry_count();
    for hook in &hooks {
        hook(options, error, retries);
    }
}

/// Run AfterResponse hooks until one asks for a retry. Returns the retry
/// overrides if any hook requested one.
pub(crate) fn run_after_response(
    options: &Options,
    response: &mut Response,
) -> Result<Option<Options>, NetError> {
    let trigger = RetryTrigger::new(options.retry_count(), options.retry_policy().limit);
    for hook in &options.hooks.after_response {
        match hook(response, &trigger)? {
            AfterResponse::Continue => {}
            AfterResponse::Retry(overrides) => return Ok(Some(overrides)),
        }
    }
    Ok(None)
}
