//! The per-call configuration record and its layered merge.
//!
//! An [`Options`] value is both the override layer a caller passes in and
//! the live record a call mutates as it runs. Every field is optional; a
//! `None` (or an empty header map / hook list) means "unset" and falls back to
//! the layer below it when merging with [`Options::extend`].
//!
//! ```rust,ignore
//! use hookline::options::{Options, RetryOptions};
//! use http::Method;
//!
//! let base = Options::defaults().prefix_url("https://api.example.com");
//! let call = base.extend(
//!     Options::new()
//!         .method(Method::POST)
//!         .header("x-api-key", "secret")
//!         .retry_options(RetryOptions::default().limit(5)),
//! )?;
//! ```

pub mod form;
pub mod retry;

pub use form::Form;
pub use retry::{CalculateTimeoutFn, RedirectOptions, RetryOptions};

use crate::adapter::{Adapter, HyperAdapter};
use crate::base::neterror::NetError;
use crate::cookies::jar::{cookie_header_value, CookieJar};
use crate::cookies::store::CookieStore;
use crate::hooks::Hooks;
use crate::http::RequestBody;
use crate::util::merge_url;
use http::header::{HeaderName, HeaderValue, COOKIE};
use http::{HeaderMap, Method};
use std::any::Any;
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use url::Url;

/// JSON payloads are ordered key/value mappings.
pub type Json = serde_json::Map<String, serde_json::Value>;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Serializes a JSON payload into the request body.
pub type MarshalJsonFn = Arc<dyn Fn(&Json) -> Result<Vec<u8>, BoxError> + Send + Sync>;

/// Parses a response body as a JSON payload.
pub type UnmarshalJsonFn = Arc<dyn Fn(&[u8]) -> Result<Json, BoxError> + Send + Sync>;

/// Per-attempt timeout, and the retry delay when the server gives none.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// The configuration record.
#[derive(Clone, Default)]
pub struct Options {
    /// Transport used for every attempt. Replaced wholesale when merged.
    pub adapter: Option<Arc<dyn Adapter>>,

    /// Forward proxy the adapter should route attempts through.
    pub proxy: Option<Url>,

    /// Request URI; relative URIs resolve against `prefix_url`.
    pub uri: Option<String>,

    /// Prepended to `uri`. A trailing slash is added when missing.
    pub prefix_url: Option<String>,

    /// The URL computed from `prefix_url`, `uri` and `search_params` before
    /// each attempt.
    pub full_url: Option<Url>,

    pub method: Option<Method>,

    pub headers: HeaderMap,

    /// Raw body. Form data, then JSON data, take precedence over it.
    pub body: Option<RequestBody>,

    pub json: Option<Json>,

    /// Encoded as `application/x-www-form-urlencoded`.
    pub form: Option<Form>,

    /// Replaces the query string of `uri`.
    pub search_params: Option<Form>,

    pub marshal_json: Option<MarshalJsonFn>,

    pub unmarshal_json: Option<UnmarshalJsonFn>,

    /// Arbitrary caller data, e.g. an auth token read by a hook.
    pub context: Option<Arc<dyn Any + Send + Sync>>,

    /// When unset, cookies are only sent if placed in `headers` manually.
    pub cookie_jar: Option<Arc<dyn CookieJar>>,

    pub timeout: Option<Duration>,

    pub retry: Option<bool>,

    pub retry_options: Option<RetryOptions>,

    pub follow_redirect: Option<bool>,

    pub redirect_options: Option<RedirectOptions>,

    pub hooks: Hooks,

    pub(crate) retries: u32,

    pub(crate) redirect_urls: Vec<Url>,
}

impl Options {
    /// An empty override record: every field unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// The base record every client starts from.
    pub fn defaults() -> Self {
        Self {
            adapter: Some(Arc::new(HyperAdapter::new())),
            method: Some(Method::GET),
            marshal_json: Some(Arc::new(|json: &Json| {
                serde_json::to_vec(json).map_err(BoxError::from)
            })),
            unmarshal_json: Some(Arc::new(|data: &[u8]| {
                serde_json::from_slice::<Json>(data).map_err(BoxError::from)
            })),
            cookie_jar: Some(Arc::new(CookieStore::new())),
            timeout: Some(DEFAULT_TIMEOUT),
            retry: Some(true),
            retry_options: Some(RetryOptions::default()),
            follow_redirect: Some(true),
            redirect_options: Some(RedirectOptions::default()),
            ..Self::default()
        }
    }

    /// Merge `over` on top of `self`: every field set on `over` wins.
    ///
    /// Fails with [`NetError::ConfigMerge`] when the merged `prefix_url` is
    /// not an absolute URL.
    pub fn extend(self, over: Options) -> Result<Options, NetError> {
        let merged = self.merge(over);
        if let Some(prefix) = merged.prefix_url.as_deref().filter(|p| !p.is_empty()) {
            Url::parse(prefix).map_err(|e| NetError::ConfigMerge {
                reason: format!("prefix_url {:?}: {}", prefix, e),
            })?;
        }
        Ok(merged)
    }

    /// Infallible field-by-field merge used by [`Options::extend`] and for
    /// merging hook-supplied retry overrides into a live record.
    pub(crate) fn merge(self, over: Options) -> Options {
        let mut headers = self.headers;
        for name in over.headers.keys() {
            headers.remove(name);
        }
        for (name, value) in over.headers.iter() {
            headers.append(name.clone(), value.clone());
        }

        Options {
            adapter: over.adapter.or(self.adapter),
            proxy: over.proxy.or(self.proxy),
            uri: over.uri.or(self.uri),
            prefix_url: over.prefix_url.or(self.prefix_url),
            full_url: over.full_url.or(self.full_url),
            method: over.method.or(self.method),
            headers,
            body: over.body.or(self.body),
            json: over.json.or(self.json),
            form: over.form.or(self.form),
            search_params: over.search_params.or(self.search_params),
            marshal_json: over.marshal_json.or(self.marshal_json),
            unmarshal_json: over.unmarshal_json.or(self.unmarshal_json),
            context: over.context.or(self.context),
            cookie_jar: over.cookie_jar.or(self.cookie_jar),
            timeout: over.timeout.or(self.timeout),
            retry: over.retry.or(self.retry),
            retry_options: over.retry_options.or(self.retry_options),
            follow_redirect: over.follow_redirect.or(self.follow_redirect),
            redirect_options: over.redirect_options.or(self.redirect_options),
            hooks: self.hooks.merge(over.hooks),
            retries: self.retries,
            redirect_urls: self.redirect_urls,
        }
    }

    /// In-place form of [`Options::merge`].
    pub(crate) fn merge_from(&mut self, over: Options) {
        let base = std::mem::take(self);
        *self = base.merge(over);
    }

    // Builder setters

    pub fn adapter<A: Adapter + 'static>(mut self, adapter: A) -> Self {
        self.adapter = Some(Arc::new(adapter));
        self
    }

    pub fn proxy(mut self, proxy: Url) -> Self {
        self.proxy = Some(proxy);
        self
    }

    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn prefix_url(mut self, prefix: impl Into<String>) -> Self {
        self.prefix_url = Some(prefix.into());
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Add a header. Invalid names or values are dropped with a warning;
    /// use [`Options::try_header`] to surface them.
    pub fn header<K, V>(mut self, key: K, value: V) -> Self
    where
        K: TryInto<HeaderName>,
        V: TryInto<HeaderValue>,
    {
        match (key.try_into(), value.try_into()) {
            (Ok(k), Ok(v)) => {
                self.headers.append(k, v);
            }
            _ => tracing::warn!("dropping invalid header"),
        }
        self
    }

    /// Add a header, failing with [`NetError::InvalidHeader`] on an invalid
    /// name or value.
    pub fn try_header<K, V>(mut self, key: K, value: V) -> Result<Self, NetError>
    where
        K: TryInto<HeaderName>,
        V: TryInto<HeaderValue>,
    {
        let name = key
            .try_into()
            .map_err(|_| NetError::InvalidHeader("invalid header name".into()))?;
        let value = value
            .try_into()
            .map_err(|_| NetError::InvalidHeader(format!("invalid value for {}", name)))?;
        self.headers.append(name, value);
        Ok(self)
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn json(mut self, json: Json) -> Self {
        self.json = Some(json);
        self
    }

    /// Set the JSON payload from any value that serializes to an object.
    #[cfg(feature = "json")]
    pub fn json_value<T: serde::Serialize>(mut self, value: &T) -> Result<Self, NetError> {
        match serde_json::to_value(value) {
            Ok(serde_json::Value::Object(map)) => {
                self.json = Some(map);
                Ok(self)
            }
            Ok(other) => Err(NetError::BodyEncoding {
                reason: format!("expected a JSON object, got {}", other),
            }),
            Err(e) => Err(NetError::BodyEncoding {
                reason: e.to_string(),
            }),
        }
    }

    pub fn form(mut self, form: Form) -> Self {
        self.form = Some(form);
        self
    }

    pub fn search_params(mut self, params: Form) -> Self {
        self.search_params = Some(params);
        self
    }

    pub fn marshal_json<F>(mut self, f: F) -> Self
    where
        F: Fn(&Json) -> Result<Vec<u8>, BoxError> + Send + Sync + 'static,
    {
        self.marshal_json = Some(Arc::new(f));
        self
    }

    pub fn unmarshal_json<F>(mut self, f: F) -> Self
    where
        F: Fn(&[u8]) -> Result<Json, BoxError> + Send + Sync + 'static,
    {
        self.unmarshal_json = Some(Arc::new(f));
        self
    }

    pub fn context<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.context = Some(Arc::new(value));
        self
    }

    pub fn cookie_jar<J: CookieJar + 'static>(mut self, jar: J) -> Self {
        self.cookie_jar = Some(Arc::new(jar));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn retry(mut self, enabled: bool) -> Self {
        self.retry = Some(enabled);
        self
    }

    pub fn retry_options(mut self, options: RetryOptions) -> Self {
        self.retry_options = Some(options);
        self
    }

    pub fn follow_redirect(mut self, enabled: bool) -> Self {
        self.follow_redirect = Some(enabled);
        self
    }

    pub fn redirect_options(mut self, options: RedirectOptions) -> Self {
        self.redirect_options = Some(options);
        self
    }

    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    // Resolved views. Unset fields read as their `Options::defaults()` value.

    pub fn current_method(&self) -> Method {
        self.method.clone().unwrap_or(Method::GET)
    }

    pub fn retry_enabled(&self) -> bool {
        self.retry.unwrap_or(true)
    }

    pub fn redirects_enabled(&self) -> bool {
        self.follow_redirect.unwrap_or(true)
    }

    pub fn retry_policy(&self) -> &RetryOptions {
        static DEFAULT: OnceLock<RetryOptions> = OnceLock::new();
        self.retry_options
            .as_ref()
            .unwrap_or_else(|| DEFAULT.get_or_init(RetryOptions::default))
    }

    pub fn redirect_policy(&self) -> RedirectOptions {
        self.redirect_options.unwrap_or_default()
    }

    pub fn request_timeout(&self) -> Duration {
        self.timeout.unwrap_or(DEFAULT_TIMEOUT)
    }

    /// Downcast the caller-supplied context.
    pub fn context_ref<T: Any>(&self) -> Option<&T> {
        self.context.as_deref().and_then(|c| c.downcast_ref::<T>())
    }

    /// Retries performed so far in the current call.
    pub fn retry_count(&self) -> u32 {
        self.retries
    }

    /// URLs that answered with a followed redirect so far in the current call.
    pub fn redirect_urls(&self) -> &[Url] {
        &self.redirect_urls
    }

    /// Clear the per-call counters. Only a new top-level call does this.
    pub(crate) fn reset_counters(&mut self) {
        self.retries = 0;
        self.redirect_urls.clear();
    }

    /// Compute the request URL from `prefix_url`, `uri` and `search_params`.
    pub fn compute_full_url(&self) -> Result<Url, NetError> {
        let uri = self.uri.as_deref().unwrap_or("");
        let mut url = merge_url(self.prefix_url.as_deref().unwrap_or(""), uri)?;
        if let Some(params) = self.search_params.as_ref().filter(|p| !p.is_empty()) {
            url.set_query(Some(&params.encode()));
        }
        Ok(url)
    }

    /// Headers as they should go on the wire: the record's headers with the
    /// cookie jar's cookies for `full_url` appended to the `cookie` header.
    pub fn outgoing_headers(&self) -> HeaderMap {
        let mut headers = self.headers.clone();
        let (Some(jar), Some(url)) = (self.cookie_jar.as_ref(), self.full_url.as_ref()) else {
            return headers;
        };

        let cookies = jar.cookies_for(url);
        if cookies.is_empty() {
            return headers;
        }

        let stored = cookie_header_value(&cookies);
        let value = match headers.get(COOKIE).and_then(|v| v.to_str().ok()) {
            Some(manual) if !manual.is_empty() => format!("{}; {}", manual, stored),
            _ => stored,
        };
        match HeaderValue::from_str(&value) {
            Ok(v) => {
                headers.insert(COOKIE, v);
            }
            Err(e) => tracing::warn!(error = %e, "dropping unencodable cookie header"),
        }
        headers
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("adapter", &self.adapter.is_some())
            .field("proxy", &self.proxy.as_ref().map(Url::as_str))
            .field("uri", &self.uri)
            .field("prefix_url", &self.prefix_url)
            .field("full_url", &self.full_url.as_ref().map(Url::as_str))
            .field("method", &self.method)
            .field("headers", &self.headers)
            .field("body", &self.body)
            .field("json", &self.json)
            .field("form", &self.form)
            .field("search_params", &self.search_params)
            .field("cookie_jar", &self.cookie_jar.is_some())
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .field("retry_options", &self.retry_options)
            .field("follow_redirect", &self.follow_redirect)
            .field("redirect_options", &self.redirect_options)
            .field("hooks", &self.hooks)
            .field("retries", &self.retries)
            .field("redirect_urls", &self.redirect_urls.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookies::store::CookieStore;
    use cookie::Cookie;

    fn override_record() -> Options {
        Options::new()
            .uri("https://example.com")
            .retry(false)
            .method(Method::POST)
            .header("foo", "Bar")
            .body("hello world")
            .search_params(Form::new().with("abc", "def"))
            .timeout(Duration::from_millis(1000))
            .follow_redirect(false)
            .redirect_options(RedirectOptions {
                limit: 3,
                rewrite_methods: false,
            })
            .hooks(Hooks::new().on_before_request(|_| {}))
    }

    #[test]
    fn test_set_fields_win() {
        let merged = Options::defaults().extend(override_record()).unwrap();

        assert_eq!(merged.uri.as_deref(), Some("https://example.com"));
        assert!(!merged.retry_enabled());
        assert_eq!(merged.current_method(), Method::POST);
        assert_eq!(merged.headers.get("foo").unwrap(), "Bar");
        assert_eq!(merged.body, Some(RequestBody::from("hello world")));
        assert_eq!(merged.search_params.as_ref().unwrap().encode(), "abc=def");
        assert_eq!(merged.request_timeout(), Duration::from_millis(1000));
        assert!(!merged.redirects_enabled());
        assert_eq!(merged.redirect_policy().limit, 3);
        assert_eq!(merged.hooks.before_request.len(), 1);
    }

    #[test]
    fn test_unset_fields_fall_back() {
        let merged = Options::defaults().extend(Options::new()).unwrap();

        assert!(merged.adapter.is_some());
        assert!(merged.marshal_json.is_some());
        assert!(merged.unmarshal_json.is_some());
        assert!(merged.cookie_jar.is_some());
        assert_eq!(merged.request_timeout(), DEFAULT_TIMEOUT);
        assert_eq!(merged.retry_policy().limit, 2);
        assert!(merged.redirect_policy().rewrite_methods);
    }

    #[test]
    fn test_headers_merge_per_name() {
        let base = Options::new().header("a", "1").header("b", "1").header("b", "2");
        let merged = base.extend(Options::new().header("b", "3")).unwrap();

        assert_eq!(merged.headers.get("a").unwrap(), "1");
        let b: Vec<_> = merged.headers.get_all("b").iter().collect();
        assert_eq!(b, vec!["3"]);
    }

    #[test]
    fn test_sequential_merge_equals_fold() {
        let layers = vec![
            Options::new().prefix_url("https://one.example.com"),
            Options::new().method(Method::PUT).timeout(Duration::from_secs(1)),
            Options::new().prefix_url("https://three.example.com"),
        ];

        let mut sequential = Options::defaults();
        for layer in layers.clone() {
            sequential = sequential.extend(layer).unwrap();
        }
        let folded = layers
            .into_iter()
            .try_fold(Options::defaults(), Options::extend)
            .unwrap();

        assert_eq!(sequential.prefix_url, folded.prefix_url);
        assert_eq!(sequential.prefix_url.as_deref(), Some("https://three.example.com"));
        assert_eq!(sequential.current_method(), folded.current_method());
        assert_eq!(sequential.request_timeout(), folded.request_timeout());
    }

    #[test]
    fn test_adapter_replaced_wholesale() {
        struct Null;
        impl Adapter for Null {
            fn do_request<'a>(&'a self, _options: &'a Options) -> crate::adapter::Dispatching<'a> {
                Box::pin(async { Err(NetError::transport("null")) })
            }
        }

        let base = Options::defaults();
        let before = base.adapter.clone().unwrap();
        let merged = base.extend(Options::new().adapter(Null)).unwrap();
        assert!(!Arc::ptr_eq(&before, merged.adapter.as_ref().unwrap()));
    }

    #[test]
    fn test_invalid_header_reported() {
        let err = Options::new().try_header("bad name", "v").unwrap_err();
        assert!(matches!(err, NetError::InvalidHeader(_)));

        let err = Options::new().try_header("x-ok", "line\nbreak").unwrap_err();
        assert!(err.to_string().contains("x-ok"), "got {}", err);

        let options = Options::new().header("x-ok", "1").header("bad name", "v");
        assert_eq!(options.headers.len(), 1);
        assert_eq!(options.headers.get("x-ok").unwrap(), "1");
    }

    #[test]
    fn test_proxy_merges_right_biased() {
        let corporate = Url::parse("http://proxy.internal:3128").unwrap();
        let local = Url::parse("http://127.0.0.1:8888").unwrap();

        let base = Options::defaults().extend(Options::new().proxy(corporate.clone())).unwrap();
        assert_eq!(base.proxy.as_ref(), Some(&corporate));

        let kept = base.clone().extend(Options::new().method(Method::PUT)).unwrap();
        assert_eq!(kept.proxy.as_ref(), Some(&corporate));

        let replaced = base.extend(Options::new().proxy(local.clone())).unwrap();
        assert_eq!(replaced.proxy.as_ref(), Some(&local));
        assert!(format!("{:?}", replaced).contains("127.0.0.1:8888"));
    }

    #[test]
    fn test_counters_survive_merge() {
        let mut live = Options::defaults();
        live.retries = 1;
        live.redirect_urls.push(Url::parse("https://example.com/a").unwrap());
        live.merge_from(Options::new().method(Method::DELETE));

        assert_eq!(live.retry_count(), 1);
        assert_eq!(live.redirect_urls().len(), 1);
        assert_eq!(live.current_method(), Method::DELETE);
    }

    #[test]
    fn test_invalid_prefix_is_merge_error() {
        let err = Options::defaults()
            .extend(Options::new().prefix_url("not a url"))
            .unwrap_err();
        assert!(matches!(err, NetError::ConfigMerge { .. }));
    }

    #[test]
    fn test_full_url_with_prefix_and_search_params() {
        let options = Options::new()
            .prefix_url("https://example.com/api")
            .uri("items?old=1")
            .search_params(Form::ordered().with("page", "2").with("q", "x y"));

        let url = options.compute_full_url().unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/items?page=2&q=x+y");
    }

    #[test]
    fn test_outgoing_headers_append_jar_cookies() {
        let jar = CookieStore::new();
        let url = Url::parse("https://example.com/").unwrap();
        jar.set_cookies(&url, vec![Cookie::new("stored", "1")]);

        let mut options = Options::new().cookie_jar(jar).header("cookie", "manual=2");
        options.full_url = Some(url);

        let headers = options.outgoing_headers();
        assert_eq!(headers.get(COOKIE).unwrap(), "manual=2; stored=1");
        assert_eq!(options.headers.get(COOKIE).unwrap(), "manual=2");
    }

    #[test]
    fn test_context_downcast() {
        let options = Options::new().context(String::from("token"));
        assert_eq!(options.context_ref::<String>().map(String::as_str), Some("token"));
        assert!(options.context_ref::<u32>().is_none());
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_json_value_requires_object() {
        assert!(Options::new().json_value(&serde_json::json!({"a": 1})).is_ok());
        assert!(matches!(
            Options::new().json_value(&serde_json::json!([1, 2])),
            Err(NetError::BodyEncoding { .. })
        ));
    }
}
