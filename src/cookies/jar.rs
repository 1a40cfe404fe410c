//! The cookie store capability consumed by the orchestrator.

use cookie::Cookie;
use std::sync::Arc;
use url::Url;

/// A cookie jar: read the cookies that apply to a URL, record cookies a
/// response set for a URL.
///
/// Implementations must be thread-safe; one jar is typically shared by every
/// call made through a client.
pub trait CookieJar: Send + Sync {
    /// Cookies to send with a request to `url`.
    fn cookies_for(&self, url: &Url) -> Vec<Cookie<'static>>;

    /// Store cookies received in a response from `url`.
    fn set_cookies(&self, url: &Url, cookies: Vec<Cookie<'static>>);
}

impl<J: CookieJar + ?Sized> CookieJar for Arc<J> {
    fn cookies_for(&self, url: &Url) -> Vec<Cookie<'static>> {
        (**self).cookies_for(url)
    }

    fn set_cookies(&self, url: &Url, cookies: Vec<Cookie<'static>>) {
        (**self).set_cookies(url, cookies)
    }
}

/// Render cookies as a `Cookie` request header value (`a=1; b=2`).
pub fn cookie_header_value<'c, I>(cookies: I) -> String
where
    I: IntoIterator<Item = &'c Cookie<'static>>,
{
    cookies
        .into_iter()
        .map(|c| format!("{}={}", c.name(), c.value()))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Parse every `Set-Cookie` header of a response, skipping malformed lines.
pub fn parse_set_cookies(headers: &http::HeaderMap) -> Vec<Cookie<'static>> {
    headers
        .get_all(http::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|line| match Cookie::parse(line.to_string()) {
            Ok(c) => Some(c),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring malformed Set-Cookie header");
                None
            }
        })
        .collect()
}
