//! Redirect decisions and follow-up request state.

use crate::base::neterror::NetError;
use crate::cookies::sync;
use crate::hooks;
use crate::http::body;
use crate::http::response::Response;
use crate::options::Options;
use http::header::{AUTHORIZATION, COOKIE, HOST, LOCATION};
use http::{Method, StatusCode};
use url::Url;

/// Statuses that trigger a redirect when a `location` header is present.
pub const REDIRECT_STATUS_CODES: [u16; 7] = [300, 301, 302, 303, 304, 307, 308];

/// Where a followed redirect leads.
#[derive(Debug, Clone)]
pub struct Redirect {
    pub url: Url,
    pub status: StatusCode,
    /// The method was rewritten to GET and the payload dropped.
    pub rewrote_method: bool,
}

fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|l| !l.is_empty())
}

/// Check if `response` should be followed.
pub fn should_redirect(options: &Options, response: &Response) -> bool {
    options.redirects_enabled()
        && REDIRECT_STATUS_CODES.contains(&response.status().as_u16())
        && location(response).is_some()
}

/// Resolve a `location` value against the current URL.
pub fn next_url(current: &Url, location: &str) -> Result<Url, NetError> {
    current
        .join(location)
        .map_err(|e| NetError::InvalidUrl(format!("location {:?}: {}", location, e)))
}

/// Whether moving from `from` to `to` changes host or port.
pub fn is_cross_origin(from: &Url, to: &Url) -> bool {
    from.host_str() != to.host_str() || from.port_or_known_default() != to.port_or_known_default()
}

/// Whether a redirect with `status` turns `method` into GET.
pub fn rewrites_method(status: StatusCode, method: &Method, rewrite_methods: bool) -> bool {
    rewrite_methods || (status == StatusCode::SEE_OTHER && *method != Method::GET && *method != Method::HEAD)
}

/// Apply a redirect to the live record.
///
/// Closes the response body, enforces the redirect limit, rewrites the
/// method if needed, moves the record to the next URL, strips credentials
/// on cross-origin hops, reconciles manual cookies and runs BeforeRedirect
/// hooks. The caller then issues the follow-up attempt.
pub fn follow(options: &mut Options, response: &mut Response) -> Result<Redirect, NetError> {
    response.close();

    let limit = options.redirect_policy().limit;
    if limit != 0 && options.redirect_urls.len() >= limit {
        tracing::warn!(
            redirects = options.redirect_urls.len(),
            "maximum redirects reached"
        );
        return Err(NetError::MaxRedirectsExceeded {
            redirects: options.redirect_urls.len(),
        });
    }

    let location = location(response).unwrap_or_default().to_string();
    let current = match options.full_url.clone() {
        Some(url) => url,
        None => options.compute_full_url()?,
    };
    let next = next_url(&current, &location)?;
    let status = response.status();

    let method = options.current_method();
    let rewrote_method = rewrites_method(status, &method, options.redirect_policy().rewrite_methods);
    if rewrote_method {
        options.method = Some(Method::GET);
        body::clear_payload(options);
    }

    if is_cross_origin(&current, &next) {
        options.headers.remove(HOST);
        options.headers.remove(COOKIE);
        options.headers.remove(AUTHORIZATION);
    }

    sync::reconcile(options, response);

    tracing::debug!(
        from = %current,
        to = %next,
        status = status.as_u16(),
        method = %options.current_method(),
        "following redirect"
    );

    options.prefix_url = None;
    options.search_params = None;
    options.uri = Some(next.to_string());
    options.full_url = Some(next.clone());
    options.redirect_urls.push(next.clone());

    hooks::run_before_redirect(options, response);

    // A hook may point the follow-up at a new prefix; keep the redirect's
    // path and query under it.
    if options.prefix_url.as_deref().is_some_and(|p| !p.is_empty()) {
        let mut path = next.path().to_string();
        if let Some(query) = next.query() {
            path.push('?');
            path.push_str(query);
        }
        options.uri = Some(path);
    }

    Ok(Redirect {
        url: next,
        status,
        rewrote_method,
    })
}
