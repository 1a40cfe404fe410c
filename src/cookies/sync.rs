//! Reconciles a manually set `cookie` header with the cookie jar.
//!
//! When a caller sets a `cookie` header by hand and also configures a jar, a
//! response that sets a cookie of the same name makes the manual value
//! stale: the jar now has the server's value and will append it to the
//! next request. The stale manual entries are dropped so each name is only
//! sent once, with the jar's value.

use crate::cookies::jar::parse_set_cookies;
use crate::http::response::Response;
use crate::options::Options;
use http::header::{HeaderValue, COOKIE};
use std::collections::HashSet;

/// Split a `cookie` request header into its `name=value` pairs, in order.
pub fn parse_cookie_header(value: &str) -> Vec<(String, String)> {
    value
        .split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            let name = name.trim();
            (!name.is_empty()).then(|| (name.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Drop manual cookies superseded by the response's `Set-Cookie` headers.
///
/// Only applies when a jar is configured and a manual `cookie` header is
/// present. The header is rebuilt only if something was removed.
pub fn reconcile(options: &mut Options, response: &Response) {
    if options.cookie_jar.is_none() {
        return;
    }
    let Some(manual) = options.headers.get(COOKIE).and_then(|v| v.to_str().ok()) else {
        return;
    };

    let mut pairs = parse_cookie_header(manual);
    let superseded: HashSet<String> = parse_set_cookies(response.headers())
        .into_iter()
        .map(|c| c.name().to_string())
        .collect();

    let before = pairs.len();
    pairs.retain(|(name, _)| !superseded.contains(name));
    if pairs.len() == before {
        return;
    }

    tracing::debug!(
        removed = before - pairs.len(),
        "dropping manual cookies superseded by Set-Cookie"
    );

    if pairs.is_empty() {
        options.headers.remove(COOKIE);
        return;
    }

    let rebuilt = pairs
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("; ");
    match HeaderValue::from_str(&rebuilt) {
        Ok(v) => {
            options.headers.insert(COOKIE, v);
        }
        Err(_) => {
            options.headers.remove(COOKIE);
        }
    }
}
