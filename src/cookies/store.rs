//! In-memory cookie jar with RFC 6265 matching.

use crate::cookies::jar::CookieJar;
use cookie::Cookie;
use dashmap::DashMap;
use psl::{List, Psl};
use std::sync::Arc;
use time::{Duration, OffsetDateTime, PrimitiveDateTime};
use url::Url;

/// Maximum cookies per domain (Chromium default).
const MAX_COOKIES_PER_DOMAIN: usize = 50;

/// A cookie as held by the store, with its attributes resolved against the
/// URL that set it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub creation_time: OffsetDateTime,
    pub expiration_time: Option<OffsetDateTime>,
    pub secure: bool,
    pub http_only: bool,
    pub host_only: bool,
}

impl StoredCookie {
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expiration_time.is_some_and(|expiry| expiry <= now)
    }
}

/// Thread-safe in-memory cookie store, keyed by cookie domain.
///
/// Cloning yields a handle to the same store.
#[derive(Debug, Clone, Default)]
pub struct CookieStore {
    store: Arc<DashMap<String, Vec<StoredCookie>>>,
}

impl CookieStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store one parsed `Set-Cookie` received from `url`.
    ///
    /// Cookies for a public suffix or a foreign domain are rejected. A cookie
    /// that is already expired removes any stored cookie it would replace.
    pub fn store_cookie(&self, url: &Url, parsed: &Cookie<'_>) {
        let host = url.host_str().unwrap_or("").to_lowercase();
        let now = OffsetDateTime::now_utc();

        let (domain, host_only) = match parsed.domain() {
            Some(d) => {
                let d = d.trim_start_matches('.').to_lowercase();
                if !is_valid_cookie_domain(&d, &host) {
                    tracing::warn!(cookie = parsed.name(), domain = %d, host = %host, "rejecting cookie domain");
                    return;
                }
                (d, false)
            }
            None => (host, true),
        };

        let path = match parsed.path() {
            Some(p) if p.starts_with('/') => p.to_string(),
            _ => default_path(url.path()),
        };

        // Max-Age wins over Expires.
        let expiration_time = match parsed.max_age() {
            Some(age) => Some(expiry_after(now, age)),
            None => parsed.expires().and_then(|e| e.datetime()),
        };

        let cookie = StoredCookie {
            name: parsed.name().to_string(),
            value: parsed.value().to_string(),
            domain,
            path,
            creation_time: now,
            expiration_time,
            secure: parsed.secure().unwrap_or(false),
            http_only: parsed.http_only().unwrap_or(false),
            host_only,
        };

        let mut entry = self.store.entry(cookie.domain.clone()).or_default();
        entry.retain(|c| c.name != cookie.name || c.path != cookie.path);
        if cookie.is_expired(now) {
            return;
        }

        while entry.len() >= MAX_COOKIES_PER_DOMAIN {
            if let Some(oldest_idx) = entry
                .iter()
                .enumerate()
                .min_by_key(|(_, c)| c.creation_time)
                .map(|(i, _)| i)
            {
                entry.remove(oldest_idx);
            } else {
                break;
            }
        }
        entry.push(cookie);
    }

    /// Cookies that apply to `url`, longest path first.
    pub fn matching(&self, url: &Url) -> Vec<StoredCookie> {
        let host = url.host_str().unwrap_or("").to_lowercase();
        let now = OffsetDateTime::now_utc();
        let mut result = Vec::new();

        for domain in matching_domains(&host) {
            let Some(entry) = self.store.get(&domain) else {
                continue;
            };
            for cookie in entry.iter() {
                if !domain_matches(&cookie.domain, &host, cookie.host_only)
                    || !path_matches(&cookie.path, url.path())
                    || (cookie.secure && url.scheme() != "https")
                    || cookie.is_expired(now)
                {
                    continue;
                }
                result.push(cookie.clone());
            }
        }

        result.sort_by(|a, b| {
            b.path
                .len()
                .cmp(&a.path.len())
                .then_with(|| a.creation_time.cmp(&b.creation_time))
        });
        result
    }

    pub fn len(&self) -> usize {
        self.store.iter().map(|e| e.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.store.clear();
    }
}

impl CookieJar for CookieStore {
    fn cookies_for(&self, url: &Url) -> Vec<Cookie<'static>> {
        self.matching(url)
            .into_iter()
            .map(|c| Cookie::new(c.name, c.value))
            .collect()
    }

    fn set_cookies(&self, url: &Url, cookies: Vec<Cookie<'static>>) {
        for cookie in &cookies {
            self.store_cookie(url, cookie);
        }
    }
}

/// `now + max_age`, clamped to the representable range. A non-positive
/// Max-Age expires the cookie immediately.
fn expiry_after(now: OffsetDateTime, max_age: Duration) -> OffsetDateTime {
    if max_age <= Duration::ZERO {
        return now;
    }
    now.checked_add(max_age)
        .unwrap_or_else(|| PrimitiveDateTime::MAX.assume_utc())
}

/// RFC 6265 5.1.4 default-path of a request path.
fn default_path(request_path: &str) -> String {
    if !request_path.starts_with('/') {
        return "/".to_string();
    }
    match request_path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => request_path[..idx].to_string(),
    }
}

/// The host itself and its parent domains.
fn matching_domains(host: &str) -> Vec<String> {
    let mut domains = vec![host.to_string()];
    let parts: Vec<&str> = host.split('.').collect();
    for i in 1..parts.len().saturating_sub(1) {
        domains.push(parts[i..].join("."));
    }
    domains
}

/// RFC 6265 domain matching.
fn domain_matches(cookie_domain: &str, request_host: &str, host_only: bool) -> bool {
    if host_only {
        return cookie_domain.eq_ignore_ascii_case(request_host);
    }
    if request_host.eq_ignore_ascii_case(cookie_domain) {
        return true;
    }
    request_host.len() > cookie_domain.len()
        && request_host
            .to_ascii_lowercase()
            .ends_with(&format!(".{}", cookie_domain.to_ascii_lowercase()))
}

/// RFC 6265 path matching.
fn path_matches(cookie_path: &str, request_path: &str) -> bool {
    if request_path == cookie_path {
        return true;
    }
    if let Some(rest) = request_path.strip_prefix(cookie_path) {
        return cookie_path.ends_with('/') || rest.starts_with('/');
    }
    false
}

/// Check if a domain is a public suffix (e.g., "com", "co.uk").
pub fn is_public_suffix(domain: &str) -> bool {
    let domain = domain.to_lowercase();
    List.suffix(domain.as_bytes())
        .is_some_and(|suffix| suffix.as_bytes() == domain.as_bytes())
}

/// A `Domain` attribute is acceptable if it is not a public suffix and the
/// host is the domain or one of its subdomains.
pub fn is_valid_cookie_domain(cookie_domain: &str, url_host: &str) -> bool {
    let cookie_domain = cookie_domain.trim_start_matches('.').to_lowercase();
    let url_host = url_host.to_lowercase();

    if cookie_domain.is_empty() || is_public_suffix(&cookie_domain) {
        return false;
    }
    url_host == cookie_domain || url_host.ends_with(&format!(".{}", cookie_domain))
}
