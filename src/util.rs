//! Small helpers shared by the engines.

use crate::base::neterror::NetError;
use url::Url;

/// Resolve `uri` against `prefix`.
///
/// An empty prefix means `uri` must be absolute. Otherwise the prefix gets a
/// trailing slash so relative URIs extend its path; absolute URIs and
/// absolute paths replace it the usual way.
pub fn merge_url(prefix: &str, uri: &str) -> Result<Url, NetError> {
    if prefix.is_empty() {
        return Url::parse(uri).map_err(|e| NetError::InvalidUrl(format!("{}: {}", uri, e)));
    }

    let base = if prefix.ends_with('/') {
        Url::parse(prefix)
    } else {
        Url::parse(&format!("{}/", prefix))
    }
    .map_err(|e| NetError::InvalidUrl(format!("{}: {}", prefix, e)))?;

    base.join(uri)
        .map_err(|e| NetError::InvalidUrl(format!("{}: {}", uri, e)))
}

/// Whether `haystack` contains any of `needles`.
pub fn contains_any<S: AsRef<str>>(needles: &[S], haystack: &str) -> bool {
    needles.iter().any(|n| haystack.contains(n.as_ref()))
}
