//! Ergonomic error context helpers.
//!
//! Transport failures are surfaced as opaque [`NetError::Transport`] values
//! whose message starts with an errno-style code (`ECONNREFUSED`, `ETIMEDOUT`,
//! ...). Retry policies match on those codes by substring, so adapters should
//! route their IO failures through these helpers.

use crate::base::neterror::NetError;
use std::error::Error as StdError;
use std::io;

/// Errno-style code for an IO error kind, if one applies.
pub fn errno_code(kind: io::ErrorKind) -> Option<&'static str> {
    use io::ErrorKind;

    match kind {
        ErrorKind::ConnectionRefused => Some("ECONNREFUSED"),
        ErrorKind::ConnectionReset => Some("ECONNRESET"),
        ErrorKind::ConnectionAborted => Some("ECONNABORTED"),
        ErrorKind::TimedOut => Some("ETIMEDOUT"),
        ErrorKind::AddrInUse => Some("EADDRINUSE"),
        ErrorKind::AddrNotAvailable => Some("EADDRNOTAVAIL"),
        ErrorKind::BrokenPipe => Some("EPIPE"),
        ErrorKind::NotConnected => Some("ENOTCONN"),
        ErrorKind::NotFound => Some("ENOTFOUND"),
        _ => None,
    }
}

/// Build a transport error from an arbitrary error, walking its source chain
/// for an underlying [`io::Error`] to pick the errno-style prefix.
pub fn transport_error(err: &(dyn StdError + 'static)) -> NetError {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            if let Some(code) = errno_code(io_err.kind()) {
                return NetError::transport(format!("{}: {}", code, err));
            }
        }
        if e.to_string().starts_with("dns error") {
            return NetError::transport(format!("ENOTFOUND: {}", err));
        }
        current = e.source();
    }
    NetError::transport(err.to_string())
}

/// Extension trait for adding transport context to fallible results.
pub trait TransportResultExt<T> {
    /// Convert the error into a [`NetError::Transport`] with an errno-style
    /// prefix when one can be determined.
    ///
    /// # Example
    /// ```ignore
    /// use hookline::base::context::TransportResultExt;
    ///
    /// let response = client.request(req).await.transport_context()?;
    /// // Error: "ECONNREFUSED: client error (Connect)"
    /// ```
    fn transport_context(self) -> Result<T, NetError>;
}

impl<T, E> TransportResultExt<T> for Result<T, E>
where
    E: StdError + 'static,
{
    fn transport_context(self) -> Result<T, NetError> {
        self.map_err(|e| transport_error(&e))
    }
}
