//! Transport adapters.
//!
//! The orchestrator never touches sockets: every physical attempt is handed
//! to an [`Adapter`], which turns the live [`Options`] into exactly one
//! request/response exchange.

pub mod hyper;

pub use self::hyper::HyperAdapter;

use crate::base::neterror::NetError;
use crate::http::response::Response;
use crate::options::Options;
use futures::future::BoxFuture;
use std::sync::Arc;

/// Alias for the `Future` type returned by an adapter.
pub type Dispatching<'a> = BoxFuture<'a, Result<Response, NetError>>;

/// Performs one physical HTTP exchange.
///
/// # Contract
///
/// - Read the request from `options`: `current_method()`, the computed
///   `full_url`, `outgoing_headers()` (manual headers plus cookie-jar
///   cookies) and `body`.
/// - Do not retain `options` past the returned future.
/// - Return `Err` on any failure to complete the exchange. Prefer
///   [`crate::base::context::TransportResultExt`] so IO failures carry the
///   errno-style codes retry policies match on.
/// - Return a response whose status, headers and body are readable; the
///   orchestrator attaches the originating request info and stores cookies.
pub trait Adapter: Send + Sync {
    fn do_request<'a>(&'a self, options: &'a Options) -> Dispatching<'a>;
}

/// Blanket implementation for Arc-wrapped adapters.
impl<A: Adapter + ?Sized> Adapter for Arc<A> {
    fn do_request<'a>(&'a self, options: &'a Options) -> Dispatching<'a> {
        (**self).do_request(options)
    }
}
