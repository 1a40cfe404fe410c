//! # hookline
//!
//! An HTTP request lifecycle orchestrator for Rust.
//!
//! `hookline` turns one logical call into a bounded sequence of physical
//! attempts, handling retries, redirects, cookie propagation and body
//! encoding, while callers intercept the exchange at five lifecycle hooks.
//! The wire exchange itself is delegated to a pluggable [`Adapter`].
//!
//! ## Features
//!
//! - **Layered options**: defaults, client overrides and per-call overrides, merged right-biased
//! - **Retries**: method/status/error-code policy, `retry-after` support, pluggable delay
//! - **Redirects**: limits, method rewriting, credential stripping across origins
//! - **Cookies**: in-memory RFC 6265 jar with PSL validation, manual header reconciliation
//! - **Hooks**: Init, BeforeRequest, AfterResponse, BeforeRedirect, BeforeRetry
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hookline::{Client, Hooks, Options};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), hookline::NetError> {
//!     let client = Client::new(
//!         Options::new()
//!             .prefix_url("http://api.example.com")
//!             .hooks(Hooks::new().on_before_request(|o| {
//!                 o.headers.insert("x-trace", "1".parse().unwrap());
//!             })),
//!     )?;
//!
//!     let response = client.get("status").send().await?;
//!     println!("Status: {}", response.status());
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error definitions and transport error context
//! - [`options`] - The configuration record and its merge
//! - [`http`] - Body resolution, retry and redirect engines, responses
//! - [`cookies`] - Cookie jar capability, in-memory store, reconciliation
//! - [`hooks`] - Lifecycle hook lists
//! - [`adapter`] - Transport capability and the hyper-based default
//! - [`request`] - The per-call orchestration loop

pub mod adapter;
pub mod base;
pub mod client;
pub mod cookies;
pub mod hooks;
pub mod http;
pub mod options;
pub mod request;
pub mod util;

pub use adapter::{Adapter, HyperAdapter};
pub use base::neterror::NetError;
pub use client::{delete, get, head, patch, post, put, request, Client, RequestBuilder};
pub use cookies::{CookieJar, CookieStore};
pub use hooks::{AfterResponse, Hooks, RetryTrigger};
pub use crate::http::{RequestBody, Response};
pub use options::{Form, Json, Options, RedirectOptions, RetryOptions};
