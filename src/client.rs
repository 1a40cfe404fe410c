//! HTTP client with layered options.
//!
//! A [`Client`] owns a base [`Options`] record (the defaults merged with the
//! client's own overrides). Every call clones that record, merges the
//! call's overrides on top and runs the clone to completion, so calls never
//! observe each other's state.
//!
//! # Example
//!
//! ```rust,ignore
//! use hookline::{Client, Options};
//!
//! let client = Client::new(Options::new().prefix_url("http://api.example.com"))?;
//!
//! let resp = client.get("users/1")
//!     .header("accept", "application/json")
//!     .send()
//!     .await?;
//! ```

use crate::base::neterror::NetError;
use crate::http::response::Response;
use crate::http::RequestBody;
use crate::options::{Form, Json, Options};
use crate::request::RequestJob;
use http::Method;
use std::sync::Arc;
use std::time::Duration;

/// HTTP Client for making requests.
///
/// The default transport is [`HyperAdapter`](crate::adapter::HyperAdapter),
/// which speaks plain HTTP only. For `https` URLs set a TLS-capable
/// [`Adapter`](crate::adapter::Adapter) with [`Options::adapter`].
#[derive(Clone, Debug)]
pub struct Client {
    options: Arc<Options>,
}

impl Default for Client {
    fn default() -> Self {
        Self {
            options: Arc::new(Options::defaults()),
        }
    }
}

impl Client {
    /// Create a client from the defaults merged with `overrides`.
    pub fn new(overrides: Options) -> Result<Self, NetError> {
        Client::default().extend(overrides)
    }

    /// A new client whose base record is this one's merged with `overrides`.
    pub fn extend(&self, overrides: Options) -> Result<Self, NetError> {
        let options = (*self.options).clone().extend(overrides)?;
        Ok(Self {
            options: Arc::new(options),
        })
    }

    /// The client's base record.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Run one call: merge `overrides` left to right onto the client's
    /// record, fix the URI and method, and drive the call to completion.
    pub async fn execute<U, I>(&self, method: Method, url: U, overrides: I) -> Result<Response, NetError>
    where
        U: Into<String>,
        I: IntoIterator<Item = Options>,
    {
        let mut options = overrides
            .into_iter()
            .try_fold((*self.options).clone(), Options::extend)?;
        options.uri = Some(url.into());
        options.method = Some(method);
        RequestJob::new(options).run().await
    }

    /// Start building a GET request.
    pub fn get<U: Into<String>>(&self, url: U) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    /// Start building a POST request.
    pub fn post<U: Into<String>>(&self, url: U) -> RequestBuilder {
        self.request(Method::POST, url)
    }

    /// Start building a PUT request.
    pub fn put<U: Into<String>>(&self, url: U) -> RequestBuilder {
        self.request(Method::PUT, url)
    }

    /// Start building a PATCH request.
    pub fn patch<U: Into<String>>(&self, url: U) -> RequestBuilder {
        self.request(Method::PATCH, url)
    }

    /// Start building a DELETE request.
    pub fn delete<U: Into<String>>(&self, url: U) -> RequestBuilder {
        self.request(Method::DELETE, url)
    }

    /// Start building a HEAD request.
    pub fn head<U: Into<String>>(&self, url: U) -> RequestBuilder {
        self.request(Method::HEAD, url)
    }

    /// Start building a request with custom method.
    pub fn request<U: Into<String>>(&self, method: Method, url: U) -> RequestBuilder {
        RequestBuilder {
            client: self.clone(),
            method,
            url: url.into(),
            layers: Vec::new(),
            last: Options::new(),
        }
    }
}

/// Builder for a single request.
///
/// Setters accumulate into one override record; [`RequestBuilder::options`]
/// adds whole records. Everything merges in call order when sent.
pub struct RequestBuilder {
    client: Client,
    method: Method,
    url: String,
    layers: Vec<Options>,
    last: Options,
}

impl RequestBuilder {
    /// Layer a full override record.
    pub fn options(mut self, overrides: Options) -> Self {
        let pending = std::mem::take(&mut self.last);
        self.layers.push(pending);
        self.layers.push(overrides);
        self
    }

    /// Add a header.
    pub fn header<K, V>(mut self, key: K, value: V) -> Self
    where
        K: TryInto<http::header::HeaderName>,
        V: TryInto<http::HeaderValue>,
    {
        self.last = self.last.header(key, value);
        self
    }

    /// Set the raw request body.
    pub fn body(mut self, body: impl Into<RequestBody>) -> Self {
        self.last = self.last.body(body);
        self
    }

    /// Set a JSON payload.
    pub fn json(mut self, json: Json) -> Self {
        self.last = self.last.json(json);
        self
    }

    /// Set a form payload.
    pub fn form(mut self, form: Form) -> Self {
        self.last = self.last.form(form);
        self
    }

    /// Set the query string.
    pub fn search_params(mut self, params: Form) -> Self {
        self.last = self.last.search_params(params);
        self
    }

    /// Set the per-attempt timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.last = self.last.timeout(timeout);
        self
    }

    /// Send the request.
    pub async fn send(mut self) -> Result<Response, NetError> {
        self.layers.push(self.last);
        self.client.execute(self.method, self.url, self.layers).await
    }
}

/// One-off call through a default client.
pub async fn request<U, I>(method: Method, url: U, overrides: I) -> Result<Response, NetError>
where
    U: Into<String>,
    I: IntoIterator<Item = Options>,
{
    Client::default().execute(method, url, overrides).await
}

pub async fn get<U, I>(url: U, overrides: I) -> Result<Response, NetError>
where
    U: Into<String>,
    I: IntoIterator<Item = Options>,
{
    request(Method::GET, url, overrides).await
}

pub async fn post<U, I>(url: U, overrides: I) -> Result<Response, NetError>
where
    U: Into<String>,
    I: IntoIterator<Item = Options>,
{
    request(Method::POST, url, overrides).await
}

pub async fn put<U, I>(url: U, overrides: I) -> Result<Response, NetError>
where
    U: Into<String>,
    I: IntoIterator<Item = Options>,
{
    request(Method::PUT, url, overrides).await
}

pub async fn patch<U, I>(url: U, overrides: I) -> Result<Response, NetError>
where
    U: Into<String>,
    I: IntoIterator<Item = Options>,
{
    request(Method::PATCH, url, overrides).await
}

pub async fn delete<U, I>(url: U, overrides: I) -> Result<Response, NetError>
where
    U: Into<String>,
    I: IntoIterator<Item = Options>,
{
    request(Method::DELETE, url, overrides).await
}

pub async fn head<U, I>(url: U, overrides: I) -> Result<Response, NetError>
where
    U: Into<String>,
    I: IntoIterator<Item = Options>,
{
    request(Method::HEAD, url, overrides).await
}
