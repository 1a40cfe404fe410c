//! HTTP Response with body access.

use crate::base::neterror::NetError;
use crate::http::ResponseBody;
use crate::options::{Json, UnmarshalJsonFn};
use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode, Version};
use std::fmt;
use url::Url;

/// The request that produced a [`Response`], as it was put on the wire.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

/// HTTP Response with accessible body.
/// This is the user-facing response type that owns the body.
pub struct Response {
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    body: Option<ResponseBody>,
    request: Option<RequestInfo>,
    unmarshal_json: Option<UnmarshalJsonFn>,
}

impl Response {
    pub fn new(status: StatusCode, headers: HeaderMap, body: ResponseBody) -> Self {
        Self {
            status,
            version: Version::HTTP_11,
            headers,
            body: Some(body),
            request: None,
            unmarshal_json: None,
        }
    }

    /// A response with the given status, no headers and an empty body.
    pub fn empty(status: StatusCode) -> Self {
        Self::new(status, HeaderMap::new(), ResponseBody::empty())
    }

    /// Create from any `http::Response` whose body converts into a [`ResponseBody`].
    pub fn from_http<B>(resp: http::Response<B>) -> Self
    where
        B: http_body::Body<Data = Bytes> + Send + Sync + 'static,
        B::Error: fmt::Display,
    {
        let (parts, body) = resp.into_parts();
        Self {
            status: parts.status,
            version: parts.version,
            headers: parts.headers,
            body: Some(ResponseBody::new(body)),
            request: None,
            unmarshal_json: None,
        }
    }

    /// Builder-style header insertion, mostly useful for adapters and tests.
    pub fn with_header(mut self, name: http::header::HeaderName, value: &str) -> Self {
        if let Ok(v) = http::HeaderValue::from_str(value) {
            self.headers.append(name, v);
        }
        self
    }

    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Get the status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get the HTTP version.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Get a reference to the headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// The originating request, once the orchestrator has attached it.
    pub fn request(&self) -> Option<&RequestInfo> {
        self.request.as_ref()
    }

    pub(crate) fn set_request(&mut self, request: RequestInfo) {
        self.request = Some(request);
    }

    pub(crate) fn set_unmarshal_json(&mut self, f: UnmarshalJsonFn) {
        self.unmarshal_json = Some(f);
    }

    /// Replace the body, e.g. from an AfterResponse hook.
    pub fn set_body(&mut self, body: impl Into<ResponseBody>) {
        self.body = Some(body.into());
    }

    /// Take the response body for consumption.
    /// Can only be called once - subsequent calls return None.
    pub fn take_body(&mut self) -> Option<ResponseBody> {
        self.body.take()
    }

    /// Whether the body is still available.
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Drop the body without reading it, releasing the transport's resources.
    pub fn close(&mut self) {
        self.body = None;
    }

    /// Convenience method to consume body as bytes.
    pub async fn bytes(mut self) -> Result<Bytes, NetError> {
        self.body.take().ok_or(NetError::BodyConsumed)?.bytes().await
    }

    /// Convenience method to consume body as text.
    pub async fn text(mut self) -> Result<String, NetError> {
        self.body.take().ok_or(NetError::BodyConsumed)?.text().await
    }

    /// Consume body as a JSON object using the bound unmarshal function,
    /// falling back to `serde_json` when none was bound.
    pub async fn json(mut self) -> Result<Json, NetError> {
        let unmarshal = self.unmarshal_json.take();
        let bytes = self.bytes().await?;
        match unmarshal {
            Some(f) => f(&bytes).map_err(|e| NetError::JsonParse(e.to_string())),
            None => serde_json::from_slice(&bytes).map_err(|e| NetError::JsonParse(e.to_string())),
        }
    }

    /// Consume body as JSON, deserializing to type T.
    pub async fn json_as<T: serde::de::DeserializeOwned>(self) -> Result<T, NetError> {
        let bytes = self.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| NetError::JsonParse(e.to_string()))
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("version", &self.version)
            .field("headers", &self.headers)
            .field("request", &self.request)
            .field("body_consumed", &self.body.is_none())
            .finish()
    }
}
