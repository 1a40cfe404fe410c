//! Response body streaming.
//!
//! A body is consumed at most once; dropping it releases whatever the
//! transport holds for it (socket, buffer).

use crate::base::neterror::NetError;
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full};
use std::fmt;

/// Response body wrapper, independent of the adapter that produced it.
pub struct ResponseBody {
    inner: BoxBody<Bytes, NetError>,
}

impl ResponseBody {
    /// Wrap any `http_body::Body` whose error converts into a displayable cause.
    pub fn new<B>(body: B) -> Self
    where
        B: http_body::Body<Data = Bytes> + Send + Sync + 'static,
        B::Error: fmt::Display,
    {
        Self {
            inner: body
                .map_err(|e| NetError::HttpBody(e.to_string()))
                .boxed(),
        }
    }

    /// A body with no content.
    pub fn empty() -> Self {
        Self {
            inner: Empty::<Bytes>::new()
                .map_err(|never| match never {})
                .boxed(),
        }
    }

    /// A fully buffered body.
    pub fn full(data: impl Into<Bytes>) -> Self {
        Self {
            inner: Full::new(data.into())
                .map_err(|never| match never {})
                .boxed(),
        }
    }

    /// Read entire body as bytes.
    pub async fn bytes(self) -> Result<Bytes, NetError> {
        let collected = self.inner.collect().await?;
        Ok(collected.to_bytes())
    }

    /// Read body as UTF-8 string.
    pub async fn text(self) -> Result<String, NetError> {
        let bytes = self.bytes().await?;
        String::from_utf8(bytes.to_vec()).map_err(|_| NetError::InvalidUtf8)
    }

    /// Get the inner boxed body for low-level access.
    pub fn into_inner(self) -> BoxBody<Bytes, NetError> {
        self.inner
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseBody").finish_non_exhaustive()
    }
}

impl From<Bytes> for ResponseBody {
    fn from(data: Bytes) -> Self {
        ResponseBody::full(data)
    }
}

impl From<&'static str> for ResponseBody {
    fn from(data: &'static str) -> Self {
        ResponseBody::full(Bytes::from_static(data.as_bytes()))
    }
}

impl From<String> for ResponseBody {
    fn from(data: String) -> Self {
        ResponseBody::full(data)
    }
}
