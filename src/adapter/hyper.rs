//! Reference adapter on top of hyper-util's pooled client.

use crate::adapter::{Adapter, Dispatching};
use crate::base::context::TransportResultExt;
use crate::base::neterror::NetError;
use crate::http::response::Response;
use crate::options::Options;
use ::hyper::body::Incoming;
use ::hyper::client::conn::http1;
use bytes::Bytes;
use http::header::{HeaderValue, HOST, PROXY_AUTHORIZATION};
use http_body_util::Full;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::{TokioExecutor, TokioIo};
use tokio::net::TcpStream;
use url::Url;

/// Plain-HTTP adapter (HTTP/1.1) with connection pooling.
///
/// TLS is not provided: `https` URLs fail with [`NetError::InvalidUrl`].
/// Register a TLS-capable [`Adapter`] through [`Options::adapter`] for them.
///
/// When [`Options::proxy`] is set, each attempt opens a connection to the
/// (`http`) proxy and sends the request in absolute form. Userinfo in the
/// proxy URL becomes a Basic `Proxy-Authorization` header.
#[derive(Clone)]
pub struct HyperAdapter {
    client: Client<HttpConnector, Full<Bytes>>,
}

impl Default for HyperAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl HyperAdapter {
    pub fn new() -> Self {
        Self {
            client: Client::builder(TokioExecutor::new()).build_http(),
        }
    }

    fn build_request(options: &Options) -> Result<http::Request<Full<Bytes>>, NetError> {
        let url = match options.full_url.clone() {
            Some(url) => url,
            None => options.compute_full_url()?,
        };
        if url.scheme() != "http" {
            return Err(NetError::InvalidUrl(format!(
                "{}: scheme not supported by HyperAdapter, use a TLS-capable adapter",
                url
            )));
        }

        let uri: http::Uri = url
            .as_str()
            .parse()
            .map_err(|e: http::uri::InvalidUri| NetError::InvalidUrl(e.to_string()))?;
        let body = options
            .body
            .as_ref()
            .map(|b| b.to_bytes())
            .unwrap_or_default();

        let mut request = http::Request::new(Full::new(body));
        *request.method_mut() = options.current_method();
        *request.uri_mut() = uri;
        *request.headers_mut() = options.outgoing_headers();
        Ok(request)
    }

    /// Send `request` (absolute-form URI) over a fresh connection to `proxy`.
    async fn send_via_proxy(
        proxy: &Url,
        mut request: http::Request<Full<Bytes>>,
    ) -> Result<http::Response<Incoming>, NetError> {
        if proxy.scheme() != "http" {
            return Err(NetError::InvalidUrl(format!(
                "{}: only http proxies are supported by HyperAdapter",
                proxy
            )));
        }
        let host = proxy
            .host_str()
            .ok_or_else(|| NetError::InvalidUrl(format!("{}: proxy has no host", proxy)))?;
        let port = proxy.port_or_known_default().unwrap_or(80);

        let authority = request.uri().authority().map(|a| a.to_string());
        if !request.headers().contains_key(HOST) {
            if let Some(value) = authority.and_then(|a| HeaderValue::from_str(&a).ok()) {
                request.headers_mut().insert(HOST, value);
            }
        }
        if let Some(auth) = proxy_auth_header(proxy) {
            request.headers_mut().insert(PROXY_AUTHORIZATION, auth);
        }

        let host = host.trim_start_matches('[').trim_end_matches(']');
        let stream = TcpStream::connect((host, port)).await.transport_context()?;
        let (mut sender, connection) = http1::handshake(TokioIo::new(stream))
            .await
            .transport_context()?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::debug!(error = %e, "proxy connection closed");
            }
        });

        sender.send_request(request).await.transport_context()
    }
}

/// Basic credentials from the proxy URL's userinfo, if any.
fn proxy_auth_header(proxy: &Url) -> Option<HeaderValue> {
    if proxy.username().is_empty() {
        return None;
    }
    use base64::{engine::general_purpose, Engine as _};
    let creds = format!("{}:{}", proxy.username(), proxy.password().unwrap_or(""));
    let encoded = general_purpose::STANDARD.encode(creds);
    HeaderValue::from_str(&format!("Basic {}", encoded)).ok()
}

impl Adapter for HyperAdapter {
    fn do_request<'a>(&'a self, options: &'a Options) -> Dispatching<'a> {
        Box::pin(async move {
            let request = Self::build_request(options)?;
            tracing::trace!(method = %request.method(), uri = %request.uri(), "dispatching");
            let response: http::Response<Incoming> = match options.proxy.as_ref() {
                Some(proxy) => Self::send_via_proxy(proxy, request).await?,
                None => self.client.request(request).await.transport_context()?,
            };
            Ok(Response::from_http(response))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_round_trip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let n = socket.read(&mut buf).await.unwrap();
            let request = String::from_utf8_lossy(&buf[..n]).to_string();
            assert!(request.starts_with("PUT /echo HTTP/1.1"));
            socket
                .write_all(b"HTTP/1.1 201 Created\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok")
                .await
                .unwrap();
        });

        let mut options = Options::new()
            .method(Method::PUT)
            .uri(format!("http://{}/echo", addr))
            .body("data");
        options.full_url = Some(options.compute_full_url().unwrap());

        let res = HyperAdapter::new().do_request(&options).await.unwrap();
        assert_eq!(res.status(), 201);
        assert_eq!(res.text().await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_refused_connection_has_errno_code() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let options = Options::new().uri(format!("http://{}/", addr));
        let err = HyperAdapter::new().do_request(&options).await.unwrap_err();
        assert!(err.to_string().contains("ECONNREFUSED"), "got {}", err);
    }

    #[tokio::test]
    async fn test_proxy_gets_absolute_form_request() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 2048];
            let n = socket.read(&mut buf).await.unwrap();
            let _ = tx.send(String::from_utf8_lossy(&buf[..n]).to_string());
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 7\r\nConnection: close\r\n\r\nproxied")
                .await
                .unwrap();
        });

        let mut options = Options::new()
            .uri("http://origin.invalid/items?page=2")
            .proxy(Url::parse(&format!("http://user:pass@{}", addr)).unwrap());
        options.full_url = Some(options.compute_full_url().unwrap());

        let res = HyperAdapter::new().do_request(&options).await.unwrap();
        assert_eq!(res.text().await.unwrap(), "proxied");

        let raw = rx.await.unwrap().to_lowercase();
        assert!(raw.starts_with("get http://origin.invalid/items?page=2 http/1.1"), "got {}", raw);
        assert!(raw.contains("host: origin.invalid"));
        // base64("user:pass")
        assert!(raw.contains("proxy-authorization: basic dxnlcjpwyxnz"));
    }

    #[tokio::test]
    async fn test_non_http_proxy_rejected() {
        let options = Options::new()
            .uri("http://origin.invalid/")
            .proxy(Url::parse("socks5://127.0.0.1:1080").unwrap());
        let err = HyperAdapter::new().do_request(&options).await.unwrap_err();
        assert!(matches!(err, NetError::InvalidUrl(_)));
        assert!(err.to_string().contains("proxies"));
    }

    #[tokio::test]
    async fn test_https_rejected() {
        let options = Options::new().uri("https://example.com/");
        let err = HyperAdapter::new().do_request(&options).await.unwrap_err();
        assert!(matches!(err, NetError::InvalidUrl(_)));
        assert!(err.to_string().contains("TLS-capable adapter"), "got {}", err);
    }
}
