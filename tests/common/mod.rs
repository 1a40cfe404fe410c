#![allow(dead_code)]

use hookline::adapter::{Adapter, Dispatching};
use hookline::{NetError, Options, Response};
use http::{Method, StatusCode};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// A request as the test server received it.
#[derive(Debug, Clone)]
pub struct Received {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Received {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

fn parse_request(raw: &str) -> Received {
    let (head, body) = raw.split_once("\r\n\r\n").unwrap_or((raw, ""));
    let mut lines = head.lines();
    let mut start = lines.next().unwrap_or("").split_whitespace();
    let method = start.next().unwrap_or("").to_string();
    let path = start.next().unwrap_or("").to_string();
    let headers = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();
    Received {
        method,
        path,
        headers,
        body: body.to_string(),
    }
}

pub type Handler = dyn Fn(&Received) -> String + Send + Sync;

/// Raw HTTP/1.1 test server. Every connection gets one response and is
/// closed. Returns the base URL and the log of received requests.
pub async fn spawn_server<F>(handler: F) -> (String, Arc<Mutex<Vec<Received>>>)
where
    F: Fn(&Received) -> String + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));
    let server_log = log.clone();
    let handler: Arc<Handler> = Arc::new(handler);

    tokio::spawn(async move {
        loop {
            if let Ok((mut socket, _)) = listener.accept().await {
                let handler = handler.clone();
                let log = server_log.clone();
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 8192];
                    let mut filled = 0;
                    // Read until the head is complete and the declared body arrived.
                    loop {
                        let n = socket.read(&mut buf[filled..]).await.unwrap_or(0);
                        if n == 0 {
                            break;
                        }
                        filled += n;
                        let text = String::from_utf8_lossy(&buf[..filled]).to_string();
                        if let Some((head, body)) = text.split_once("\r\n\r\n") {
                            let expected = parse_request(head)
                                .header("content-length")
                                .and_then(|v| v.parse::<usize>().ok())
                                .unwrap_or(0);
                            if body.len() >= expected {
                                break;
                            }
                        }
                    }
                    let received = parse_request(&String::from_utf8_lossy(&buf[..filled]));
                    let response = handler(&received);
                    log.lock().unwrap().push(received);
                    let _ = socket.write_all(response.as_bytes()).await;
                });
            }
        }
    });

    (format!("http://{}", addr), log)
}

/// Build a raw response with `Connection: close`.
pub fn reply(status: &str, headers: &[(&str, &str)], body: &str) -> String {
    let mut out = format!("HTTP/1.1 {}\r\n", status);
    for (k, v) in headers {
        out.push_str(&format!("{}: {}\r\n", k, v));
    }
    out.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    ));
    out
}

/// What the recording adapter saw for one attempt.
#[derive(Debug, Clone)]
pub struct Seen {
    pub method: Method,
    pub url: String,
    pub headers: http::HeaderMap,
    pub body: Option<String>,
}

type Reply = dyn Fn(usize, &Options) -> Result<Response, NetError> + Send + Sync;

/// In-process adapter answering through a closure.
#[derive(Clone)]
pub struct Recording {
    reply: Arc<Reply>,
    pub seen: Arc<Mutex<Vec<Seen>>>,
}

impl Recording {
    pub fn new<F>(reply: F) -> Self
    where
        F: Fn(usize, &Options) -> Result<Response, NetError> + Send + Sync + 'static,
    {
        Self {
            reply: Arc::new(reply),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn ok() -> Self {
        Self::new(|_, _| Ok(Response::empty(StatusCode::OK)))
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }
}

impl Adapter for Recording {
    fn do_request<'a>(&'a self, options: &'a Options) -> Dispatching<'a> {
        let attempt = {
            let mut seen = self.seen.lock().unwrap();
            seen.push(Seen {
                method: options.current_method(),
                url: options
                    .full_url
                    .as_ref()
                    .map(|u| u.to_string())
                    .unwrap_or_default(),
                headers: options.outgoing_headers(),
                body: options
                    .body
                    .as_ref()
                    .map(|b| String::from_utf8_lossy(&b.to_bytes()).into_owned()),
            });
            seen.len() - 1
        };
        let result = (self.reply)(attempt, options);
        Box::pin(async move { result })
    }
}
