//! Retry policy through the client, against live servers and the recording adapter.

mod common;

use common::{reply, spawn_server, Recording};
use hookline::{Client, Hooks, NetError, Options, Response, RetryOptions};
use http::StatusCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn immediate() -> RetryOptions {
    RetryOptions::default().calculate_timeout(|_, _, _, _| Duration::ZERO)
}

#[tokio::test]
async fn test_503_retried_up_to_limit() {
    let (base, log) = spawn_server(|_| reply("503 Service Unavailable", &[], "busy")).await;

    let err = Client::new(Options::new().retry_options(immediate()))
        .unwrap()
        .get(format!("{}/flaky", base))
        .send()
        .await
        .unwrap_err();

    assert!(matches!(err, NetError::MaxRetriesExceeded { retries: 2, .. }), "got {:?}", err);
    let last = err.into_last_response().unwrap();
    assert_eq!(last.status(), 503);
    assert_eq!(log.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_retry_after_header_feeds_delay() {
    let (base, _) = spawn_server(|_| {
        reply("429 Too Many Requests", &[("Retry-After", "3")], "")
    })
    .await;

    let computed = Arc::new(Mutex::new(Vec::new()));
    let sink = computed.clone();
    let policy = RetryOptions::default()
        .limit(1)
        .calculate_timeout(move |_, _, delay, _| {
            sink.lock().unwrap().push(delay);
            Duration::ZERO
        });

    let err = hookline::get(format!("{}/", base), [Options::new().retry_options(policy)])
        .await
        .unwrap_err();

    assert!(matches!(err, NetError::MaxRetriesExceeded { .. }));
    assert_eq!(*computed.lock().unwrap(), vec![time::Duration::seconds(3)]);
}

#[tokio::test]
async fn test_post_not_retried_on_status() {
    let (base, log) = spawn_server(|_| reply("503 Service Unavailable", &[], "")).await;

    let res = hookline::post(format!("{}/", base), [Options::new().retry_options(immediate())])
        .await
        .unwrap();

    assert_eq!(res.status(), 503);
    assert_eq!(log.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_recovers_after_transient_failure() {
    let (base, log) = spawn_server({
        let hits = Arc::new(Mutex::new(0));
        move |_| {
            let mut n = hits.lock().unwrap();
            *n += 1;
            if *n == 1 {
                reply("502 Bad Gateway", &[], "")
            } else {
                reply("200 OK", &[], "recovered")
            }
        }
    })
    .await;

    let res = Client::new(Options::new().retry_options(immediate()))
        .unwrap()
        .get(format!("{}/", base))
        .send()
        .await
        .unwrap();

    assert_eq!(res.text().await.unwrap(), "recovered");
    assert_eq!(log.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_before_retry_hook_observes_each_retry() {
    let adapter = Recording::new(|attempt, _| match attempt {
        0 => Err(NetError::transport("ECONNRESET: connection reset")),
        1 => Ok(Response::empty(StatusCode::SERVICE_UNAVAILABLE)),
        _ => Ok(Response::empty(StatusCode::OK)),
    });

    let calls = Arc::new(Mutex::new(Vec::new()));
    let sink = calls.clone();
    let res = Client::new(
        Options::new()
            .adapter(adapter.clone())
            .retry_options(immediate())
            .hooks(Hooks::new().on_before_retry(move |_, err, retries| {
                sink.lock().unwrap().push((err.map(|e| e.to_string()), retries));
            })),
    )
    .unwrap()
    .get("http://example.com/")
    .send()
    .await
    .unwrap();

    assert_eq!(res.status(), 200);
    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], (Some("ECONNRESET: connection reset".to_string()), 0));
    assert_eq!(calls[1], (None, 1));
    assert_eq!(adapter.seen().len(), 3);
}

#[tokio::test]
async fn test_hook_retry_applies_overrides() {
    let adapter = Recording::new(|attempt, _| {
        Ok(Response::empty(if attempt == 0 {
            StatusCode::UNAUTHORIZED
        } else {
            StatusCode::OK
        }))
    });

    let res = Client::new(Options::new().adapter(adapter.clone()).hooks(
        Hooks::new().on_after_response(|res, retry| {
            if res.status() == StatusCode::UNAUTHORIZED && retry.can_retry() {
                return Ok(retry.retry(Options::new().header("authorization", "Bearer fresh")));
            }
            Ok(hookline::AfterResponse::Continue)
        }),
    ))
    .unwrap()
    .get("http://example.com/private")
    .send()
    .await
    .unwrap();

    assert_eq!(res.status(), 200);
    let seen = adapter.seen();
    assert_eq!(seen.len(), 2);
    assert!(seen[0].headers.get("authorization").is_none());
    assert_eq!(seen[1].headers.get("authorization").unwrap(), "Bearer fresh");
}

#[tokio::test(start_paused = true)]
async fn test_default_delay_is_request_timeout() {
    let adapter = Recording::new(|attempt, _| {
        Ok(Response::empty(if attempt == 0 {
            StatusCode::GATEWAY_TIMEOUT
        } else {
            StatusCode::OK
        }))
    });

    let start = tokio::time::Instant::now();
    Client::new(
        Options::new()
            .adapter(adapter)
            .timeout(Duration::from_millis(1500)),
    )
    .unwrap()
    .get("http://example.com/")
    .send()
    .await
    .unwrap();

    assert!(start.elapsed() >= Duration::from_millis(1500));
}

#[tokio::test]
async fn test_retry_disabled() {
    let adapter = Recording::new(|_, _| Ok(Response::empty(StatusCode::SERVICE_UNAVAILABLE)));

    let res = hookline::get(
        "http://example.com/",
        [Options::new().adapter(adapter.clone()).retry(false)],
    )
    .await
    .unwrap();

    assert_eq!(res.status(), 503);
    assert_eq!(adapter.seen().len(), 1);
}
