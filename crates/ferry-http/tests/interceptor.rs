//! Interceptor pipeline tests against a stub transport

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{StubAdapter, URL};
use ferry_http::{
    Error, HttpExt, InterceptorHttp, InterceptorOptions, Request, RequestMethod, RequestOptions,
    Response,
};
use parking_lot::Mutex;
use serde_json::json;

fn tag(step: &'static str) -> impl Fn(Request) -> futures::future::Ready<Result<Request, Error>> {
    move |mut request| {
        request.append_header("X-Step", step);
        futures::future::ready(Ok(request))
    }
}

fn steps(request: &Request) -> Vec<String> {
    request
        .headers()
        .get_all("x-step")
        .map(<[String]>::to_vec)
        .unwrap_or_default()
}

async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_handlers_wrap_dispatch_in_order() {
    let adapter = StubAdapter::ok();
    let client = InterceptorHttp::new(adapter.clone());
    client.interceptors.request.use_fulfilled(tag("one"));
    client.interceptors.request.use_fulfilled(tag("two"));
    client.interceptors.response.use_fulfilled(|mut response: Response| async move {
        response.headers_mut().set("X-Seen", "yes");
        Ok(response)
    });

    let response = client.get(URL, None).await.expect("response");
    assert_eq!(response.headers().get("x-seen"), Some("yes"));
    assert_eq!(steps(&adapter.requests()[0]), vec!["one", "two"]);
}

#[tokio::test]
async fn test_unlock_releases_every_waiting_call() {
    let adapter = StubAdapter::ok();
    let client = InterceptorHttp::new(adapter.clone());
    for step in ["a", "b", "c"] {
        client.interceptors.request.use_fulfilled(tag(step));
    }

    client.interceptors.request.lock();
    let calls = (0..3)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.get(URL, None).await })
        })
        .collect::<Vec<_>>();

    settle().await;
    assert!(adapter.requests().is_empty());

    client.interceptors.request.unlock();
    for call in calls {
        let response = call.await.expect("task").expect("response");
        assert!(response.ok());
    }

    let requests = adapter.requests();
    assert_eq!(requests.len(), 3);
    for request in requests {
        assert_eq!(steps(&request), vec!["a", "b", "c"]);
    }
}

#[tokio::test]
async fn test_clear_rejects_every_waiting_handler() {
    let adapter = StubAdapter::ok();
    let client = InterceptorHttp::new(adapter.clone());
    let reasons = Arc::new(Mutex::new(Vec::new()));

    for step in ["a", "b", "c"] {
        let reasons = reasons.clone();
        client.interceptors.request.use_handler(tag(step), move |error| {
            let reasons = reasons.clone();
            async move {
                if let Error::LockCleared(reason) = &error {
                    reasons.lock().push(reason.clone());
                }
                Err(error)
            }
        });
    }

    client.interceptors.request.lock();
    let calls = (0..3)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.get(URL, None).await })
        })
        .collect::<Vec<_>>();

    settle().await;
    client.interceptors.request.clear(Some("x"));

    for call in calls {
        let result = call.await.expect("task");
        assert!(matches!(result, Err(Error::LockCleared(ref reason)) if reason == "x"));
    }
    assert_eq!(*reasons.lock(), vec!["x"; 9]);
    assert!(adapter.requests().is_empty());
    assert!(!client.interceptors.request.is_locked());
}

#[tokio::test]
async fn test_response_lock_pauses_only_response_handlers() {
    let adapter = StubAdapter::ok();
    let client = InterceptorHttp::new(adapter.clone());
    client.interceptors.request.use_fulfilled(tag("a"));
    client.interceptors.response.use_fulfilled(|mut response: Response| async move {
        response.headers_mut().set("X-Seen", "yes");
        Ok(response)
    });

    client.interceptors.response.lock();
    assert!(!client.interceptors.request.is_locked());

    let caller = client.clone();
    let call = tokio::spawn(async move { caller.get(URL, None).await });

    settle().await;
    let requests = adapter.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(steps(&requests[0]), vec!["a"]);
    assert!(!call.is_finished());

    client.interceptors.response.unlock();
    let response = call.await.expect("task").expect("response");
    assert_eq!(response.headers().get("x-seen"), Some("yes"));
}

#[tokio::test]
async fn test_wait_lock_false_passes_a_held_lock() {
    let adapter = StubAdapter::ok();
    let client = InterceptorHttp::new(adapter.clone());
    client.interceptors.request.use_fulfilled(tag("a"));
    client.interceptors.request.lock();

    let options = RequestOptions::new().wait_lock(false);
    let response = tokio::time::timeout(Duration::from_secs(5), client.get(URL, Some(options)))
        .await
        .expect("does not wait for the lock")
        .expect("response");
    assert!(response.ok());
    assert_eq!(steps(&adapter.requests()[0]), vec!["a"]);
    client.interceptors.request.unlock();
}

#[tokio::test]
async fn test_request_options_override_client_wait_lock() {
    let adapter = StubAdapter::ok();
    let client = InterceptorHttp::with_defaults(RequestOptions::new().wait_lock(false), adapter.clone());
    client.interceptors.request.use_fulfilled(tag("a"));
    client.interceptors.request.lock();

    let request = Request::new(RequestMethod::Get, URL);
    let response = tokio::time::timeout(Duration::from_secs(5), client.request(request, None))
        .await
        .expect("client default applies to prepared requests")
        .expect("response");
    assert!(response.ok());

    let waiting = client.clone();
    let call = tokio::spawn(async move {
        let options = RequestOptions::new().wait_lock(true);
        waiting.get(URL, Some(options)).await
    });
    settle().await;
    assert_eq!(adapter.requests().len(), 1);

    client.interceptors.request.unlock();
    call.await.expect("task").expect("response");
    assert_eq!(adapter.requests().len(), 2);
}

#[tokio::test]
async fn test_skip_interceptor_bypasses_handlers() {
    let adapter = StubAdapter::ok();
    let client = InterceptorHttp::new(adapter.clone());
    client.interceptors.request.use_fulfilled(tag("a"));
    client.interceptors.request.lock();

    let options = RequestOptions::new().skip_interceptor(true);
    client.get(URL, Some(options)).await.expect("response");
    assert!(steps(&adapter.requests()[0]).is_empty());
    client.interceptors.request.unlock();

    let skipping = InterceptorHttp::with_defaults(
        RequestOptions::new().skip_interceptor(true),
        adapter.clone(),
    );
    skipping.interceptors.request.use_fulfilled(tag("b"));
    skipping.get(URL, None).await.expect("response");
    assert!(steps(&adapter.requests()[1]).is_empty());
}

#[tokio::test]
async fn test_eject_applies_to_later_calls_only() {
    let adapter = StubAdapter::ok();
    let client = InterceptorHttp::new(adapter.clone());
    let first = client.interceptors.request.use_fulfilled(tag("a"));
    let second = client.interceptors.request.use_fulfilled(tag("b"));

    let in_flight = client.get(URL, None);
    client.interceptors.request.eject(first);
    in_flight.await.expect("captured call");
    client.get(URL, None).await.expect("later call");

    client.interceptors.request.eject(second);
    let third = client.interceptors.request.use_fulfilled(tag("c"));
    assert_eq!(third.index(), 2);
    client.get(URL, None).await.expect("after second eject");

    let requests = adapter.requests();
    assert_eq!(steps(&requests[0]), vec!["a", "b"]);
    assert_eq!(steps(&requests[1]), vec!["b"]);
    assert_eq!(steps(&requests[2]), vec!["c"]);
}

#[tokio::test]
async fn test_response_handler_recovers_rejection() {
    let client = InterceptorHttp::new(StubAdapter::status(404));
    client
        .interceptors
        .response
        .use_handler(|response| async move { Ok(response) }, |error: Error| async move {
            match error.into_response() {
                Some(response) if response.status() == 404 => Ok(response),
                Some(response) => Err(response.into()),
                None => Err(Error::Handler("no response".to_string())),
            }
        });

    let response = client.get(URL, None).await.expect("recovered");
    assert_eq!(response.status(), 404);
    assert!(!response.ok());
}

#[tokio::test]
async fn test_request_handler_failure_skips_dispatch() {
    let adapter = StubAdapter::ok();
    let client = InterceptorHttp::new(adapter.clone());
    let observed = Arc::new(Mutex::new(None));

    client
        .interceptors
        .request
        .use_fulfilled(|_| async { Err(Error::Handler("denied".to_string())) });
    let sink = observed.clone();
    client.interceptors.response.use_handler(
        |response| async move { Ok(response) },
        move |error: Error| {
            *sink.lock() = Some(error.to_string());
            async move { Err(error) }
        },
    );

    let err = client.get(URL, None).await.expect_err("rejected");
    assert!(matches!(err, Error::Handler(ref m) if m == "denied"));
    assert_eq!(observed.lock().as_deref(), Some("denied"));
    assert!(adapter.requests().is_empty());
}

#[tokio::test]
async fn test_extra_reaches_handlers() {
    let client = InterceptorHttp::new(StubAdapter::ok());
    let seen = Arc::new(Mutex::new(None));
    let sink = seen.clone();
    client.interceptors.request.use_fulfilled(move |request: Request| {
        *sink.lock() = request
            .interceptor_options()
            .and_then(|options: &InterceptorOptions| options.extra.clone());
        async move { Ok(request) }
    });

    let options = RequestOptions::new().extra(json!({ "retry": 2 }));
    client.get(URL, Some(options)).await.expect("response");
    assert_eq!(*seen.lock(), Some(json!({ "retry": 2 })));
}
