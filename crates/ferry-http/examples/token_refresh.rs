//! Pause outgoing requests while an access token is refreshed
//!
//! This example demonstrates:
//! - Loading client defaults from a settings file
//! - Attaching a token with a request interceptor
//! - Holding every request behind the lock while the token is renewed
//! - Recovering from an expired token in a response interceptor

use std::sync::Arc;

use ferry_http::{Error, HttpExt, InterceptorHttp, ReqwestAdapter, RequestOptions, Settings};
use parking_lot::RwLock;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let base_url =
        std::env::var("FERRY_BASE_URL").unwrap_or_else(|_| "https://httpbin.org".to_string());
    let settings = Settings::new(std::env::var("FERRY_CONFIG").ok()).from_env();

    let client = InterceptorHttp::with_defaults(settings.request_options(), ReqwestAdapter::new());
    let token = Arc::new(RwLock::new("expired".to_string()));

    let current = token.clone();
    client.interceptors.request.use_fulfilled(move |request| {
        let bearer = format!("Bearer {}", current.read());
        async move { Ok(request.with_header("Authorization", bearer)) }
    });

    let gate = client.interceptors.request.clone();
    client.interceptors.response.use_handler(
        |response| async move { Ok(response) },
        move |error: Error| {
            let gate = gate.clone();
            async move {
                if error.response().map(|r| r.status()) == Some(401) {
                    println!("Token rejected, later requests wait for the refresh");
                    gate.lock();
                }
                Err(error)
            }
        },
    );

    println!("\n=== Request with an expired token ===");
    match client.get(&format!("{base_url}/bearer"), None).await {
        Ok(response) => println!("Status: {}", response.status()),
        Err(e) => eprintln!("Request failed: {e}"),
    }

    println!("\n=== Refreshing the token ===");
    let refresh = RequestOptions::new().skip_interceptor(true);
    match client.get(&format!("{base_url}/uuid"), Some(refresh)).await {
        Ok(_) => *token.write() = "fresh".to_string(),
        Err(e) => eprintln!("Refresh failed: {e}"),
    }
    client.interceptors.request.unlock();

    println!("\n=== Request with the refreshed token ===");
    match client.get(&format!("{base_url}/bearer"), None).await {
        Ok(response) => println!("Status: {}", response.status()),
        Err(e) => eprintln!("Request failed: {e}"),
    }

    Ok(())
}
