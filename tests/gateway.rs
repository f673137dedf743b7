//! End-to-end tests for the gateway pipeline: quota gate, error category
//! mapping, and the image path.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ai_gateway::config::GatewayConfig;
use ai_gateway::http::HttpServer;
use ai_gateway::lifecycle::Shutdown;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

mod common;

/// Config pointing the chat upstream at a mock, with a test credential.
fn gateway_config(proxy_addr: SocketAddr, upstream_addr: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = proxy_addr.to_string();
    config.chat.base_url = format!("http://{}", upstream_addr);
    config.chat.api_key = "test-key".to_string();
    config.chat.timeout_secs = 5;
    config
}

/// Spawn the gateway and return its shutdown handle.
async fn start_gateway(config: GatewayConfig, proxy_addr: SocketAddr) -> Shutdown {
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    let listener = tokio::net::TcpListener::bind(proxy_addr).await.unwrap();

    let task_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let _ = server.run(listener, &task_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(200)).await;
    shutdown
}

fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

fn chat_body() -> Value {
    json!({"messages": [{"role": "user", "content": "hi"}]})
}

#[tokio::test]
async fn test_chat_success_relays_upstream_payload() {
    let upstream_addr: SocketAddr = "127.0.0.1:28411".parse().unwrap();
    let proxy_addr: SocketAddr = "127.0.0.1:28412".parse().unwrap();

    common::start_mock_upstream(upstream_addr, 200, common::VALID_COMPLETION).await;
    let shutdown = start_gateway(gateway_config(proxy_addr, upstream_addr), proxy_addr).await;

    let res = http_client()
        .post(format!("http://{}/api/chat", proxy_addr))
        .json(&chat_body())
        .send()
        .await
        .expect("Gateway unreachable");

    assert_eq!(res.status(), 200);
    let payload: Value = res.json().await.unwrap();
    // Relayed unchanged, including fields the gateway does not model.
    assert_eq!(payload["id"], "cmpl-1");
    assert_eq!(payload["choices"][0]["message"]["content"], "Hello");

    shutdown.trigger();
}

#[tokio::test]
async fn test_quota_rejection_carries_stable_reset_time() {
    let upstream_addr: SocketAddr = "127.0.0.1:28421".parse().unwrap();
    let proxy_addr: SocketAddr = "127.0.0.1:28422".parse().unwrap();

    common::start_mock_upstream(upstream_addr, 200, common::VALID_COMPLETION).await;
    let mut config = gateway_config(proxy_addr, upstream_addr);
    config.rate_limit.max_requests = 2;
    config.rate_limit.window_secs = 3600;
    let shutdown = start_gateway(config, proxy_addr).await;

    let client = http_client();
    let url = format!("http://{}/api/chat", proxy_addr);

    for _ in 0..2 {
        let res = client.post(&url).json(&chat_body()).send().await.unwrap();
        assert_eq!(res.status(), 200);
    }

    let res = client.post(&url).json(&chat_body()).send().await.unwrap();
    assert_eq!(res.status(), 429);
    let rejection: Value = res.json().await.unwrap();
    assert_eq!(rejection["error"], "rate_limited");

    let reset_time = rejection["reset_time"].as_str().unwrap().to_string();
    let reset_at = DateTime::parse_from_rfc3339(&reset_time).expect("reset_time must be ISO-8601");
    assert!(reset_at > Utc::now(), "reset must lie in the future");

    // A second rejection reports the identical stored instant.
    let res = client.post(&url).json(&chat_body()).send().await.unwrap();
    assert_eq!(res.status(), 429);
    let again: Value = res.json().await.unwrap();
    assert_eq!(again["reset_time"].as_str().unwrap(), reset_time);

    shutdown.trigger();
}

#[tokio::test]
async fn test_upstream_401_maps_to_auth_failure() {
    let upstream_addr: SocketAddr = "127.0.0.1:28431".parse().unwrap();
    let proxy_addr: SocketAddr = "127.0.0.1:28432".parse().unwrap();

    common::start_mock_upstream(upstream_addr, 401, r#"{"error":"bad key"}"#).await;
    let shutdown = start_gateway(gateway_config(proxy_addr, upstream_addr), proxy_addr).await;

    let res = http_client()
        .post(format!("http://{}/api/chat", proxy_addr))
        .json(&chat_body())
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 502);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "auth_failure");
    // Raw upstream body must not leak.
    assert!(!body["message"].as_str().unwrap().contains("bad key"));

    shutdown.trigger();
}

#[tokio::test]
async fn test_upstream_429_maps_to_overloaded() {
    let upstream_addr: SocketAddr = "127.0.0.1:28441".parse().unwrap();
    let proxy_addr: SocketAddr = "127.0.0.1:28442".parse().unwrap();

    common::start_mock_upstream(upstream_addr, 429, r#"{"error":"slow down"}"#).await;
    let shutdown = start_gateway(gateway_config(proxy_addr, upstream_addr), proxy_addr).await;

    let res = http_client()
        .post(format!("http://{}/api/chat", proxy_addr))
        .json(&chat_body())
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 503);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "upstream_overloaded");

    shutdown.trigger();
}

#[tokio::test]
async fn test_success_without_choices_is_malformed() {
    let upstream_addr: SocketAddr = "127.0.0.1:28451".parse().unwrap();
    let proxy_addr: SocketAddr = "127.0.0.1:28452".parse().unwrap();

    common::start_mock_upstream(upstream_addr, 200, r#"{"choices":[]}"#).await;
    let shutdown = start_gateway(gateway_config(proxy_addr, upstream_addr), proxy_addr).await;

    let res = http_client()
        .post(format!("http://{}/api/chat", proxy_addr))
        .json(&chat_body())
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 502);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "malformed_upstream_response");

    shutdown.trigger();
}

#[tokio::test]
async fn test_missing_credential_makes_no_upstream_call() {
    let upstream_addr: SocketAddr = "127.0.0.1:28461".parse().unwrap();
    let proxy_addr: SocketAddr = "127.0.0.1:28462".parse().unwrap();

    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    common::start_programmable_upstream(upstream_addr, move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            (200, common::VALID_COMPLETION.to_string())
        }
    })
    .await;

    let mut config = gateway_config(proxy_addr, upstream_addr);
    config.chat.api_key = String::new();
    let shutdown = start_gateway(config, proxy_addr).await;

    let res = http_client()
        .post(format!("http://{}/api/chat", proxy_addr))
        .json(&chat_body())
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 500);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "configuration");
    assert_eq!(calls.load(Ordering::SeqCst), 0, "no upstream call may be attempted");

    shutdown.trigger();
}

#[tokio::test]
async fn test_empty_messages_rejected_before_upstream() {
    let upstream_addr: SocketAddr = "127.0.0.1:28471".parse().unwrap();
    let proxy_addr: SocketAddr = "127.0.0.1:28472".parse().unwrap();

    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    common::start_programmable_upstream(upstream_addr, move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            (200, common::VALID_COMPLETION.to_string())
        }
    })
    .await;

    let shutdown = start_gateway(gateway_config(proxy_addr, upstream_addr), proxy_addr).await;

    let res = http_client()
        .post(format!("http://{}/api/chat", proxy_addr))
        .json(&json!({"messages": []}))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_input");
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    shutdown.trigger();
}

#[tokio::test]
async fn test_image_endpoint_sanitizes_and_links() {
    let upstream_addr: SocketAddr = "127.0.0.1:28481".parse().unwrap();
    let proxy_addr: SocketAddr = "127.0.0.1:28482".parse().unwrap();

    let mut config = gateway_config(proxy_addr, upstream_addr);
    config.image.base_url = "https://images.example.com/prompt".to_string();
    config.image.width = 512;
    config.image.height = 512;
    let shutdown = start_gateway(config, proxy_addr).await;

    let res = http_client()
        .post(format!("http://{}/api/image", proxy_addr))
        .json(&json!({"prompt": "a cat! @#$ sitting, on-a-mat"}))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["prompt"], "a cat sitting, on-a-mat");

    let image_url = body["image_url"].as_str().unwrap();
    assert!(image_url.starts_with("https://images.example.com/prompt/a%20cat%20sitting"));
    assert!(image_url.contains("width=512"));
    assert!(image_url.contains("height=512"));

    shutdown.trigger();
}

#[tokio::test]
async fn test_empty_image_prompt_is_invalid_input() {
    let upstream_addr: SocketAddr = "127.0.0.1:28491".parse().unwrap();
    let proxy_addr: SocketAddr = "127.0.0.1:28492".parse().unwrap();

    let shutdown = start_gateway(gateway_config(proxy_addr, upstream_addr), proxy_addr).await;

    let res = http_client()
        .post(format!("http://{}/api/image", proxy_addr))
        .json(&json!({"prompt": "   "}))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_input");

    shutdown.trigger();
}

#[tokio::test]
async fn test_unparseable_body_uses_error_taxonomy() {
    let upstream_addr: SocketAddr = "127.0.0.1:28511".parse().unwrap();
    let proxy_addr: SocketAddr = "127.0.0.1:28512".parse().unwrap();

    let shutdown = start_gateway(gateway_config(proxy_addr, upstream_addr), proxy_addr).await;
    let client = http_client();

    // Syntactically broken JSON.
    let res = client
        .post(format!("http://{}/api/chat", proxy_addr))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_input");
    assert!(body["message"].as_str().is_some());

    // Well-formed JSON of the wrong shape.
    let res = client
        .post(format!("http://{}/api/image", proxy_addr))
        .json(&json!({"prompt": 42}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_input");

    shutdown.trigger();
}

#[tokio::test]
async fn test_health_endpoint() {
    let upstream_addr: SocketAddr = "127.0.0.1:28501".parse().unwrap();
    let proxy_addr: SocketAddr = "127.0.0.1:28502".parse().unwrap();

    let shutdown = start_gateway(gateway_config(proxy_addr, upstream_addr), proxy_addr).await;

    let res = http_client()
        .get(format!("http://{}/health", proxy_addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    shutdown.trigger();
}
