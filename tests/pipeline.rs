//! Pipeline-level acceptance tests with a scripted transport double.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderValue, Method, Request, StatusCode};

use gh_relay::config::{ErrorFormat, ProxyOptions};
use gh_relay::proxy::Pipeline;

mod common;
use common::{Hop, MockTransport};

fn pipeline(options: ProxyOptions, transport: Arc<MockTransport>) -> Pipeline {
    Pipeline::new(options, transport)
}

fn request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn unsupported_target_is_rejected_without_an_upstream_call() {
    let transport = Arc::new(MockTransport::ok("never"));
    let pipeline = pipeline(ProxyOptions::default(), transport.clone());

    let response = pipeline
        .handle(request(Method::GET, "/https://example.com/unrelated"))
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn release_target_is_proxied_verbatim() {
    let transport = Arc::new(MockTransport::ok("release-bytes"));
    let pipeline = pipeline(ProxyOptions::default(), transport.clone());

    let response = pipeline
        .handle(request(
            Method::GET,
            "/https://github.com/octocat/Hello-World/archive/main.zip",
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "*"
    );
    assert_eq!(
        transport.targets(),
        vec!["https://github.com/octocat/Hello-World/archive/main.zip".to_string()]
    );
    assert_eq!(body_string(response).await, "release-bytes");
}

#[tokio::test]
async fn blob_targets_are_fetched_as_raw() {
    let transport = Arc::new(MockTransport::ok("contents"));
    let pipeline = pipeline(ProxyOptions::default(), transport.clone());

    pipeline
        .handle(request(
            Method::GET,
            "/https://github.com/octocat/Hello-World/blob/main/README.md",
        ))
        .await;

    assert_eq!(
        transport.targets(),
        vec!["https://github.com/octocat/Hello-World/raw/main/README.md".to_string()]
    );
}

#[tokio::test]
async fn allow_list_gates_before_any_upstream_contact() {
    let transport = Arc::new(MockTransport::ok("never"));
    let mut options = ProxyOptions::default();
    options.allow_list = vec!["/octocat/".to_string()];
    let pipeline = pipeline(options, transport.clone());

    let denied = pipeline
        .handle(request(
            Method::GET,
            "/https://github.com/other/repo/archive/main.zip",
        ))
        .await;
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);
    assert_eq!(transport.call_count(), 0);

    let admitted = pipeline
        .handle(request(
            Method::GET,
            "/https://github.com/octocat/Hello-World/archive/main.zip",
        ))
        .await;
    assert_eq!(admitted.status(), StatusCode::OK);
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn query_form_is_normalized_with_a_301() {
    let transport = Arc::new(MockTransport::ok("never"));
    let pipeline = pipeline(ProxyOptions::default(), transport.clone());

    let mut req = request(Method::GET, "/?q=https://github.com/a/b/archive/main.zip");
    req.headers_mut()
        .insert(header::HOST, HeaderValue::from_static("proxy.example"));
    let response = pipeline.handle(req).await;

    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "https://proxy.example/https://github.com/a/b/archive/main.zip"
    );
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn query_form_without_a_scheme_is_a_400() {
    let transport = Arc::new(MockTransport::ok("never"));
    let pipeline = pipeline(ProxyOptions::default(), transport.clone());

    let response = pipeline
        .handle(request(Method::GET, "/?q=github.com/a/b/archive/main.zip"))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn path_form_without_a_scheme_is_a_404() {
    let transport = Arc::new(MockTransport::ok("never"));
    let pipeline = pipeline(ProxyOptions::default(), transport.clone());

    let response = pipeline
        .handle(request(Method::GET, "/octocat/Hello-World/archive/main.zip"))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn empty_path_yields_the_landing_response() {
    let transport = Arc::new(MockTransport::ok("never"));
    let pipeline = pipeline(ProxyOptions::default(), transport.clone());

    let response = pipeline.handle(request(Method::GET, "/")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(transport.call_count(), 0);
    assert!(body_string(response).await.contains("gh-relay"));
}

#[tokio::test]
async fn preflight_is_answered_without_reaching_the_network() {
    let transport = Arc::new(MockTransport::ok("never"));
    let pipeline = pipeline(ProxyOptions::default(), transport.clone());

    let mut req = request(
        Method::OPTIONS,
        "/https://github.com/octocat/Hello-World/archive/main.zip",
    );
    req.headers_mut().insert(
        header::ACCESS_CONTROL_REQUEST_HEADERS,
        HeaderValue::from_static("authorization"),
    );
    let response = pipeline.handle(req).await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_METHODS)
            .unwrap(),
        "GET,POST,PUT,PATCH,TRACE,DELETE,HEAD,OPTIONS"
    );
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn api_redirects_within_the_api_host_are_chased() {
    let transport = Arc::new(MockTransport::with_hops(vec![
        Hop::redirect("https://api.github.com/repositories/1296269"),
        Hop::ok("{\"id\":1296269}"),
    ]));
    let pipeline = pipeline(ProxyOptions::default(), transport.clone());

    let response = pipeline
        .handle(request(
            Method::GET,
            "/https://api.github.com/repos/octocat/Hello-World",
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(transport.call_count(), 2);
    assert_eq!(
        transport.targets(),
        vec![
            "https://api.github.com/repos/octocat/Hello-World".to_string(),
            "https://api.github.com/repositories/1296269".to_string(),
        ]
    );
    assert_eq!(body_string(response).await, "{\"id\":1296269}");
}

#[tokio::test]
async fn api_redirect_cycles_fail_closed() {
    let hops = (0..10)
        .map(|_| Hop::redirect("https://api.github.com/loop"))
        .collect();
    let transport = Arc::new(MockTransport::with_hops(hops));
    let mut options = ProxyOptions::default();
    options.max_redirect_hops = 3;
    let pipeline = pipeline(options, transport.clone());

    let response = pipeline
        .handle(request(Method::GET, "/https://api.github.com/repos/x/y"))
        .await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    // Initial fetch plus the allowed follows.
    assert_eq!(transport.call_count(), 4);
}

#[tokio::test]
async fn proxiable_locations_are_reanchored_to_the_relay() {
    let transport = Arc::new(MockTransport::with_hops(vec![Hop::redirect(
        "https://github.com/octocat/Hello-World/releases/download/v1/x.zip",
    )]));
    let pipeline = pipeline(ProxyOptions::default(), transport.clone());

    let response = pipeline
        .handle(request(
            Method::GET,
            "/https://github.com/octocat/Hello-World/archive/main.zip",
        ))
        .await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/https://github.com/octocat/Hello-World/releases/download/v1/x.zip"
    );
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn other_locations_pass_through_untouched() {
    let transport = Arc::new(MockTransport::with_hops(vec![Hop::redirect(
        "https://objects.example.net/signed/blob?sig=abc",
    )]));
    let pipeline = pipeline(ProxyOptions::default(), transport.clone());

    let response = pipeline
        .handle(request(
            Method::GET,
            "/https://github.com/octocat/Hello-World/archive/main.zip",
        ))
        .await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "https://objects.example.net/signed/blob?sig=abc"
    );
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn api_upstream_failures_are_503() {
    let transport = Arc::new(MockTransport::failing());
    let pipeline = pipeline(ProxyOptions::default(), transport.clone());

    let response = pipeline
        .handle(request(Method::GET, "/https://api.github.com/repos/x/y"))
        .await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn other_upstream_failures_are_502() {
    let transport = Arc::new(MockTransport::failing());
    let pipeline = pipeline(ProxyOptions::default(), transport.clone());

    let response = pipeline
        .handle(request(
            Method::GET,
            "/https://github.com/octocat/Hello-World/archive/main.zip",
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn api_quota_headers_reach_the_caller() {
    let mut hop = Hop::ok("{}");
    hop.headers
        .insert("x-ratelimit-remaining", HeaderValue::from_static("42"));
    hop.headers
        .insert("x-frame-options", HeaderValue::from_static("DENY"));
    let transport = Arc::new(MockTransport::with_hops(vec![hop]));
    let pipeline = pipeline(ProxyOptions::default(), transport.clone());

    let response = pipeline
        .handle(request(Method::GET, "/https://api.github.com/rate_limit"))
        .await;

    assert_eq!(
        response.headers().get("x-ratelimit-remaining").unwrap(),
        "42"
    );
    assert!(response.headers().get("x-frame-options").is_none());
}

#[tokio::test]
async fn api_calls_carry_a_browser_identity_upstream() {
    let transport = Arc::new(MockTransport::ok("{}"));
    let options = ProxyOptions::default();
    let expected_identity = options.api_user_agent.clone();
    let pipeline = pipeline(options, transport.clone());

    pipeline
        .handle(request(Method::GET, "/https://api.github.com/repos/x/y"))
        .await;

    let seen = transport.headers_seen();
    assert_eq!(
        seen[0].get(header::USER_AGENT).unwrap(),
        expected_identity.as_str()
    );
}

#[tokio::test]
async fn mirror_mode_redirects_blob_targets_without_fetching() {
    let transport = Arc::new(MockTransport::ok("never"));
    let mut options = ProxyOptions::default();
    options.mirror = true;
    let pipeline = pipeline(options, transport.clone());

    let response = pipeline
        .handle(request(
            Method::GET,
            "/https://github.com/octocat/Hello-World/blob/main/README.md",
        ))
        .await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "https://cdn.jsdelivr.net/gh/octocat/Hello-World@main/README.md"
    );
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn json_error_format_produces_structured_bodies() {
    let transport = Arc::new(MockTransport::ok("never"));
    let mut options = ProxyOptions::default();
    options.error_format = ErrorFormat::Json;
    let pipeline = pipeline(options, transport.clone());

    let response = pipeline
        .handle(request(Method::GET, "/https://example.com/unrelated"))
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value =
        serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["error"], "not_supported");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn configured_prefix_anchors_extraction_and_rewrites() {
    let transport = Arc::new(MockTransport::with_hops(vec![Hop::redirect(
        "https://github.com/octocat/Hello-World/releases/download/v1/x.zip",
    )]));
    let mut options = ProxyOptions::default();
    options.prefix = "/gh/".to_string();
    let pipeline = pipeline(options, transport.clone());

    let response = pipeline
        .handle(request(
            Method::GET,
            "/gh/https://github.com/octocat/Hello-World/archive/main.zip",
        ))
        .await;

    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/gh/https://github.com/octocat/Hello-World/releases/download/v1/x.zip"
    );
}
