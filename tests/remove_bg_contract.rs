use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, Bytes},
    http::{Request, StatusCode, header},
    routing::get,
};
use tower::ServiceExt;

use rembg_backend::{
    config::AppConfig,
    features::{
        health::handler::health_check,
        removal::{
            create_removal_router,
            remover::{BackgroundRemover, RemovalError},
        },
    },
    state::AppState,
};

const API_KEY: &str = "test-api-key";
/// PNG 魔数前 8 字节的 base64
const PNG_B64: &str = "iVBORw0KGgo=";
/// mock 上游返回的"处理结果"
const PROCESSED: &[u8] = b"\x89PNG\r\n\x1a\nprocessed";

/// 可控的背景移除 mock：成功返回固定字节，失败返回上游错误。
struct MockRemover {
    fail: bool,
}

#[async_trait]
impl BackgroundRemover for MockRemover {
    async fn remove(&self, _input: Vec<u8>) -> Result<Bytes, RemovalError> {
        if self.fail {
            Err(RemovalError::Upstream {
                status: 500,
                message: "inference failed".to_string(),
            })
        } else {
            Ok(Bytes::from_static(PROCESSED))
        }
    }
}

fn make_state(fail: bool) -> AppState {
    let config = AppConfig {
        auth: rembg_backend::config::AuthConfig {
            api_key: API_KEY.to_string(),
        },
        ..AppConfig::default()
    };
    AppState::new(Arc::new(config), Arc::new(MockRemover { fail }))
}

fn make_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(create_removal_router())
        .with_state(state)
}

fn post_remove_bg(image: &str, api_key: Option<&str>) -> Request<Body> {
    let body = serde_json::json!({ "image": image });
    let mut builder = Request::builder()
        .method("POST")
        .uri("/remove-bg")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(key) = api_key {
        builder = builder.header("x-api-key", key);
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("build request")
}

async fn body_bytes(resp: axum::response::Response) -> Bytes {
    axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body")
}

#[tokio::test]
async fn data_url_with_valid_key_returns_png_attachment() {
    let app = make_app(make_state(false));

    let req = post_remove_bg(
        &format!("data:image/png;base64,{PNG_B64}"),
        Some(API_KEY),
    );
    let resp = app.oneshot(req).await.expect("call app");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).expect("content type"),
        "image/png"
    );
    assert_eq!(
        resp.headers()
            .get(header::CONTENT_DISPOSITION)
            .expect("content disposition"),
        "attachment; filename=removed-background.png"
    );
    assert_eq!(&body_bytes(resp).await[..], PROCESSED);
}

#[tokio::test]
async fn plain_base64_is_also_accepted() {
    let app = make_app(make_state(false));

    let resp = app
        .oneshot(post_remove_bg(PNG_B64, Some(API_KEY)))
        .await
        .expect("call app");

    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn wrong_key_returns_fixed_403_body() {
    let app = make_app(make_state(false));

    let resp = app
        .oneshot(post_remove_bg(PNG_B64, Some("wrong")))
        .await
        .expect("call app");

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let v: serde_json::Value =
        serde_json::from_slice(&body_bytes(resp).await).expect("parse json");
    assert_eq!(v, serde_json::json!({"detail": "Invalid API Key"}));
}

#[tokio::test]
async fn missing_key_returns_403() {
    let app = make_app(make_state(false));

    let resp = app
        .oneshot(post_remove_bg(PNG_B64, None))
        .await
        .expect("call app");

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn auth_is_checked_before_payload_validity() {
    let app = make_app(make_state(false));

    // 载荷也是非法的，但必须先按鉴权失败处理
    let resp = app
        .oneshot(post_remove_bg("not-base64!!!", Some("wrong")))
        .await
        .expect("call app");

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let v: serde_json::Value =
        serde_json::from_slice(&body_bytes(resp).await).expect("parse json");
    assert_eq!(v["detail"], "Invalid API Key");
}

#[tokio::test]
async fn invalid_base64_returns_400_with_processing_prefix() {
    let app = make_app(make_state(false));

    let resp = app
        .oneshot(post_remove_bg("not-base64!!!", Some(API_KEY)))
        .await
        .expect("call app");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let v: serde_json::Value =
        serde_json::from_slice(&body_bytes(resp).await).expect("parse json");
    let detail = v["detail"].as_str().expect("detail string");
    assert!(
        detail.starts_with("Error processing image: "),
        "unexpected detail: {detail}"
    );
}

#[tokio::test]
async fn remover_failure_maps_to_400() {
    let app = make_app(make_state(true));

    let resp = app
        .oneshot(post_remove_bg(PNG_B64, Some(API_KEY)))
        .await
        .expect("call app");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let v: serde_json::Value =
        serde_json::from_slice(&body_bytes(resp).await).expect("parse json");
    let detail = v["detail"].as_str().expect("detail string");
    assert!(detail.starts_with("Error processing image: "));
    assert!(detail.contains("inference failed"), "detail: {detail}");
}

#[tokio::test]
async fn options_preflight_returns_empty_json_object() {
    let app = make_app(make_state(false));

    let req = Request::builder()
        .method("OPTIONS")
        .uri("/remove-bg")
        .body(Body::empty())
        .expect("build request");
    let resp = app.oneshot(req).await.expect("call app");

    assert_eq!(resp.status(), StatusCode::OK);
    let v: serde_json::Value =
        serde_json::from_slice(&body_bytes(resp).await).expect("parse json");
    assert_eq!(v, serde_json::json!({}));
}
