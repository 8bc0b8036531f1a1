use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
    routing::get,
};
use tower::ServiceExt;

use rembg_backend::features::health::handler::health_check;

/// 探活契约：固定 JSON 响应体，不依赖任何共享状态或上游服务。
#[tokio::test]
async fn health_returns_fixed_status_body() {
    let app: Router = Router::new().route("/health", get(health_check));

    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .expect("build request");
    let resp = app.oneshot(req).await.expect("call app");

    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let v: serde_json::Value = serde_json::from_slice(&bytes).expect("parse json");
    assert_eq!(
        v,
        serde_json::json!({
            "status": "healthy",
            "service": "Background Remover API",
            "version": "1.0.0"
        })
    );
}
