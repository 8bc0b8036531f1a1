use axum::{http::StatusCode, response::Json};
use serde::Serialize;

/// 对外展示的服务名（契约固定，与包名无关）
const SERVICE_NAME: &str = "Background Remover API";

/// 健康检查响应
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    /// 服务状态
    #[schema(example = "healthy")]
    pub status: String,
    /// 服务名称
    #[schema(example = "Background Remover API")]
    pub service: String,
    /// 当前版本（Cargo package version）
    #[schema(example = "1.0.0")]
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/health",
    summary = "健康检查",
    description = "用于探活的健康检查端点，返回服务状态与版本信息，不依赖上游推理服务。",
    responses((status = 200, description = "服务健康", body = HealthResponse)),
    tag = "Health"
)]
pub async fn health_check() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            service: SERVICE_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::health_check;

    #[tokio::test]
    async fn health_body_is_fixed_contract() {
        let (status, body) = health_check().await;
        assert_eq!(status, axum::http::StatusCode::OK);
        assert_eq!(body.status, "healthy");
        assert_eq!(body.service, "Background Remover API");
        assert_eq!(body.version, "1.0.0");
    }
}
