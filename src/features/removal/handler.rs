use std::time::Instant;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, HeaderValue, header},
    response::IntoResponse,
    routing::post,
};

use crate::error::{AppError, ErrorDetail};
use crate::state::AppState;

use super::decoder;
use super::models::ImageRequest;

/// 处理结果以附件形式下发，前端直接触发下载
const CONTENT_DISPOSITION_VALUE: &str = "attachment; filename=removed-background.png";

/// 校验调用方 API Key（Header: x-api-key），必须与配置值完全一致。
/// 配置为空串视为锁死：任何请求都拒绝。
fn require_api_key(headers: &HeaderMap, expected: &str) -> Result<(), AppError> {
    let provided = headers.get("x-api-key").and_then(|v| v.to_str().ok());
    match provided {
        Some(v) if !expected.is_empty() && v == expected => Ok(()),
        _ => Err(AppError::InvalidApiKey),
    }
}

#[utoipa::path(
    post,
    path = "/remove-bg",
    summary = "移除图像背景",
    description = "接收 base64 编码的图像（支持 data-URL 前缀），转发给推理服务去除背景，\
以附件形式返回 PNG 字节。鉴权在任何解码之前完成。",
    request_body = ImageRequest,
    responses(
        (status = 200, description = "去除背景后的 PNG 字节（Content-Type: image/png，附件下发）"),
        (status = 400, description = "解码失败或上游处理失败", body = ErrorDetail),
        (status = 403, description = "API Key 缺失或不匹配", body = ErrorDetail)
    ),
    security(("ApiKey" = [])),
    tag = "Removal"
)]
pub async fn remove_bg(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ImageRequest>,
) -> Result<impl IntoResponse, AppError> {
    // 鉴权优先：Key 不对时不做任何解码/处理
    require_api_key(&headers, &state.config.auth.api_key)?;

    let input = decoder::decode_image_payload(&req.image)?;
    let input_bytes = input.len();

    let t_remove = Instant::now();
    let output = state.remover.remove(input).await?;
    tracing::info!(
        input_bytes,
        output_bytes = output.len(),
        elapsed_ms = t_remove.elapsed().as_millis() as u64,
        "背景移除完成"
    );

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("image/png")),
            (
                header::CONTENT_DISPOSITION,
                HeaderValue::from_static(CONTENT_DISPOSITION_VALUE),
            ),
        ],
        output,
    ))
}

#[utoipa::path(
    options,
    path = "/remove-bg",
    summary = "CORS 预检",
    description = "显式的预检路由，返回空 JSON 对象；实际的 CORS 响应头由中间件补齐。",
    responses((status = 200, description = "空 JSON 对象", body = serde_json::Value)),
    tag = "Removal"
)]
pub async fn options_remove_bg() -> Json<serde_json::Value> {
    Json(serde_json::json!({}))
}

/// 背景移除路由
pub fn create_removal_router() -> Router<AppState> {
    Router::new().route("/remove-bg", post(remove_bg).options(options_remove_bg))
}

#[cfg(test)]
mod tests {
    use super::require_api_key;
    use crate::error::AppError;
    use axum::http::{HeaderMap, HeaderValue};

    fn headers_with_key(key: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_str(key).expect("header"));
        headers
    }

    #[test]
    fn accepts_exact_match_only() {
        assert!(require_api_key(&headers_with_key("secret"), "secret").is_ok());
        assert!(matches!(
            require_api_key(&headers_with_key("Secret"), "secret"),
            Err(AppError::InvalidApiKey)
        ));
    }

    #[test]
    fn rejects_missing_header() {
        assert!(matches!(
            require_api_key(&HeaderMap::new(), "secret"),
            Err(AppError::InvalidApiKey)
        ));
    }

    #[test]
    fn empty_configured_key_rejects_everything() {
        assert!(matches!(
            require_api_key(&headers_with_key(""), ""),
            Err(AppError::InvalidApiKey)
        ));
    }
}
