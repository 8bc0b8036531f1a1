use serde::Deserialize;

/// 背景移除请求体
///
/// `image` 既可以是前端直接传来的 data-URL（`data:image/...;base64,<payload>`），
/// 也可以是裸 base64 字符串，两者在解码前统一归一化。
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct ImageRequest {
    /// base64 编码的图像（可带 data-URL 前缀）
    #[schema(example = "data:image/png;base64,iVBORw0KGgo=")]
    pub image: String,
}
