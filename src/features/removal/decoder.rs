use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use thiserror::Error;

/// 载荷解码错误类型
///
/// 注意：Display 文案会拼进对外响应的 `detail` 字段
/// （`Error processing image: <message>`），保持英文且稳定。
#[derive(Error, Debug)]
pub enum DecodeError {
    /// 载荷为空字符串
    #[error("image payload is empty")]
    EmptyPayload,

    /// data-URL 缺少 ',' 分隔符
    #[error("data URL is missing the ',' separator")]
    MissingSeparator,

    /// base64 解码失败
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// 解码图像载荷，兼容 data-URL 与裸 base64 两种形态。
///
/// data-URL 只按第一个 `,` 拆分（base64 正文不含逗号，前缀里的
/// 媒体类型参数则可能含），之后用标准字母表严格解码。
/// 同一输入多次调用产出完全相同的字节序列。
pub fn decode_image_payload(raw: &str) -> Result<Vec<u8>, DecodeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DecodeError::EmptyPayload);
    }

    let payload = if trimmed.starts_with("data:image") {
        let (_, data) = trimmed
            .split_once(',')
            .ok_or(DecodeError::MissingSeparator)?;
        data
    } else {
        trimmed
    };

    if payload.is_empty() {
        return Err(DecodeError::EmptyPayload);
    }

    Ok(BASE64.decode(payload.as_bytes())?)
}
