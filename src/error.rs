use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::features::removal::decoder::DecodeError;
use crate::features::removal::remover::RemovalError;

/// 应用统一错误类型
///
/// 每种失败模式一个变体，状态码与对外文案集中在本模块内收敛，
/// handler 只负责用 `?` 冒泡。
#[derive(Error, Debug)]
pub enum AppError {
    /// API Key 缺失或不匹配
    #[error("invalid api key")]
    InvalidApiKey,

    /// 图像载荷解码错误
    #[error("图像解码失败: {0}")]
    Decode(#[from] DecodeError),

    /// 上游背景移除失败
    #[error("背景移除失败: {0}")]
    Removal(#[from] RemovalError),

    /// 内部服务器错误
    #[error("内部错误: {0}")]
    Internal(String),
}

/// 对外错误响应体。
///
/// 沿用前端既有契约：`{"detail": "<message>"}`，字段名与文案均不可变更。
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorDetail {
    /// 错误详情
    #[schema(example = "Invalid API Key")]
    pub detail: String,
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidApiKey => StatusCode::FORBIDDEN,
            AppError::Decode(_) => StatusCode::BAD_REQUEST,
            AppError::Removal(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 对外 detail 文案。
    ///
    /// - 鉴权失败固定为 `Invalid API Key`，不泄露任何比对细节；
    /// - 解码/处理类错误统一加 `Error processing image:` 前缀并携带底层消息；
    /// - 内部错误不向外透出具体原因。
    pub fn detail(&self) -> String {
        match self {
            AppError::InvalidApiKey => "Invalid API Key".to_string(),
            AppError::Decode(e) => format!("Error processing image: {e}"),
            AppError::Removal(e) => format!("Error processing image: {e}"),
            AppError::Internal(_) => "Internal Server Error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("请求处理失败: {self}");
        }

        let body = ErrorDetail {
            detail: self.detail(),
        };
        (status, Json(body)).into_response()
    }
}
