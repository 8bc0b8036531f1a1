use async_trait::async_trait;
use axum::body::Bytes;
use reqwest::Client;
use thiserror::Error;

use crate::config::RemovalConfig;

/// 上游错误文案截断长度，避免把整页 HTML 错误塞进响应 detail
const UPSTREAM_MESSAGE_MAX: usize = 200;

/// 背景移除错误类型
///
/// Display 文案会拼进对外响应的 `detail` 字段，保持英文且稳定。
#[derive(Error, Debug)]
pub enum RemovalError {
    /// 上游请求超时
    #[error("background removal timed out")]
    Timeout,

    /// 网络/传输错误
    #[error("background removal request failed: {0}")]
    Network(String),

    /// 上游返回非成功状态
    #[error("background removal upstream returned {status}: {message}")]
    Upstream {
        /// 上游 HTTP 状态码
        status: u16,
        /// 上游响应体摘要（已截断）
        message: String,
    },
}

impl From<reqwest::Error> for RemovalError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RemovalError::Timeout
        } else {
            RemovalError::Network(err.to_string())
        }
    }
}

/// 背景移除协作方
///
/// 对服务而言这是一个黑盒：字节进、字节出，不对输出内容做任何校验。
/// 生产实现为 [`HttpRemover`]，测试通过同一 trait 注入 mock。
#[async_trait]
pub trait BackgroundRemover: Send + Sync {
    /// 输入原始图像字节，返回去除背景后的 PNG 字节
    async fn remove(&self, input: Vec<u8>) -> Result<Bytes, RemovalError>;
}

/// 通过 HTTP 调用 rembg 风格推理服务的实现
///
/// 复用单个带连接池的 `reqwest::Client`，超时取自配置（推理耗时随图片尺寸增长）。
pub struct HttpRemover {
    client: Client,
    endpoint: String,
}

impl HttpRemover {
    pub fn new(cfg: &RemovalConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(cfg.timeout_duration()).build()?;
        Ok(Self {
            client,
            endpoint: cfg.endpoint.clone(),
        })
    }
}

#[async_trait]
impl BackgroundRemover for HttpRemover {
    async fn remove(&self, input: Vec<u8>) -> Result<Bytes, RemovalError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(input)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let mut message = resp.text().await.unwrap_or_default();
            message.truncate(UPSTREAM_MESSAGE_MAX);
            return Err(RemovalError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.bytes().await?)
    }
}
