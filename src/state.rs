use std::sync::Arc;

use crate::config::AppConfig;
use crate::features::removal::remover::BackgroundRemover;

/// 聚合的应用共享状态
///
/// 启动时构建一次，之后只读：配置与上游协作方均不含跨请求可变状态，
/// handler 之间不需要任何互斥。
#[derive(Clone)]
pub struct AppState {
    /// 启动期加载的只读配置
    pub config: Arc<AppConfig>,
    /// 背景移除协作方（生产为 HTTP 上游，测试注入 mock）
    pub remover: Arc<dyn BackgroundRemover>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, remover: Arc<dyn BackgroundRemover>) -> Self {
        Self { config, remover }
    }
}
