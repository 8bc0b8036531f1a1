use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// 未配置 API Key 时的回退值（与早期部署保持一致，仅供本地开发）。
pub const FALLBACK_API_KEY: &str = "mysecretkey123";

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "ServerConfig::default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "ServerConfig::default_port")]
    pub port: u16,
    /// 请求体大小上限（字节），base64 编码大约膨胀 4/3，需为原图预留余量
    #[serde(default = "ServerConfig::default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl ServerConfig {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }
    fn default_port() -> u16 {
        8000
    }
    fn default_max_body_bytes() -> usize {
        20 * 1024 * 1024
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            max_body_bytes: Self::default_max_body_bytes(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
    /// 日志格式
    #[serde(default = "LoggingConfig::default_format")]
    pub format: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
    fn default_format() -> String {
        "full".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            format: Self::default_format(),
        }
    }
}

/// 鉴权配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// 调用方 API Key（Header: x-api-key），需与配置值完全一致
    #[serde(default = "AuthConfig::default_api_key", alias = "api-key", alias = "apiKey")]
    pub api_key: String,
}

impl AuthConfig {
    fn default_api_key() -> String {
        if let Ok(raw) = std::env::var("API_KEY") {
            let key = raw.trim().to_string();
            if !key.is_empty() {
                return key;
            }
        }
        FALLBACK_API_KEY.to_string()
    }

    /// 是否仍在使用内置回退 Key（启动时据此打印告警）
    pub fn is_fallback_key(&self) -> bool {
        self.api_key == FALLBACK_API_KEY
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_key: Self::default_api_key(),
        }
    }
}

/// 背景移除上游配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemovalConfig {
    /// 推理服务端点（接收原始图像字节，返回去背景后的 PNG 字节）
    #[serde(default = "RemovalConfig::default_endpoint")]
    pub endpoint: String,
    /// 上游请求超时（秒），推理耗时随图片尺寸增长
    #[serde(default = "RemovalConfig::default_timeout")]
    pub timeout_secs: u64,
}

impl RemovalConfig {
    fn default_endpoint() -> String {
        "http://127.0.0.1:7000/api/remove".to_string()
    }
    fn default_timeout() -> u64 {
        90
    }

    /// 获取上游请求超时时间
    pub fn timeout_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RemovalConfig {
    fn default() -> Self {
        Self {
            endpoint: Self::default_endpoint(),
            timeout_secs: Self::default_timeout(),
        }
    }
}

/// CORS 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// 是否启用 CORS
    #[serde(default = "CorsConfig::default_enabled")]
    pub enabled: bool,
    /// 允许的 Origin 列表（支持 "*" 表示任意）
    #[serde(default = "CorsConfig::default_allowed_origins")]
    pub allowed_origins: Vec<String>,
    /// 允许的方法列表（支持 "*" 表示任意）
    #[serde(default = "CorsConfig::default_allowed_methods")]
    pub allowed_methods: Vec<String>,
    /// 允许的请求头列表（支持 "*" 表示任意）
    #[serde(default = "CorsConfig::default_allowed_headers")]
    pub allowed_headers: Vec<String>,
    /// 暴露的响应头列表（支持 "*" 表示任意）
    #[serde(default)]
    pub expose_headers: Vec<String>,
    /// 是否允许携带凭证（Cookie/Authorization）
    #[serde(default = "CorsConfig::default_allow_credentials")]
    pub allow_credentials: bool,
    /// 预检缓存时间（秒）
    #[serde(default)]
    pub max_age_secs: Option<u64>,
}

impl CorsConfig {
    fn default_enabled() -> bool {
        true
    }

    fn default_allowed_origins() -> Vec<String> {
        if let Ok(raw) = std::env::var("ALLOWED_ORIGINS") {
            let origins = split_csv(&raw);
            if !origins.is_empty() {
                return origins;
            }
        }
        vec!["http://localhost:3000".to_string()]
    }

    fn default_allowed_methods() -> Vec<String> {
        vec!["GET".to_string(), "POST".to_string(), "OPTIONS".to_string()]
    }

    // 注意：allow_credentials=true 与 "*" 互斥（tower-http 会拒绝），
    // 因此默认值枚举出实际用到的请求头而非通配。
    fn default_allowed_headers() -> Vec<String> {
        vec!["content-type".to_string(), "x-api-key".to_string()]
    }

    fn default_allow_credentials() -> bool {
        true
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            allowed_origins: Self::default_allowed_origins(),
            allowed_methods: Self::default_allowed_methods(),
            allowed_headers: Self::default_allowed_headers(),
            expose_headers: Vec::new(),
            allow_credentials: Self::default_allow_credentials(),
            max_age_secs: None,
        }
    }
}

/// 优雅退出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownConfig {
    /// 优雅退出超时时间（秒）
    #[serde(default = "ShutdownConfig::default_timeout")]
    pub timeout_secs: u64,
}

impl ShutdownConfig {
    fn default_timeout() -> u64 {
        30
    }

    /// 获取优雅退出超时时间
    pub fn timeout_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            timeout_secs: Self::default_timeout(),
        }
    }
}

/// 应用配置
///
/// 启动时加载一次，整体以 `Arc<AppConfig>` 挂入 `AppState` 传递给各 handler，
/// 之后只读不改，不使用进程级全局单例。
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// 鉴权配置
    #[serde(default)]
    pub auth: AuthConfig,
    /// 背景移除上游配置
    #[serde(default)]
    pub removal: RemovalConfig,
    /// CORS 配置
    #[serde(default)]
    pub cors: CorsConfig,
    /// 优雅退出配置
    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

impl AppConfig {
    /// 从配置文件加载配置，支持环境变量覆盖
    ///
    /// `config.toml` 可缺省（全部走默认值 + 环境变量），便于容器化部署。
    pub fn load() -> Result<Self, ConfigError> {
        let builder = ConfigBuilder::builder()
            // 加载配置文件（允许缺省）
            .add_source(File::with_name("config").required(false))
            // 支持环境变量覆盖，例如：APP_SERVER_PORT
            .add_source(
                Environment::with_prefix("APP")
                    .separator("_")
                    .try_parsing(true),
            )
            .build()?;

        builder.try_deserialize()
    }

    /// 获取服务器监听地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// 按逗号拆分并清洗列表型环境变量
fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
