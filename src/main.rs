use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::{Router, routing::get};
use rembg_backend::config::AppConfig;
use rembg_backend::cors::build_cors_layer;
use rembg_backend::features::health::handler::health_check;
use rembg_backend::features::removal::create_removal_router;
use rembg_backend::features::removal::remover::HttpRemover;
use rembg_backend::request_id::request_id_middleware;
use rembg_backend::state::AppState;
use rembg_backend::ShutdownManager;
use tower_http::compression::CompressionLayer;
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa_swagger_ui::SwaggerUi;

fn compression_predicate() -> impl tower_http::compression::predicate::Predicate {
    use tower_http::compression::predicate::{NotForContentType, Predicate, SizeAbove};

    // PNG 结果本身已压缩，再压只浪费 CPU；二进制下载类型同理。
    // JSON 错误响应与 OpenAPI 文档照常压缩。
    SizeAbove::default()
        .and(NotForContentType::IMAGES)
        .and(NotForContentType::const_new("application/octet-stream"))
}


#[derive(OpenApi)]
#[openapi(
    paths(
        rembg_backend::features::removal::handler::remove_bg,
        rembg_backend::features::removal::handler::options_remove_bg,
        rembg_backend::features::health::handler::health_check,
    ),
    components(
        schemas(
            rembg_backend::features::removal::ImageRequest,
            rembg_backend::features::health::HealthResponse,
            rembg_backend::error::ErrorDetail,
        )
    ),
    modifiers(&ApiKeySecurity),
    tags(
        (name = "Removal", description = "Background removal APIs"),
        (name = "Health", description = "Health APIs"),
    ),
    info(
        title = "Background Remover API",
        version = "1.0.0",
        description = "AI background removal relay service (Axum)"
    )
)]
pub struct ApiDoc;

struct ApiKeySecurity;

impl Modify for ApiKeySecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "ApiKey",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("x-api-key"))),
        );
    }
}

#[tokio::main]
async fn main() {
    // Load config（此时 tracing 尚未就绪，失败直接落到 stderr）
    let config = match AppConfig::load() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("Config load failed: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                let level = &config.logging.level;
                format!("rembg_backend={level},tower_http={level}").into()
            }),
        )
        .init();

    if config.auth.is_fallback_key() {
        tracing::warn!("API Key 使用内置回退值，请通过 API_KEY 环境变量或 config.toml 配置");
    }

    // 创建优雅退出管理器并启动信号处理器
    let shutdown_manager = ShutdownManager::new();
    if let Err(e) = shutdown_manager.start_signal_handler().await {
        tracing::error!("信号处理器启动失败: {}", e);
        std::process::exit(1);
    }

    // 背景移除协作方（共享连接池的 HTTP 客户端）
    let remover = match HttpRemover::new(&config.removal) {
        Ok(r) => Arc::new(r),
        Err(e) => {
            tracing::error!("上游 HTTP 客户端初始化失败: {}", e);
            std::process::exit(1);
        }
    };

    let app_state = AppState::new(config.clone(), remover);

    // Routes
    let mut app = Router::<AppState>::new()
        .route("/health", get(health_check))
        .merge(create_removal_router())
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state);

    // base64 载荷比原图大约 4/3，体积上限按配置放宽
    app = app.layer(DefaultBodyLimit::max(config.server.max_body_bytes));

    // 全局 request_id 中间件
    app = app.layer(axum::middleware::from_fn(request_id_middleware));

    // CORS（配置非法时跳过，服务照常启动）
    if let Some(cors) = build_cors_layer(&config.cors) {
        app = app.layer(cors);
    }

    // 应用内响应压缩：JSON/文档压缩，PNG 输出排除
    app = app.layer(CompressionLayer::new().compress_when(compression_predicate()));

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Bind address failed {}: {}", addr, e);
            std::process::exit(1);
        });

    tracing::info!("Server: http://{}", addr);
    tracing::info!("Docs: http://{}/docs", addr);
    tracing::info!("Health: http://{}/health", addr);
    tracing::info!("Remove API: http://{}/remove-bg", addr);
    tracing::info!("Removal upstream: {}", config.removal.endpoint);

    // 运行服务器直到收到退出信号；优雅关闭超时后强制退出
    let serve = axum::serve(listener, app).with_graceful_shutdown({
        let manager = shutdown_manager.clone();
        async move {
            let reason = manager.wait_for_shutdown().await;
            tracing::info!("接收到退出信号: {:?}，开始优雅关闭HTTP服务器...", reason);
        }
    });

    let shutdown_timeout = config.shutdown.timeout_duration();
    let forced_exit = {
        let manager = shutdown_manager.clone();
        async move {
            manager.wait_for_shutdown().await;
            tokio::time::sleep(shutdown_timeout).await;
        }
    };

    tokio::select! {
        result = serve => {
            if let Err(e) = result {
                tracing::error!("服务器运行错误: {}", e);
                std::process::exit(1);
            }
            tracing::info!("服务器已优雅关闭");
        }
        _ = forced_exit => {
            tracing::warn!("优雅退出超时（{}秒），强制退出", config.shutdown.timeout_secs);
        }
    }
}
