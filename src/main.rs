//! 员工管理系统认证服务主入口

use ems_system::{
    auth::cache::IdentityCache,
    auth::jwt::JwtService,
    config::AppConfig,
    db,
    handlers::health,
    middleware::AppState,
    repository::user_repo::PgUserStore,
    routes,
    services::{AuthService, IdentityService},
    telemetry,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "--version" => {
                println!("ems-system {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("未知参数: {}", args[1]);
                print_help();
                std::process::exit(1);
            }
        }
    }

    // 加载 .env 文件（开发环境）
    // 生产环境应该直接设置环境变量，不依赖 .env 文件
    if let Ok(profile) = std::env::var("EMS_ENV") {
        dotenv::from_filename(format!(".env.{}", profile)).ok();
    } else {
        dotenv::from_filename(".env.local").ok();
        dotenv::from_filename(".env.development").ok();
        dotenv::dotenv().ok();
    }

    health::set_start_time();

    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        anyhow::anyhow!("Failed to load configuration: {}", e)
    })?;

    telemetry::init(&config);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        token_ttl_secs = config.security.token_exp_secs,
        identity_cache_capacity = config.security.identity_cache_capacity,
        identity_cache_ttl_secs = config.security.identity_cache_ttl_secs,
        "EMS auth service starting"
    );

    let db_pool = db::connect(&config.database).await?;
    db::run_migrations(&db_pool).await?;

    // 签名密钥只在此处加载一次，之后对所有请求只读
    let jwt_service = Arc::new(JwtService::from_config(&config)?);
    let user_store = Arc::new(PgUserStore::new(db_pool.clone()));

    let identity_cache = IdentityCache::new(
        config.security.identity_cache_capacity,
        Duration::from_secs(config.security.identity_cache_ttl_secs),
    );

    let app_state = Arc::new(AppState {
        config: config.clone(),
        db: db_pool.clone(),
        auth_service: Arc::new(AuthService::new(user_store.clone(), jwt_service.clone())),
        identity_service: Arc::new(IdentityService::new(user_store, identity_cache)),
        jwt_service,
    });

    let app = routes::create_router(app_state.clone());

    let addr = &config.server.addr;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(addr = %addr, "Server listening");

    // 信号到达后立即开始排水；守护任务限定排水时长
    let drain_timeout_secs = config.server.graceful_shutdown_timeout_secs;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_wait(shutdown_signal()).await;
            spawn_drain_guard(drain_timeout_secs);
        })
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// 等待关闭信号，信号到达立即返回，之后由 axum 开始排水
async fn shutdown_wait(signal: impl Future<Output = ()>) {
    signal.await;
    tracing::info!("Shutdown signal received, draining in-flight requests");
}

/// 排水超时兜底：到期仍未退出则强制终止进程
fn spawn_drain_guard(timeout_secs: u64) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(timeout_secs)).await;
        tracing::warn!("Graceful shutdown timeout reached, forcing exit");
        std::process::exit(1);
    });
}

/// 监听 Ctrl+C 与 SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// 打印帮助信息
fn print_help() {
    println!("ems-system {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("用法: ems-system [选项]");
    println!();
    println!("选项:");
    println!("  --version     打印版本信息并退出");
    println!("  --help        打印此帮助信息并退出");
    println!();
    println!("环境变量:");
    println!("  所有配置通过环境变量完成");
    println!("  可用选项请参考 .env.example");
}

#[cfg(test)]
mod tests {
    use super::*;

    // 信号到达后排水必须立刻开始，中途不允许任何定时等待
    #[tokio::test(start_paused = true)]
    async fn test_shutdown_wait_returns_immediately_on_signal() {
        let start = tokio::time::Instant::now();
        shutdown_wait(async {}).await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
