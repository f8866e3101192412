//! 日志初始化
//! 结构化日志经 tracing 输出；指标随首次使用自动注册，无需显式初始化

use crate::config::AppConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// 初始化结构化日志
/// 格式由配置决定：json 供生产采集，pretty 供本地开发
/// （配置校验已保证 format 只会是这两者之一）
pub fn init(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let fmt_layer = if config.logging.format.eq_ignore_ascii_case("pretty") {
        tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(false)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(false)
            .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();

    tracing::info!(
        service = "ems-system",
        version = env!("CARGO_PKG_VERSION"),
        log_level = %config.logging.level,
        log_format = %config.logging.format,
        "Telemetry initialized"
    );
}
