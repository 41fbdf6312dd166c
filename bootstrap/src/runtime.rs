//! 服务运行时

use csi_config::AppConfig;
use csi_telemetry::{Verbosity, init_tracing, init_tracing_json};
use tracing::info;

use crate::interceptor::LogInterceptor;
use crate::layer::LogLayer;

/// 初始化服务运行时
///
/// 返回的详细级别句柄需要交给拦截器，运行期可通过它调整级别
pub fn init_runtime(config: &AppConfig) -> Verbosity {
    // 初始化 tracing
    if config.is_production() {
        init_tracing_json(&config.telemetry.log_level);
    } else {
        init_tracing(&config.telemetry.log_level);
    }

    let verbosity = Verbosity::new(config.telemetry.verbosity);

    info!(
        app_name = %config.app_name,
        app_env = %config.app_env,
        verbosity = config.telemetry.verbosity,
        "Runtime initialized"
    );

    verbosity
}

/// 按配置创建日志拦截器
pub fn log_interceptor(config: &AppConfig, verbosity: Verbosity) -> LogInterceptor {
    LogInterceptor::new(verbosity).with_level(config.interceptor.level)
}

/// 按配置创建日志中间件
pub fn log_layer(config: &AppConfig, verbosity: Verbosity) -> LogLayer {
    LogLayer::new(log_interceptor(config, verbosity))
}
