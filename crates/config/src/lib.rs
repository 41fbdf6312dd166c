//! csi-config - 配置加载库

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] figment::Error),
}

/// 遥测配置
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    /// tracing EnvFilter 指令，RUST_LOG 优先
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// 诊断详细级别（类似 klog 的 -v）
    #[serde(default)]
    pub verbosity: u8,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            verbosity: 0,
        }
    }
}

/// gRPC 日志拦截器配置
#[derive(Debug, Clone, Deserialize)]
pub struct InterceptorConfig {
    /// 输出请求/响应日志所需的最低详细级别
    #[serde(default = "default_interceptor_level")]
    pub level: u8,
}

fn default_interceptor_level() -> u8 {
    5
}

impl Default for InterceptorConfig {
    fn default() -> Self {
        Self {
            level: default_interceptor_level(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_name: String,
    #[serde(default = "default_app_env")]
    pub app_env: String,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub interceptor: InterceptorConfig,
}

fn default_app_env() -> String {
    "development".to_string()
}

/// 环境变量前缀，嵌套字段用 `__` 分隔（如 `CSI_TELEMETRY__VERBOSITY`）
pub const ENV_PREFIX: &str = "CSI_";

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 优先级从低到高：`{config_dir}/default.toml`、`{config_dir}/{APP_ENV}.toml`、`CSI_*` 环境变量
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let env = std::env::var("APP_ENV").unwrap_or_else(|_| default_app_env());

        let config: Self = Figment::new()
            .merge(Toml::file(format!("{}/default.toml", config_dir)))
            .merge(Toml::file(format!("{}/{}.toml", config_dir, env)))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        Ok(config)
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    /// 是否为开发环境
    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }
}

#[cfg(test)]
mod tests;
