//! gRPC 截止时间
//!
//! 客户端通过 `grpc-timeout` 头传递剩余超时，格式为 `TimeoutValue TimeoutUnit`：
//! 1 到 8 位十进制数字，后跟单位 `H`（时）、`M`（分）、`S`（秒）、`m`（毫秒）、
//! `u`（微秒）或 `n`（纳秒）。这里只负责解析和展示，不做超时控制。

use std::fmt;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::debug;

/// 超时请求头
pub const GRPC_TIMEOUT_HEADER: &str = "grpc-timeout";

const MAX_TIMEOUT_DIGITS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeoutError {
    #[error("grpc-timeout is empty")]
    Empty,

    #[error("grpc-timeout value exceeds 8 digits: {0}")]
    TooLong(String),

    #[error("grpc-timeout value is not a number: {0}")]
    InvalidValue(String),

    #[error("grpc-timeout unit is unknown: {0}")]
    InvalidUnit(String),
}

/// 解析 `grpc-timeout` 的值
pub fn parse_grpc_timeout(raw: &str) -> Result<Duration, TimeoutError> {
    let unit_start = raw
        .char_indices()
        .last()
        .map(|(idx, _)| idx)
        .ok_or(TimeoutError::Empty)?;
    let (value, unit) = raw.split_at(unit_start);

    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TimeoutError::InvalidValue(raw.to_string()));
    }
    if value.len() > MAX_TIMEOUT_DIGITS {
        return Err(TimeoutError::TooLong(raw.to_string()));
    }

    let value: u64 = value
        .parse()
        .map_err(|_| TimeoutError::InvalidValue(raw.to_string()))?;

    match unit {
        "H" => Ok(Duration::from_secs(value * 60 * 60)),
        "M" => Ok(Duration::from_secs(value * 60)),
        "S" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_millis(value)),
        "u" => Ok(Duration::from_micros(value)),
        "n" => Ok(Duration::from_nanos(value)),
        _ => Err(TimeoutError::InvalidUnit(raw.to_string())),
    }
}

/// 由 `grpc-timeout` 计算截止时间
///
/// 缺失或格式错误都视为没有截止时间
pub fn deadline_from_timeout(raw: Option<&str>, now: Instant) -> Option<Instant> {
    let raw = raw?;
    match parse_grpc_timeout(raw) {
        Ok(timeout) => now.checked_add(timeout),
        Err(e) => {
            debug!(error = %e, "Ignoring malformed grpc-timeout");
            None
        }
    }
}

/// 距离截止时间的剩余时间
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineRemaining {
    /// 调用没有截止时间
    None,
    Remaining(Duration),
    /// 截止时间已过去多久
    Exceeded(Duration),
}

impl DeadlineRemaining {
    pub fn until(deadline: Option<Instant>, now: Instant) -> Self {
        match deadline {
            None => Self::None,
            Some(deadline) => match deadline.checked_duration_since(now) {
                Some(remaining) => Self::Remaining(remaining),
                None => Self::Exceeded(now.duration_since(deadline)),
            },
        }
    }
}

impl fmt::Display for DeadlineRemaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::Remaining(remaining) => write!(f, "{:?}", remaining),
            Self::Exceeded(overdue) => write!(f, "-{:?}", overdue),
        }
    }
}
