//! gRPC 请求/响应日志拦截器
//!
//! 详细级别达到阈值时，在调用前记录方法名和剩余截止时间，调用后记录耗时和状态。
//! 处理函数总会被调用，其返回值原样透传；日志只是副作用，不影响控制流。

use std::future::Future;
use std::time::{Duration, Instant};

use csi_telemetry::{Verbosity, VerbosityGate};
use tonic::Code;
use tonic::metadata::MetadataMap;
use tracing::info;

use crate::deadline::{DeadlineRemaining, GRPC_TIMEOUT_HEADER, deadline_from_timeout};
use crate::status::{GrpcStatus, status_of};

/// 请求/响应日志的默认详细级别
pub const REQUEST_LOG_LEVEL: u8 = 5;

/// 单次调用的元信息
#[derive(Debug, Clone)]
pub struct CallInfo {
    method: String,
    deadline: Option<Instant>,
}

impl CallInfo {
    /// `method` 为完整方法名，如 `/csi.v1.Identity/Probe`
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// 从 HTTP 请求头读取截止时间
    pub fn from_headers(method: impl Into<String>, headers: &http::HeaderMap) -> Self {
        let timeout = headers
            .get(GRPC_TIMEOUT_HEADER)
            .and_then(|v| v.to_str().ok());

        Self {
            method: method.into(),
            deadline: deadline_from_timeout(timeout, Instant::now()),
        }
    }

    /// 从 tonic 请求元数据读取截止时间
    pub fn from_metadata(method: impl Into<String>, metadata: &MetadataMap) -> Self {
        let timeout = metadata
            .get(GRPC_TIMEOUT_HEADER)
            .and_then(|v| v.to_str().ok());

        Self {
            method: method.into(),
            deadline: deadline_from_timeout(timeout, Instant::now()),
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

/// 日志拦截器
///
/// 门控在调用前后各查询一次，调用期间调整级别只影响第二条日志
#[derive(Debug, Clone)]
pub struct LogInterceptor<G = Verbosity> {
    gate: G,
    level: u8,
}

impl<G: VerbosityGate> LogInterceptor<G> {
    pub fn new(gate: G) -> Self {
        Self {
            gate,
            level: REQUEST_LOG_LEVEL,
        }
    }

    /// 设置输出日志所需的详细级别
    pub fn with_level(mut self, level: u8) -> Self {
        self.level = level;
        self
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// 当前是否输出日志
    pub fn enabled(&self) -> bool {
        self.gate.enabled(self.level)
    }

    /// 包装一次调用
    ///
    /// # 示例
    ///
    /// ```ignore
    /// let call = CallInfo::new("/csi.v1.Node/NodeGetInfo");
    /// let reply = interceptor
    ///     .intercept(&call, request, |req| service.node_get_info(req))
    ///     .await?;
    /// ```
    pub async fn intercept<Req, Resp, E, H, Fut>(
        &self,
        call: &CallInfo,
        request: Req,
        handler: H,
    ) -> Result<Resp, E>
    where
        H: FnOnce(Req) -> Fut,
        Fut: Future<Output = Result<Resp, E>>,
        E: GrpcStatus,
    {
        self.observe(call, move || handler(request), status_of).await
    }

    /// 包装 tonic 风格的一元处理函数，截止时间取自请求元数据
    pub async fn intercept_unary<T, U, E, H, Fut>(
        &self,
        method: &str,
        request: tonic::Request<T>,
        handler: H,
    ) -> Result<tonic::Response<U>, E>
    where
        H: FnOnce(tonic::Request<T>) -> Fut,
        Fut: Future<Output = Result<tonic::Response<U>, E>>,
        E: GrpcStatus,
    {
        let call = CallInfo::from_metadata(method, request.metadata());
        self.intercept(&call, request, handler).await
    }

    /// 记录调用前后的日志，`status` 负责从结果推导状态
    pub(crate) async fn observe<T, E, F, Fut, S>(
        &self,
        call: &CallInfo,
        invoke: F,
        status: S,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        S: FnOnce(&Result<T, E>) -> (Code, String),
    {
        let start = Instant::now();
        if self.enabled() {
            log_request(call, start);
        }

        let result = invoke().await;

        if self.enabled() {
            let (code, message) = status(&result);
            log_response(call, start.elapsed(), code, &message);
        }

        result
    }
}

fn log_request(call: &CallInfo, now: Instant) {
    info!(
        grpc.method = %call.method(),
        grpc.deadline = %DeadlineRemaining::until(call.deadline(), now),
        "request"
    );
}

fn log_response(call: &CallInfo, elapsed: Duration, code: Code, message: &str) {
    info!(
        grpc.method = %call.method(),
        grpc.duration = ?elapsed,
        grpc.code = ?code,
        grpc.message = %message,
        "response"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_info_from_metadata() {
        let mut metadata = MetadataMap::new();
        metadata.insert(GRPC_TIMEOUT_HEADER, "5S".parse().unwrap());

        let before = Instant::now();
        let call = CallInfo::from_metadata("/Service/Method", &metadata);

        assert_eq!(call.method(), "/Service/Method");
        let deadline = call.deadline().expect("deadline should be set");
        assert!(deadline >= before + Duration::from_secs(5));
    }

    #[test]
    fn test_call_info_without_timeout_has_no_deadline() {
        let call = CallInfo::from_headers("/Service/Method", &http::HeaderMap::new());
        assert!(call.deadline().is_none());
    }

    #[test]
    fn test_gate_checked_against_level() {
        let interceptor = LogInterceptor::new(Verbosity::new(4));
        assert_eq!(interceptor.level(), REQUEST_LOG_LEVEL);
        assert!(!interceptor.enabled());

        let interceptor = interceptor.with_level(4);
        assert!(interceptor.enabled());
    }
}
