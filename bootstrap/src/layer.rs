//! Tower 中间件形式的日志拦截器
//!
//! 通过 `Server::builder().layer(..)` 注册到 tonic 服务上：
//!
//! ```ignore
//! Server::builder()
//!     .layer(log_layer(&config, verbosity.clone()))
//!     .add_service(IdentityServer::new(identity))
//!     .serve(addr)
//!     .await?;
//! ```

use std::task::{Context, Poll};

use csi_telemetry::{Verbosity, VerbosityGate};
use futures::future::BoxFuture;
use tonic::{Code, Status};
use tower::{Layer, Service};

use crate::interceptor::{CallInfo, LogInterceptor};
use crate::status::GrpcStatus;

/// 日志中间件 Layer
#[derive(Debug, Clone)]
pub struct LogLayer<G = Verbosity> {
    interceptor: LogInterceptor<G>,
}

impl<G> LogLayer<G> {
    pub fn new(interceptor: LogInterceptor<G>) -> Self {
        Self { interceptor }
    }
}

impl<S, G: Clone> Layer<S> for LogLayer<G> {
    type Service = LogService<S, G>;

    fn layer(&self, inner: S) -> Self::Service {
        LogService {
            inner,
            interceptor: self.interceptor.clone(),
        }
    }
}

/// 日志中间件 Service
///
/// 方法名取自请求路径，截止时间取自 `grpc-timeout` 头
#[derive(Debug, Clone)]
pub struct LogService<S, G = Verbosity> {
    inner: S,
    interceptor: LogInterceptor<G>,
}

impl<S, G, ReqBody, ResBody> Service<http::Request<ReqBody>> for LogService<S, G>
where
    S: Service<http::Request<ReqBody>, Response = http::Response<ResBody>>
        + Clone
        + Send
        + 'static,
    S::Future: Send + 'static,
    S::Error: GrpcStatus + Send + 'static,
    G: VerbosityGate + Clone + 'static,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: http::Request<ReqBody>) -> Self::Future {
        let call = CallInfo::from_headers(request.uri().path(), request.headers());
        let interceptor = self.interceptor.clone();

        // 使用已 ready 的实例处理本次请求
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            interceptor
                .observe(&call, move || inner.call(request), response_status)
                .await
        })
    }
}

/// tonic 把处理函数返回的错误放在 trailers-only 响应的头部，
/// 没有 `grpc-status` 头即为成功
fn response_status<B, E: GrpcStatus>(result: &Result<http::Response<B>, E>) -> (Code, String) {
    match result {
        Ok(response) => match Status::from_header_map(response.headers()) {
            Some(status) => (status.code(), status.message().to_string()),
            None => (Code::Ok, String::new()),
        },
        Err(err) => err.grpc_status(),
    }
}
