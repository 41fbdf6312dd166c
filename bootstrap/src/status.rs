//! 从处理结果推导 gRPC 状态

use std::convert::Infallible;
use std::error::Error;

use csi_errors::AppError;
use tonic::{Code, Status};

/// 可以推导出 gRPC 状态（状态码 + 消息）的错误
pub trait GrpcStatus {
    fn grpc_status(&self) -> (Code, String);
}

impl GrpcStatus for Status {
    fn grpc_status(&self) -> (Code, String) {
        (self.code(), self.message().to_string())
    }
}

impl GrpcStatus for AppError {
    fn grpc_status(&self) -> (Code, String) {
        (self.grpc_code(), self.to_string())
    }
}

/// 沿错误链查找 `Status`，找不到时视为 `Unknown`
impl GrpcStatus for Box<dyn Error + Send + Sync> {
    fn grpc_status(&self) -> (Code, String) {
        let mut source: Option<&(dyn Error + 'static)> = Some(&**self);
        while let Some(err) = source {
            if let Some(status) = err.downcast_ref::<Status>() {
                return status.grpc_status();
            }
            source = err.source();
        }
        (Code::Unknown, self.to_string())
    }
}

impl GrpcStatus for Infallible {
    fn grpc_status(&self) -> (Code, String) {
        match *self {}
    }
}

/// 成功结果对应 `Ok` 且消息为空
pub fn status_of<T, E: GrpcStatus>(result: &Result<T, E>) -> (Code, String) {
    match result {
        Ok(_) => (Code::Ok, String::new()),
        Err(err) => err.grpc_status(),
    }
}
