//! csi-bootstrap - gRPC 服务公共骨架
//!
//! 驱动插件所有 gRPC 服务复用的拦截器与运行时初始化

mod deadline;
mod interceptor;
mod layer;
mod runtime;
mod status;

pub use deadline::*;
pub use interceptor::*;
pub use layer::*;
pub use runtime::*;
pub use status::*;
