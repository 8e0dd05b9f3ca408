//! 驱动层模块
//!
//! 本模块提供 AMOR 机械臂的底层会话管理，包括：
//! - 硬件传输层抽象（[`AmorTransport`]）
//! - 共享会话句柄与唯一的硬件锁（[`SharedHandle`]）
//! - 模拟机械臂（`mock` feature）
//!
//! # 使用场景
//!
//! 大多数用户应该使用 `amor-client` 提供的关节空间与笛卡尔空间控制器。

mod error;
mod handle;
pub mod transport;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::{DriverError, Result};
pub use handle::{HandleGuard, SharedHandle};
pub use transport::{
    AmorFault, AmorFaultKind, AmorTransport, CartesianVector, JointInfo, JointVector,
    MovementStatus, NUM_JOINTS, TransportResult,
};

#[cfg(any(test, feature = "mock"))]
pub use mock::SimulatedArm;
