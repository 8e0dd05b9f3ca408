//! AMOR SDK - 7 关节 AMOR 机械臂控制 SDK
//!
//! 将笛卡尔空间运动命令转换为关节空间命令，并提供关节级的遥测与运动原语。
//!
//! # 架构设计
//!
//! 本 SDK 采用分层架构，从底层到高层：
//!
//! - **运动学层** (`kinematics`): 单位换算、位姿编解码、求解器接口
//! - **驱动层** (`driver`): 硬件传输抽象、共享会话句柄与硬件锁
//! - **客户端层** (`client`): 关节空间/笛卡尔空间控制器、设备生命周期
//!
//! # 快速开始
//!
//! ```rust,ignore
//! use amor_sdk::prelude::*;
//!
//! amor_sdk::init_logger!();
//! let device = AmorDevice::open(transport, &DeviceConfig::default())?;
//! device.joints().relative_move(0, Deg(5.0))?;
//! ```

pub mod prelude;

pub use amor_client as client;
pub use amor_driver as driver;
pub use amor_kinematics as kinematics;

// --- 用户以此为界 ---
// 以下是通过 Facade Pattern 提供的公共 API

pub use amor_client::{
    AmorDevice, CartesianController, ConfigParam, ControllerConfig, ControllerState, DeviceConfig,
    GripperCommand, JointController, RobotError, StatReport,
};
pub use amor_driver::{AmorTransport, DriverError, SharedHandle};
pub use amor_kinematics::{CartesianSolver, DhChainSolver, KinematicsError, Pose, Twist};

#[cfg(feature = "mock")]
pub use amor_driver::SimulatedArm;

use tracing_subscriber::EnvFilter;

/// 未设置 `RUST_LOG` 时的默认过滤规则
pub const DEFAULT_LOG_FILTER: &str = "info";

/// 初始化日志（`RUST_LOG` 优先，否则使用 [`DEFAULT_LOG_FILTER`]）
///
/// 同时把 `log` crate 的记录桥接到 `tracing`。重复调用返回 `false`。
pub fn init_logging() -> bool {
    init_logging_with(DEFAULT_LOG_FILTER)
}

/// 以指定的默认过滤规则初始化日志
pub fn init_logging_with(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        return false;
    }

    // 其他依赖通过 `log` 输出的记录
    let _ = tracing_log::LogTracer::init_with_filter(log::LevelFilter::Trace);
    true
}

/// 初始化日志的便捷宏
///
/// ```rust,ignore
/// amor_sdk::init_logger!();
/// amor_sdk::init_logger!("amor_client=debug");
/// ```
#[macro_export]
macro_rules! init_logger {
    () => {
        $crate::init_logging()
    };
    ($filter:expr) => {
        $crate::init_logging_with($filter)
    };
}
