//! 错误类型体系
//!
//! 所有控制器操作都返回 [`Result`]，不会跨越 API 边界 panic。
//! 硬件调用失败在句柄处以底层描述记录日志，这里只负责分类与传递。
//!
//! # 示例
//!
//! ```rust
//! use amor_client::types::RobotError;
//!
//! fn handle_error(err: RobotError) {
//!     if err.is_hardware() {
//!         eprintln!("硬件错误，建议先 stop 再重新 stat: {}", err);
//!     } else {
//!         eprintln!("请求被拒绝: {}", err);
//!     }
//! }
//! ```

use super::joint::Joint;
use amor_driver::DriverError;
use amor_kinematics::KinematicsError;
use thiserror::Error;

/// 机器人错误类型
#[derive(Debug, Error)]
pub enum RobotError {
    /// 底层调用失败
    #[error("Hardware error: {0}")]
    Hardware(#[from] DriverError),

    /// 关节索引越界
    #[error("Joint index {index} out of range [0, {count})")]
    IndexOutOfRange {
        /// 传入的索引
        index: usize,
        /// 关节数
        count: usize,
    },

    /// 参数无效（批量大小、命令码、配置值等）
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// 当前状态不允许该操作
    #[error("Operation '{operation}' not allowed while {state}")]
    InvalidState {
        /// 操作名
        operation: &'static str,
        /// 当前状态
        state: String,
    },

    /// 硬件不支持
    #[error("Not supported: {0}")]
    Unsupported(String),

    /// 目标不可达
    #[error("Target unreachable: {0}")]
    Unreachable(String),

    /// 奇异位形
    #[error("Singular configuration: {0}")]
    Singular(String),

    /// 关节速度超限
    #[error("Velocity limit exceeded for joint {joint}: {value:.3} (limit: {limit:.3})")]
    VelocityLimitExceeded {
        /// 关节
        joint: Joint,
        /// 期望速度（deg/s）
        value: f64,
        /// 限速（deg/s）
        limit: f64,
    },

    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<KinematicsError> for RobotError {
    fn from(err: KinematicsError) -> Self {
        match err {
            KinematicsError::Unreachable(msg) => RobotError::Unreachable(msg),
            KinematicsError::Singular(msg) => RobotError::Singular(msg),
            KinematicsError::Unsupported(msg) => RobotError::Unsupported(msg),
            other @ (KinematicsError::InvalidSize { .. } | KinematicsError::InvalidArgument(_)) => {
                RobotError::InvalidArgument(other.to_string())
            },
        }
    }
}

impl RobotError {
    /// 是否为硬件错误
    pub fn is_hardware(&self) -> bool {
        matches!(self, Self::Hardware(_))
    }

    /// 是否为求解失败
    pub fn is_solver_failure(&self) -> bool {
        matches!(self, Self::Unreachable(_) | Self::Singular(_))
    }

    /// 是否为参数或状态校验失败（未触达硬件）
    pub fn is_rejected_locally(&self) -> bool {
        matches!(
            self,
            Self::IndexOutOfRange { .. }
                | Self::InvalidArgument(_)
                | Self::InvalidState { .. }
                | Self::Unsupported(_)
        )
    }

    /// 创建索引越界错误
    pub fn index_out_of_range(index: usize) -> Self {
        Self::IndexOutOfRange {
            index,
            count: Joint::ALL.len(),
        }
    }

    /// 创建参数无效错误
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// 创建状态错误
    pub fn invalid_state(operation: &'static str, state: impl ToString) -> Self {
        Self::InvalidState {
            operation,
            state: state.to_string(),
        }
    }

    /// 创建不支持错误
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// 创建速度超限错误
    pub fn velocity_limit(joint: Joint, value: f64, limit: f64) -> Self {
        Self::VelocityLimitExceeded {
            joint,
            value,
            limit,
        }
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, RobotError>;
