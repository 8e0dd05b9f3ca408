//! 驱动层错误类型定义

use crate::transport::AmorFaultKind;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DriverError {
    /// 无法建立会话
    #[error("Could not get AMOR handle ({library}, port {port}): {reason}")]
    Connect {
        /// CAN 驱动库
        library: String,
        /// CAN 端口
        port: u32,
        /// 底层错误描述
        reason: String,
    },

    /// 底层调用失败
    #[error("{call}() failed: {reason}")]
    CallFailed {
        /// 调用名称
        call: &'static str,
        /// 故障分类
        kind: AmorFaultKind,
        /// 底层错误描述（`last_error()`）
        reason: String,
    },

    /// 会话已释放
    #[error("AMOR handle already released")]
    Released,
}

impl DriverError {
    /// 失败的底层调用名称（如有）
    pub fn call(&self) -> Option<&'static str> {
        match self {
            DriverError::CallFailed { call, .. } => Some(call),
            _ => None,
        }
    }

    /// 是否为会话已失效类错误
    pub fn is_session_lost(&self) -> bool {
        matches!(
            self,
            DriverError::Released
                | DriverError::CallFailed {
                    kind: AmorFaultKind::NotConnected,
                    ..
                }
        )
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, DriverError>;
