//! 运动学层错误类型定义

use thiserror::Error;

/// 运动学层错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KinematicsError {
    /// 输入向量长度不符
    #[error("Invalid vector size: expected {expected}, got {actual}")]
    InvalidSize {
        /// 期望长度
        expected: usize,
        /// 实际长度
        actual: usize,
    },

    /// 参数无效
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// 该表示不支持此转换
    #[error("Unsupported conversion: {0}")]
    Unsupported(String),

    /// 目标位姿不可达
    #[error("Target unreachable: {0}")]
    Unreachable(String),

    /// 奇异位形
    #[error("Singular configuration: {0}")]
    Singular(String),
}

impl KinematicsError {
    /// 检查向量长度
    pub(crate) fn check_size(expected: usize, actual: usize) -> Result<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self::InvalidSize { expected, actual })
        }
    }

    /// 是否为求解失败（不可达或奇异）
    pub fn is_solver_failure(&self) -> bool {
        matches!(self, Self::Unreachable(_) | Self::Singular(_))
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, KinematicsError>;
