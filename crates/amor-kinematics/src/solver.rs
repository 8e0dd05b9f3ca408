//! 运动学求解器接口
//!
//! 控制层只依赖 [`CartesianSolver`] trait，具体实现可以是本 crate 的
//! [`DhChainSolver`](crate::chain::DhChainSolver)，也可以是外部求解器。
//!
//! 关节量在此接口上统一使用角度（`Deg`，速度为 deg/s），
//! 位姿使用内部表示（米 + 旋转向量）。

use crate::error::Result;
use crate::representation::{Pose, Twist};
use crate::units::Deg;
use std::fmt;

/// 笛卡尔量的参考坐标系
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ReferenceFrame {
    /// 机器人基座系
    #[default]
    Base,
    /// 工具中心点（TCP）系，随末端运动
    Tcp,
}

impl fmt::Display for ReferenceFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceFrame::Base => write!(f, "base"),
            ReferenceFrame::Tcp => write!(f, "tcp"),
        }
    }
}

/// 运动学求解器
///
/// 所有方法都可能返回 `KinematicsError::Unreachable` 或 `KinematicsError::Singular`。
pub trait CartesianSolver: Send + Sync {
    /// 关节数
    fn joint_count(&self) -> usize;

    /// 正运动学：关节角（度）→ 末端位姿（基座系）
    fn forward_kinematics(&self, q: &[Deg]) -> Result<Pose>;

    /// 逆运动学
    ///
    /// - `target`: 目标位姿；`frame == Tcp` 时相对于 `seed` 对应的当前 TCP 表示
    /// - `seed`: 迭代初值（通常为当前关节角）
    fn inverse_kinematics(&self, target: &Pose, seed: &[Deg], frame: ReferenceFrame)
    -> Result<Vec<Deg>>;

    /// 微分逆运动学：期望速度旋量 → 关节速度（deg/s）
    fn differential_inverse_kinematics(
        &self,
        q: &[Deg],
        twist: &Twist,
        frame: ReferenceFrame,
    ) -> Result<Vec<Deg>>;

    /// 变换原点：将相对 `new_origin` 表示的 `pose` 转换到 `new_origin` 所在的坐标系
    fn change_origin(&self, pose: &Pose, new_origin: &Pose) -> Result<Pose> {
        Ok(Pose::from_isometry(
            &(new_origin.to_isometry() * pose.to_isometry()),
        ))
    }
}
