//! 运动学基础层
//!
//! 本模块为 AMOR 机械臂提供与硬件无关的运动学基础设施：
//! - 强类型角度单位（`Rad`、`Deg`）与毫米/米换算
//! - 位姿编解码（笛卡尔/柱/球坐标 × 轴角/RPY/ZYZ/旋转矩阵/四元数）
//! - 运动学求解器接口（`CartesianSolver`）及 DH 链参考实现
//!
//! # 使用场景
//!
//! 控制层（`amor-client`）通过 [`CartesianSolver`] 调用正/逆运动学，
//! 通过 [`representation`] 在硬件原始单位与 SI 位姿之间转换。

pub mod chain;
mod error;
pub mod representation;
pub mod solver;
pub mod units;

pub use chain::{DhChainSolver, DhLink};
pub use error::{KinematicsError, Result};
pub use representation::{
    CoordinateSystem, EncodedPose, EncodedTwist, OrientationSystem, Pose, Twist, decode_pose,
    decode_velocity, encode_pose, encode_velocity,
};
pub use solver::{CartesianSolver, ReferenceFrame};
pub use units::{Deg, Rad, deg_to_rad, m_to_mm, mm_to_m, rad_to_deg};
