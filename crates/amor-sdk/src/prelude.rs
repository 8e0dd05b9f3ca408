//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use amor_sdk::prelude::*;
//! ```

// 客户端层（推荐使用）
pub use amor_client::{
    AmorDevice, CartesianController, ConfigParam, ControllerConfig, ControllerState, DeviceConfig,
    GripperCommand, JointController, StatReport,
};
pub use amor_client::types::{
    Deg, Joint, JointArray, JointPositions, JointType, JointVelocities, Rad, RobotError,
};

// 运动学
pub use amor_kinematics::{
    CartesianSolver, CoordinateSystem, DhChainSolver, DhLink, OrientationSystem, Pose,
    ReferenceFrame, Twist, decode_pose, decode_velocity, encode_pose, encode_velocity,
};

// 驱动层（高级用户使用）
pub use amor_driver::{AmorTransport, SharedHandle};

// 错误类型
pub use amor_driver::DriverError;
pub use amor_kinematics::KinematicsError;
