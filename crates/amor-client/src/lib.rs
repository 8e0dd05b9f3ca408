//! AMOR 控制层
//!
//! 本 crate 在共享会话句柄之上提供两个控制器：
//!
//! - [`JointController`]: 关节空间读写（角度单位为度）
//! - [`CartesianController`]: 笛卡尔空间运动（点到点、直线、速度流）与参考系处理
//!
//! 两个控制器持有同一个 [`SharedHandle`](amor_driver::SharedHandle) 的克隆，
//! 所有硬件访问都经过同一把锁。[`AmorDevice`] 负责按 [`DeviceConfig`] 打开与关闭会话。
//!
//! # 示例
//!
//! ```rust,ignore
//! use amor_client::{AmorDevice, DeviceConfig};
//!
//! let device = AmorDevice::open(transport, &DeviceConfig::default())?;
//! let positions = device.joints().encoders()?;
//! ```

pub mod cartesian;
pub mod config;
pub mod device;
pub mod joint_control;
pub mod types;

pub use cartesian::{
    CartesianController, ConfigParam, ControllerConfig, ControllerState, GripperCommand,
    StatReport,
};
pub use config::DeviceConfig;
pub use device::AmorDevice;
pub use joint_control::JointController;
pub use types::{
    Deg, Joint, JointArray, JointPositions, JointType, JointVelocities, Rad, Result, RobotError,
};
