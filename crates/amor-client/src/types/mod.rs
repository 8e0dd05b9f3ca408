//! 公共类型
//!
//! - [`Joint`] / [`JointArray`]: 7 关节索引与定长容器
//! - [`RobotError`]: 控制层错误
//! - 单位类型从 `amor-kinematics` 重新导出

mod error;
mod joint;

pub use amor_kinematics::units::{Deg, Rad};
pub use error::{Result, RobotError};
pub use joint::{Joint, JointArray, JointPositions, JointType, JointVelocities};
