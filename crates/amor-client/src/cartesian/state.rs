//! 笛卡尔控制器状态机

use std::fmt;

/// 笛卡尔控制器状态
///
/// ```text
///            move_to_pose            move_linear         move_with_velocity
///   Idle ────────────────▶ P2P    Idle ───────▶ Linear   Idle ────────▶ Velocity
///    ▲                      │                    │                        │
///    └──── wait_until_done / stop_control ───────┴──── stop_control ──────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ControllerState {
    /// 未控制
    #[default]
    Idle,
    /// 关节插补点到点运动中
    PointToPointMoving,
    /// 笛卡尔直线运动中
    LinearMoving,
    /// 笛卡尔速度流
    VelocityStreaming,
}

impl ControllerState {
    /// 是否可以等待完成（只有点到点与直线运动有终点）
    pub fn is_waitable(self) -> bool {
        matches!(
            self,
            ControllerState::PointToPointMoving | ControllerState::LinearMoving
        )
    }

    /// 是否处于控制中
    pub fn is_controlling(self) -> bool {
        self != ControllerState::Idle
    }
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ControllerState::Idle => "idle",
            ControllerState::PointToPointMoving => "point-to-point moving",
            ControllerState::LinearMoving => "linear moving",
            ControllerState::VelocityStreaming => "velocity streaming",
        };
        f.write_str(s)
    }
}
