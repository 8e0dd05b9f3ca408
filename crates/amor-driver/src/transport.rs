//! 硬件传输层抽象
//!
//! [`AmorTransport`] 描述 AMOR 底层 API（CAN 驱动 + 厂商固件）的最小调用面。
//! 所有量均为硬件单位：关节为弧度，笛卡尔位置为毫米，笛卡尔姿态为 RPY 弧度三元组。
//!
//! 实现者无需考虑并发：调用总是经过 [`SharedHandle`](crate::SharedHandle)
//! 的互斥锁串行化。

use semver::Version;
use std::fmt;

/// 关节数
pub const NUM_JOINTS: usize = 7;

/// 7 维关节向量（弧度或 rad/s）
pub type JointVector = [f64; NUM_JOINTS];

/// 6 维笛卡尔向量（mm + rad，或 mm/s + rad/s）
pub type CartesianVector = [f64; 6];

/// 传输层调用结果
pub type TransportResult<T> = std::result::Result<T, AmorFault>;

/// 底层故障分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AmorFaultKind {
    /// 未连接或会话已失效
    NotConnected,
    /// 总线通信失败
    Communication,
    /// 固件拒绝该命令
    Rejected,
    /// 其他
    Unknown,
}

impl fmt::Display for AmorFaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AmorFaultKind::NotConnected => "not connected",
            AmorFaultKind::Communication => "communication",
            AmorFaultKind::Rejected => "rejected",
            AmorFaultKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// 底层调用失败标记
///
/// 具体的错误描述通过 [`AmorTransport::last_error`] 获取。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmorFault {
    /// 故障分类
    pub kind: AmorFaultKind,
}

impl AmorFault {
    /// 创建故障
    pub const fn new(kind: AmorFaultKind) -> Self {
        AmorFault { kind }
    }
}

impl fmt::Display for AmorFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AMOR fault ({})", self.kind)
    }
}

impl std::error::Error for AmorFault {}

/// 关节静态参数（弧度）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointInfo {
    /// 关节下限
    pub lower_limit: f64,
    /// 关节上限
    pub upper_limit: f64,
    /// 最大速度（rad/s）
    pub max_velocity: f64,
    /// 最大加速度（rad/s²）
    pub max_acceleration: f64,
}

/// 全局运动状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementStatus {
    /// 运动中
    Moving,
    /// 运动完成
    Finished,
}

impl MovementStatus {
    /// 是否已完成
    pub fn is_finished(self) -> bool {
        matches!(self, MovementStatus::Finished)
    }
}

/// AMOR 底层 API
pub trait AmorTransport: Send {
    /// 底层库版本
    fn library_version(&self) -> Version;

    /// 建立会话
    fn connect(&mut self, library: &str, port: u32) -> TransportResult<()>;

    /// 释放会话
    fn release(&mut self) -> TransportResult<()>;

    /// 读取关节静态参数
    fn joint_info(&mut self, joint: usize) -> TransportResult<JointInfo>;

    /// 读取关节状态字（厂商定义，不解释）
    fn joint_status(&mut self, joint: usize) -> TransportResult<i32>;

    /// 实际关节位置
    fn actual_positions(&mut self) -> TransportResult<JointVector>;

    /// 实际关节速度
    fn actual_velocities(&mut self) -> TransportResult<JointVector>;

    /// 最近一次请求的关节位置
    fn requested_positions(&mut self) -> TransportResult<JointVector>;

    /// 关节位置目标
    fn set_positions(&mut self, positions: &JointVector) -> TransportResult<()>;

    /// 关节速度目标
    fn set_velocities(&mut self, velocities: &JointVector) -> TransportResult<()>;

    /// 当前笛卡尔位姿（mm + RPY）
    fn cartesian_position(&mut self) -> TransportResult<CartesianVector>;

    /// 笛卡尔位姿目标（直线运动）
    fn set_cartesian_positions(&mut self, pose: &CartesianVector) -> TransportResult<()>;

    /// 笛卡尔速度目标（硬件轴序）
    fn set_cartesian_velocities(&mut self, velocities: &CartesianVector) -> TransportResult<()>;

    /// 全局运动状态
    fn movement_status(&mut self) -> TransportResult<MovementStatus>;

    /// 受控停止（所有关节）
    fn controlled_stop(&mut self) -> TransportResult<()>;

    /// 急停
    fn emergency_stop(&mut self) -> TransportResult<()>;

    /// 闭合夹爪
    fn close_hand(&mut self) -> TransportResult<()>;

    /// 张开夹爪
    fn open_hand(&mut self) -> TransportResult<()>;

    /// 停止夹爪
    fn stop_hand(&mut self) -> TransportResult<()>;

    /// 最近一次失败的描述
    fn last_error(&self) -> String;
}
