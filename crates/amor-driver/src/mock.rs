//! 模拟机械臂
//!
//! 无硬件时使用的 [`AmorTransport`] 实现，供测试与 CLI 演示使用。
//!
//! - 克隆共享同一份内部状态：传入句柄后仍可通过保留的克隆观察和操控
//! - 故障注入：按调用名称使其失败
//! - 调用计数：验证某操作是否触达硬件
//! - 运动模型：写入目标后经过若干次状态轮询才到位，可设为永不结束

use crate::transport::{
    AmorFault, AmorFaultKind, AmorTransport, CartesianVector, JointInfo, JointVector,
    MovementStatus, NUM_JOINTS, TransportResult,
};
use parking_lot::Mutex;
use semver::Version;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// 夹爪状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandState {
    /// 未动作
    #[default]
    Idle,
    /// 已张开
    Open,
    /// 已闭合
    Closed,
    /// 已停止
    Stopped,
}

/// 最近一次运动命令的类型
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LastCommand {
    /// 关节位置
    Positions(JointVector),
    /// 关节速度
    Velocities(JointVector),
    /// 笛卡尔位姿
    CartesianPositions(CartesianVector),
    /// 笛卡尔速度
    CartesianVelocities(CartesianVector),
    /// 受控停止
    ControlledStop,
}

#[derive(Debug)]
struct SimState {
    connected: bool,
    positions: JointVector,
    velocities: JointVector,
    requested: JointVector,
    pending: Option<JointVector>,
    cartesian: CartesianVector,
    joint_info: [JointInfo; NUM_JOINTS],
    motion_polls: Option<u32>,
    remaining_polls: u32,
    moving: bool,
    hand: HandState,
    emergency_stopped: bool,
    last_command: Option<LastCommand>,
    last_error: String,
    failing: HashSet<&'static str>,
    fail_all: bool,
    counts: HashMap<&'static str, usize>,
    latency: Duration,
}

impl Default for SimState {
    fn default() -> Self {
        SimState {
            connected: false,
            positions: [0.0; NUM_JOINTS],
            velocities: [0.0; NUM_JOINTS],
            requested: [0.0; NUM_JOINTS],
            pending: None,
            cartesian: [0.0; 6],
            joint_info: [JointInfo {
                lower_limit: -std::f64::consts::PI,
                upper_limit: std::f64::consts::PI,
                max_velocity: 1.0,
                max_acceleration: 2.0,
            }; NUM_JOINTS],
            motion_polls: Some(0),
            remaining_polls: 0,
            moving: false,
            hand: HandState::Idle,
            emergency_stopped: false,
            last_command: None,
            last_error: String::new(),
            failing: HashSet::new(),
            fail_all: false,
            counts: HashMap::new(),
            latency: Duration::ZERO,
        }
    }
}

impl SimState {
    fn enter(&mut self, call: &'static str) -> TransportResult<()> {
        trace!("simulated {}", call);
        *self.counts.entry(call).or_insert(0) += 1;

        if self.fail_all || self.failing.contains(call) {
            self.last_error = format!("{call}: injected failure");
            return Err(AmorFault::new(AmorFaultKind::Communication));
        }

        if !self.connected && call != "amor_connect" {
            self.last_error = format!("{call}: not connected");
            return Err(AmorFault::new(AmorFaultKind::NotConnected));
        }

        Ok(())
    }

    fn start_motion(&mut self, target: Option<JointVector>) {
        match self.motion_polls {
            Some(0) => {
                if let Some(target) = target {
                    self.positions = target;
                }
                self.moving = false;
            },
            Some(n) => {
                self.pending = target;
                self.remaining_polls = n;
                self.moving = true;
            },
            None => {
                self.pending = target;
                self.moving = true;
            },
        }
    }

    fn finish_motion(&mut self) {
        if let Some(target) = self.pending.take() {
            self.positions = target;
        }
        self.velocities = [0.0; NUM_JOINTS];
        self.moving = false;
    }
}

/// 模拟 AMOR 机械臂
#[derive(Debug, Clone, Default)]
pub struct SimulatedArm {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedArm {
    /// 创建模拟臂（所有关节位于零位，运动立即完成）
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置当前关节位置（弧度）
    pub fn set_actual_positions(&self, positions: JointVector) {
        let mut state = self.state.lock();
        state.positions = positions;
        state.requested = positions;
    }

    /// 当前关节位置（弧度）
    pub fn positions(&self) -> JointVector {
        self.state.lock().positions
    }

    /// 最近一次请求的关节位置（弧度）
    pub fn requested(&self) -> JointVector {
        self.state.lock().requested
    }

    /// 最近一次写入的关节速度（rad/s）
    pub fn velocities(&self) -> JointVector {
        self.state.lock().velocities
    }

    /// 设置硬件报告的笛卡尔位姿（mm + RPY）
    pub fn set_cartesian(&self, pose: CartesianVector) {
        self.state.lock().cartesian = pose;
    }

    /// 设置所有关节的静态参数
    pub fn set_joint_info(&self, info: JointInfo) {
        self.state.lock().joint_info = [info; NUM_JOINTS];
    }

    /// 运动命令后需要多少次状态轮询才到位；`None` 表示永不结束
    pub fn set_motion_polls(&self, polls: Option<u32>) {
        self.state.lock().motion_polls = polls;
    }

    /// 每次调用的模拟延迟
    pub fn set_latency(&self, latency: Duration) {
        self.state.lock().latency = latency;
    }

    /// 使指定调用失败
    pub fn fail_call(&self, call: &'static str) {
        self.state.lock().failing.insert(call);
    }

    /// 使所有调用失败
    pub fn fail_all(&self, fail: bool) {
        self.state.lock().fail_all = fail;
    }

    /// 清除故障注入
    pub fn clear_failures(&self) {
        let mut state = self.state.lock();
        state.failing.clear();
        state.fail_all = false;
    }

    /// 指定调用的次数
    pub fn call_count(&self, call: &str) -> usize {
        self.state.lock().counts.get(call).copied().unwrap_or(0)
    }

    /// 所有调用的总次数
    pub fn total_calls(&self) -> usize {
        self.state.lock().counts.values().sum()
    }

    /// 清零调用计数
    pub fn reset_counts(&self) {
        self.state.lock().counts.clear();
    }

    /// 夹爪状态
    pub fn hand(&self) -> HandState {
        self.state.lock().hand
    }

    /// 是否触发过急停
    pub fn emergency_stopped(&self) -> bool {
        self.state.lock().emergency_stopped
    }

    /// 是否仍处于连接状态
    pub fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    /// 最近一次运动命令
    pub fn last_command(&self) -> Option<LastCommand> {
        self.state.lock().last_command
    }

    fn with_call<T>(
        &self,
        call: &'static str,
        f: impl FnOnce(&mut SimState) -> T,
    ) -> TransportResult<T> {
        let latency = {
            let mut state = self.state.lock();
            state.enter(call)?;
            state.latency
        };

        if !latency.is_zero() {
            std::thread::sleep(latency);
        }

        Ok(f(&mut self.state.lock()))
    }
}

impl AmorTransport for SimulatedArm {
    fn library_version(&self) -> Version {
        Version::new(1, 4, 2)
    }

    fn connect(&mut self, _library: &str, _port: u32) -> TransportResult<()> {
        self.with_call("amor_connect", |s| {
            s.connected = true;
            s.emergency_stopped = false;
        })
    }

    fn release(&mut self) -> TransportResult<()> {
        self.with_call("amor_release", |s| s.connected = false)
    }

    fn joint_info(&mut self, joint: usize) -> TransportResult<JointInfo> {
        let info = self.with_call("amor_get_joint_info", |s| s.joint_info.get(joint).copied())?;
        info.ok_or_else(|| {
            self.state.lock().last_error = format!("invalid joint {joint}");
            AmorFault::new(AmorFaultKind::Rejected)
        })
    }

    fn joint_status(&mut self, joint: usize) -> TransportResult<i32> {
        self.with_call("amor_get_status", |s| {
            if joint < NUM_JOINTS && !s.emergency_stopped {
                0
            } else {
                1
            }
        })
    }

    fn actual_positions(&mut self) -> TransportResult<JointVector> {
        self.with_call("amor_get_actual_positions", |s| s.positions)
    }

    fn actual_velocities(&mut self) -> TransportResult<JointVector> {
        self.with_call("amor_get_actual_velocities", |s| s.velocities)
    }

    fn requested_positions(&mut self) -> TransportResult<JointVector> {
        self.with_call("amor_get_req_positions", |s| s.requested)
    }

    fn set_positions(&mut self, positions: &JointVector) -> TransportResult<()> {
        let positions = *positions;
        self.with_call("amor_set_positions", |s| {
            s.requested = positions;
            s.last_command = Some(LastCommand::Positions(positions));
            s.start_motion(Some(positions));
        })
    }

    fn set_velocities(&mut self, velocities: &JointVector) -> TransportResult<()> {
        let velocities = *velocities;
        self.with_call("amor_set_velocities", |s| {
            s.velocities = velocities;
            s.last_command = Some(LastCommand::Velocities(velocities));
        })
    }

    fn cartesian_position(&mut self) -> TransportResult<CartesianVector> {
        self.with_call("amor_get_cartesian_position", |s| s.cartesian)
    }

    fn set_cartesian_positions(&mut self, pose: &CartesianVector) -> TransportResult<()> {
        let pose = *pose;
        self.with_call("amor_set_cartesian_positions", |s| {
            s.last_command = Some(LastCommand::CartesianPositions(pose));
            s.cartesian = pose;
            s.start_motion(None);
        })
    }

    fn set_cartesian_velocities(&mut self, velocities: &CartesianVector) -> TransportResult<()> {
        let velocities = *velocities;
        self.with_call("amor_set_cartesian_velocities", |s| {
            s.last_command = Some(LastCommand::CartesianVelocities(velocities));
        })
    }

    fn movement_status(&mut self) -> TransportResult<MovementStatus> {
        self.with_call("amor_get_movement_status", |s| {
            if !s.moving {
                return MovementStatus::Finished;
            }

            match s.motion_polls {
                None => MovementStatus::Moving,
                Some(_) if s.remaining_polls > 0 => {
                    s.remaining_polls -= 1;
                    MovementStatus::Moving
                },
                Some(_) => {
                    s.finish_motion();
                    MovementStatus::Finished
                },
            }
        })
    }

    fn controlled_stop(&mut self) -> TransportResult<()> {
        self.with_call("amor_controlled_stop", |s| {
            s.pending = None;
            s.velocities = [0.0; NUM_JOINTS];
            s.moving = false;
            s.last_command = Some(LastCommand::ControlledStop);
        })
    }

    fn emergency_stop(&mut self) -> TransportResult<()> {
        self.with_call("amor_emergency_stop", |s| {
            s.pending = None;
            s.velocities = [0.0; NUM_JOINTS];
            s.moving = false;
            s.emergency_stopped = true;
        })
    }

    fn close_hand(&mut self) -> TransportResult<()> {
        self.with_call("amor_close_hand", |s| s.hand = HandState::Closed)
    }

    fn open_hand(&mut self) -> TransportResult<()> {
        self.with_call("amor_open_hand", |s| s.hand = HandState::Open)
    }

    fn stop_hand(&mut self) -> TransportResult<()> {
        self.with_call("amor_stop_hand", |s| s.hand = HandState::Stopped)
    }

    fn last_error(&self) -> String {
        self.state.lock().last_error.clone()
    }
}
