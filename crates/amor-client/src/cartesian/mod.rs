//! 笛卡尔空间控制器
//!
//! 在运动学求解器与位姿编解码之上实现点到点、直线与速度流三种运动模式，
//! 以及参考系（基座/TCP）处理和等待完成逻辑。
//!
//! # 锁
//!
//! - 硬件访问经过共享句柄的唯一硬件锁，与关节空间控制器互斥
//! - 状态与参数由控制器自己的 `RwLock` 保护，每次只持有一次调用的时间
//!
//! # 硬件单位
//!
//! 硬件的笛卡尔位姿为毫米 + RPY（弧度），对外统一为米 + 内部位姿表示。

mod config;
mod gripper;
mod state;

pub use config::{
    ConfigParam, ControllerConfig, DEFAULT_GAIN, DEFAULT_WAIT_PERIOD_MS, frame_code,
    frame_from_code,
};
pub use gripper::GripperCommand;
pub use state::ControllerState;

use crate::types::{Deg, Joint, JointArray, Result, RobotError};
use amor_driver::{CartesianVector, JointVector, MovementStatus, NUM_JOINTS, SharedHandle};
use amor_kinematics::{
    CartesianSolver, CoordinateSystem, OrientationSystem, Pose, ReferenceFrame, Twist,
    decode_pose, decode_velocity, encode_pose, m_to_mm, mm_to_m,
};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, error, info, warn};

/// `stat` 的结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatReport {
    /// 当前末端位姿（基座系，内部表示）
    pub pose: Pose,
    /// 当前控制器状态
    pub state: ControllerState,
    /// 读取时间
    pub timestamp: SystemTime,
}

/// RPY 速率 → 硬件笛卡尔速度命令
///
/// 硬件的角速度轴序与 RPY 速率不一致，固定重排为
/// `hw[3] = rpy[4]`、`hw[4] = -rpy[5]`、`hw[5] = rpy[3]`。
/// 这是针对 AMOR 控制器的硬件特定变换，不是一般的运动学关系。
pub fn hardware_velocity_command(rpy_rates: &[f64; 6]) -> CartesianVector {
    [
        m_to_mm(rpy_rates[0]),
        m_to_mm(rpy_rates[1]),
        m_to_mm(rpy_rates[2]),
        rpy_rates[4],
        -rpy_rates[5],
        rpy_rates[3],
    ]
}

#[derive(Debug)]
struct Inner {
    state: ControllerState,
    config: ControllerConfig,
}

/// 笛卡尔空间控制器
pub struct CartesianController {
    handle: SharedHandle,
    solver: Arc<dyn CartesianSolver>,
    inner: RwLock<Inner>,
    /// 关节速度上限（deg/s）
    max_velocities: JointArray<Deg>,
    cancel_wait: AtomicBool,
}

impl fmt::Debug for CartesianController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("CartesianController")
            .field("state", &inner.state)
            .field("config", &inner.config)
            .finish_non_exhaustive()
    }
}

impl CartesianController {
    /// 创建控制器
    ///
    /// 读取各关节的速度上限用于 `apply_twist` 的校验。
    ///
    /// # 错误
    ///
    /// - `RobotError::Config`: 求解器关节数不为 7
    /// - `RobotError::InvalidArgument`: 参数不合法
    /// - `RobotError::Hardware`: 读取关节参数失败
    pub fn new(
        handle: SharedHandle,
        solver: Arc<dyn CartesianSolver>,
        config: ControllerConfig,
    ) -> Result<Self> {
        if solver.joint_count() != NUM_JOINTS {
            return Err(RobotError::Config(format!(
                "solver has {} joints, expected {}",
                solver.joint_count(),
                NUM_JOINTS
            )));
        }
        config.validate()?;

        let mut max_velocities = JointArray::splat(Deg::ZERO);
        {
            let mut guard = handle.lock();
            for joint in Joint::ALL {
                let info = guard.joint_info(joint.index())?;
                max_velocities[joint] = amor_kinematics::Rad(info.max_velocity).to_deg();
            }
        }

        info!(
            "Cartesian controller ready (frame: {}, wait period: {} ms)",
            config.reference_frame, config.wait_period_ms
        );

        Ok(CartesianController {
            handle,
            solver,
            inner: RwLock::new(Inner {
                state: ControllerState::Idle,
                config,
            }),
            max_velocities,
            cancel_wait: AtomicBool::new(false),
        })
    }

    /// 共享句柄
    pub fn handle(&self) -> &SharedHandle {
        &self.handle
    }

    /// 当前状态
    pub fn state(&self) -> ControllerState {
        self.inner.read().state
    }

    /// 当前参数
    pub fn config(&self) -> ControllerConfig {
        self.inner.read().config
    }

    fn set_state(&self, state: ControllerState) {
        let mut inner = self.inner.write();
        if inner.state != state {
            debug!("Cartesian state: {} -> {}", inner.state, state);
        }
        inner.state = state;
    }

    fn frame(&self) -> ReferenceFrame {
        self.inner.read().config.reference_frame
    }

    fn current_joints(&self) -> Result<Vec<Deg>> {
        let positions = self.handle.lock().actual_positions()?;
        Ok(JointArray::from_radians(&positions).into_iter().collect())
    }

    // ==================== 查询 ====================

    /// 读取当前末端位姿、状态与时间戳
    pub fn stat(&self) -> Result<StatReport> {
        let raw = self.handle.lock().cartesian_position()?;

        let values = [
            mm_to_m(raw[0]),
            mm_to_m(raw[1]),
            mm_to_m(raw[2]),
            raw[3],
            raw[4],
            raw[5],
        ];
        let pose = encode_pose(&values, CoordinateSystem::Cartesian, OrientationSystem::Rpy)?;

        Ok(StatReport {
            pose,
            state: self.state(),
            timestamp: SystemTime::now(),
        })
    }

    /// 逆运动学（以当前关节角为初值，使用当前参考系）
    pub fn inverse_kinematics(&self, target: &Pose) -> Result<Vec<Deg>> {
        let seed = self.current_joints()?;
        self.solver
            .inverse_kinematics(target, &seed, self.frame())
            .map_err(|e| {
                error!("inverse_kinematics() failed: {}", e);
                e.into()
            })
    }

    // ==================== 运动 ====================

    /// 点到点运动（关节插补）
    pub fn move_to_pose(&self, target: &Pose) -> Result<()> {
        let q = self.inverse_kinematics(target)?;
        let positions = joint_vector(&q)?;

        self.handle.lock().set_positions(&positions)?;
        self.set_state(ControllerState::PointToPointMoving);
        Ok(())
    }

    /// 相对运动
    ///
    /// TCP 参考系下目标本身即相对于工具，直接交给 [`move_to_pose`](Self::move_to_pose)；
    /// 基座系下在当前位姿上逐分量叠加。
    pub fn move_to_relative_pose(&self, delta: &Pose) -> Result<()> {
        if self.frame() == ReferenceFrame::Tcp {
            return self.move_to_pose(delta);
        }

        let current = self.stat()?.pose;
        self.move_to_pose(&current.offset_by(delta))
    }

    /// 笛卡尔直线运动
    pub fn move_linear(&self, target: &Pose) -> Result<()> {
        let target = match self.frame() {
            ReferenceFrame::Tcp => {
                let q = self.current_joints()?;
                let base_tcp = self.solver.forward_kinematics(&q).map_err(|e| {
                    error!("forward_kinematics() failed: {}", e);
                    RobotError::from(e)
                })?;
                self.solver.change_origin(target, &base_tcp).map_err(|e| {
                    error!("change_origin() failed: {}", e);
                    RobotError::from(e)
                })?
            },
            ReferenceFrame::Base => *target,
        };

        let rpy = decode_pose(&target, CoordinateSystem::Cartesian, OrientationSystem::Rpy);
        let v = rpy.as_slice();
        let command = [
            m_to_mm(v[0]),
            m_to_mm(v[1]),
            m_to_mm(v[2]),
            v[3],
            v[4],
            v[5],
        ];

        self.handle.lock().set_cartesian_positions(&command)?;
        self.set_state(ControllerState::LinearMoving);
        Ok(())
    }

    /// 笛卡尔速度流（仅基座系）
    pub fn move_with_velocity(&self, twist: &Twist) -> Result<()> {
        if self.frame() == ReferenceFrame::Tcp {
            warn!("TCP frame not supported yet in move_with_velocity");
            return Err(RobotError::unsupported("velocity command in TCP frame"));
        }

        let current = self.stat()?.pose;
        let rates = decode_velocity(
            &current,
            twist,
            CoordinateSystem::Cartesian,
            OrientationSystem::Rpy,
        )?;

        let v = rates.as_slice();
        let rpy_rates = [v[0], v[1], v[2], v[3], v[4], v[5]];
        let command = hardware_velocity_command(&rpy_rates);

        self.handle.lock().set_cartesian_velocities(&command)?;
        self.set_state(ControllerState::VelocityStreaming);
        Ok(())
    }

    /// 停止控制
    ///
    /// 状态先置为 `Idle`，再发出受控停止；停止失败时状态不回滚。
    pub fn stop_control(&self) -> Result<()> {
        self.set_state(ControllerState::Idle);
        self.handle.lock().controlled_stop()?;
        Ok(())
    }

    /// 等待点到点或直线运动完成
    ///
    /// - 其他状态立即返回成功
    /// - 按参数中的轮询周期读取运动状态
    /// - `timeout` 为零表示不限时；超时或被 [`cancel_wait`](Self::cancel_wait)
    ///   取消时调用 [`stop_control`](Self::stop_control) 并结束等待
    /// - 结束时状态总是回到 `Idle`
    /// - 只有最后一次状态读取失败时返回错误
    pub fn wait_until_done(&self, timeout: Duration) -> Result<()> {
        if !self.state().is_waitable() {
            return Ok(());
        }

        self.cancel_wait.store(false, Ordering::SeqCst);
        let period = self.config().wait_period();
        let start = Instant::now();
        let mut outcome = Ok(());

        loop {
            let elapsed = start.elapsed();
            if !timeout.is_zero() && elapsed >= timeout {
                warn!(
                    "Timeout reached ({:.3} seconds), stopping control",
                    timeout.as_secs_f64()
                );
                if let Err(e) = self.stop_control() {
                    warn!("stop_control() after timeout failed: {}", e);
                }
                break;
            }

            if self.cancel_wait.swap(false, Ordering::SeqCst) {
                warn!("Wait cancelled, stopping control");
                if let Err(e) = self.stop_control() {
                    warn!("stop_control() after cancel failed: {}", e);
                }
                break;
            }

            match self.handle.lock().movement_status() {
                Ok(MovementStatus::Finished) => break,
                Ok(MovementStatus::Moving) => {},
                Err(e) => {
                    outcome = Err(e.into());
                    break;
                },
            }

            let sleep = if timeout.is_zero() {
                period
            } else {
                period.min(timeout.saturating_sub(start.elapsed()))
            };
            std::thread::sleep(sleep);
        }

        self.set_state(ControllerState::Idle);
        outcome
    }

    /// 取消正在进行的 [`wait_until_done`](Self::wait_until_done)
    pub fn cancel_wait(&self) {
        self.cancel_wait.store(true, Ordering::SeqCst);
    }

    /// 微分逆运动学速度命令（不改变状态）
    ///
    /// 关节速度超过上限时发出受控停止，不写入速度，返回 `VelocityLimitExceeded`。
    pub fn apply_twist(&self, twist: &Twist) -> Result<()> {
        let q = self.current_joints()?;
        let qdot = self
            .solver
            .differential_inverse_kinematics(&q, twist, self.frame())
            .map_err(|e| {
                error!("differential_inverse_kinematics() failed: {}", e);
                RobotError::from(e)
            })?;
        let qdot_array = JointArray::new(deg_array(&qdot)?);

        if let Err(violation) = self.check_joint_velocities(&qdot_array) {
            warn!("{}, stopping", violation);
            self.handle.lock().controlled_stop()?;
            return Err(violation);
        }

        let velocities = qdot_array.to_radians();
        self.handle.lock().set_velocities(&velocities)?;
        Ok(())
    }

    fn check_joint_velocities(&self, qdot: &JointArray<Deg>) -> Result<()> {
        for joint in Joint::ALL {
            let value = qdot[joint].0;
            let limit = self.max_velocities[joint].0;
            if value.abs() > limit {
                return Err(RobotError::velocity_limit(joint, value, limit));
            }
        }
        Ok(())
    }

    /// 位姿流命令（不支持，回退为点到点运动）
    pub fn apply_pose(&self, target: &Pose) -> Result<()> {
        warn!("apply_pose() not supported, falling back to move_to_pose()");
        self.move_to_pose(target)
    }

    // ==================== 夹爪 ====================

    /// 按命令码驱动夹爪
    pub fn act(&self, code: i32) -> Result<()> {
        let Ok(command) = GripperCommand::try_from(code) else {
            error!(
                "Unrecognized act() command with code {} ({})",
                code,
                gripper::decode_vocab(code)
            );
            return Err(RobotError::invalid_argument(format!(
                "unrecognized gripper command code {code}"
            )));
        };

        self.actuate(command)
    }

    /// 驱动夹爪
    pub fn actuate(&self, command: GripperCommand) -> Result<()> {
        let mut guard = self.handle.lock();
        match command {
            GripperCommand::Close => guard.close_hand()?,
            GripperCommand::Open => guard.open_hand()?,
            GripperCommand::Stop => guard.stop_hand()?,
        }
        Ok(())
    }

    // ==================== 不支持的操作 ====================

    /// 重力补偿（不支持）
    pub fn gravity_compensation(&self) -> Result<()> {
        warn!("gravity_compensation() not implemented");
        Err(RobotError::unsupported("gravity compensation"))
    }

    /// 力控制（不支持）
    pub fn force_control(&self, _force: &[f64]) -> Result<()> {
        warn!("force_control() not implemented");
        Err(RobotError::unsupported("force control"))
    }

    /// 更换工具偏置（不支持）
    pub fn change_tool(&self, _tool: &Pose) -> Result<()> {
        warn!("Tool change is not supported on AMOR");
        Err(RobotError::unsupported("tool change"))
    }

    /// 末端力旋量（不支持）
    pub fn apply_wrench(&self, _wrench: &[f64; 6]) -> Result<()> {
        warn!("apply_wrench() not supported");
        Err(RobotError::unsupported("wrench"))
    }

    // ==================== 参数 ====================

    /// 读取单个参数
    pub fn parameter(&self, param: ConfigParam) -> f64 {
        self.inner.read().config.get(param)
    }

    /// 读取全部参数
    pub fn parameters(&self) -> BTreeMap<ConfigParam, f64> {
        let config = self.config();
        ConfigParam::ALL.into_iter().map(|p| (p, config.get(p))).collect()
    }

    /// 设置单个参数（仅 `Idle` 状态）
    pub fn set_parameter(&self, param: ConfigParam, value: f64) -> Result<()> {
        let mut inner = self.inner.write();
        if inner.state != ControllerState::Idle {
            error!("Unable to set config parameter while controlling");
            return Err(RobotError::invalid_state("set_parameter", inner.state));
        }
        inner.config.set(param, value)
    }

    /// 批量设置参数
    ///
    /// 逐项应用；任何一项失败都返回错误，但成功的项已经生效。
    pub fn set_parameters(&self, params: &BTreeMap<ConfigParam, f64>) -> Result<()> {
        let mut inner = self.inner.write();
        if inner.state != ControllerState::Idle {
            error!("Unable to set config parameters while controlling");
            return Err(RobotError::invalid_state("set_parameters", inner.state));
        }

        let mut first_error = None;
        for (&param, &value) in params {
            if let Err(e) = inner.config.set(param, value) {
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}

fn deg_array(q: &[Deg]) -> Result<[Deg; NUM_JOINTS]> {
    <[Deg; NUM_JOINTS]>::try_from(q).map_err(|_| {
        RobotError::invalid_argument(format!(
            "solver returned {} joint values, expected {}",
            q.len(),
            NUM_JOINTS
        ))
    })
}

fn joint_vector(q: &[Deg]) -> Result<JointVector> {
    Ok(JointArray::new(deg_array(q)?).to_radians())
}

#[cfg(test)]
mod tests {
    use super::*;
    use amor_driver::{JointInfo, SimulatedArm, mock::LastCommand};
    use amor_kinematics::{KinematicsError, deg_to_rad};
    use approx::assert_relative_eq;
    use nalgebra::Vector3;
    use parking_lot::Mutex;
    use std::thread;

    /// 可编程的求解器
    #[derive(Default)]
    struct Scripted {
        ik: Mutex<Option<KinematicsError>>,
        fk: Mutex<Pose>,
        qdot: Mutex<Vec<Deg>>,
        last_target: Mutex<Option<Pose>>,
    }

    impl CartesianSolver for Scripted {
        fn joint_count(&self) -> usize {
            NUM_JOINTS
        }

        fn forward_kinematics(&self, _q: &[Deg]) -> amor_kinematics::Result<Pose> {
            Ok(*self.fk.lock())
        }

        fn inverse_kinematics(
            &self,
            target: &Pose,
            seed: &[Deg],
            _frame: ReferenceFrame,
        ) -> amor_kinematics::Result<Vec<Deg>> {
            *self.last_target.lock() = Some(*target);
            match self.ik.lock().clone() {
                Some(err) => Err(err),
                None => Ok(seed.iter().map(|&d| d + Deg(10.0)).collect()),
            }
        }

        fn differential_inverse_kinematics(
            &self,
            _q: &[Deg],
            _twist: &Twist,
            _frame: ReferenceFrame,
        ) -> amor_kinematics::Result<Vec<Deg>> {
            Ok(self.qdot.lock().clone())
        }
    }

    fn setup() -> (SimulatedArm, Arc<Scripted>, CartesianController) {
        let arm = SimulatedArm::new();
        let handle = SharedHandle::connect(arm.clone(), "libeddriver.so", 0).unwrap();
        let solver = Arc::new(Scripted::default());
        let config = ControllerConfig {
            wait_period_ms: 2.0,
            ..ControllerConfig::default()
        };
        let ctrl = CartesianController::new(handle, solver.clone(), config).unwrap();
        arm.reset_counts();
        (arm, solver, ctrl)
    }

    #[test]
    fn test_stat_converts_millimeters() {
        let (arm, _solver, ctrl) = setup();
        arm.set_cartesian([100.0, 0.0, 0.0, 0.0, 0.0, 0.0]);

        let report = ctrl.stat().unwrap();
        assert_relative_eq!(report.pose.position, Vector3::new(0.1, 0.0, 0.0), epsilon = 1e-15);
        assert_relative_eq!(report.pose.rotation, Vector3::zeros(), epsilon = 1e-15);
        assert_eq!(report.state, ControllerState::Idle);
    }

    #[test]
    fn test_stat_failure_is_hardware_error() {
        let (arm, _solver, ctrl) = setup();
        arm.fail_call("amor_get_cartesian_position");
        assert!(ctrl.stat().unwrap_err().is_hardware());
    }

    #[test]
    fn test_move_to_pose_transitions() {
        let (arm, _solver, ctrl) = setup();
        ctrl.move_to_pose(&Pose::identity()).unwrap();

        assert_eq!(ctrl.state(), ControllerState::PointToPointMoving);
        for value in arm.requested() {
            assert_eq!(value, deg_to_rad(10.0));
        }
    }

    #[test]
    fn test_move_to_pose_failure_keeps_state() {
        let (arm, solver, ctrl) = setup();
        *solver.ik.lock() = Some(KinematicsError::Unreachable("far".into()));

        let err = ctrl.move_to_pose(&Pose::identity()).unwrap_err();
        assert!(matches!(err, RobotError::Unreachable(_)));
        assert_eq!(ctrl.state(), ControllerState::Idle);
        assert_eq!(arm.call_count("amor_set_positions"), 0);

        *solver.ik.lock() = None;
        arm.fail_call("amor_set_positions");
        assert!(ctrl.move_to_pose(&Pose::identity()).is_err());
        assert_eq!(ctrl.state(), ControllerState::Idle);
    }

    #[test]
    fn test_relative_pose_in_base_adds_to_current() {
        let (arm, solver, ctrl) = setup();
        arm.set_cartesian([100.0, 200.0, 300.0, 0.0, 0.0, 0.0]);

        let delta = Pose::new(Vector3::new(0.01, 0.0, -0.1), Vector3::new(0.0, 0.0, 0.1));
        ctrl.move_to_relative_pose(&delta).unwrap();

        let target = solver.last_target.lock().unwrap();
        assert_relative_eq!(target.position, Vector3::new(0.11, 0.2, 0.2), epsilon = 1e-12);
        assert_relative_eq!(target.rotation, Vector3::new(0.0, 0.0, 0.1), epsilon = 1e-12);
        assert_eq!(ctrl.state(), ControllerState::PointToPointMoving);
    }

    #[test]
    fn test_relative_pose_in_tcp_forwards_directly() {
        let (arm, solver, ctrl) = setup();
        ctrl.set_parameter(ConfigParam::Frame, 1.0).unwrap();

        let delta = Pose::new(Vector3::new(0.0, 0.0, 0.05), Vector3::zeros());
        ctrl.move_to_relative_pose(&delta).unwrap();

        assert_eq!(*solver.last_target.lock(), Some(delta));
        assert_eq!(arm.call_count("amor_get_cartesian_position"), 0);
    }

    #[test]
    fn test_move_linear_base() {
        let (arm, _solver, ctrl) = setup();
        let target = Pose::new(Vector3::new(0.3, -0.2, 0.5), Vector3::zeros());

        ctrl.move_linear(&target).unwrap();

        let Some(LastCommand::CartesianPositions(cmd)) = arm.last_command() else {
            panic!("expected cartesian position command");
        };
        assert_relative_eq!(cmd[0], 300.0, epsilon = 1e-9);
        assert_relative_eq!(cmd[1], -200.0, epsilon = 1e-9);
        assert_relative_eq!(cmd[2], 500.0, epsilon = 1e-9);
        assert_eq!(ctrl.state(), ControllerState::LinearMoving);
    }

    #[test]
    fn test_move_linear_tcp_changes_origin() {
        let (arm, solver, ctrl) = setup();
        *solver.fk.lock() = Pose::new(Vector3::new(0.1, 0.0, 0.0), Vector3::zeros());
        ctrl.set_parameter(ConfigParam::Frame, 1.0).unwrap();

        let target = Pose::new(Vector3::new(0.05, 0.0, 0.0), Vector3::zeros());
        ctrl.move_linear(&target).unwrap();

        let Some(LastCommand::CartesianPositions(cmd)) = arm.last_command() else {
            panic!("expected cartesian position command");
        };
        assert_relative_eq!(cmd[0], 150.0, epsilon = 1e-9);
        assert_eq!(arm.call_count("amor_get_actual_positions"), 1);
    }

    #[test]
    fn test_move_with_velocity_remaps_axes() {
        let (arm, _solver, ctrl) = setup();
        let twist = Twist::from_array([0.01, 0.02, 0.03, 0.1, 0.2, 0.3]);

        ctrl.move_with_velocity(&twist).unwrap();

        let Some(LastCommand::CartesianVelocities(cmd)) = arm.last_command() else {
            panic!("expected cartesian velocity command");
        };
        assert_relative_eq!(cmd[0], 10.0, epsilon = 1e-9);
        assert_relative_eq!(cmd[1], 20.0, epsilon = 1e-9);
        assert_relative_eq!(cmd[2], 30.0, epsilon = 1e-9);
        assert_relative_eq!(cmd[3], 0.2, epsilon = 1e-12);
        assert_relative_eq!(cmd[4], -0.3, epsilon = 1e-12);
        assert_relative_eq!(cmd[5], 0.1, epsilon = 1e-12);
        assert_eq!(ctrl.state(), ControllerState::VelocityStreaming);
    }

    #[test]
    fn test_move_with_velocity_rejects_tcp() {
        let (arm, _solver, ctrl) = setup();
        ctrl.set_parameter(ConfigParam::Frame, 1.0).unwrap();

        let err = ctrl.move_with_velocity(&Twist::zero()).unwrap_err();
        assert!(matches!(err, RobotError::Unsupported(_)));
        assert_eq!(arm.total_calls(), 0);
        assert_eq!(ctrl.state(), ControllerState::Idle);
    }

    #[test]
    fn test_stop_control_always_idle() {
        let (arm, _solver, ctrl) = setup();
        ctrl.move_to_pose(&Pose::identity()).unwrap();
        arm.fail_call("amor_controlled_stop");

        assert!(ctrl.stop_control().is_err());
        assert_eq!(ctrl.state(), ControllerState::Idle);
    }

    #[test]
    fn test_wait_when_not_waitable() {
        let (arm, _solver, ctrl) = setup();
        ctrl.wait_until_done(Duration::ZERO).unwrap();
        assert_eq!(arm.total_calls(), 0);

        ctrl.move_with_velocity(&Twist::zero()).unwrap();
        arm.reset_counts();
        ctrl.wait_until_done(Duration::from_secs(1)).unwrap();
        assert_eq!(arm.call_count("amor_get_movement_status"), 0);
        assert_eq!(ctrl.state(), ControllerState::VelocityStreaming);
    }

    #[test]
    fn test_wait_without_timeout_until_finished() {
        let (arm, _solver, ctrl) = setup();
        arm.set_motion_polls(Some(3));
        ctrl.move_to_pose(&Pose::identity()).unwrap();

        ctrl.wait_until_done(Duration::ZERO).unwrap();
        assert_eq!(ctrl.state(), ControllerState::Idle);
        assert_eq!(arm.call_count("amor_get_movement_status"), 4);
        assert_eq!(arm.call_count("amor_controlled_stop"), 0);
    }

    #[test]
    fn test_wait_timeout_stops_control() {
        let (arm, _solver, ctrl) = setup();
        arm.set_motion_polls(None);
        ctrl.move_to_pose(&Pose::identity()).unwrap();

        let timeout = Duration::from_millis(50);
        let period = ctrl.config().wait_period();
        let start = Instant::now();
        ctrl.wait_until_done(timeout).unwrap();

        let elapsed = start.elapsed();
        assert!(elapsed >= timeout);
        assert!(elapsed < timeout + period + Duration::from_millis(100));
        assert_eq!(ctrl.state(), ControllerState::Idle);
        assert_eq!(arm.call_count("amor_controlled_stop"), 1);
    }

    #[test]
    fn test_wait_status_failure() {
        let (arm, _solver, ctrl) = setup();
        arm.set_motion_polls(None);
        ctrl.move_linear(&Pose::identity()).unwrap();
        arm.fail_call("amor_get_movement_status");

        assert!(ctrl.wait_until_done(Duration::ZERO).unwrap_err().is_hardware());
        assert_eq!(ctrl.state(), ControllerState::Idle);
    }

    #[test]
    fn test_cancel_wait() {
        let (arm, _solver, ctrl) = setup();
        arm.set_motion_polls(None);
        ctrl.move_to_pose(&Pose::identity()).unwrap();

        let ctrl = Arc::new(ctrl);
        let waiter = {
            let ctrl = ctrl.clone();
            thread::spawn(move || ctrl.wait_until_done(Duration::ZERO))
        };

        thread::sleep(Duration::from_millis(50));
        ctrl.cancel_wait();
        waiter.join().unwrap().unwrap();

        assert_eq!(ctrl.state(), ControllerState::Idle);
        assert_eq!(arm.call_count("amor_controlled_stop"), 1);
    }

    #[test]
    fn test_apply_twist_within_limits() {
        let (arm, solver, ctrl) = setup();
        *solver.qdot.lock() = vec![Deg(10.0); NUM_JOINTS];

        ctrl.apply_twist(&Twist::zero()).unwrap();

        for value in arm.velocities() {
            assert_eq!(value, deg_to_rad(10.0));
        }
        assert_eq!(ctrl.state(), ControllerState::Idle);
    }

    #[test]
    fn test_apply_twist_over_limit_stops() {
        let arm = SimulatedArm::new();
        arm.set_joint_info(JointInfo {
            lower_limit: -3.0,
            upper_limit: 3.0,
            max_velocity: deg_to_rad(30.0),
            max_acceleration: 1.0,
        });
        let handle = SharedHandle::connect(arm.clone(), "libeddriver.so", 0).unwrap();
        let solver = Arc::new(Scripted::default());
        let ctrl =
            CartesianController::new(handle, solver.clone(), ControllerConfig::default()).unwrap();

        let mut qdot = vec![Deg(1.0); NUM_JOINTS];
        qdot[4] = Deg(-45.0);
        *solver.qdot.lock() = qdot;

        let err = ctrl.apply_twist(&Twist::zero()).unwrap_err();
        match err {
            RobotError::VelocityLimitExceeded { joint, .. } => assert_eq!(joint, Joint::A4),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(arm.call_count("amor_controlled_stop"), 1);
        assert_eq!(arm.call_count("amor_set_velocities"), 0);
    }

    #[test]
    fn test_act_unknown_code_no_hardware() {
        let (arm, _solver, ctrl) = setup();
        assert!(matches!(ctrl.act(9999), Err(RobotError::InvalidArgument(_))));
        assert_eq!(arm.total_calls(), 0);
    }

    #[test]
    fn test_act_dispatch() {
        let (arm, _solver, ctrl) = setup();
        ctrl.act(GripperCommand::Close.code()).unwrap();
        assert_eq!(arm.hand(), amor_driver::mock::HandState::Closed);
        ctrl.actuate(GripperCommand::Open).unwrap();
        assert_eq!(arm.hand(), amor_driver::mock::HandState::Open);
        ctrl.act(GripperCommand::Stop.code()).unwrap();
        assert_eq!(arm.hand(), amor_driver::mock::HandState::Stopped);
    }

    #[test]
    fn test_config_gated_on_idle() {
        let (_arm, _solver, ctrl) = setup();
        ctrl.move_to_pose(&Pose::identity()).unwrap();

        let err = ctrl.set_parameter(ConfigParam::Gain, 1.0).unwrap_err();
        assert!(matches!(err, RobotError::InvalidState { .. }));
        assert_eq!(ctrl.parameter(ConfigParam::Gain), DEFAULT_GAIN);

        let params = BTreeMap::from([(ConfigParam::Gain, 1.0)]);
        assert!(ctrl.set_parameters(&params).is_err());

        ctrl.stop_control().unwrap();
        ctrl.set_parameter(ConfigParam::Gain, 1.0).unwrap();
        assert_eq!(ctrl.parameter(ConfigParam::Gain), 1.0);
    }

    #[test]
    fn test_set_parameters_partial() {
        let (_arm, _solver, ctrl) = setup();
        let params = BTreeMap::from([
            (ConfigParam::Gain, 0.5),
            (ConfigParam::WaitPeriod, -1.0),
            (ConfigParam::Frame, 1.0),
        ]);

        assert!(matches!(
            ctrl.set_parameters(&params),
            Err(RobotError::InvalidArgument(_))
        ));

        let all = ctrl.parameters();
        assert_eq!(all[&ConfigParam::Gain], 0.5);
        assert_eq!(all[&ConfigParam::WaitPeriod], 2.0);
        assert_eq!(all[&ConfigParam::Frame], 1.0);
    }

    #[test]
    fn test_unsupported_operations() {
        let (arm, _solver, ctrl) = setup();
        assert!(matches!(ctrl.gravity_compensation(), Err(RobotError::Unsupported(_))));
        assert!(matches!(ctrl.force_control(&[0.0; 6]), Err(RobotError::Unsupported(_))));
        assert!(matches!(ctrl.change_tool(&Pose::identity()), Err(RobotError::Unsupported(_))));
        assert!(matches!(ctrl.apply_wrench(&[0.0; 6]), Err(RobotError::Unsupported(_))));
        assert_eq!(arm.total_calls(), 0);
    }

    #[test]
    fn test_apply_pose_falls_back() {
        let (_arm, _solver, ctrl) = setup();
        ctrl.apply_pose(&Pose::identity()).unwrap();
        assert_eq!(ctrl.state(), ControllerState::PointToPointMoving);
    }

    #[test]
    fn test_solver_joint_count_checked() {
        struct TwoJoints;
        impl CartesianSolver for TwoJoints {
            fn joint_count(&self) -> usize {
                2
            }
            fn forward_kinematics(&self, _q: &[Deg]) -> amor_kinematics::Result<Pose> {
                Ok(Pose::identity())
            }
            fn inverse_kinematics(
                &self,
                _t: &Pose,
                s: &[Deg],
                _f: ReferenceFrame,
            ) -> amor_kinematics::Result<Vec<Deg>> {
                Ok(s.to_vec())
            }
            fn differential_inverse_kinematics(
                &self,
                q: &[Deg],
                _t: &Twist,
                _f: ReferenceFrame,
            ) -> amor_kinematics::Result<Vec<Deg>> {
                Ok(q.to_vec())
            }
        }

        let arm = SimulatedArm::new();
        let handle = SharedHandle::connect(arm, "libeddriver.so", 0).unwrap();
        let err =
            CartesianController::new(handle, Arc::new(TwoJoints), ControllerConfig::default())
                .unwrap_err();
        assert!(matches!(err, RobotError::Config(_)));
    }
}
