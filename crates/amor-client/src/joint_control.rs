//! 关节空间控制器
//!
//! 直接的关节级读写。对外角度单位为度（速度为 deg/s），只有在调用硬件时才转换为弧度。
//!
//! # 读-改-写
//!
//! 硬件只接受整向量写入。单关节或批量的位置命令需要先读取当前位置、覆盖目标分量、
//! 再整体写回；读与写在同一个 [`HandleGuard`](amor_driver::HandleGuard) 内完成，
//! 其他线程（包括笛卡尔控制器）的写入不会夹在两次调用之间。
//!
//! # 参数校验
//!
//! 所有索引与批量参数在触达硬件之前校验：
//! - 越界索引 → `IndexOutOfRange`
//! - 空批量 → 直接成功（记录 warning），不调用硬件
//! - 批量长度超过关节数或与数据长度不一致 → `InvalidArgument`

use crate::types::{
    Deg, Joint, JointArray, JointPositions, JointType, JointVelocities, Rad, Result, RobotError,
};
use amor_driver::{JointVector, NUM_JOINTS, SharedHandle};
use std::time::SystemTime;
use tracing::{error, trace, warn};

/// 校验单个关节索引
fn check_index(index: usize) -> Result<Joint> {
    Joint::from_index(index).ok_or_else(|| {
        error!("Index out of range: {} >= {}", index, NUM_JOINTS);
        RobotError::index_out_of_range(index)
    })
}

/// 校验批量关节索引
///
/// 返回 `Ok(None)` 表示空批量。
fn check_batch(joints: &[usize]) -> Result<Option<Vec<Joint>>> {
    if joints.is_empty() {
        warn!("Passed joint batch of size zero");
        return Ok(None);
    }

    if joints.len() > NUM_JOINTS {
        error!(
            "Joint batch size out of range (> {}): {}",
            NUM_JOINTS,
            joints.len()
        );
        return Err(RobotError::invalid_argument(format!(
            "batch of {} joints exceeds joint count {}",
            joints.len(),
            NUM_JOINTS
        )));
    }

    joints.iter().map(|&j| check_index(j)).collect::<Result<Vec<_>>>().map(Some)
}

/// 校验批量索引与数据长度
fn check_batch_values<T>(joints: &[usize], values: &[T]) -> Result<Option<Vec<Joint>>> {
    if joints.len() != values.len() {
        error!(
            "Joint batch size mismatch: {} joints, {} values",
            joints.len(),
            values.len()
        );
        return Err(RobotError::invalid_argument(format!(
            "{} joints but {} values",
            joints.len(),
            values.len()
        )));
    }

    check_batch(joints)
}

/// 批量是否覆盖全部关节（此时无需先读取当前位置）
fn covers_all(joints: &[Joint]) -> bool {
    Joint::ALL.iter().all(|j| joints.contains(j))
}

fn to_deg(rad: f64) -> Deg {
    Rad(rad).to_deg()
}

/// 关节空间控制器
///
/// 持有共享句柄的一个克隆；可与笛卡尔控制器并发使用。
#[derive(Debug, Clone)]
pub struct JointController {
    handle: SharedHandle,
}

impl JointController {
    /// 创建控制器
    pub fn new(handle: SharedHandle) -> Self {
        JointController { handle }
    }

    /// 共享句柄
    pub fn handle(&self) -> &SharedHandle {
        &self.handle
    }

    /// 关节数
    pub fn axes(&self) -> usize {
        NUM_JOINTS
    }

    // ==================== 编码器 ====================

    /// 读取单个关节位置
    pub fn encoder(&self, j: usize) -> Result<Deg> {
        trace!("encoder({})", j);
        let joint = check_index(j)?;
        let positions = self.handle.lock().actual_positions()?;
        Ok(to_deg(positions[joint.index()]))
    }

    /// 读取所有关节位置
    pub fn encoders(&self) -> Result<JointPositions> {
        trace!("encoders()");
        let positions = self.handle.lock().actual_positions()?;
        Ok(JointArray::from_radians(&positions))
    }

    /// 读取单个关节位置及时间戳
    pub fn encoder_timed(&self, j: usize) -> Result<(Deg, SystemTime)> {
        trace!("encoder_timed({})", j);
        let now = SystemTime::now();
        Ok((self.encoder(j)?, now))
    }

    /// 读取所有关节位置及时间戳
    pub fn encoders_timed(&self) -> Result<(JointPositions, SystemTime)> {
        trace!("encoders_timed()");
        let now = SystemTime::now();
        Ok((self.encoders()?, now))
    }

    /// 读取单个关节速度（deg/s）
    pub fn encoder_speed(&self, j: usize) -> Result<Deg> {
        trace!("encoder_speed({})", j);
        let joint = check_index(j)?;
        let velocities = self.handle.lock().actual_velocities()?;
        Ok(to_deg(velocities[joint.index()]))
    }

    /// 读取所有关节速度（deg/s）
    pub fn encoder_speeds(&self) -> Result<JointVelocities> {
        trace!("encoder_speeds()");
        let velocities = self.handle.lock().actual_velocities()?;
        Ok(JointArray::from_radians(&velocities))
    }

    /// 关节加速度（硬件不提供）
    pub fn encoder_acceleration(&self, _j: usize) -> Result<Deg> {
        Err(RobotError::unsupported("encoder acceleration"))
    }

    /// 所有关节加速度（硬件不提供）
    pub fn encoder_accelerations(&self) -> Result<JointArray<Deg>> {
        Err(RobotError::unsupported("encoder accelerations"))
    }

    /// 编码器清零（不支持）
    pub fn reset_encoder(&self, _j: usize) -> Result<()> {
        error!("reset_encoder() not available");
        Err(RobotError::unsupported("reset_encoder"))
    }

    /// 所有编码器清零（不支持）
    pub fn reset_encoders(&self) -> Result<()> {
        error!("reset_encoders() not available");
        Err(RobotError::unsupported("reset_encoders"))
    }

    /// 设置编码器值（不支持）
    pub fn set_encoder(&self, _j: usize, _value: Deg) -> Result<()> {
        error!("set_encoder() not available");
        Err(RobotError::unsupported("set_encoder"))
    }

    /// 设置所有编码器值（不支持）
    pub fn set_encoders(&self, _values: &JointPositions) -> Result<()> {
        error!("set_encoders() not available");
        Err(RobotError::unsupported("set_encoders"))
    }

    // ==================== 位置控制 ====================

    /// 单关节绝对运动
    pub fn position_move(&self, j: usize, target: Deg) -> Result<()> {
        trace!("position_move({}, {})", j, target.0);
        let joint = check_index(j)?;
        self.read_modify_write(&[joint], |positions| {
            positions[joint.index()] = target.to_rad().0;
        })
    }

    /// 所有关节绝对运动
    pub fn position_move_all(&self, targets: &JointPositions) -> Result<()> {
        trace!("position_move_all()");
        let positions = targets.to_radians();
        self.handle.lock().set_positions(&positions)?;
        Ok(())
    }

    /// 批量绝对运动
    pub fn position_move_batch(&self, joints: &[usize], targets: &[Deg]) -> Result<()> {
        trace!("position_move_batch({})", joints.len());
        let Some(batch) = check_batch_values(joints, targets)? else {
            return Ok(());
        };

        self.read_modify_write(&batch, |positions| {
            for (joint, target) in batch.iter().zip(targets) {
                positions[joint.index()] = target.to_rad().0;
            }
        })
    }

    /// 单关节相对运动
    pub fn relative_move(&self, j: usize, delta: Deg) -> Result<()> {
        trace!("relative_move({}, {})", j, delta.0);
        let joint = check_index(j)?;
        self.read_modify_write(&[], |positions| {
            positions[joint.index()] += delta.to_rad().0;
        })
    }

    /// 所有关节相对运动
    pub fn relative_move_all(&self, deltas: &JointPositions) -> Result<()> {
        trace!("relative_move_all()");
        self.read_modify_write(&[], |positions| {
            for (position, delta) in positions.iter_mut().zip(deltas) {
                *position += delta.to_rad().0;
            }
        })
    }

    /// 批量相对运动
    pub fn relative_move_batch(&self, joints: &[usize], deltas: &[Deg]) -> Result<()> {
        trace!("relative_move_batch({})", joints.len());
        let Some(batch) = check_batch_values(joints, deltas)? else {
            return Ok(());
        };

        self.read_modify_write(&[], |positions| {
            for (joint, delta) in batch.iter().zip(deltas) {
                positions[joint.index()] += delta.to_rad().0;
            }
        })
    }

    /// 持锁执行读-改-写
    ///
    /// `overwritten` 覆盖全部关节时跳过读取（绝对运动的整批写入）。
    fn read_modify_write<F>(&self, overwritten: &[Joint], update: F) -> Result<()>
    where
        F: FnOnce(&mut JointVector),
    {
        let mut guard = self.handle.lock();

        let mut positions = if covers_all(overwritten) {
            [0.0; NUM_JOINTS]
        } else {
            guard.actual_positions()?
        };

        update(&mut positions);
        guard.set_positions(&positions)?;
        Ok(())
    }

    // ==================== 运动状态 ====================

    /// 单关节是否到位（全局状态）
    pub fn check_motion_done(&self, j: usize) -> Result<bool> {
        trace!("check_motion_done({})", j);
        check_index(j)?;
        self.check_motion_done_all()
    }

    /// 所有关节是否到位
    pub fn check_motion_done_all(&self) -> Result<bool> {
        trace!("check_motion_done_all()");
        let status = self.handle.lock().movement_status()?;
        Ok(status.is_finished())
    }

    /// 批量是否到位（同一个全局状态广播到每个请求的关节）
    pub fn check_motion_done_batch(&self, joints: &[usize]) -> Result<Vec<bool>> {
        trace!("check_motion_done_batch({})", joints.len());
        let Some(batch) = check_batch(joints)? else {
            return Ok(Vec::new());
        };

        let done = self.check_motion_done_all()?;
        Ok(vec![done; batch.len()])
    }

    // ==================== 停止 ====================

    /// 停止单关节（硬件不支持选择性停止，会停止所有关节）
    pub fn stop(&self, j: usize) -> Result<()> {
        warn!(
            "Selective stop not available, stopping all joints at once ({})",
            j
        );
        check_index(j)?;
        self.stop_all()
    }

    /// 受控停止所有关节
    pub fn stop_all(&self) -> Result<()> {
        trace!("stop_all()");
        self.handle.lock().controlled_stop()?;
        Ok(())
    }

    /// 批量停止（会停止所有关节）
    pub fn stop_batch(&self, joints: &[usize]) -> Result<()> {
        warn!(
            "Selective stop not available, stopping all joints at once ({} requested)",
            joints.len()
        );
        if check_batch(joints)?.is_none() {
            return Ok(());
        }
        self.stop_all()
    }

    // ==================== 参考速度/加速度 ====================

    /// 单关节参考速度（关节最大速度，deg/s）
    pub fn ref_speed(&self, j: usize) -> Result<Deg> {
        trace!("ref_speed({})", j);
        let joint = check_index(j)?;
        let info = self.handle.lock().joint_info(joint.index())?;
        Ok(to_deg(info.max_velocity))
    }

    /// 所有关节参考速度
    pub fn ref_speeds(&self) -> Result<JointVelocities> {
        trace!("ref_speeds()");
        self.joint_limits(&Joint::ALL, |info| info.max_velocity)
            .map(|v| JointArray::new(collect_array(v)))
    }

    /// 批量参考速度
    pub fn ref_speeds_batch(&self, joints: &[usize]) -> Result<Vec<Deg>> {
        trace!("ref_speeds_batch({})", joints.len());
        match check_batch(joints)? {
            Some(batch) => self.joint_limits(&batch, |info| info.max_velocity),
            None => Ok(Vec::new()),
        }
    }

    /// 单关节参考加速度（关节最大加速度，deg/s²）
    pub fn ref_acceleration(&self, j: usize) -> Result<Deg> {
        trace!("ref_acceleration({})", j);
        let joint = check_index(j)?;
        let info = self.handle.lock().joint_info(joint.index())?;
        Ok(to_deg(info.max_acceleration))
    }

    /// 所有关节参考加速度
    pub fn ref_accelerations(&self) -> Result<JointArray<Deg>> {
        trace!("ref_accelerations()");
        self.joint_limits(&Joint::ALL, |info| info.max_acceleration)
            .map(|v| JointArray::new(collect_array(v)))
    }

    /// 批量参考加速度
    pub fn ref_accelerations_batch(&self, joints: &[usize]) -> Result<Vec<Deg>> {
        trace!("ref_accelerations_batch({})", joints.len());
        match check_batch(joints)? {
            Some(batch) => self.joint_limits(&batch, |info| info.max_acceleration),
            None => Ok(Vec::new()),
        }
    }

    fn joint_limits<F>(&self, joints: &[Joint], field: F) -> Result<Vec<Deg>>
    where
        F: Fn(&amor_driver::JointInfo) -> f64,
    {
        let mut guard = self.handle.lock();
        joints
            .iter()
            .map(|joint| {
                let info = guard.joint_info(joint.index())?;
                Ok(to_deg(field(&info)))
            })
            .collect()
    }

    /// 设置参考速度（不支持）
    pub fn set_ref_speed(&self, _j: usize, _speed: Deg) -> Result<()> {
        error!("set_ref_speed() not available");
        Err(RobotError::unsupported("set_ref_speed"))
    }

    /// 设置所有参考速度（不支持）
    pub fn set_ref_speeds(&self, _speeds: &JointVelocities) -> Result<()> {
        error!("set_ref_speeds() not available");
        Err(RobotError::unsupported("set_ref_speeds"))
    }

    /// 设置参考加速度（不支持）
    pub fn set_ref_acceleration(&self, _j: usize, _acc: Deg) -> Result<()> {
        error!("set_ref_acceleration() not available");
        Err(RobotError::unsupported("set_ref_acceleration"))
    }

    /// 设置所有参考加速度（不支持）
    pub fn set_ref_accelerations(&self, _accs: &JointArray<Deg>) -> Result<()> {
        error!("set_ref_accelerations() not available");
        Err(RobotError::unsupported("set_ref_accelerations"))
    }

    // ==================== 目标位置 ====================

    /// 单关节最近一次请求的位置
    pub fn target_position(&self, j: usize) -> Result<Deg> {
        trace!("target_position({})", j);
        let joint = check_index(j)?;
        let positions = self.handle.lock().requested_positions()?;
        Ok(to_deg(positions[joint.index()]))
    }

    /// 所有关节最近一次请求的位置
    pub fn target_positions(&self) -> Result<JointPositions> {
        trace!("target_positions()");
        let positions = self.handle.lock().requested_positions()?;
        Ok(JointArray::from_radians(&positions))
    }

    /// 批量最近一次请求的位置
    pub fn target_positions_batch(&self, joints: &[usize]) -> Result<Vec<Deg>> {
        trace!("target_positions_batch({})", joints.len());
        let Some(batch) = check_batch(joints)? else {
            return Ok(Vec::new());
        };

        let positions = self.handle.lock().requested_positions()?;
        Ok(batch.iter().map(|j| to_deg(positions[j.index()])).collect())
    }

    // ==================== 轴信息 ====================

    /// 轴名（`A1` … `A6`，第 3 个关节为 `A2.5`）
    pub fn axis_name(&self, j: usize) -> Result<&'static str> {
        trace!("axis_name({})", j);
        Ok(check_index(j)?.name())
    }

    /// 关节类型（全部为旋转关节）
    pub fn joint_type(&self, j: usize) -> Result<JointType> {
        trace!("joint_type({})", j);
        check_index(j)?;
        Ok(JointType::Revolute)
    }
}

fn collect_array(values: Vec<Deg>) -> [Deg; NUM_JOINTS] {
    let mut out = [Deg::ZERO; NUM_JOINTS];
    for (slot, value) in out.iter_mut().zip(values) {
        *slot = value;
    }
    out
}
