//! 设备生命周期
//!
//! 打开会话、初始化关节、按配置创建笛卡尔控制器；关闭时急停并释放会话。

use crate::cartesian::CartesianController;
use crate::config::DeviceConfig;
use crate::joint_control::JointController;
use crate::types::{Joint, Result};
use amor_driver::{AmorTransport, SharedHandle};
use amor_kinematics::CartesianSolver;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 已打开的 AMOR 设备
///
/// 关节空间控制器与笛卡尔控制器共享同一个句柄（同一把硬件锁）。
/// `Drop` 时自动 [`close`](Self::close)。
#[derive(Debug)]
pub struct AmorDevice {
    handle: SharedHandle,
    joints: JointController,
    cartesian: Option<CartesianController>,
    closed: bool,
}

impl AmorDevice {
    /// 打开设备，笛卡尔控制器使用配置中的运动学链
    pub fn open<T>(transport: T, config: &DeviceConfig) -> Result<Self>
    where
        T: AmorTransport + 'static,
    {
        config.validate()?;
        let solver = if config.cartesian_enabled() {
            Some(Arc::new(config.build_solver()?) as Arc<dyn CartesianSolver>)
        } else {
            None
        };
        Self::open_inner(transport, config, solver)
    }

    /// 打开设备，笛卡尔控制器使用外部求解器
    pub fn open_with_solver<T>(
        transport: T,
        config: &DeviceConfig,
        solver: Arc<dyn CartesianSolver>,
    ) -> Result<Self>
    where
        T: AmorTransport + 'static,
    {
        config.validate()?;
        Self::open_inner(transport, config, Some(solver))
    }

    fn open_inner<T>(
        transport: T,
        config: &DeviceConfig,
        solver: Option<Arc<dyn CartesianSolver>>,
    ) -> Result<Self>
    where
        T: AmorTransport + 'static,
    {
        let handle = SharedHandle::connect(transport, &config.can_library, config.can_port)?;

        match Self::initialize(&handle, config, solver) {
            Ok((joints, cartesian)) => Ok(AmorDevice {
                handle,
                joints,
                cartesian,
                closed: false,
            }),
            Err(e) => {
                if let Err(release_err) = handle.release() {
                    warn!("Release after failed open: {}", release_err);
                }
                Err(e)
            },
        }
    }

    fn initialize(
        handle: &SharedHandle,
        config: &DeviceConfig,
        solver: Option<Arc<dyn CartesianSolver>>,
    ) -> Result<(JointController, Option<CartesianController>)> {
        {
            let mut guard = handle.lock();
            for joint in Joint::ALL {
                let info = guard.joint_info(joint.index())?;
                let status = guard.joint_status(joint.index())?;
                debug!(
                    "Joint {}: limits [{:.3}, {:.3}] rad, max vel {:.3}, max acc {:.3}, status {}",
                    joint,
                    info.lower_limit,
                    info.upper_limit,
                    info.max_velocity,
                    info.max_acceleration,
                    status
                );
            }
        }

        let joints = JointController::new(handle.clone());
        let current = joints.encoders()?;
        info!(
            "Current positions (deg): {:?}",
            current.map(|d| d.0).into_array()
        );

        // 进入位置模式：以当前位置作为目标
        joints.position_move_all(&current)?;

        let cartesian = match (&config.cartesian_controller, solver) {
            (Some(name), Some(solver)) => {
                info!("Creating Cartesian controller '{}'", name);
                Some(CartesianController::new(
                    handle.clone(),
                    solver,
                    config.controller,
                )?)
            },
            _ => None,
        };

        Ok((joints, cartesian))
    }

    /// 关节空间控制器
    pub fn joints(&self) -> &JointController {
        &self.joints
    }

    /// 笛卡尔控制器（未配置时为 `None`）
    pub fn cartesian(&self) -> Option<&CartesianController> {
        self.cartesian.as_ref()
    }

    /// 共享句柄
    pub fn handle(&self) -> &SharedHandle {
        &self.handle
    }

    /// 是否已关闭
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// 关闭设备（幂等）
    ///
    /// 先停止笛卡尔控制，再急停并释放会话。
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        if let Some(cartesian) = self.cartesian.take()
            && cartesian.state().is_controlling()
            && let Err(e) = cartesian.stop_control()
        {
            warn!("Failed to stop Cartesian control on close: {}", e);
        }

        if self.handle.release()? {
            info!("AMOR device closed");
        }
        Ok(())
    }
}

impl Drop for AmorDevice {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Error while closing AMOR device: {}", e);
        }
    }
}
