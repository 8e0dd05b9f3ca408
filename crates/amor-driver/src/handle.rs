//! 共享会话句柄
//!
//! 一个 AMOR 会话只有一个句柄、一把锁。锁与传输层放在同一个 `Arc` 分配中，
//! 因此句柄的每个克隆天然共享同一把锁：关节空间控制器与笛卡尔控制器
//! 持有同一个 [`SharedHandle`] 的克隆即可互斥访问硬件。
//!
//! 读-改-写操作（先读当前位置再写目标）必须在同一个 [`HandleGuard`] 内完成。

use crate::error::{DriverError, Result};
use crate::transport::{
    AmorTransport, CartesianVector, JointInfo, JointVector, MovementStatus, TransportResult,
};
use parking_lot::{Mutex, MutexGuard};
use semver::Version;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

struct Session {
    transport: Box<dyn AmorTransport>,
    released: bool,
}

struct Inner {
    session: Mutex<Session>,
    version: Version,
}

/// 共享会话句柄
///
/// `Clone` 只增加引用计数，不会创建新的会话或新的锁。
#[derive(Clone)]
pub struct SharedHandle {
    inner: Arc<Inner>,
}

impl fmt::Debug for SharedHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedHandle")
            .field("version", &self.inner.version)
            .field("owners", &Arc::strong_count(&self.inner))
            .finish()
    }
}

impl SharedHandle {
    /// 通过传输层建立会话
    ///
    /// # 错误
    ///
    /// - `DriverError::Connect`: 底层无法建立连接
    pub fn connect<T>(mut transport: T, library: &str, port: u32) -> Result<Self>
    where
        T: AmorTransport + 'static,
    {
        let version = transport.library_version();
        info!("AMOR API library version {}", version);
        info!("Trying to connect to AMOR...");

        if transport.connect(library, port).is_err() {
            let reason = transport.last_error();
            error!("Could not get AMOR handle: {}", reason);
            return Err(DriverError::Connect {
                library: library.to_string(),
                port,
                reason,
            });
        }

        info!("Acquired AMOR handle!");

        Ok(SharedHandle {
            inner: Arc::new(Inner {
                session: Mutex::new(Session {
                    transport: Box::new(transport),
                    released: false,
                }),
                version,
            }),
        })
    }

    /// 获取硬件锁（阻塞）
    pub fn lock(&self) -> HandleGuard<'_> {
        HandleGuard {
            session: self.inner.session.lock(),
        }
    }

    /// 在超时内尝试获取硬件锁
    pub fn try_lock_for(&self, timeout: Duration) -> Option<HandleGuard<'_>> {
        self.inner
            .session
            .try_lock_for(timeout)
            .map(|session| HandleGuard { session })
    }

    /// 底层库版本
    pub fn library_version(&self) -> &Version {
        &self.inner.version
    }

    /// 两个句柄是否指向同一会话（同一把锁）
    pub fn same_session(&self, other: &SharedHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// 会话是否已释放
    pub fn is_released(&self) -> bool {
        self.inner.session.lock().released
    }

    /// 急停并释放会话
    ///
    /// 只有第一次调用会触达硬件，返回 `Ok(true)`；之后的调用返回 `Ok(false)`。
    /// 急停失败只记录日志，仍继续释放。
    pub fn release(&self) -> Result<bool> {
        let mut session = self.inner.session.lock();
        if session.released {
            return Ok(false);
        }
        session.released = true;

        let transport = session.transport.as_mut();
        if transport.emergency_stop().is_err() {
            warn!("amor_emergency_stop() failed: {}", transport.last_error());
        }

        match transport.release() {
            Ok(()) => {
                info!("AMOR handle released");
                Ok(true)
            },
            Err(fault) => {
                let reason = transport.last_error();
                error!("amor_release() failed: {}", reason);
                Err(DriverError::CallFailed {
                    call: "amor_release",
                    kind: fault.kind,
                    reason,
                })
            },
        }
    }
}

/// 持锁期间的硬件访问
///
/// 每个方法对应一次底层调用；失败时以 `last_error()` 的描述记录 `error!` 日志，
/// 并转换为 `DriverError::CallFailed`，不做重试。
pub struct HandleGuard<'a> {
    session: MutexGuard<'a, Session>,
}

impl HandleGuard<'_> {
    fn call<T, F>(&mut self, call: &'static str, f: F) -> Result<T>
    where
        F: FnOnce(&mut Box<dyn AmorTransport>) -> TransportResult<T>,
    {
        if self.session.released {
            return Err(DriverError::Released);
        }

        let transport = &mut self.session.transport;
        match f(&mut *transport) {
            Ok(value) => Ok(value),
            Err(fault) => {
                let reason = transport.last_error();
                error!("{}() failed: {}", call, reason);
                Err(DriverError::CallFailed {
                    call,
                    kind: fault.kind,
                    reason,
                })
            },
        }
    }

    /// 关节静态参数
    pub fn joint_info(&mut self, joint: usize) -> Result<JointInfo> {
        self.call("amor_get_joint_info", |t| t.joint_info(joint))
    }

    /// 关节状态字
    pub fn joint_status(&mut self, joint: usize) -> Result<i32> {
        self.call("amor_get_status", |t| t.joint_status(joint))
    }

    /// 实际关节位置（弧度）
    pub fn actual_positions(&mut self) -> Result<JointVector> {
        self.call("amor_get_actual_positions", |t| t.actual_positions())
    }

    /// 实际关节速度（rad/s）
    pub fn actual_velocities(&mut self) -> Result<JointVector> {
        self.call("amor_get_actual_velocities", |t| t.actual_velocities())
    }

    /// 最近一次请求的关节位置（弧度）
    pub fn requested_positions(&mut self) -> Result<JointVector> {
        self.call("amor_get_req_positions", |t| t.requested_positions())
    }

    /// 写关节位置目标（弧度）
    pub fn set_positions(&mut self, positions: &JointVector) -> Result<()> {
        self.call("amor_set_positions", |t| t.set_positions(positions))
    }

    /// 写关节速度目标（rad/s）
    pub fn set_velocities(&mut self, velocities: &JointVector) -> Result<()> {
        self.call("amor_set_velocities", |t| t.set_velocities(velocities))
    }

    /// 当前笛卡尔位姿（mm + RPY）
    pub fn cartesian_position(&mut self) -> Result<CartesianVector> {
        self.call("amor_get_cartesian_position", |t| t.cartesian_position())
    }

    /// 写笛卡尔位姿目标
    pub fn set_cartesian_positions(&mut self, pose: &CartesianVector) -> Result<()> {
        self.call("amor_set_cartesian_positions", |t| {
            t.set_cartesian_positions(pose)
        })
    }

    /// 写笛卡尔速度目标（硬件轴序）
    pub fn set_cartesian_velocities(&mut self, velocities: &CartesianVector) -> Result<()> {
        self.call("amor_set_cartesian_velocities", |t| {
            t.set_cartesian_velocities(velocities)
        })
    }

    /// 全局运动状态
    pub fn movement_status(&mut self) -> Result<MovementStatus> {
        self.call("amor_get_movement_status", |t| t.movement_status())
    }

    /// 受控停止
    pub fn controlled_stop(&mut self) -> Result<()> {
        self.call("amor_controlled_stop", |t| t.controlled_stop())
    }

    /// 急停
    pub fn emergency_stop(&mut self) -> Result<()> {
        self.call("amor_emergency_stop", |t| t.emergency_stop())
    }

    /// 闭合夹爪
    pub fn close_hand(&mut self) -> Result<()> {
        self.call("amor_close_hand", |t| t.close_hand())
    }

    /// 张开夹爪
    pub fn open_hand(&mut self) -> Result<()> {
        self.call("amor_open_hand", |t| t.open_hand())
    }

    /// 停止夹爪
    pub fn stop_hand(&mut self) -> Result<()> {
        self.call("amor_stop_hand", |t| t.stop_hand())
    }
}
