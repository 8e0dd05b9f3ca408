//! DH 串联链求解器
//!
//! 基于标准 DH 参数（`Rz(θ)·Tz(d)·Tx(a)·Rx(α)`）的数值求解器：
//! - 正运动学：逐级累乘齐次变换
//! - 逆运动学：阻尼最小二乘迭代（带关节限位钳制）
//! - 微分逆运动学：几何雅可比伪逆
//!
//! 主要用于仿真与测试；真实部署可替换为任意 [`CartesianSolver`] 实现。

use crate::error::{KinematicsError, Result};
use crate::representation::{Pose, Twist, rotation_vector};
use crate::solver::{CartesianSolver, ReferenceFrame};
use crate::units::{Deg, deg_to_rad, rad_to_deg};
use nalgebra::{DMatrix, DVector, Isometry3, Vector3};
use tracing::{debug, trace};

/// 默认最大迭代次数
const DEFAULT_MAX_ITERATIONS: usize = 500;

/// 默认收敛阈值（位置 m 与姿态 rad 合并范数）
const DEFAULT_TOLERANCE: f64 = 1e-10;

/// 默认阻尼系数
const DEFAULT_DAMPING: f64 = 1e-2;

/// 伪逆中判定奇异的最小奇异值
const MIN_SINGULAR_VALUE: f64 = 1e-6;

/// 微分逆解允许的速度残差（相对）
const MAX_TWIST_RESIDUAL: f64 = 1e-6;

/// 单个连杆的 DH 参数与关节限位
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DhLink {
    /// 连杆长度 a（米）
    pub a: f64,
    /// 连杆偏距 d（米）
    pub d: f64,
    /// 连杆扭角 α（弧度）
    pub alpha: f64,
    /// 关节零位偏置（弧度）
    #[cfg_attr(feature = "serde", serde(default))]
    pub offset: f64,
    /// 关节下限（度）
    pub min_deg: f64,
    /// 关节上限（度）
    pub max_deg: f64,
}

impl DhLink {
    /// 创建连杆，限位为 ±180°
    pub const fn new(a: f64, d: f64, alpha: f64) -> Self {
        DhLink {
            a,
            d,
            alpha,
            offset: 0.0,
            min_deg: -180.0,
            max_deg: 180.0,
        }
    }

    /// 设置关节限位（度）
    pub const fn with_limits(mut self, min_deg: f64, max_deg: f64) -> Self {
        self.min_deg = min_deg;
        self.max_deg = max_deg;
        self
    }

    /// 该连杆在关节角 `q`（弧度）下的齐次变换
    fn transform(&self, q: f64) -> Isometry3<f64> {
        Isometry3::rotation(Vector3::z() * (q + self.offset))
            * Isometry3::translation(0.0, 0.0, self.d)
            * Isometry3::translation(self.a, 0.0, 0.0)
            * Isometry3::rotation(Vector3::x() * self.alpha)
    }
}

/// DH 串联链求解器
#[derive(Debug, Clone)]
pub struct DhChainSolver {
    links: Vec<DhLink>,
    max_iterations: usize,
    tolerance: f64,
    damping: f64,
}

impl DhChainSolver {
    /// 创建求解器
    ///
    /// # 错误
    ///
    /// - `KinematicsError::InvalidArgument`: 连杆为空或限位倒置
    pub fn new(links: Vec<DhLink>) -> Result<Self> {
        if links.is_empty() {
            return Err(KinematicsError::InvalidArgument(
                "kinematic chain has no links".to_string(),
            ));
        }

        if let Some((i, link)) = links
            .iter()
            .enumerate()
            .find(|(_, l)| l.min_deg > l.max_deg)
        {
            return Err(KinematicsError::InvalidArgument(format!(
                "link {i} has inverted limits [{}, {}]",
                link.min_deg, link.max_deg
            )));
        }

        Ok(DhChainSolver {
            links,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
            damping: DEFAULT_DAMPING,
        })
    }

    /// 设置逆解最大迭代次数
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// 设置逆解收敛阈值
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// 连杆参数
    pub fn links(&self) -> &[DhLink] {
        &self.links
    }

    fn check_joints(&self, q: &[Deg]) -> Result<()> {
        KinematicsError::check_size(self.links.len(), q.len())
    }

    /// 各关节坐标系（第 i 项为关节 i 转轴所在坐标系）以及末端坐标系
    fn frames(&self, q: &[f64]) -> (Vec<Isometry3<f64>>, Isometry3<f64>) {
        let mut frames = Vec::with_capacity(self.links.len());
        let mut current = Isometry3::identity();

        for (link, &qi) in self.links.iter().zip(q) {
            frames.push(current);
            current *= link.transform(qi);
        }

        (frames, current)
    }

    fn end_effector(&self, q: &[f64]) -> Isometry3<f64> {
        self.frames(q).1
    }

    /// 几何雅可比（6 × n，基座系，对弧度）
    fn jacobian(&self, q: &[f64]) -> DMatrix<f64> {
        let (frames, end) = self.frames(q);
        let p_end = end.translation.vector;
        let mut j = DMatrix::zeros(6, self.links.len());

        for (i, frame) in frames.iter().enumerate() {
            let z = frame.rotation * Vector3::z();
            let linear = z.cross(&(p_end - frame.translation.vector));
            j.fixed_view_mut::<3, 1>(0, i).copy_from(&linear);
            j.fixed_view_mut::<3, 1>(3, i).copy_from(&z);
        }

        j
    }

    fn clamp_to_limits(&self, q: &mut DVector<f64>) {
        for (qi, link) in q.iter_mut().zip(&self.links) {
            *qi = qi.clamp(deg_to_rad(link.min_deg), deg_to_rad(link.max_deg));
        }
    }
}

fn to_radians(q: &[Deg]) -> Vec<f64> {
    q.iter().map(|d| deg_to_rad(d.0)).collect()
}

impl CartesianSolver for DhChainSolver {
    fn joint_count(&self) -> usize {
        self.links.len()
    }

    fn forward_kinematics(&self, q: &[Deg]) -> Result<Pose> {
        self.check_joints(q)?;
        Ok(Pose::from_isometry(&self.end_effector(&to_radians(q))))
    }

    fn inverse_kinematics(
        &self,
        target: &Pose,
        seed: &[Deg],
        frame: ReferenceFrame,
    ) -> Result<Vec<Deg>> {
        self.check_joints(seed)?;

        let seed_rad = to_radians(seed);
        let goal = match frame {
            ReferenceFrame::Base => target.to_isometry(),
            ReferenceFrame::Tcp => self.end_effector(&seed_rad) * target.to_isometry(),
        };

        let mut q = DVector::from_vec(seed_rad);
        let lambda_sq = self.damping * self.damping;

        for iteration in 0..self.max_iterations {
            let current = self.end_effector(q.as_slice());
            let dp = goal.translation.vector - current.translation.vector;
            let dr = rotation_vector(&(goal.rotation * current.rotation.inverse()));
            let error = DVector::from_iterator(6, dp.iter().chain(dr.iter()).copied());

            if error.norm() < self.tolerance {
                trace!("IK converged after {} iterations", iteration);
                return Ok(q.iter().map(|&r| Deg(rad_to_deg(r))).collect());
            }

            let j = self.jacobian(q.as_slice());
            let jjt = &j * j.transpose() + DMatrix::identity(6, 6) * lambda_sq;
            let step = jjt.lu().solve(&error).ok_or_else(|| {
                KinematicsError::Singular("damped normal matrix not invertible".to_string())
            })?;

            q += j.transpose() * step;
            self.clamp_to_limits(&mut q);
        }

        debug!("IK did not converge within {} iterations", self.max_iterations);
        Err(KinematicsError::Unreachable(format!(
            "no solution within {} iterations",
            self.max_iterations
        )))
    }

    fn differential_inverse_kinematics(
        &self,
        q: &[Deg],
        twist: &Twist,
        frame: ReferenceFrame,
    ) -> Result<Vec<Deg>> {
        self.check_joints(q)?;
        let q_rad = to_radians(q);

        let (linear, angular) = match frame {
            ReferenceFrame::Base => (twist.linear, twist.angular),
            ReferenceFrame::Tcp => {
                let rot = self.end_effector(&q_rad).rotation;
                (rot * twist.linear, rot * twist.angular)
            },
        };

        let xi = DVector::from_iterator(6, linear.iter().chain(angular.iter()).copied());
        let jacobian = self.jacobian(&q_rad);
        let svd = jacobian.clone().svd(true, true);

        let min_sv = svd.singular_values.iter().copied().fold(f64::INFINITY, f64::min);
        if min_sv < MIN_SINGULAR_VALUE {
            return Err(KinematicsError::Singular(format!(
                "smallest singular value {min_sv:.3e}"
            )));
        }

        let qdot = svd
            .solve(&xi, MIN_SINGULAR_VALUE)
            .map_err(|e| KinematicsError::Singular(e.to_string()))?;

        // 最小二乘解无法复现目标速度：目标不在雅可比列空间内
        let residual = (&jacobian * &qdot - &xi).norm();
        if residual > MAX_TWIST_RESIDUAL * xi.norm().max(1.0) {
            return Err(KinematicsError::Singular(format!(
                "twist not achievable from this configuration (residual {residual:.3e})"
            )));
        }

        Ok(qdot.iter().map(|&r| Deg(rad_to_deg(r))).collect())
    }
}
