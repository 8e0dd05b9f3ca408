//! 位姿与速度的表示编解码
//!
//! 内部统一使用 [`Pose`]：位置（米）+ 旋转向量（即缩放轴角，弧度）。
//! 对外的位姿向量必须同时声明坐标系与姿态表示（[`EncodedPose`]），
//! 两者之间通过 [`encode_pose`] / [`decode_pose`] 转换。
//!
//! # 支持的表示
//!
//! | 姿态表示 | 分量数 | 说明 |
//! |----------|--------|------|
//! | `AxisAngle` | 4 | 单位轴 + 角度 |
//! | `AxisAngleScaled` | 3 | 旋转向量（内部表示） |
//! | `Rpy` | 3 | 固定轴 X-Y-Z，`R = Rz(y)·Ry(p)·Rx(r)` |
//! | `EulerZyz` | 3 | `R = Rz(α)·Ry(β)·Rz(γ)` |
//! | `RotationMatrix` | 9 | 行优先展开 |
//! | `Quaternion` | 4 | `(w, x, y, z)`，解码时取 `w ≥ 0` |
//!
//! 位置可以是笛卡尔 `(x, y, z)`、柱坐标 `(ρ, φ, z)` 或球坐标 `(r, φ, θ)`
//! （φ 为方位角，θ 为极角）。
//!
//! # 速度
//!
//! 速度转换依赖当前位姿（角速度与表示导数之间的映射随姿态变化），
//! 因此 [`encode_velocity`] / [`decode_velocity`] 额外接收当前位姿。
//!
//! # 示例
//!
//! ```rust
//! use amor_kinematics::representation::*;
//!
//! let pose = encode_pose(&[0.1, 0.0, 0.0, 0.0, 0.0, 0.0], CoordinateSystem::Cartesian, OrientationSystem::Rpy).unwrap();
//! let rpy = decode_pose(&pose, CoordinateSystem::Cartesian, OrientationSystem::Rpy);
//! assert!((rpy.values[0] - 0.1).abs() < 1e-12);
//! ```

use crate::error::{KinematicsError, Result};
use nalgebra::{Isometry3, Matrix3, Quaternion, Rotation3, Translation3, UnitQuaternion, Vector3};
use smallvec::SmallVec;
use std::fmt;

/// 四元数归一化阈值（避免除零）
const QUATERNION_NORM_THRESHOLD: f64 = 1e-10;

/// 轴角表示中判定"零旋转"的阈值
const AXIS_NORM_THRESHOLD: f64 = 1e-12;

/// 速率映射矩阵行列式低于此值视为奇异
const SINGULARITY_THRESHOLD: f64 = 1e-6;

/// 旋转矩阵正交性容差，超出时先投影到 SO(3)
const ORTHONORMAL_TOLERANCE: f64 = 1e-6;

/// 编码后的分量存储（位置 3 + 姿态至多 9）
pub type Components = SmallVec<[f64; 12]>;

/// 位置坐标系
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CoordinateSystem {
    /// 笛卡尔坐标 `(x, y, z)`
    #[default]
    Cartesian,
    /// 柱坐标 `(ρ, φ, z)`
    Cylindrical,
    /// 球坐标 `(r, φ, θ)`
    Spherical,
}

/// 姿态表示
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OrientationSystem {
    /// 单位轴 + 角度（4 分量）
    AxisAngle,
    /// 旋转向量（3 分量）
    #[default]
    AxisAngleScaled,
    /// Roll-Pitch-Yaw（3 分量）
    Rpy,
    /// ZYZ 欧拉角（3 分量）
    EulerZyz,
    /// 旋转矩阵（9 分量，行优先）
    RotationMatrix,
    /// 四元数 `(w, x, y, z)`（4 分量）
    Quaternion,
}

impl OrientationSystem {
    /// 姿态分量数
    pub const fn components(self) -> usize {
        match self {
            OrientationSystem::AxisAngle | OrientationSystem::Quaternion => 4,
            OrientationSystem::AxisAngleScaled
            | OrientationSystem::Rpy
            | OrientationSystem::EulerZyz => 3,
            OrientationSystem::RotationMatrix => 9,
        }
    }
}

/// 内部位姿：位置（米）+ 旋转向量（弧度）
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pose {
    /// 位置（米）
    pub position: Vector3<f64>,
    /// 旋转向量（方向为转轴，模长为转角）
    pub rotation: Vector3<f64>,
}

impl Pose {
    /// 原点、无旋转
    pub fn identity() -> Self {
        Pose {
            position: Vector3::zeros(),
            rotation: Vector3::zeros(),
        }
    }

    /// 创建新的位姿
    pub fn new(position: Vector3<f64>, rotation: Vector3<f64>) -> Self {
        Pose { position, rotation }
    }

    /// 从 6 元数组创建（前 3 位置，后 3 旋转向量）
    pub fn from_array(v: [f64; 6]) -> Self {
        Pose {
            position: Vector3::new(v[0], v[1], v[2]),
            rotation: Vector3::new(v[3], v[4], v[5]),
        }
    }

    /// 从切片创建，长度必须为 6
    pub fn from_slice(v: &[f64]) -> Result<Self> {
        KinematicsError::check_size(6, v.len())?;
        Ok(Pose::from_array([v[0], v[1], v[2], v[3], v[4], v[5]]))
    }

    /// 转换为 6 元数组
    pub fn to_array(&self) -> [f64; 6] {
        [
            self.position.x,
            self.position.y,
            self.position.z,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        ]
    }

    /// 姿态（单位四元数）
    pub fn orientation(&self) -> UnitQuaternion<f64> {
        UnitQuaternion::from_scaled_axis(self.rotation)
    }

    /// 转换为齐次变换
    pub fn to_isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(Translation3::from(self.position), self.orientation())
    }

    /// 从齐次变换创建
    pub fn from_isometry(iso: &Isometry3<f64>) -> Self {
        Pose {
            position: iso.translation.vector,
            rotation: rotation_vector(&iso.rotation),
        }
    }

    /// 逐分量相加（用于相对运动）
    pub fn offset_by(&self, delta: &Pose) -> Pose {
        Pose {
            position: self.position + delta.position,
            rotation: self.rotation + delta.rotation,
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Pose::identity()
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.4}, {:.4}, {:.4} | {:.4}, {:.4}, {:.4}]",
            self.position.x,
            self.position.y,
            self.position.z,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z
        )
    }
}

/// 内部速度旋量：线速度（m/s）+ 角速度（rad/s），均在基座系下表示
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Twist {
    /// 线速度（m/s）
    pub linear: Vector3<f64>,
    /// 角速度（rad/s）
    pub angular: Vector3<f64>,
}

impl Twist {
    /// 零速度
    pub fn zero() -> Self {
        Twist {
            linear: Vector3::zeros(),
            angular: Vector3::zeros(),
        }
    }

    /// 从 6 元数组创建
    pub fn from_array(v: [f64; 6]) -> Self {
        Twist {
            linear: Vector3::new(v[0], v[1], v[2]),
            angular: Vector3::new(v[3], v[4], v[5]),
        }
    }

    /// 从切片创建，长度必须为 6
    pub fn from_slice(v: &[f64]) -> Result<Self> {
        KinematicsError::check_size(6, v.len())?;
        Ok(Twist::from_array([v[0], v[1], v[2], v[3], v[4], v[5]]))
    }

    /// 转换为 6 元数组
    pub fn to_array(&self) -> [f64; 6] {
        [
            self.linear.x,
            self.linear.y,
            self.linear.z,
            self.angular.x,
            self.angular.y,
            self.angular.z,
        ]
    }
}

/// 带表示声明的位姿向量
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedPose {
    /// 分量（位置在前，姿态在后）
    pub values: Components,
    /// 位置坐标系
    pub coordinates: CoordinateSystem,
    /// 姿态表示
    pub orientation: OrientationSystem,
}

impl EncodedPose {
    /// 分量切片
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

/// 带表示声明的速度向量（各分量为所选表示的时间导数）
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedTwist {
    /// 分量（位置导数在前，姿态导数在后）
    pub values: Components,
    /// 位置坐标系
    pub coordinates: CoordinateSystem,
    /// 姿态表示
    pub orientation: OrientationSystem,
}

impl EncodedTwist {
    /// 分量切片
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

/// 期望的向量长度
fn expected_len(orientation: OrientationSystem) -> usize {
    3 + orientation.components()
}

/// 单位四元数 → 旋转向量（取 `w ≥ 0` 的半球，atan2 保证小角度精度）
pub(crate) fn rotation_vector(q: &UnitQuaternion<f64>) -> Vector3<f64> {
    let (w, v) = if q.w < 0.0 {
        (-q.w, -q.imag())
    } else {
        (q.w, q.imag())
    };

    let n = v.norm();
    if n < f64::EPSILON {
        return v * 2.0;
    }

    let angle = 2.0 * n.atan2(w);
    v * (angle / n)
}

/// 取 `w ≥ 0` 的四元数
fn canonical(q: &UnitQuaternion<f64>) -> Quaternion<f64> {
    let q = *q.quaternion();
    if q.w < 0.0 { -q } else { q }
}

// ==================== 位置 ====================

fn encode_position(v: &[f64], coordinates: CoordinateSystem) -> Vector3<f64> {
    match coordinates {
        CoordinateSystem::Cartesian => Vector3::new(v[0], v[1], v[2]),
        CoordinateSystem::Cylindrical => {
            let (rho, phi, z) = (v[0], v[1], v[2]);
            Vector3::new(rho * phi.cos(), rho * phi.sin(), z)
        },
        CoordinateSystem::Spherical => {
            let (r, phi, theta) = (v[0], v[1], v[2]);
            Vector3::new(
                r * theta.sin() * phi.cos(),
                r * theta.sin() * phi.sin(),
                r * theta.cos(),
            )
        },
    }
}

fn decode_position(p: &Vector3<f64>, coordinates: CoordinateSystem) -> [f64; 3] {
    match coordinates {
        CoordinateSystem::Cartesian => [p.x, p.y, p.z],
        CoordinateSystem::Cylindrical => [p.x.hypot(p.y), p.y.atan2(p.x), p.z],
        CoordinateSystem::Spherical => {
            let r = p.norm();
            let theta = if r > 0.0 { p.x.hypot(p.y).atan2(p.z) } else { 0.0 };
            [r, p.y.atan2(p.x), theta]
        },
    }
}

/// 位置参数对笛卡尔位置的雅可比（列为各参数的偏导）
fn position_jacobian(params: &[f64; 3], coordinates: CoordinateSystem) -> Matrix3<f64> {
    match coordinates {
        CoordinateSystem::Cartesian => Matrix3::identity(),
        CoordinateSystem::Cylindrical => {
            let (rho, phi) = (params[0], params[1]);
            let (s, c) = phi.sin_cos();
            Matrix3::new(c, -rho * s, 0.0, s, rho * c, 0.0, 0.0, 0.0, 1.0)
        },
        CoordinateSystem::Spherical => {
            let (r, phi, theta) = (params[0], params[1], params[2]);
            let (sp, cp) = phi.sin_cos();
            let (st, ct) = theta.sin_cos();
            Matrix3::new(
                st * cp,
                -r * st * sp,
                r * ct * cp,
                st * sp,
                r * st * cp,
                r * ct * sp,
                ct,
                0.0,
                -r * st,
            )
        },
    }
}

// ==================== 姿态 ====================

fn rot_z(angle: f64) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Vector3::z_axis(), angle)
}

fn rot_y(angle: f64) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Vector3::y_axis(), angle)
}

fn encode_orientation(v: &[f64], orientation: OrientationSystem) -> Vector3<f64> {
    match orientation {
        OrientationSystem::AxisAngleScaled => Vector3::new(v[0], v[1], v[2]),
        OrientationSystem::AxisAngle => {
            let axis = Vector3::new(v[0], v[1], v[2]);
            let norm = axis.norm();
            if norm < AXIS_NORM_THRESHOLD {
                Vector3::zeros()
            } else {
                axis * (v[3] / norm)
            }
        },
        OrientationSystem::Rpy => {
            rotation_vector(&UnitQuaternion::from_euler_angles(v[0], v[1], v[2]))
        },
        OrientationSystem::EulerZyz => {
            let rot = rot_z(v[0]) * rot_y(v[1]) * rot_z(v[2]);
            rotation_vector(&UnitQuaternion::from_rotation_matrix(&rot))
        },
        OrientationSystem::RotationMatrix => {
            let m = Matrix3::from_row_slice(&v[..9]);
            let rot = if (m.transpose() * m - Matrix3::identity()).norm() < ORTHONORMAL_TOLERANCE {
                Rotation3::from_matrix_unchecked(m)
            } else {
                Rotation3::from_matrix(&m)
            };
            rotation_vector(&UnitQuaternion::from_rotation_matrix(&rot))
        },
        OrientationSystem::Quaternion => {
            let q = Quaternion::new(v[0], v[1], v[2], v[3]);
            if q.norm_squared() < QUATERNION_NORM_THRESHOLD {
                tracing::warn!(
                    "Encoding near-zero quaternion ({:.3}, {:.3}, {:.3}, {:.3}) as identity",
                    v[0],
                    v[1],
                    v[2],
                    v[3]
                );
                return Vector3::zeros();
            }
            rotation_vector(&UnitQuaternion::from_quaternion(q))
        },
    }
}

fn decode_orientation(rotation: &Vector3<f64>, orientation: OrientationSystem) -> Components {
    let q = UnitQuaternion::from_scaled_axis(*rotation);
    let mut out = Components::new();

    match orientation {
        OrientationSystem::AxisAngleScaled => out.extend_from_slice(rotation.as_slice()),
        OrientationSystem::AxisAngle => {
            let angle = rotation.norm();
            if angle < AXIS_NORM_THRESHOLD {
                out.extend_from_slice(&[0.0, 0.0, 1.0, 0.0]);
            } else {
                let axis = rotation / angle;
                out.extend_from_slice(&[axis.x, axis.y, axis.z, angle]);
            }
        },
        OrientationSystem::Rpy => {
            let (roll, pitch, yaw) = q.euler_angles();
            out.extend_from_slice(&[roll, pitch, yaw]);
        },
        OrientationSystem::EulerZyz => out.extend_from_slice(&zyz_angles(&q.to_rotation_matrix())),
        OrientationSystem::RotationMatrix => {
            let m = q.to_rotation_matrix();
            let m = m.matrix();
            for row in 0..3 {
                for col in 0..3 {
                    out.push(m[(row, col)]);
                }
            }
        },
        OrientationSystem::Quaternion => {
            let q = canonical(&q);
            out.extend_from_slice(&[q.w, q.i, q.j, q.k]);
        },
    }

    out
}

/// 旋转矩阵 → ZYZ 欧拉角 `(α, β, γ)`，β ∈ [0, π]
fn zyz_angles(rot: &Rotation3<f64>) -> [f64; 3] {
    let m = rot.matrix();
    let beta = m[(0, 2)].hypot(m[(1, 2)]).atan2(m[(2, 2)]);

    if beta.abs() < 1e-12 {
        // 万向节锁：α 与 γ 合并
        [0.0, beta, m[(1, 0)].atan2(m[(0, 0)])]
    } else if (beta - std::f64::consts::PI).abs() < 1e-12 {
        [0.0, beta, (-m[(0, 1)]).atan2(-m[(0, 0)])]
    } else {
        [
            m[(1, 2)].atan2(m[(0, 2)]),
            beta,
            m[(2, 1)].atan2(-m[(2, 0)]),
        ]
    }
}

/// 欧拉角速率 → 角速度的映射矩阵（列为各角速率对应的转轴）
fn euler_rate_matrix(angles: &[f64], orientation: OrientationSystem) -> Matrix3<f64> {
    let ex = Vector3::x();
    let ey = Vector3::y();
    let ez = Vector3::z();

    let (c0, c1, c2) = match orientation {
        OrientationSystem::Rpy => {
            let rz = rot_z(angles[2]);
            (rz * rot_y(angles[1]) * ex, rz * ey, ez)
        },
        _ => {
            let rz = rot_z(angles[0]);
            (ez, rz * ey, rz * rot_y(angles[1]) * ez)
        },
    };

    Matrix3::from_columns(&[c0, c1, c2])
}

/// 求逆，行列式过小时报告奇异
fn invert(m: Matrix3<f64>, what: impl FnOnce() -> String) -> Result<Matrix3<f64>> {
    if m.determinant().abs() < SINGULARITY_THRESHOLD {
        return Err(KinematicsError::Singular(what()));
    }
    m.try_inverse().ok_or_else(|| KinematicsError::Singular(what()))
}

/// 反对称矩阵
fn skew(w: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(0.0, -w.z, w.y, w.z, 0.0, -w.x, -w.y, w.x, 0.0)
}

// ==================== 对外接口 ====================

/// 将带表示的位姿向量编码为内部位姿
///
/// # 错误
///
/// - `KinematicsError::InvalidSize`: 向量长度与所声明表示不符
pub fn encode_pose(
    values: &[f64],
    coordinates: CoordinateSystem,
    orientation: OrientationSystem,
) -> Result<Pose> {
    KinematicsError::check_size(expected_len(orientation), values.len())?;

    Ok(Pose {
        position: encode_position(&values[..3], coordinates),
        rotation: encode_orientation(&values[3..], orientation),
    })
}

/// 将内部位姿解码为指定表示
pub fn decode_pose(
    pose: &Pose,
    coordinates: CoordinateSystem,
    orientation: OrientationSystem,
) -> EncodedPose {
    let mut values = Components::new();
    values.extend_from_slice(&decode_position(&pose.position, coordinates));
    values.extend(decode_orientation(&pose.rotation, orientation));

    EncodedPose {
        values,
        coordinates,
        orientation,
    }
}

/// 将表示导数形式的速度编码为内部速度旋量
///
/// `current` 为当前位姿（内部表示），用于计算与姿态相关的映射。
///
/// # 错误
///
/// - `KinematicsError::InvalidSize`: 向量长度不符
/// - `KinematicsError::Unsupported`: 单位轴 + 角度表示没有速率映射
pub fn encode_velocity(
    current: &Pose,
    xdot: &[f64],
    coordinates: CoordinateSystem,
    orientation: OrientationSystem,
) -> Result<Twist> {
    KinematicsError::check_size(expected_len(orientation), xdot.len())?;

    let params = decode_position(&current.position, coordinates);
    let rates = Vector3::new(xdot[0], xdot[1], xdot[2]);
    let linear = position_jacobian(&params, coordinates) * rates;

    let r = &xdot[3..];
    let angular = match orientation {
        OrientationSystem::AxisAngleScaled => Vector3::new(r[0], r[1], r[2]),
        OrientationSystem::Rpy | OrientationSystem::EulerZyz => {
            let angles = decode_orientation(&current.rotation, orientation);
            euler_rate_matrix(&angles, orientation) * Vector3::new(r[0], r[1], r[2])
        },
        OrientationSystem::RotationMatrix => {
            let rot = current.orientation().to_rotation_matrix();
            let s = Matrix3::from_row_slice(&r[..9]) * rot.matrix().transpose();
            Vector3::new(
                0.5 * (s[(2, 1)] - s[(1, 2)]),
                0.5 * (s[(0, 2)] - s[(2, 0)]),
                0.5 * (s[(1, 0)] - s[(0, 1)]),
            )
        },
        OrientationSystem::Quaternion => {
            let q = canonical(&current.orientation());
            let qdot = Quaternion::new(r[0], r[1], r[2], r[3]);
            (qdot * q.conjugate()).imag() * 2.0
        },
        OrientationSystem::AxisAngle => {
            return Err(KinematicsError::Unsupported(
                "velocity in axis-angle representation".to_string(),
            ));
        },
    };

    Ok(Twist { linear, angular })
}

/// 将内部速度旋量解码为指定表示的导数
///
/// # 错误
///
/// - `KinematicsError::Singular`: 当前位姿处于表示奇异处（如 RPY 俯仰 ±90°、柱坐标 ρ = 0）
/// - `KinematicsError::Unsupported`: 单位轴 + 角度表示没有速率映射
pub fn decode_velocity(
    current: &Pose,
    twist: &Twist,
    coordinates: CoordinateSystem,
    orientation: OrientationSystem,
) -> Result<EncodedTwist> {
    let params = decode_position(&current.position, coordinates);
    let jacobian = position_jacobian(&params, coordinates);
    let position_rates = invert(jacobian, || {
        format!("{coordinates:?} coordinates at {params:?}")
    })? * twist.linear;

    let mut values = Components::new();
    values.extend_from_slice(position_rates.as_slice());

    match orientation {
        OrientationSystem::AxisAngleScaled => values.extend_from_slice(twist.angular.as_slice()),
        OrientationSystem::Rpy | OrientationSystem::EulerZyz => {
            let angles = decode_orientation(&current.rotation, orientation);
            let rates = invert(euler_rate_matrix(&angles, orientation), || {
                format!("{orientation:?} angles at {angles:?}")
            })? * twist.angular;
            values.extend_from_slice(rates.as_slice());
        },
        OrientationSystem::RotationMatrix => {
            let rot = current.orientation().to_rotation_matrix();
            let rdot = skew(&twist.angular) * rot.matrix();
            for row in 0..3 {
                for col in 0..3 {
                    values.push(rdot[(row, col)]);
                }
            }
        },
        OrientationSystem::Quaternion => {
            let q = canonical(&current.orientation());
            let omega = Quaternion::from_imag(twist.angular);
            let qdot = omega * q * 0.5;
            values.extend_from_slice(&[qdot.w, qdot.i, qdot.j, qdot.k]);
        },
        OrientationSystem::AxisAngle => {
            return Err(KinematicsError::Unsupported(
                "velocity in axis-angle representation".to_string(),
            ));
        },
    }

    Ok(EncodedTwist {
        values,
        coordinates,
        orientation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use std::f64::consts::FRAC_PI_2;

    const TOL: f64 = 1e-9;

    fn assert_close(a: &[f64], b: &[f64]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < TOL, "{a:?} != {b:?}");
        }
    }

    #[test]
    fn test_component_counts() {
        assert_eq!(OrientationSystem::AxisAngle.components(), 4);
        assert_eq!(OrientationSystem::AxisAngleScaled.components(), 3);
        assert_eq!(OrientationSystem::Rpy.components(), 3);
        assert_eq!(OrientationSystem::RotationMatrix.components(), 9);
        assert_eq!(OrientationSystem::Quaternion.components(), 4);
    }

    #[test]
    fn test_wrong_size_is_rejected() {
        let err = encode_pose(&[0.0; 5], CoordinateSystem::Cartesian, OrientationSystem::Rpy);
        assert_eq!(
            err,
            Err(KinematicsError::InvalidSize {
                expected: 6,
                actual: 5
            })
        );

        let err = encode_pose(
            &[0.0; 6],
            CoordinateSystem::Cartesian,
            OrientationSystem::RotationMatrix,
        );
        assert!(matches!(err, Err(KinematicsError::InvalidSize { expected: 12, .. })));
    }

    #[test]
    fn test_rpy_yaw_matches_axis_angle_about_z() {
        let pose = encode_pose(
            &[0.0, 0.0, 0.0, 0.0, 0.0, FRAC_PI_2],
            CoordinateSystem::Cartesian,
            OrientationSystem::Rpy,
        )
        .unwrap();
        assert_relative_eq!(pose.rotation, Vector3::new(0.0, 0.0, FRAC_PI_2), epsilon = 1e-12);

        let aa = decode_pose(&pose, CoordinateSystem::Cartesian, OrientationSystem::AxisAngle);
        assert_close(&aa.values, &[0.0, 0.0, 0.0, 0.0, 0.0, 1.0, FRAC_PI_2]);
    }

    #[test]
    fn test_identity_rotation_decodes_to_canonical_forms() {
        let pose = Pose::identity();
        let q = decode_pose(&pose, CoordinateSystem::Cartesian, OrientationSystem::Quaternion);
        assert_close(&q.values, &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]);

        let m = decode_pose(&pose, CoordinateSystem::Cartesian, OrientationSystem::RotationMatrix);
        assert_close(
            &m.values,
            &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
        );
    }

    #[test]
    fn test_cylindrical_and_spherical_positions() {
        let pose = encode_pose(
            &[2.0, FRAC_PI_2, 1.0, 0.0, 0.0, 0.0],
            CoordinateSystem::Cylindrical,
            OrientationSystem::Rpy,
        )
        .unwrap();
        assert_relative_eq!(pose.position, Vector3::new(0.0, 2.0, 1.0), epsilon = 1e-12);

        let pose = encode_pose(
            &[1.0, 0.0, FRAC_PI_2, 0.0, 0.0, 0.0],
            CoordinateSystem::Spherical,
            OrientationSystem::Rpy,
        )
        .unwrap();
        assert_relative_eq!(pose.position, Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_near_zero_quaternion_becomes_identity() {
        let pose = encode_pose(
            &[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            CoordinateSystem::Cartesian,
            OrientationSystem::Quaternion,
        )
        .unwrap();
        assert_eq!(pose.rotation, Vector3::zeros());
    }

    #[test]
    fn test_rpy_velocity_at_identity_is_angular_velocity() {
        let twist = encode_velocity(
            &Pose::identity(),
            &[0.1, 0.2, 0.3, 0.4, 0.5, 0.6],
            CoordinateSystem::Cartesian,
            OrientationSystem::Rpy,
        )
        .unwrap();
        assert_close(&twist.to_array(), &[0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
    }

    #[test]
    fn test_rpy_velocity_singular_at_gimbal_lock() {
        let current = encode_pose(
            &[0.0, 0.0, 0.0, 0.0, FRAC_PI_2, 0.0],
            CoordinateSystem::Cartesian,
            OrientationSystem::Rpy,
        )
        .unwrap();
        let twist = Twist::from_array([0.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
        let err = decode_velocity(&current, &twist, CoordinateSystem::Cartesian, OrientationSystem::Rpy);
        assert!(matches!(err, Err(KinematicsError::Singular(_))));
    }

    #[test]
    fn test_axis_angle_velocity_unsupported() {
        let err = encode_velocity(
            &Pose::identity(),
            &[0.0; 7],
            CoordinateSystem::Cartesian,
            OrientationSystem::AxisAngle,
        );
        assert!(matches!(err, Err(KinematicsError::Unsupported(_))));
    }

    #[test]
    fn test_isometry_conversion() {
        let pose = Pose::from_array([0.1, -0.2, 0.3, 0.2, -0.1, 0.4]);
        let back = Pose::from_isometry(&pose.to_isometry());
        assert_close(&back.to_array(), &pose.to_array());
    }

    fn orientation_strategy() -> impl Strategy<Value = (OrientationSystem, Vec<f64>)> {
        prop_oneof![
            prop::array::uniform3(-1.0..1.0f64)
                .prop_map(|v| (OrientationSystem::AxisAngleScaled, v.to_vec())),
            (-3.0..3.0f64, -1.4..1.4f64, -3.0..3.0f64)
                .prop_map(|(r, p, y)| (OrientationSystem::Rpy, vec![r, p, y])),
            (-3.0..3.0f64, 0.1..3.0f64, -3.0..3.0f64)
                .prop_map(|(a, b, g)| (OrientationSystem::EulerZyz, vec![a, b, g])),
            (prop::array::uniform3(-1.0..1.0f64), 0.05..3.0f64)
                .prop_filter("axis must not vanish", |(axis, _)| {
                    Vector3::from(*axis).norm() > 0.1
                })
                .prop_map(|(axis, angle)| {
                    let a = Vector3::from(axis).normalize();
                    (OrientationSystem::AxisAngle, vec![a.x, a.y, a.z, angle])
                }),
            (0.1..1.0f64, prop::array::uniform3(-1.0..1.0f64)).prop_map(|(w, v)| {
                let q = Quaternion::new(w, v[0], v[1], v[2]).normalize();
                (OrientationSystem::Quaternion, vec![q.w, q.i, q.j, q.k])
            }),
            prop::array::uniform3(-1.5..1.5f64).prop_map(|v| {
                let m = Rotation3::new(Vector3::from(v));
                let m = m.matrix();
                let mut out = Vec::with_capacity(9);
                for row in 0..3 {
                    for col in 0..3 {
                        out.push(m[(row, col)]);
                    }
                }
                (OrientationSystem::RotationMatrix, out)
            }),
        ]
    }

    fn position_strategy() -> impl Strategy<Value = (CoordinateSystem, [f64; 3])> {
        prop_oneof![
            prop::array::uniform3(-2.0..2.0f64).prop_map(|p| (CoordinateSystem::Cartesian, p)),
            (0.1..2.0f64, -3.0..3.0f64, -2.0..2.0f64)
                .prop_map(|(rho, phi, z)| (CoordinateSystem::Cylindrical, [rho, phi, z])),
            (0.1..2.0f64, -3.0..3.0f64, 0.1..3.0f64)
                .prop_map(|(r, phi, theta)| (CoordinateSystem::Spherical, [r, phi, theta])),
        ]
    }

    proptest! {
        #[test]
        fn pose_roundtrip(
            (coordinates, position) in position_strategy(),
            (orientation, rotation) in orientation_strategy(),
        ) {
            let mut values = position.to_vec();
            values.extend(rotation);

            let pose = encode_pose(&values, coordinates, orientation).unwrap();
            let back = decode_pose(&pose, coordinates, orientation);

            prop_assert_eq!(back.values.len(), values.len());
            for (a, b) in back.values.iter().zip(&values) {
                prop_assert!((a - b).abs() < TOL, "{:?} vs {:?}", back.values, values);
            }
        }

        #[test]
        fn velocity_roundtrip(
            (coordinates, position) in position_strategy(),
            (orientation, rotation) in orientation_strategy(),
            linear in prop::array::uniform3(-1.0..1.0f64),
            angular in prop::array::uniform3(-1.0..1.0f64),
        ) {
            prop_assume!(orientation != OrientationSystem::AxisAngle);

            let mut values = position.to_vec();
            values.extend(rotation);
            let current = encode_pose(&values, coordinates, orientation).unwrap();

            let twist = Twist {
                linear: Vector3::from(linear),
                angular: Vector3::from(angular),
            };
            let encoded = decode_velocity(&current, &twist, coordinates, orientation).unwrap();
            let back = encode_velocity(&current, &encoded.values, coordinates, orientation).unwrap();

            for (a, b) in back.to_array().iter().zip(twist.to_array().iter()) {
                prop_assert!((a - b).abs() < 1e-8);
            }
        }
    }
}
