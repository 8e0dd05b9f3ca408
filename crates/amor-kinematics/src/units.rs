//! 强类型单位系统
//!
//! 关节空间对外使用角度（`Deg`），与硬件交互使用弧度（`Rad`）。
//! 笛卡尔位置在硬件侧为毫米，对外为米。
//!
//! 换算严格按 `rad·180/π` 与 `deg·π/180` 的运算顺序计算，
//! 不使用 `f64::to_degrees`/`to_radians`（其舍入路径不同）。
//!
//! # 示例
//!
//! ```rust
//! use amor_kinematics::units::{Deg, Rad};
//!
//! let angle = Rad(std::f64::consts::PI).to_deg();
//! assert!((angle.0 - 180.0).abs() < 1e-12);
//! ```

use std::f64::consts::PI;
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// 毫米 → 米
pub const MM_TO_M: f64 = 0.001;

/// 米 → 毫米
pub const M_TO_MM: f64 = 1000.0;

/// 弧度转角度：`rad·180/π`
#[inline]
pub fn rad_to_deg(rad: f64) -> f64 {
    rad * 180.0 / PI
}

/// 角度转弧度：`deg·π/180`
#[inline]
pub fn deg_to_rad(deg: f64) -> f64 {
    deg * PI / 180.0
}

/// 毫米转米
#[inline]
pub fn mm_to_m(mm: f64) -> f64 {
    mm * MM_TO_M
}

/// 米转毫米
#[inline]
pub fn m_to_mm(m: f64) -> f64 {
    m * M_TO_MM
}

/// 弧度（NewType）
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rad(pub f64);

impl Rad {
    /// 零弧度常量
    pub const ZERO: Self = Rad(0.0);

    /// 转换为角度
    #[inline]
    pub fn to_deg(self) -> Deg {
        Deg(rad_to_deg(self.0))
    }

    /// 获取原始值
    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }

    /// 取绝对值
    #[inline]
    pub fn abs(self) -> Self {
        Rad(self.0.abs())
    }
}

impl fmt::Display for Rad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4} rad", self.0)
    }
}

/// 角度（NewType）
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Deg(pub f64);

impl Deg {
    /// 零角度常量
    pub const ZERO: Self = Deg(0.0);

    /// 转换为弧度
    #[inline]
    pub fn to_rad(self) -> Rad {
        Rad(deg_to_rad(self.0))
    }

    /// 获取原始值
    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }

    /// 取绝对值
    #[inline]
    pub fn abs(self) -> Self {
        Deg(self.0.abs())
    }
}

impl fmt::Display for Deg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}°", self.0)
    }
}

macro_rules! impl_angle_ops {
    ($ty:ident) => {
        impl Add for $ty {
            type Output = Self;
            #[inline]
            fn add(self, rhs: Self) -> Self {
                $ty(self.0 + rhs.0)
            }
        }

        impl Sub for $ty {
            type Output = Self;
            #[inline]
            fn sub(self, rhs: Self) -> Self {
                $ty(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $ty {
            type Output = Self;
            #[inline]
            fn mul(self, rhs: f64) -> Self {
                $ty(self.0 * rhs)
            }
        }

        impl Neg for $ty {
            type Output = Self;
            #[inline]
            fn neg(self) -> Self {
                $ty(-self.0)
            }
        }

        impl AddAssign for $ty {
            #[inline]
            fn add_assign(&mut self, rhs: Self) {
                self.0 += rhs.0;
            }
        }

        impl SubAssign for $ty {
            #[inline]
            fn sub_assign(&mut self, rhs: Self) {
                self.0 -= rhs.0;
            }
        }

        impl From<f64> for $ty {
            #[inline]
            fn from(value: f64) -> Self {
                $ty(value)
            }
        }
    };
}

impl_angle_ops!(Rad);
impl_angle_ops!(Deg);

impl From<Rad> for Deg {
    #[inline]
    fn from(rad: Rad) -> Self {
        rad.to_deg()
    }
}

impl From<Deg> for Rad {
    #[inline]
    fn from(deg: Deg) -> Self {
        deg.to_rad()
    }
}
