//! 关节索引和数组
//!
//! 提供编译期安全的关节索引，防止越界和索引错误。
//! 外部传入的 `usize` 索引必须先经过 [`Joint::from_index`] 检查。
//!
//! # 示例
//!
//! ```rust
//! use amor_client::types::{Joint, JointArray};
//! use amor_kinematics::Deg;
//!
//! let positions = JointArray::splat(Deg(10.0));
//! assert_eq!(positions[Joint::A2_5], Deg(10.0));
//!
//! for (joint, pos) in Joint::ALL.iter().zip(positions.iter()) {
//!     println!("{}: {}", joint, pos);
//! }
//! ```

use amor_driver::{JointVector, NUM_JOINTS};
use amor_kinematics::{Deg, Rad};
use std::fmt;
use std::ops::{Index, IndexMut};

/// 关节枚举
///
/// AMOR 的 7 个关节，按硬件轴名命名（第 3 个关节为 `A2.5`）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Joint {
    /// 基座旋转
    A1 = 0,
    /// 肩部
    A2 = 1,
    /// 肩部附加轴
    A2_5 = 2,
    /// 肘部
    A3 = 3,
    /// 前臂旋转
    A4 = 4,
    /// 腕部
    A5 = 5,
    /// 末端旋转
    A6 = 6,
}

impl Joint {
    /// 所有关节的数组
    pub const ALL: [Joint; NUM_JOINTS] = [
        Joint::A1,
        Joint::A2,
        Joint::A2_5,
        Joint::A3,
        Joint::A4,
        Joint::A5,
        Joint::A6,
    ];

    /// 获取关节索引（0-6）
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// 从索引创建关节（范围检查）
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// 硬件轴名
    pub const fn name(self) -> &'static str {
        match self {
            Joint::A1 => "A1",
            Joint::A2 => "A2",
            Joint::A2_5 => "A2.5",
            Joint::A3 => "A3",
            Joint::A4 => "A4",
            Joint::A5 => "A5",
            Joint::A6 => "A6",
        }
    }
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 关节类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JointType {
    /// 旋转关节
    Revolute,
    /// 移动关节
    Prismatic,
}

/// 关节数组
///
/// 类型安全的 7 关节数组容器，支持索引、迭代和映射操作。
#[derive(Debug, Clone, PartialEq)]
pub struct JointArray<T> {
    data: [T; NUM_JOINTS],
}

impl<T: Copy> Copy for JointArray<T> {}

impl<T> JointArray<T> {
    /// 创建新的关节数组
    #[inline]
    pub const fn new(data: [T; NUM_JOINTS]) -> Self {
        JointArray { data }
    }

    /// 获取内部数组的引用
    #[inline]
    pub fn as_array(&self) -> &[T; NUM_JOINTS] {
        &self.data
    }

    /// 获取内部数组（消耗 self）
    #[inline]
    pub fn into_array(self) -> [T; NUM_JOINTS] {
        self.data
    }

    /// 迭代器
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// 可变迭代器
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.data.iter_mut()
    }

    /// 映射转换
    pub fn map<U, F>(self, f: F) -> JointArray<U>
    where
        F: FnMut(T) -> U,
    {
        JointArray::new(self.data.map(f))
    }
}

impl<T: Copy> JointArray<T> {
    /// 创建所有元素相同的数组
    #[inline]
    pub const fn splat(value: T) -> Self {
        JointArray::new([value; NUM_JOINTS])
    }
}

impl<T: Default + Copy> Default for JointArray<T> {
    fn default() -> Self {
        JointArray::splat(T::default())
    }
}

impl JointArray<Deg> {
    /// 转换为硬件关节向量（弧度）
    pub fn to_radians(&self) -> JointVector {
        self.data.map(|d| d.to_rad().0)
    }

    /// 从硬件关节向量（弧度）创建
    pub fn from_radians(v: &JointVector) -> Self {
        JointArray::new(v.map(|r| Rad(r).to_deg()))
    }
}

impl<T> Index<Joint> for JointArray<T> {
    type Output = T;

    #[inline]
    fn index(&self, joint: Joint) -> &T {
        &self.data[joint.index()]
    }
}

impl<T> IndexMut<Joint> for JointArray<T> {
    #[inline]
    fn index_mut(&mut self, joint: Joint) -> &mut T {
        &mut self.data[joint.index()]
    }
}

impl<T> From<[T; NUM_JOINTS]> for JointArray<T> {
    #[inline]
    fn from(data: [T; NUM_JOINTS]) -> Self {
        JointArray::new(data)
    }
}

impl<T> From<JointArray<T>> for [T; NUM_JOINTS] {
    #[inline]
    fn from(arr: JointArray<T>) -> Self {
        arr.data
    }
}

impl<T> IntoIterator for JointArray<T> {
    type Item = T;
    type IntoIter = std::array::IntoIter<T, NUM_JOINTS>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a JointArray<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

/// 关节位置（度）
pub type JointPositions = JointArray<Deg>;

/// 关节速度（度/秒）
pub type JointVelocities = JointArray<Deg>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_index() {
        assert_eq!(Joint::A1.index(), 0);
        assert_eq!(Joint::A2_5.index(), 2);
        assert_eq!(Joint::A6.index(), 6);
    }

    #[test]
    fn test_joint_from_index() {
        assert_eq!(Joint::from_index(0), Some(Joint::A1));
        assert_eq!(Joint::from_index(6), Some(Joint::A6));
        assert_eq!(Joint::from_index(7), None);
        assert_eq!(Joint::from_index(usize::MAX), None);
    }

    #[test]
    fn test_axis_names() {
        let names: Vec<_> = Joint::ALL.iter().map(|j| j.name()).collect();
        assert_eq!(names, ["A1", "A2", "A2.5", "A3", "A4", "A5", "A6"]);
        assert_eq!(format!("{}", Joint::A2_5), "A2.5");
    }

    #[test]
    fn test_radian_conversion() {
        let zero = JointArray::from_radians(&[0.0; NUM_JOINTS]);
        assert_eq!(zero, JointArray::splat(Deg(0.0)));

        let mut deg = JointArray::splat(Deg(0.0));
        deg[Joint::A3] = Deg(180.0);
        let rad = deg.to_radians();
        assert!((rad[3] - std::f64::consts::PI).abs() < 1e-15);
    }

    #[test]
    fn test_into_iter_and_default() {
        let arr: JointArray<i32> = JointArray::default();
        assert_eq!(arr.into_iter().sum::<i32>(), 0);

        let data = [1, 2, 3, 4, 5, 6, 7];
        let back: [i32; NUM_JOINTS] = JointArray::from(data).into();
        assert_eq!(back, data);
    }
}
