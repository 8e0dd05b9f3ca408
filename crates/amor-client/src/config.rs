//! 设备配置
//!
//! TOML 格式，所有字段都有默认值：
//!
//! ```toml
//! cartesian_controller = "cartesian"
//! can_library = "libeddriver.so"
//! can_port = 0
//!
//! [controller]
//! gain = 0.05
//! wait_period_ms = 30.0
//! reference_frame = "base"
//!
//! [[kinematics]]
//! a = 0.0
//! d = 0.3
//! alpha = -1.5707963267948966
//! min_deg = -170.0
//! max_deg = 170.0
//! ```

use crate::cartesian::ControllerConfig;
use crate::types::{Result, RobotError};
use amor_driver::NUM_JOINTS;
use amor_kinematics::{DhChainSolver, DhLink};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;
use std::fs;
use std::path::Path;
use tracing::debug;

/// 默认 CAN 驱动库
pub const DEFAULT_CAN_LIBRARY: &str = "libeddriver.so";

/// 默认 CAN 端口
pub const DEFAULT_CAN_PORT: u32 = 0;

/// AMOR 的名义运动学链（7 个转动关节）
pub fn nominal_chain() -> Vec<DhLink> {
    vec![
        DhLink::new(0.0, 0.30, -FRAC_PI_2).with_limits(-170.0, 170.0),
        DhLink::new(0.0, 0.0, FRAC_PI_2).with_limits(-110.0, 110.0),
        DhLink::new(0.0, 0.40, -FRAC_PI_2).with_limits(-170.0, 170.0),
        DhLink::new(0.0, 0.0, FRAC_PI_2).with_limits(-120.0, 120.0),
        DhLink::new(0.0, 0.35, -FRAC_PI_2).with_limits(-170.0, 170.0),
        DhLink::new(0.0, 0.0, FRAC_PI_2).with_limits(-120.0, 120.0),
        DhLink::new(0.0, 0.12, 0.0).with_limits(-175.0, 175.0),
    ]
}

/// 设备配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// 笛卡尔控制器名称，缺省时不创建笛卡尔控制器
    pub cartesian_controller: Option<String>,
    /// CAN 驱动库
    pub can_library: String,
    /// CAN 端口
    pub can_port: u32,
    /// 笛卡尔控制器参数
    pub controller: ControllerConfig,
    /// 运动学链
    pub kinematics: Vec<DhLink>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            cartesian_controller: None,
            can_library: DEFAULT_CAN_LIBRARY.to_string(),
            can_port: DEFAULT_CAN_PORT,
            controller: ControllerConfig::default(),
            kinematics: nominal_chain(),
        }
    }
}

impl DeviceConfig {
    /// 从 TOML 字符串解析并校验
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: DeviceConfig =
            toml::from_str(content).map_err(|e| RobotError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 从文件加载
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading device config from {}", path.display());

        let content = fs::read_to_string(path)
            .map_err(|e| RobotError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// 序列化为 TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| RobotError::Config(e.to_string()))
    }

    /// 保存到文件
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_toml_string()?)
            .map_err(|e| RobotError::Config(format!("{}: {}", path.display(), e)))
    }

    /// 是否启用笛卡尔控制器
    pub fn cartesian_enabled(&self) -> bool {
        self.cartesian_controller.is_some()
    }

    /// 校验
    pub fn validate(&self) -> Result<()> {
        if self.kinematics.len() != NUM_JOINTS {
            return Err(RobotError::Config(format!(
                "kinematic chain has {} links, expected {}",
                self.kinematics.len(),
                NUM_JOINTS
            )));
        }
        self.controller
            .validate()
            .map_err(|e| RobotError::Config(e.to_string()))
    }

    /// 按运动学链构建求解器
    pub fn build_solver(&self) -> Result<DhChainSolver> {
        DhChainSolver::new(self.kinematics.clone()).map_err(|e| RobotError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amor_kinematics::ReferenceFrame;
    use std::io::Write;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = DeviceConfig::from_toml_str("").unwrap();
        assert_eq!(config, DeviceConfig::default());
        assert_eq!(config.can_library, "libeddriver.so");
        assert_eq!(config.can_port, 0);
        assert!(!config.cartesian_enabled());
    }

    #[test]
    fn test_partial_toml() {
        let config = DeviceConfig::from_toml_str(
            r#"
cartesian_controller = "cartesian"
can_port = 2

[controller]
reference_frame = "tcp"
wait_period_ms = 10.0
"#,
        )
        .unwrap();

        assert!(config.cartesian_enabled());
        assert_eq!(config.can_port, 2);
        assert_eq!(config.controller.reference_frame, ReferenceFrame::Tcp);
        assert_eq!(config.controller.wait_period_ms, 10.0);
        assert_eq!(config.controller.gain, 0.05);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = DeviceConfig::from_toml_str("[controller]\nwait_period_ms = 0.0\n").unwrap_err();
        assert!(matches!(err, RobotError::Config(_)));

        let err = DeviceConfig::from_toml_str("[controller]\nreference_frame = \"world\"\n")
            .unwrap_err();
        assert!(matches!(err, RobotError::Config(_)));

        let err = DeviceConfig::from_toml_str(
            "[[kinematics]]\na = 0.0\nd = 0.1\nalpha = 0.0\nmin_deg = -90.0\nmax_deg = 90.0\n",
        )
        .unwrap_err();
        assert!(matches!(err, RobotError::Config(_)));
    }

    #[test]
    fn test_save_and_load() {
        let mut config = DeviceConfig {
            cartesian_controller: Some("cartesian".to_string()),
            ..DeviceConfig::default()
        };
        config.controller.gain = 0.2;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        config.save(&path).unwrap();

        let loaded = DeviceConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_from_handwritten_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "can_library = \"libother.so\"").unwrap();

        let config = DeviceConfig::load(file.path()).unwrap();
        assert_eq!(config.can_library, "libother.so");
    }

    #[test]
    fn test_missing_file() {
        let err = DeviceConfig::load("/nonexistent/amor.toml").unwrap_err();
        assert!(matches!(err, RobotError::Config(_)));
    }

    #[test]
    fn test_build_solver() {
        let solver = DeviceConfig::default().build_solver().unwrap();
        assert_eq!(solver.links().len(), NUM_JOINTS);
    }
}
