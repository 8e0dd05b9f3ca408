//! 笛卡尔控制器参数

use crate::types::{Result, RobotError};
use amor_kinematics::ReferenceFrame;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::error;

/// 默认增益
pub const DEFAULT_GAIN: f64 = 0.05;

/// 默认轮询周期（毫秒）
pub const DEFAULT_WAIT_PERIOD_MS: f64 = 30.0;

/// 参考系的数值编码（用于按数值读写参数）
const FRAME_BASE_CODE: f64 = 0.0;
const FRAME_TCP_CODE: f64 = 1.0;

/// 参数键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConfigParam {
    /// 控制增益（≥ 0）
    Gain,
    /// 等待轮询周期（毫秒，> 0）
    WaitPeriod,
    /// 参考系（0 = base，1 = tcp）
    Frame,
}

impl ConfigParam {
    /// 所有参数
    pub const ALL: [ConfigParam; 3] = [ConfigParam::Gain, ConfigParam::WaitPeriod, ConfigParam::Frame];

    /// 参数名
    pub const fn name(self) -> &'static str {
        match self {
            ConfigParam::Gain => "gain",
            ConfigParam::WaitPeriod => "wait_period",
            ConfigParam::Frame => "frame",
        }
    }
}

impl fmt::Display for ConfigParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ConfigParam {
    type Err = RobotError;

    fn from_str(s: &str) -> Result<Self> {
        ConfigParam::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| RobotError::invalid_argument(format!("unknown config parameter '{s}'")))
    }
}

/// 参考系 → 数值编码
pub fn frame_code(frame: ReferenceFrame) -> f64 {
    match frame {
        ReferenceFrame::Base => FRAME_BASE_CODE,
        ReferenceFrame::Tcp => FRAME_TCP_CODE,
    }
}

/// 数值编码 → 参考系
pub fn frame_from_code(value: f64) -> Option<ReferenceFrame> {
    if value == FRAME_BASE_CODE {
        Some(ReferenceFrame::Base)
    } else if value == FRAME_TCP_CODE {
        Some(ReferenceFrame::Tcp)
    } else {
        None
    }
}

fn period_from_ms(ms: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(ms / 1000.0).ok()
}

/// 控制器参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// 控制增益
    pub gain: f64,
    /// 等待轮询周期（毫秒）
    pub wait_period_ms: f64,
    /// 参考系
    pub reference_frame: ReferenceFrame,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            gain: DEFAULT_GAIN,
            wait_period_ms: DEFAULT_WAIT_PERIOD_MS,
            reference_frame: ReferenceFrame::Base,
        }
    }
}

impl ControllerConfig {
    /// 轮询周期
    ///
    /// 字段被直接写入无法表示的值时回退到默认周期。
    pub fn wait_period(&self) -> Duration {
        period_from_ms(self.wait_period_ms)
            .unwrap_or(Duration::from_millis(DEFAULT_WAIT_PERIOD_MS as u64))
    }

    /// 读取参数（数值形式）
    pub fn get(&self, param: ConfigParam) -> f64 {
        match param {
            ConfigParam::Gain => self.gain,
            ConfigParam::WaitPeriod => self.wait_period_ms,
            ConfigParam::Frame => frame_code(self.reference_frame),
        }
    }

    /// 校验并写入参数
    ///
    /// 校验失败时参数保持不变。
    pub fn set(&mut self, param: ConfigParam, value: f64) -> Result<()> {
        match param {
            ConfigParam::Gain => {
                if value.is_nan() || value < 0.0 {
                    error!("Controller gain cannot be negative");
                    return Err(RobotError::invalid_argument(format!(
                        "gain must be >= 0, got {value}"
                    )));
                }
                self.gain = value;
            },
            ConfigParam::WaitPeriod => {
                if !value.is_finite() || value <= 0.0 {
                    error!("Wait period cannot be negative nor zero");
                    return Err(RobotError::invalid_argument(format!(
                        "wait period must be > 0 ms, got {value}"
                    )));
                }
                if period_from_ms(value).is_none() {
                    error!("Wait period too large: {}", value);
                    return Err(RobotError::invalid_argument(format!(
                        "wait period of {value} ms is out of range"
                    )));
                }
                self.wait_period_ms = value;
            },
            ConfigParam::Frame => {
                let Some(frame) = frame_from_code(value) else {
                    error!("Unrecognized or unsupported reference frame: {}", value);
                    return Err(RobotError::invalid_argument(format!(
                        "unknown reference frame code {value}"
                    )));
                };
                self.reference_frame = frame;
            },
        }
        Ok(())
    }

    /// 校验整体配置
    pub fn validate(&self) -> Result<()> {
        let mut probe = ControllerConfig::default();
        for param in ConfigParam::ALL {
            probe.set(param, self.get(param))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ControllerConfig::default();
        assert_eq!(config.gain, DEFAULT_GAIN);
        assert_eq!(config.wait_period(), Duration::from_millis(30));
        assert_eq!(config.reference_frame, ReferenceFrame::Base);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_values_leave_config_unchanged() {
        let mut config = ControllerConfig::default();

        assert!(config.set(ConfigParam::Gain, -0.1).is_err());
        assert!(config.set(ConfigParam::Gain, f64::NAN).is_err());
        assert!(config.set(ConfigParam::WaitPeriod, 0.0).is_err());
        assert!(config.set(ConfigParam::WaitPeriod, -5.0).is_err());
        assert!(config.set(ConfigParam::Frame, 2.0).is_err());
        assert_eq!(config, ControllerConfig::default());
    }

    #[test]
    fn test_set_and_get() {
        let mut config = ControllerConfig::default();
        config.set(ConfigParam::Gain, 0.0).unwrap();
        config.set(ConfigParam::WaitPeriod, 5.0).unwrap();
        config.set(ConfigParam::Frame, 1.0).unwrap();

        assert_eq!(config.get(ConfigParam::Gain), 0.0);
        assert_eq!(config.get(ConfigParam::WaitPeriod), 5.0);
        assert_eq!(config.reference_frame, ReferenceFrame::Tcp);
        assert_eq!(config.get(ConfigParam::Frame), 1.0);
    }

    #[test]
    fn test_wait_period_out_of_duration_range() {
        let mut config = ControllerConfig::default();

        assert!(matches!(
            config.set(ConfigParam::WaitPeriod, 1e300),
            Err(RobotError::InvalidArgument(_))
        ));
        assert_eq!(config.wait_period(), Duration::from_millis(30));

        let loaded = ControllerConfig {
            wait_period_ms: f64::MAX,
            ..ControllerConfig::default()
        };
        assert!(loaded.validate().is_err());

        config.set(ConfigParam::WaitPeriod, 60_000.0).unwrap();
        assert_eq!(config.wait_period(), Duration::from_secs(60));
    }

    #[test]
    fn test_param_names() {
        assert_eq!("wait_period".parse::<ConfigParam>().unwrap(), ConfigParam::WaitPeriod);
        assert!("speed".parse::<ConfigParam>().is_err());
        assert_eq!(ConfigParam::Frame.to_string(), "frame");
    }

    #[test]
    fn test_validate_rejects_bad_config() {
        let config = ControllerConfig {
            wait_period_ms: 0.0,
            ..ControllerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
