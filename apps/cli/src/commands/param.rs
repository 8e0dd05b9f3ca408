//! 控制器参数命令

use amor_sdk::client::cartesian::frame_code;
use amor_sdk::kinematics::ReferenceFrame;
use amor_sdk::{AmorDevice, ConfigParam};
use anyhow::{Context, Result};
use clap::Subcommand;

use super::cartesian::cartesian;

/// 参数命令
#[derive(Subcommand, Debug)]
pub enum ParamCommand {
    /// 读取参数（缺省时读取全部）
    Get {
        /// gain / wait_period / frame
        name: Option<String>,
    },

    /// 设置参数（仅在未控制时允许）
    Set {
        /// gain / wait_period / frame
        name: String,

        /// 数值；frame 也接受 base / tcp
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
}

/// 解析参数值
fn parse_value(param: ConfigParam, value: &str) -> Result<f64> {
    if param == ConfigParam::Frame {
        match value.to_ascii_lowercase().as_str() {
            "base" => return Ok(frame_code(ReferenceFrame::Base)),
            "tcp" => return Ok(frame_code(ReferenceFrame::Tcp)),
            _ => {},
        }
    }
    value
        .parse()
        .with_context(|| format!("Invalid value '{value}' for {param}"))
}

impl ParamCommand {
    pub fn execute(&self, device: &AmorDevice) -> Result<()> {
        let controller = cartesian(device)?;

        match self {
            ParamCommand::Get { name: Some(name) } => {
                let param: ConfigParam = name.parse()?;
                println!("{} = {}", param, controller.parameter(param));
            },
            ParamCommand::Get { name: None } => {
                for (param, value) in controller.parameters() {
                    println!("{param} = {value}");
                }
            },
            ParamCommand::Set { name, value } => {
                let param: ConfigParam = name.parse()?;
                controller.set_parameter(param, parse_value(param, value)?)?;
                println!("✅ {} = {}", param, controller.parameter(param));
            },
        }
        Ok(())
    }
}
