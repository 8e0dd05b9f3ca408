//! 关节空间命令

use amor_sdk::AmorDevice;
use amor_sdk::client::Deg;
use anyhow::Result;
use clap::Args;

/// `joints` 参数
#[derive(Args, Debug)]
pub struct JointsArgs {
    /// 以 JSON 输出
    #[arg(long)]
    pub json: bool,
}

impl JointsArgs {
    pub fn execute(&self, device: &AmorDevice) -> Result<()> {
        let joints = device.joints();
        let positions = joints.encoders()?;

        if self.json {
            let values: Vec<f64> = positions.iter().map(|d| d.0).collect();
            println!("{}", serde_json::to_string(&values)?);
            return Ok(());
        }

        println!("📊 Joint positions:");
        for (index, position) in positions.iter().enumerate() {
            println!(
                "  {:>4}: {:>9.3}° ({:.4} rad)",
                joints.axis_name(index)?,
                position.0,
                position.to_rad().0
            );
        }
        Ok(())
    }
}

/// `jog` 参数
#[derive(Args, Debug)]
pub struct JogArgs {
    /// 关节索引（0-6）
    pub joint: usize,

    /// 目标角度或增量（度）
    #[arg(allow_hyphen_values = true)]
    pub degrees: f64,

    /// 相对当前位置移动
    #[arg(short, long)]
    pub relative: bool,
}

impl JogArgs {
    pub fn execute(&self, device: &AmorDevice) -> Result<()> {
        let joints = device.joints();
        if self.relative {
            joints.relative_move(self.joint, Deg(self.degrees))?;
        } else {
            joints.position_move(self.joint, Deg(self.degrees))?;
        }

        let reached = joints.target_position(self.joint)?;
        println!(
            "✅ {} -> {:.3}°",
            joints.axis_name(self.joint)?,
            reached.0
        );
        Ok(())
    }
}
