//! 笛卡尔空间命令

use amor_sdk::kinematics::{CoordinateSystem, OrientationSystem, decode_pose};
use amor_sdk::{AmorDevice, CartesianController, GripperCommand, Pose, Twist};
use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::time::{Duration, UNIX_EPOCH};

/// 取得笛卡尔控制器（配置未启用时报错）
pub fn cartesian(device: &AmorDevice) -> Result<&CartesianController> {
    device
        .cartesian()
        .context("Cartesian controller not configured (set `cartesian_controller` in config)")
}

/// `stat` 参数
#[derive(Args, Debug)]
pub struct StatArgs {
    /// 以 JSON 输出
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct StatOutput {
    position: [f64; 3],
    rpy: [f64; 3],
    rotation_vector: [f64; 3],
    state: String,
    timestamp_ms: u128,
}

impl StatArgs {
    pub fn execute(&self, device: &AmorDevice) -> Result<()> {
        let report = cartesian(device)?.stat()?;
        let rpy = decode_pose(&report.pose, CoordinateSystem::Cartesian, OrientationSystem::Rpy);
        let rpy = rpy.as_slice();

        let output = StatOutput {
            position: report.pose.position.into(),
            rpy: [rpy[3], rpy[4], rpy[5]],
            rotation_vector: report.pose.rotation.into(),
            state: report.state.to_string(),
            timestamp_ms: report
                .timestamp
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            let [x, y, z] = output.position;
            let [r, p, yaw] = output.rpy;
            println!("📊 Pose (base frame):");
            println!("  position: {x:.4} {y:.4} {z:.4} m");
            println!("  rpy:      {r:.4} {p:.4} {yaw:.4} rad");
            println!("  state:    {}", output.state);
        }
        Ok(())
    }
}

/// 位姿参数 `x,y,z,rx,ry,rz`（米 + 缩放轴角）
#[derive(Args, Debug)]
pub struct PoseArgs {
    /// 目标位姿，逗号分隔的 6 个数
    #[arg(allow_hyphen_values = true)]
    pub pose: String,

    /// 发出命令后等待完成
    #[arg(short, long)]
    pub wait: bool,

    /// 等待超时（秒，0 表示不限时）
    #[arg(short, long, default_value_t = 0.0)]
    pub timeout: f64,
}

impl PoseArgs {
    fn target(&self) -> Result<Pose> {
        Pose::from_slice(&parse_list(&self.pose)?).context("Pose needs 6 values: x,y,z,rx,ry,rz")
    }

    fn finish(&self, controller: &CartesianController) -> Result<()> {
        if self.wait {
            controller.wait_until_done(timeout(self.timeout)?)?;
            println!("✅ Motion finished");
        } else {
            println!("✅ Command accepted ({})", controller.state());
        }
        Ok(())
    }

    pub fn move_to_pose(&self, device: &AmorDevice) -> Result<()> {
        let controller = cartesian(device)?;
        controller.move_to_pose(&self.target()?)?;
        self.finish(controller)
    }

    pub fn move_relative(&self, device: &AmorDevice) -> Result<()> {
        let controller = cartesian(device)?;
        controller.move_to_relative_pose(&self.target()?)?;
        self.finish(controller)
    }

    pub fn move_linear(&self, device: &AmorDevice) -> Result<()> {
        let controller = cartesian(device)?;
        controller.move_linear(&self.target()?)?;
        self.finish(controller)
    }
}

/// 速度参数 `vx,vy,vz,wx,wy,wz`（m/s + rad/s）
#[derive(Args, Debug)]
pub struct TwistArgs {
    /// 速度旋量，逗号分隔的 6 个数
    #[arg(allow_hyphen_values = true)]
    pub twist: String,

    /// 使用微分逆运动学下发关节速度
    #[arg(long)]
    pub joint_space: bool,
}

impl TwistArgs {
    pub fn execute(&self, device: &AmorDevice) -> Result<()> {
        let twist = Twist::from_slice(&parse_list(&self.twist)?)
            .context("Twist needs 6 values: vx,vy,vz,wx,wy,wz")?;
        let controller = cartesian(device)?;

        if self.joint_space {
            controller.apply_twist(&twist)?;
        } else {
            controller.move_with_velocity(&twist)?;
        }
        println!("✅ Velocity command sent ({})", controller.state());
        Ok(())
    }
}

/// `wait` 参数
#[derive(Args, Debug)]
pub struct WaitArgs {
    /// 超时（秒，0 表示不限时）
    #[arg(short, long, default_value_t = 0.0)]
    pub timeout: f64,
}

impl WaitArgs {
    pub fn execute(&self, device: &AmorDevice) -> Result<()> {
        cartesian(device)?.wait_until_done(timeout(self.timeout)?)?;
        println!("✅ Done");
        Ok(())
    }
}

/// 解析逗号分隔的数值列表
fn parse_list(text: &str) -> Result<Vec<f64>> {
    text.split(',')
        .map(|v| {
            v.trim()
                .parse::<f64>()
                .with_context(|| format!("Invalid number '{v}'"))
        })
        .collect()
}

fn timeout(seconds: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(seconds).context("Timeout must be a non-negative number of seconds")
}

pub fn stop(device: &AmorDevice) -> Result<()> {
    println!("🛑 Stopping control...");
    cartesian(device)?.stop_control()?;
    println!("✅ Stopped");
    Ok(())
}

/// `act` 参数
#[derive(Args, Debug)]
pub struct ActArgs {
    /// close / open / stop，或数值命令码
    pub command: String,
}

impl ActArgs {
    pub fn execute(&self, device: &AmorDevice) -> Result<()> {
        let controller = cartesian(device)?;

        match GripperCommand::from_name(&self.command) {
            Some(command) => controller.actuate(command)?,
            None => {
                let code: i32 = self
                    .command
                    .parse()
                    .with_context(|| format!("Unknown gripper command '{}'", self.command))?;
                controller.act(code)?;
            },
        }

        println!("✅ Gripper: {}", self.command);
        Ok(())
    }
}
