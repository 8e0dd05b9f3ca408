//! # AMOR CLI
//!
//! Command-line interface for AMOR robot arm control.
//!
//! 每次调用打开一个会话（内部：连接 -> 执行 -> 急停并释放），
//! 后端为模拟机械臂。需要在同一会话中执行多条命令时使用 `script`。
//!
//! ```bash
//! amor-cli stat
//! amor-cli movj 0.3,0,0.6,0,3.14,0 --wait --timeout 5
//! amor-cli param set frame tcp
//! amor-cli script demo.amor
//! ```

use amor_sdk::kinematics::{
    CartesianSolver, CoordinateSystem, Deg, OrientationSystem, decode_pose, m_to_mm,
};
use amor_sdk::{AmorDevice, DeviceConfig, SimulatedArm};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

mod commands;
mod config;

use commands::{ConfigCommand, DeviceCommand, ScriptArgs};

/// 模拟机械臂的初始关节角（度），避开伸直的奇异位形
const SIM_HOME_DEG: [f64; 7] = [0.0, 30.0, 0.0, 60.0, 0.0, 30.0, 0.0];

/// AMOR CLI - 机械臂命令行工具
#[derive(Parser, Debug)]
#[command(name = "amor-cli")]
#[command(about = "Command-line interface for AMOR robot arm control", long_about = None)]
#[command(version)]
struct Cli {
    /// 配置文件（默认位于系统配置目录下的 amor/config.toml）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 在同一会话中执行脚本
    Script(ScriptArgs),

    #[command(flatten)]
    Device(DeviceCommand),
}

/// 创建处于初始位形的模拟机械臂
fn simulated_arm(config: &DeviceConfig) -> Result<SimulatedArm> {
    let arm = SimulatedArm::new();
    let home: Vec<Deg> = SIM_HOME_DEG.iter().map(|&d| Deg(d)).collect();
    arm.set_actual_positions(SIM_HOME_DEG.map(|d| Deg(d).to_rad().0));

    let solver = config.build_solver()?;
    let pose = solver.forward_kinematics(&home)?;
    let rpy = decode_pose(&pose, CoordinateSystem::Cartesian, OrientationSystem::Rpy);
    let v = rpy.as_slice();
    arm.set_cartesian([m_to_mm(v[0]), m_to_mm(v[1]), m_to_mm(v[2]), v[3], v[4], v[5]]);
    Ok(arm)
}

fn main() -> Result<()> {
    amor_sdk::init_logger!("amor_cli=info,amor_client=warn,amor_driver=warn");

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    if let Commands::Config(cmd) = &cli.command {
        return cmd.execute(config_path);
    }

    let config = config::load(config_path)?;
    let mut device = AmorDevice::open(simulated_arm(&config)?, &config)
        .context("Failed to open AMOR device")?;
    info!("Session open");

    let result = match &cli.command {
        Commands::Script(args) => args.execute(&device),
        Commands::Device(cmd) => cmd.execute(&device),
        Commands::Config(_) => Ok(()),
    };

    device.close()?;
    result
}
