//! 命令定义和实现

pub mod cartesian;
pub mod config;
pub mod joints;
pub mod param;
pub mod script;

use amor_sdk::AmorDevice;
use anyhow::Result;
use clap::Subcommand;

pub use cartesian::{ActArgs, PoseArgs, StatArgs, TwistArgs, WaitArgs};
pub use config::ConfigCommand;
pub use joints::{JogArgs, JointsArgs};
pub use param::ParamCommand;
pub use script::ScriptArgs;

/// 需要设备会话的命令
#[derive(Subcommand, Debug)]
pub enum DeviceCommand {
    /// 读取末端位姿（基座系，米）
    Stat(StatArgs),

    /// 读取关节位置（度）
    Joints(JointsArgs),

    /// 移动单个关节（度）
    Jog(JogArgs),

    /// 点到点运动到目标位姿
    Movj(PoseArgs),

    /// 相对当前位姿运动
    Relj(PoseArgs),

    /// 笛卡尔直线运动
    Movl(PoseArgs),

    /// 笛卡尔速度命令（仅基座系）
    Movv(TwistArgs),

    /// 等待运动完成
    Wait(WaitArgs),

    /// 停止笛卡尔控制
    Stop,

    /// 夹爪命令（close / open / stop 或数值命令码）
    Act(ActArgs),

    /// 控制器参数
    #[command(subcommand)]
    Param(ParamCommand),
}

impl DeviceCommand {
    /// 在已打开的设备上执行
    pub fn execute(&self, device: &AmorDevice) -> Result<()> {
        match self {
            DeviceCommand::Stat(args) => args.execute(device),
            DeviceCommand::Joints(args) => args.execute(device),
            DeviceCommand::Jog(args) => args.execute(device),
            DeviceCommand::Movj(args) => args.move_to_pose(device),
            DeviceCommand::Relj(args) => args.move_relative(device),
            DeviceCommand::Movl(args) => args.move_linear(device),
            DeviceCommand::Movv(args) => args.execute(device),
            DeviceCommand::Wait(args) => args.execute(device),
            DeviceCommand::Stop => cartesian::stop(device),
            DeviceCommand::Act(args) => args.execute(device),
            DeviceCommand::Param(cmd) => cmd.execute(device),
        }
    }
}
