//! 配置管理命令

use anyhow::Result;
use clap::Subcommand;
use std::path::Path;

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 打印配置文件路径
    Path,

    /// 打印当前生效的配置
    Show,

    /// 写入默认配置
    Init {
        /// 覆盖已有文件
        #[arg(short, long)]
        force: bool,
    },
}

impl ConfigCommand {
    pub fn execute(&self, path: Option<&Path>) -> Result<()> {
        match self {
            ConfigCommand::Path => {
                println!("{}", crate::config::resolve(path)?.display());
            },
            ConfigCommand::Show => {
                let config = crate::config::load(path)?;
                print!("{}", config.to_toml_string()?);
            },
            ConfigCommand::Init { force } => {
                let written = crate::config::init(path, *force)?;
                println!("✅ Wrote {}", written.display());
            },
        }
        Ok(())
    }
}
