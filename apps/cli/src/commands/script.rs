//! 脚本执行
//!
//! 在同一个会话中按行执行命令，语法与命令行相同：
//!
//! ```text
//! # 注释
//! param set frame tcp
//! movl 0,0,0.05,0,0,0 --wait --timeout 5
//! act close
//! ```

use super::DeviceCommand;
use amor_sdk::AmorDevice;
use anyhow::{Context, Result};
use clap::{Args, Parser};
use std::fs;
use std::path::PathBuf;
use tracing::warn;

/// `script` 参数
#[derive(Args, Debug)]
pub struct ScriptArgs {
    /// 脚本文件
    pub path: PathBuf,

    /// 出错后继续执行后续行
    #[arg(long)]
    pub continue_on_error: bool,
}

#[derive(Parser, Debug)]
#[command(name = "script", no_binary_name = true)]
struct ScriptLine {
    #[command(subcommand)]
    command: DeviceCommand,
}

/// 解析脚本为命令序列（行号从 1 开始）
fn parse(content: &str) -> Result<Vec<(usize, DeviceCommand)>> {
    content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(number, line)| {
            ScriptLine::try_parse_from(line.split_whitespace())
                .map(|parsed| (number, parsed.command))
                .with_context(|| format!("line {number}: '{line}'"))
        })
        .collect()
}

impl ScriptArgs {
    pub fn execute(&self, device: &AmorDevice) -> Result<()> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let commands = parse(&content)?;

        let mut failures = 0;
        for (number, command) in &commands {
            println!("▶ line {number}");
            if let Err(e) = command.execute(device) {
                if !self.continue_on_error {
                    return Err(e.context(format!("line {number}")));
                }
                warn!("line {}: {:#}", number, e);
                failures += 1;
            }
        }

        if failures > 0 {
            anyhow::bail!("{failures} of {} commands failed", commands.len());
        }
        println!("✅ Script finished ({} commands)", commands.len());
        Ok(())
    }
}
