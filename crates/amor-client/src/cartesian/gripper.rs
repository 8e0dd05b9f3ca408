//! 夹爪命令
//!
//! 命令码沿用 4 字符 vocab 打包（小端，首字符在最低字节），
//! 例如 `"accg"` → `0x6763_6361`。

use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt;

/// 夹爪命令
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(i32)]
pub enum GripperCommand {
    /// 闭合（`accg`）
    Close = 0x6763_6361,
    /// 张开（`acog`）
    Open = 0x676f_6361,
    /// 停止（`acsg`）
    Stop = 0x6773_6361,
}

impl GripperCommand {
    /// 命令码
    pub fn code(self) -> i32 {
        self.into()
    }

    /// 按名称解析（`close` / `open` / `stop`）
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "close" => Some(GripperCommand::Close),
            "open" => Some(GripperCommand::Open),
            "stop" => Some(GripperCommand::Stop),
            _ => None,
        }
    }
}

impl fmt::Display for GripperCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GripperCommand::Close => "close",
            GripperCommand::Open => "open",
            GripperCommand::Stop => "stop",
        };
        f.write_str(s)
    }
}

/// 将命令码解码为 4 字符（仅用于日志）
pub(crate) fn decode_vocab(code: i32) -> String {
    code.to_le_bytes()
        .iter()
        .take_while(|&&b| b != 0)
        .map(|&b| if b.is_ascii_graphic() { b as char } else { '?' })
        .collect()
}
