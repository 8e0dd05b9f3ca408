//! 配置文件定位与加载

use amor_sdk::DeviceConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// 默认配置文件路径
///
/// - Linux: `~/.config/amor/config.toml`
/// - macOS: `~/Library/Application Support/amor/config.toml`
/// - Windows: `%APPDATA%\amor\config.toml`
pub fn default_path() -> Result<PathBuf> {
    let mut path = dirs::config_dir().context("Unable to determine config directory")?;
    path.push("amor");
    path.push("config.toml");
    Ok(path)
}

/// 解析实际使用的配置文件路径
pub fn resolve(path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(p) => Ok(p.to_path_buf()),
        None => default_path(),
    }
}

/// CLI 的默认设备配置（启用笛卡尔控制器）
pub fn cli_defaults() -> DeviceConfig {
    DeviceConfig {
        cartesian_controller: Some("cartesian".to_string()),
        ..DeviceConfig::default()
    }
}

/// 加载配置，文件不存在时使用 [`cli_defaults`]
pub fn load(path: Option<&Path>) -> Result<DeviceConfig> {
    let path = resolve(path)?;
    if !path.exists() {
        debug!("No config at {}, using defaults", path.display());
        return Ok(cli_defaults());
    }

    DeviceConfig::load(&path).with_context(|| format!("Failed to load {}", path.display()))
}

/// 写入默认配置
pub fn init(path: Option<&Path>, force: bool) -> Result<PathBuf> {
    let path = resolve(path)?;
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    cli_defaults().save(&path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_cli_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert!(config.cartesian_enabled());
    }

    #[test]
    fn test_init_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        init(Some(&path), false).unwrap();
        assert!(init(Some(&path), false).is_err());
        init(Some(&path), true).unwrap();

        assert_eq!(load(Some(&path)).unwrap(), cli_defaults());
    }
}
