//! 配置 - ~/.config/notification-autogroup/config.json

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::notification::AUTOGROUP_AT_COUNT;

/// 覆盖配置文件路径的环境变量
pub const CONFIG_ENV: &str = "NOTIFICATION_AUTOGROUP_CONFIG";

/// 自动分组配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutogroupConfig {
    /// 触发自动分组的未分组通知数量
    pub threshold: usize,
    /// replay 时是否同时用 tracing 输出回调
    pub log_summary_calls: bool,
}

impl Default for AutogroupConfig {
    fn default() -> Self {
        Self {
            threshold: AUTOGROUP_AT_COUNT,
            log_summary_calls: true,
        }
    }
}

impl AutogroupConfig {
    /// 获取配置文件路径
    pub fn path() -> PathBuf {
        Self::resolve_path(std::env::var(CONFIG_ENV).ok(), dirs::home_dir())
    }

    /// 环境变量优先，其次 home 目录，最后当前目录
    pub fn resolve_path(env: Option<String>, home: Option<PathBuf>) -> PathBuf {
        if let Some(path) = env.filter(|p| !p.is_empty()) {
            return PathBuf::from(path);
        }

        home.unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("notification-autogroup")
            .join("config.json")
    }

    /// 从默认路径加载
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path())
    }

    /// 从指定路径加载；文件不存在时使用默认值
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.threshold == 0 {
            bail!("threshold must be at least 1");
        }
        Ok(())
    }
}
