//! 客户端设置
//!
//! 提供设置数据结构和 JSON 持久化

use anyhow::Context;
use protocol::{Board, GameError, NetworkConfig, DEFAULT_BOARD_SIZE, DEFAULT_PORT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// EnvFilter 指令
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// 客户端设置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// 服务器地址
    pub server_host: String,
    /// 服务器端口
    pub server_port: u16,
    /// 棋盘边长
    pub board_size: usize,
    pub log_level: LogLevel,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: DEFAULT_PORT,
            board_size: DEFAULT_BOARD_SIZE,
            log_level: LogLevel::default(),
        }
    }
}

impl ClientSettings {
    /// 默认设置文件路径
    pub fn settings_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut path| {
            path.push("gomoku");
            path.push("settings.json");
            path
        })
    }

    /// 从默认路径加载设置
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            tracing::warn!("Config directory unavailable, using default settings");
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// 从指定文件加载设置，失败时回退到默认值
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::info!("Settings file {:?} not found, using defaults", path);
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(settings) => {
                    tracing::info!("Loaded settings: {:?}", path);
                    settings
                }
                Err(e) => {
                    tracing::warn!("Invalid settings file: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Cannot read settings file: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// 保存设置到指定文件
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating config directory {parent:?}"))?;
        }

        let content = serde_json::to_string_pretty(self).context("serializing settings")?;
        std::fs::write(path, content).with_context(|| format!("writing settings to {path:?}"))?;

        tracing::info!("Settings saved: {:?}", path);
        Ok(())
    }

    /// 检查棋盘边长，必须在分配显示缓冲之前调用
    pub fn validate(&self) -> Result<(), GameError> {
        Board::new(self.board_size).map(|_| ())
    }

    /// 网络配置
    pub fn network_config(&self) -> NetworkConfig {
        NetworkConfig {
            host: self.server_host.clone(),
            port: self.server_port,
        }
    }
}
