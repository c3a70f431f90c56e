/// 统一配置系统
///
/// 提供TOML/JSON配置文件、环境变量覆盖和配置验证
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod field;
pub mod graphics;

pub use field::{CameraConfig, FieldConfig};
pub use graphics::{GraphicsConfig, PowerPreference, Resolution};

use crate::impl_default;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 文件读取错误
    #[error("Config file error: {0}")]
    FileError(#[from] std::io::Error),
    /// 解析错误
    #[error("Config parse error: {0}")]
    ParseError(String),
    /// 验证错误
    #[error("Config validation error: {0}")]
    ValidationError(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// 背景主配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackdropConfig {
    /// 图形配置
    pub graphics: GraphicsConfig,

    /// 粒子场配置
    pub field: FieldConfig,

    /// 相机配置
    pub camera: CameraConfig,

    /// 日志配置
    pub logging: LoggingConfig,

    /// 推荐服务配置（仅供外围 UI 使用）
    pub service: ServiceConfig,
}

impl BackdropConfig {
    /// 创建默认配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 从TOML文件加载配置
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_toml_str(&content)
    }

    /// 从TOML字符串解析配置
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 从JSON文件加载配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_json_str(&content)
    }

    /// 从JSON字符串解析配置
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 保存为TOML文件
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content).map_err(ConfigError::FileError)
    }

    /// 从环境变量覆盖配置
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// 按给定的查找函数覆盖配置，无法解析的值保持原样
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(width) = lookup("BACKDROP_WINDOW_WIDTH").and_then(|v| v.parse().ok()) {
            self.graphics.resolution.width = width;
        }
        if let Some(height) = lookup("BACKDROP_WINDOW_HEIGHT").and_then(|v| v.parse().ok()) {
            self.graphics.resolution.height = height;
        }
        if let Some(vsync) = lookup("BACKDROP_VSYNC").and_then(|v| v.parse().ok()) {
            self.graphics.vsync = vsync;
        }
        if let Some(count) = lookup("BACKDROP_POINT_COUNT").and_then(|v| v.parse().ok()) {
            self.field.point_count = count;
        }
        if let Some(seed) = lookup("BACKDROP_SEED").and_then(|v| v.parse().ok()) {
            self.field.seed = Some(seed);
        }
        if let Some(level) = lookup("BACKDROP_LOG_LEVEL").and_then(|v| LogLevel::parse(&v)) {
            self.logging.level = level;
        }
    }

    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        self.graphics.validate()?;
        self.field.validate()?;
        self.camera.validate()?;
        Ok(())
    }

    /// 自动查找并加载配置文件
    ///
    /// 按以下顺序查找：
    /// 1. ./backdrop.toml
    /// 2. ./backdrop.json
    /// 3. ~/.config/particle_backdrop/config.toml
    /// 4. 使用默认配置
    pub fn load_or_default() -> Self {
        if let Ok(config) = Self::from_toml_file("backdrop.toml") {
            tracing::info!(target: "config", "Loaded config from backdrop.toml");
            return config;
        }

        if let Ok(config) = Self::from_json_file("backdrop.json") {
            tracing::info!(target: "config", "Loaded config from backdrop.json");
            return config;
        }

        if let Some(config_path) = Self::user_config_path() {
            if let Ok(config) = Self::from_toml_file(&config_path) {
                tracing::info!(target: "config", "Loaded config from {:?}", config_path);
                return config;
            }
        }

        tracing::info!(target: "config", "Using default configuration");
        Self::default()
    }

    fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("particle_backdrop").join("config.toml"))
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别（`RUST_LOG` 未设置时生效）
    pub level: LogLevel,
}

impl_default!(LoggingConfig {
    level: LogLevel::Info,
});

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    /// 跟踪
    Trace,
    /// 调试
    Debug,
    /// 信息
    Info,
    /// 警告
    Warn,
    /// 错误
    Error,
}

impl LogLevel {
    /// 解析大小写不敏感的级别名
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// 作为 `EnvFilter` 指令使用的字符串
    pub fn as_directive(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// 推荐服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// 查询端点
    pub endpoint: String,
    /// 每次查询检索的文档数
    pub top_k: u32,
}

impl_default!(ServiceConfig {
    endpoint: "http://localhost:8000/query/".to_string(),
    top_k: 5,
});
