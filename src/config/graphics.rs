use super::{ConfigError, ConfigResult};
use crate::impl_default;
use serde::{Deserialize, Serialize};

/// 图形配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphicsConfig {
    /// 窗口标题
    pub title: String,

    /// 初始分辨率
    pub resolution: Resolution,

    /// 垂直同步
    pub vsync: bool,

    /// 透明窗口（粒子叠加在桌面/宿主内容之上）
    pub transparent: bool,

    /// 适配器电源偏好
    pub power_preference: PowerPreference,
}

impl_default!(GraphicsConfig {
    title: "Particle Backdrop".to_string(),
    resolution: Resolution::default(),
    vsync: true,
    transparent: true,
    power_preference: PowerPreference::LowPower,
});

impl GraphicsConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.resolution.width == 0 || self.resolution.height == 0 {
            return Err(ConfigError::ValidationError(
                "Invalid resolution".to_string(),
            ));
        }
        Ok(())
    }
}

/// 分辨率
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// 宽度（像素）
    pub width: u32,
    /// 高度（像素）
    pub height: u32,
}

impl_default!(Resolution {
    width: 800,
    height: 600,
});

/// 电源偏好
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerPreference {
    /// 低功耗（集成显卡）
    LowPower,
    /// 高性能（独立显卡）
    HighPerformance,
}

impl From<PowerPreference> for wgpu::PowerPreference {
    fn from(preference: PowerPreference) -> Self {
        match preference {
            PowerPreference::LowPower => Self::LowPower,
            PowerPreference::HighPerformance => Self::HighPerformance,
        }
    }
}
