//! 粒子场与相机配置
//!
//! 默认值即为背景的固定视觉风格：5000 个点、立方体半边长 5、点尺寸 0.005、
//! 蓝色、70% 不透明度，每帧每轴旋转 0.0005 弧度。

use super::{ConfigError, ConfigResult};
use crate::impl_default;
use serde::{Deserialize, Serialize};

/// 粒子场配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// 点数量
    pub point_count: u32,
    /// 坐标采样范围 [-extent, extent)
    pub extent: f32,
    /// 点尺寸（世界单位）
    pub point_size: f32,
    /// 点的最小像素尺寸
    pub min_point_px: f32,
    /// 颜色（线性 RGB）
    pub color: [f32; 3],
    /// 不透明度（0-1）
    pub opacity: f32,
    /// 每帧 X/Y 轴旋转增量（弧度）
    pub rotation_delta: [f64; 2],
    /// 随机种子，设置后点云可复现
    pub seed: Option<u64>,
}

impl_default!(FieldConfig {
    point_count: 5000,
    extent: 5.0,
    point_size: 0.005,
    min_point_px: 1.0,
    color: [0.0, 0.0, 1.0],
    opacity: 0.7,
    rotation_delta: [0.0005, 0.0005],
    seed: None,
});

impl FieldConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.point_count == 0 {
            return invalid("point_count must be positive");
        }
        if !(self.extent.is_finite() && self.extent > 0.0) {
            return invalid("extent must be positive");
        }
        if !(self.point_size.is_finite() && self.point_size > 0.0) {
            return invalid("point_size must be positive");
        }
        if !(self.min_point_px.is_finite() && self.min_point_px >= 0.0) {
            return invalid("min_point_px must not be negative");
        }
        if self.color.iter().any(|c| !c.is_finite()) {
            return invalid("color must be finite");
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return invalid("opacity must be within [0, 1]");
        }
        if self.rotation_delta.iter().any(|d| !d.is_finite()) {
            return invalid("rotation_delta must be finite");
        }
        Ok(())
    }
}

/// 相机配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// 垂直视场角（度）
    pub fov_y_degrees: f32,
    /// 近平面
    pub near: f32,
    /// 远平面
    pub far: f32,
    /// 相机到原点的距离（沿 +Z）
    pub distance: f32,
}

impl_default!(CameraConfig {
    fov_y_degrees: 75.0,
    near: 0.1,
    far: 1000.0,
    distance: 5.0,
});

impl CameraConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.fov_y_degrees > 0.0 && self.fov_y_degrees < 180.0) {
            return invalid("fov_y_degrees must be within (0, 180)");
        }
        if !(self.near > 0.0 && self.far > self.near) {
            return invalid("camera planes must satisfy 0 < near < far");
        }
        if !(self.distance > 0.0 && self.distance < self.far) {
            return invalid("camera distance must satisfy 0 < distance < far");
        }
        Ok(())
    }
}

fn invalid(message: &str) -> ConfigResult<()> {
    Err(ConfigError::ValidationError(message.to_string()))
}
