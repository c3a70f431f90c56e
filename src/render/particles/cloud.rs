//! 点云几何与视觉风格

use crate::config::FieldConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 点云
///
/// 构造后不可变，每个坐标在 [-extent, extent) 内均匀采样。
#[derive(Debug, Clone, PartialEq)]
pub struct PointCloud {
    positions: Vec<[f32; 3]>,
}

impl PointCloud {
    /// 用给定随机源生成 `count` 个点
    pub fn generate<R: Rng + ?Sized>(count: usize, extent: f32, rng: &mut R) -> Self {
        let span = 2.0 * extent;
        let mut coordinate = || (rng.gen::<f32>() - 0.5) * span;
        let positions = (0..count)
            .map(|_| [coordinate(), coordinate(), coordinate()])
            .collect();
        Self { positions }
    }

    /// 按配置生成；设置了 `seed` 时结果可复现
    pub fn from_config(config: &FieldConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::generate(config.point_count as usize, config.extent, &mut rng)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    /// 顶点缓冲区上传用的字节视图
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }
}

/// 点的固定视觉风格
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointStyle {
    /// 世界单位尺寸
    pub size: f32,
    /// 最小像素尺寸
    pub min_px: f32,
    pub color: [f32; 3],
    pub opacity: f32,
}

impl PointStyle {
    pub fn from_config(config: &FieldConfig) -> Self {
        Self {
            size: config.point_size,
            min_px: config.min_point_px,
            color: config.color,
            opacity: config.opacity,
        }
    }

    pub fn rgba(&self) -> [f32; 4] {
        let [r, g, b] = self.color;
        [r, g, b, self.opacity]
    }
}

impl Default for PointStyle {
    fn default() -> Self {
        Self::from_config(&FieldConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_within_extent() {
        let mut rng = StdRng::seed_from_u64(1);
        let cloud = PointCloud::generate(5000, 5.0, &mut rng);
        assert_eq!(cloud.len(), 5000);
        assert!(cloud
            .positions()
            .iter()
            .flatten()
            .all(|c| (-5.0..5.0).contains(c)));
    }

    #[test]
    fn test_seeded_cloud_is_reproducible() {
        let config = FieldConfig {
            seed: Some(42),
            ..Default::default()
        };
        assert_eq!(PointCloud::from_config(&config), PointCloud::from_config(&config));
    }

    #[test]
    fn test_bytes_match_point_count() {
        let config = FieldConfig {
            point_count: 10,
            seed: Some(3),
            ..Default::default()
        };
        let cloud = PointCloud::from_config(&config);
        assert_eq!(cloud.as_bytes().len(), 10 * 12);
    }

    #[test]
    fn test_default_style() {
        let style = PointStyle::default();
        assert_eq!(style.size, 0.005);
        assert_eq!(style.rgba(), [0.0, 0.0, 1.0, 0.7]);
    }
}
