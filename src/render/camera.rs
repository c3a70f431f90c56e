//! 透视相机
//!
//! 固定位置 (0, 0, distance) 看向原点，只有宽高比会随视口变化。

use crate::config::CameraConfig;
use crate::render::Viewport;
use glam::{Mat4, Vec3};

/// 透视相机
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    /// 垂直视场角（弧度）
    fov_y: f32,
    aspect: f32,
    near: f32,
    far: f32,
    position: Vec3,
}

impl PerspectiveCamera {
    /// 按配置和初始视口创建相机
    pub fn new(config: &CameraConfig, viewport: Viewport) -> Self {
        Self {
            fov_y: config.fov_y_degrees.to_radians(),
            aspect: viewport.aspect(),
            near: config.near,
            far: config.far,
            position: Vec3::new(0.0, 0.0, config.distance),
        }
    }

    /// 绑定新视口的宽高比
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.aspect = viewport.aspect();
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn fov_y(&self) -> f32 {
        self.fov_y
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, Vec3::ZERO, Vec3::Y)
    }

    /// 投影矩阵（wgpu 深度范围 0..1）
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(&CameraConfig::default(), Viewport::new(800, 600).unwrap())
    }

    #[test]
    fn test_camera_defaults() {
        let camera = camera();
        assert!((camera.fov_y() - 75f32.to_radians()).abs() < 1e-6);
        assert_eq!(camera.near(), 0.1);
        assert_eq!(camera.far(), 1000.0);
        assert_eq!(camera.position(), Vec3::new(0.0, 0.0, 5.0));
        assert!((camera.aspect() - 800.0 / 600.0).abs() < 1e-6);
    }

    #[test]
    fn test_origin_projects_to_screen_center() {
        let clip = camera().view_projection() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip / clip.w;
        assert!(ndc.x.abs() < 1e-6);
        assert!(ndc.y.abs() < 1e-6);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn test_set_viewport_updates_aspect_only() {
        let mut camera = camera();
        let before = camera.view();
        camera.set_viewport(Viewport::new(1280, 720).unwrap());
        assert!((camera.aspect() - 1280.0 / 720.0).abs() < 1e-6);
        assert_eq!(camera.view(), before);
    }
}
