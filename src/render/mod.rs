//! 渲染模块
//!
//! - `backend` - 渲染后端抽象与资源跟踪替身
//! - `wgpu` - 基于 wgpu 的后端
//! - `pipeline` - 点精灵管线与着色器
//! - `camera` / `viewport` - 透视相机与视口
//! - `particles` - 粒子场服务
//! - `resize` - 尺寸变化桥接

pub mod backend;
pub mod camera;
pub mod particles;
pub mod pipeline;
pub mod resize;
pub mod viewport;
pub mod wgpu;

pub use backend::{RenderBackend, TrackingSurface};
pub use camera::PerspectiveCamera;
pub use particles::{FieldHandle, ParticleField};
pub use resize::ResizeBridge;
pub use viewport::Viewport;

#[cfg(test)]
mod tests;
