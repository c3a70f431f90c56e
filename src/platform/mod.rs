//! 平台抽象
//!
//! 宿主拥有绘制表面，`ParticleField` 只在挂载期间通过 [`RenderSurface`] 获取绘制上下文。

pub mod winit;

use crate::core::error::RenderResult;
use crate::render::backend::RenderBackend;
use crate::render::Viewport;

/// 可提供 GPU 绘制上下文的表面
pub trait RenderSurface {
    type Backend: RenderBackend;

    /// 按初始视口创建并配置绘制上下文
    fn acquire_context(&self, viewport: Viewport) -> RenderResult<Self::Backend>;
}
