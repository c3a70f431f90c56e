use std::sync::Arc;

use winit::window::Window;

use crate::config::GraphicsConfig;
use crate::core::error::RenderResult;
use crate::core::scheduler::FrameScheduler;
use crate::platform::RenderSurface;
use crate::render::wgpu::WgpuBackend;
use crate::render::Viewport;

/// winit 窗口表面
#[derive(Clone)]
pub struct WinitSurface {
    window: Arc<Window>,
    graphics: GraphicsConfig,
}

impl WinitSurface {
    pub fn new(window: Arc<Window>, graphics: GraphicsConfig) -> Self {
        Self { window, graphics }
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// 窗口当前的物理像素视口；最小化时为 `None`
    pub fn viewport(&self) -> Option<Viewport> {
        let size = self.window.inner_size();
        Viewport::new(size.width, size.height).ok()
    }
}

impl RenderSurface for WinitSurface {
    type Backend = WgpuBackend;

    fn acquire_context(&self, viewport: Viewport) -> RenderResult<WgpuBackend> {
        pollster::block_on(WgpuBackend::new(
            Arc::clone(&self.window),
            viewport,
            &self.graphics,
        ))
    }
}

/// 通过 `request_redraw` 调度帧，帧在 `RedrawRequested` 事件中送达
pub struct RedrawScheduler {
    window: Arc<Window>,
}

impl RedrawScheduler {
    pub fn new(window: Arc<Window>) -> Self {
        Self { window }
    }
}

impl FrameScheduler for RedrawScheduler {
    fn request_frame(&mut self) {
        self.window.request_redraw();
    }
}
