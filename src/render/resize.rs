//! 尺寸变化桥接
//!
//! 窗口尺寸通知可能在一帧内到达多次，这里只保留最新一次，在帧边界转发给
//! [`ParticleField::resize`]。零尺寸（最小化）和与上次转发相同的尺寸都会被丢弃。

use crate::core::error::FieldResult;
use crate::render::backend::RenderBackend;
use crate::render::particles::{FieldHandle, ParticleField};
use crate::render::Viewport;

/// 尺寸变化桥接器
#[derive(Debug, Clone)]
pub struct ResizeBridge {
    pending: Option<(u32, u32)>,
    last_forwarded: Viewport,
    forwarded: u64,
}

impl ResizeBridge {
    /// `initial` 为挂载时的视口
    pub fn new(initial: Viewport) -> Self {
        Self {
            pending: None,
            last_forwarded: initial,
            forwarded: 0,
        }
    }

    /// 记录一次尺寸变化通知
    pub fn notify(&mut self, width: u32, height: u32) {
        self.pending = Some((width, height));
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// 转发挂起的通知，返回实际转发的视口
    pub fn flush<B: RenderBackend>(
        &mut self,
        handle: &mut FieldHandle<B>,
    ) -> FieldResult<Option<Viewport>> {
        let Some((width, height)) = self.pending.take() else {
            return Ok(None);
        };
        let Ok(viewport) = Viewport::new(width, height) else {
            tracing::trace!(target: "resize", "Ignoring {}x{} resize", width, height);
            return Ok(None);
        };
        self.forward(handle, viewport)
    }

    /// 立即转发一个视口
    pub fn forward<B: RenderBackend>(
        &mut self,
        handle: &mut FieldHandle<B>,
        viewport: Viewport,
    ) -> FieldResult<Option<Viewport>> {
        if viewport == self.last_forwarded {
            return Ok(None);
        }
        ParticleField::resize(handle, viewport)?;
        self.last_forwarded = viewport;
        self.forwarded += 1;
        tracing::debug!(
            target: "resize",
            "Forwarded {}x{}",
            viewport.width(),
            viewport.height()
        );
        Ok(Some(viewport))
    }

    pub fn last_forwarded(&self) -> Viewport {
        self.last_forwarded
    }

    /// 累计转发次数
    pub fn forwarded_count(&self) -> u64 {
        self.forwarded
    }
}
