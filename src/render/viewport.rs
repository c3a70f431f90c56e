use crate::core::error::{FieldError, FieldResult};

/// 可见绘制区域的像素尺寸
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Viewport {
    width: u32,
    height: u32,
}

impl Viewport {
    /// 创建视口，宽高必须为正
    pub fn new(width: u32, height: u32) -> FieldResult<Self> {
        if width == 0 || height == 0 {
            return Err(FieldError::InvalidViewport { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// 宽高比 width / height
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

impl From<Viewport> for winit::dpi::PhysicalSize<u32> {
    fn from(viewport: Viewport) -> Self {
        Self::new(viewport.width, viewport.height)
    }
}
