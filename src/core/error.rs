//! 统一错误处理模块
//!
//! 提供粒子背景范围内的统一错误类型定义
//!
//! ## 错误类型分层
//!
//! - **后端层错误** (`RenderError`): 渲染后端的错误（适配器、设备、表面、提交等）
//! - **组件层错误** (`FieldError`): `ParticleField` 生命周期上的错误
//! - **应用层错误** (`AppError`): 宿主程序（窗口、事件循环、配置）的错误

use crate::config::ConfigError;
use thiserror::Error;

/// 渲染后端错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("Failed to create surface: {0}")]
    SurfaceCreation(String),

    #[error("Failed to request adapter: no compatible GPU found")]
    NoAdapter,

    #[error("Failed to request device: {0}")]
    DeviceRequest(String),

    #[error("Failed to create pipeline: {0}")]
    PipelineCreation(String),

    #[error("Surface error: {0}")]
    Surface(String),

    #[error("Frame submission error: {0}")]
    FrameSubmission(String),

    #[error("Invalid render state: {0}")]
    InvalidState(String),
}

/// 粒子场错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    /// 表面无法提供 GPU 绘制上下文，对该实例是致命的，不重试
    #[error("Surface unavailable: {0}")]
    SurfaceUnavailable(String),

    /// `dispose` 之后继续使用句柄（编程错误）
    #[error("Particle field used after dispose")]
    UseAfterDispose,

    /// 粒子场或相机配置未通过验证
    #[error("Invalid field config: {0}")]
    InvalidConfig(String),

    #[error("Invalid viewport {width}x{height}: dimensions must be positive")]
    InvalidViewport { width: u32, height: u32 },

    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}

/// 应用层错误
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Window creation failed: {0}")]
    Window(String),

    #[error("Event loop error: {0}")]
    EventLoop(String),

    #[error("Particle field error: {0}")]
    Field(#[from] FieldError),
}

pub type RenderResult<T> = Result<T, RenderError>;
pub type FieldResult<T> = Result<T, FieldError>;
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let render_err = RenderError::FrameSubmission("device lost".to_string());
        let field_err: FieldError = render_err.into();
        assert!(matches!(field_err, FieldError::Render(_)));

        let app_err: AppError = FieldError::UseAfterDispose.into();
        assert!(matches!(app_err, AppError::Field(FieldError::UseAfterDispose)));
    }

    #[test]
    fn test_error_display() {
        let err = RenderError::NoAdapter;
        assert_eq!(
            err.to_string(),
            "Failed to request adapter: no compatible GPU found"
        );

        let err = FieldError::InvalidViewport {
            width: 0,
            height: 600,
        };
        assert_eq!(
            err.to_string(),
            "Invalid viewport 0x600: dimensions must be positive"
        );
    }
}
