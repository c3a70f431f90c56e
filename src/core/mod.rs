//! 核心模块
//!
//! - `app` - 宿主应用与运行循环
//! - `error` - 错误类型定义
//! - `scheduler` - 帧调度与渲染循环状态机

pub mod app;
pub mod error;
pub mod scheduler;
#[macro_use]
pub mod macros;

// 重新导出错误类型
pub use error::{AppError, AppResult, FieldError, FieldResult, RenderError, RenderResult};

pub use app::BackdropApp;
pub use scheduler::{FrameScheduler, FrameTarget, LoopState, ManualScheduler, RenderLoop};
