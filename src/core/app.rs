//! 宿主应用
//!
//! 创建透明窗口，挂载粒子场，并用 winit 的重绘请求驱动渲染循环。
//!
//! # 生命周期
//!
//! 1. **初始化阶段**：读取配置、创建窗口、挂载粒子场、启动循环
//! 2. **运行阶段**：每个 `RedrawRequested` 先合并尺寸变化，再执行一帧
//! 3. **关闭阶段**：先取消循环，再释放粒子场

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyEvent, StartCause, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::Key;
use winit::window::WindowBuilder;

use crate::config::{BackdropConfig, LoggingConfig};
use crate::core::error::{AppError, AppResult, FieldError};
use crate::core::scheduler::{LoopState, RenderLoop};
use crate::platform::winit::{RedrawScheduler, WinitSurface};
use crate::render::particles::{FieldHandle, ParticleField};
use crate::render::wgpu::WgpuBackend;
use crate::render::{ResizeBridge, Viewport};

type FieldLoop = RenderLoop<RedrawScheduler, FieldHandle<WgpuBackend>>;

/// 运行期状态
struct Session {
    render_loop: FieldLoop,
    bridge: ResizeBridge,
    failure: Rc<RefCell<Option<FieldError>>>,
}

impl Session {
    fn flush_resize(&mut self) {
        let Some(handle) = self.render_loop.target_mut() else {
            return;
        };
        if let Err(error) = self.bridge.flush(handle) {
            tracing::error!(target: "app", "Resize failed: {}", error);
            record_failure(&self.failure, &error);
            self.render_loop.cancel();
        }
    }

    fn toggle_pause(&mut self) {
        if self.render_loop.is_paused() {
            self.render_loop.resume();
        } else {
            self.render_loop.pause();
        }
    }

    fn has_stopped(&self) -> bool {
        self.render_loop.state() == LoopState::Stopped
    }

    /// 取消循环并释放粒子场，可重复调用
    fn teardown(&mut self) {
        self.render_loop.cancel();
        if let Some(mut handle) = self.render_loop.take_target() {
            if let Err(error) = ParticleField::dispose(&mut handle) {
                tracing::warn!(target: "app", "Dispose failed: {}", error);
            }
            tracing::info!(
                target: "app",
                "Rendered {} frames",
                self.render_loop.frames()
            );
        }
    }
}

/// 只保留第一个失败
fn record_failure(slot: &RefCell<Option<FieldError>>, error: &FieldError) {
    let mut slot = slot.borrow_mut();
    if slot.is_none() {
        *slot = Some(error.clone());
    }
}

/// 粒子背景应用
pub struct BackdropApp;

impl BackdropApp {
    /// 初始化日志系统
    ///
    /// `RUST_LOG` 优先，未设置时使用配置中的级别。
    pub fn initialize_logging(config: &LoggingConfig) {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.level.as_directive()));
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
        tracing::info!(target: "app", "Particle backdrop starting");
    }

    /// 运行应用直到窗口关闭
    ///
    /// # 错误
    ///
    /// 配置无效、窗口或事件循环创建失败、挂载失败，或运行中某一帧失败时返回错误。
    pub fn run(config: BackdropConfig) -> AppResult<()> {
        config.validate()?;

        let event_loop = EventLoop::new()
            .map_err(|e| AppError::EventLoop(format!("Failed to create event loop: {}", e)))?;

        let graphics = &config.graphics;
        let requested = Viewport::new(graphics.resolution.width, graphics.resolution.height)?;
        let window = WindowBuilder::new()
            .with_title(graphics.title.clone())
            .with_inner_size(PhysicalSize::<u32>::from(requested))
            .with_transparent(graphics.transparent)
            .build(&event_loop)
            .map_err(|e| AppError::Window(format!("Failed to create window: {}", e)))?;
        let window = Arc::new(window);
        let window_id = window.id();

        let surface = WinitSurface::new(Arc::clone(&window), graphics.clone());
        let viewport = surface.viewport().unwrap_or(requested);
        let handle = ParticleField::mount_with(&surface, viewport, &config.field, &config.camera)?;

        let failure: Rc<RefCell<Option<FieldError>>> = Rc::new(RefCell::new(None));
        let mut render_loop = RenderLoop::new(RedrawScheduler::new(Arc::clone(&window)), handle);
        let reported = Rc::clone(&failure);
        render_loop.on_failure(move |error: &FieldError| {
            record_failure(&reported, error);
        });
        render_loop.start();

        let mut session = Session {
            render_loop,
            bridge: ResizeBridge::new(viewport),
            failure: Rc::clone(&failure),
        };

        let result = event_loop.run(move |event, elwt| match event {
            Event::NewEvents(StartCause::Init) => elwt.set_control_flow(ControlFlow::Wait),
            Event::WindowEvent { window_id: id, event } if id == window_id => match event {
                WindowEvent::CloseRequested => {
                    tracing::info!(target: "app", "Close requested");
                    session.teardown();
                    elwt.exit();
                }
                WindowEvent::Resized(size) => session.bridge.notify(size.width, size.height),
                WindowEvent::RedrawRequested => {
                    session.flush_resize();
                    session.render_loop.run_frame();
                }
                WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            logical_key: Key::Character(ref key),
                            state: ElementState::Pressed,
                            repeat: false,
                            ..
                        },
                    ..
                } if key.eq_ignore_ascii_case("p") => session.toggle_pause(),
                _ => {}
            },
            Event::AboutToWait => {
                session.flush_resize();
                if session.has_stopped() {
                    session.teardown();
                    elwt.exit();
                }
            }
            Event::LoopExiting => session.teardown(),
            _ => {}
        });

        result.map_err(|e| AppError::EventLoop(format!("Event loop error: {}", e)))?;

        let failure = failure.borrow_mut().take();
        match failure {
            Some(error) => Err(error.into()),
            None => {
                tracing::info!(target: "app", "Particle backdrop shut down");
                Ok(())
            }
        }
    }
}
