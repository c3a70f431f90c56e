//! 帧调度
//!
//! 单线程协作式渲染循环，每个调度帧恰好执行一次 tick。
//!
//! ## 状态机
//!
//! ```text
//! Idle ──start──► Running ──cancel──► Stopped
//!                   │  ▲                 ▲
//!             pause │  │ resume          │ tick 失败
//!                   ▼  │                 │
//!                (paused) ───────────────┘
//! ```
//!
//! - 同一时刻最多一个帧请求在途
//! - `cancel` 在调度边界生效：之后送达的帧不再 tick
//! - tick 失败时循环停止，错误只通过 `on_failure` 回调报告一次

use crate::core::error::{FieldError, FieldResult};

/// 循环状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// 尚未启动
    Idle,
    /// 运行中（可能处于暂停）
    Running,
    /// 已停止（终态）
    Stopped,
}

impl Default for LoopState {
    fn default() -> Self {
        Self::Idle
    }
}

/// 单帧处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// 执行了一次 tick
    Ticked,
    /// 循环未运行或已暂停，帧被丢弃
    Skipped,
    /// tick 失败，循环已停止
    Failed,
}

/// 帧调度器
///
/// 请求宿主在下一个显示帧调用 [`RenderLoop::run_frame`]。
pub trait FrameScheduler {
    fn request_frame(&mut self);
}

/// 被循环驱动的目标
pub trait FrameTarget {
    fn tick(&mut self) -> FieldResult<()>;
}

/// 手动调度器
///
/// 只记录请求次数，由调用方按固定步长送达帧。
#[derive(Debug, Default)]
pub struct ManualScheduler {
    requests: u64,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// 累计帧请求次数
    pub fn requests(&self) -> u64 {
        self.requests
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) {
        self.requests += 1;
    }
}

type FailureCallback = Box<dyn FnMut(&FieldError)>;

/// 渲染循环
///
/// 从构造起持有目标；只有在不处于 `Running` 时才能通过 [`RenderLoop::take_target`] 取回，
/// 因此目标不会在 tick 在途时被释放。
///
/// # 示例
///
/// ```
/// use particle_backdrop::core::scheduler::{LoopState, ManualScheduler, RenderLoop};
/// use particle_backdrop::render::backend::TrackingSurface;
/// use particle_backdrop::render::particles::ParticleField;
/// use particle_backdrop::render::Viewport;
///
/// let surface = TrackingSurface::new();
/// let handle = ParticleField::mount(&surface, Viewport::new(800, 600).unwrap()).unwrap();
///
/// let mut render_loop = RenderLoop::new(ManualScheduler::new(), handle);
/// render_loop.start();
/// while render_loop.frame_pending() && render_loop.frames() < 3 {
///     render_loop.run_frame();
/// }
/// render_loop.cancel();
/// assert_eq!(render_loop.state(), LoopState::Stopped);
///
/// let mut handle = render_loop.take_target().unwrap();
/// ParticleField::dispose(&mut handle).unwrap();
/// ```
pub struct RenderLoop<S: FrameScheduler, T: FrameTarget> {
    scheduler: S,
    target: Option<T>,
    state: LoopState,
    paused: bool,
    frame_pending: bool,
    frames: u64,
    on_failure: Option<FailureCallback>,
}

impl<S: FrameScheduler, T: FrameTarget> RenderLoop<S, T> {
    pub fn new(scheduler: S, target: T) -> Self {
        Self {
            scheduler,
            target: Some(target),
            state: LoopState::Idle,
            paused: false,
            frame_pending: false,
            frames: 0,
            on_failure: None,
        }
    }

    /// 注册 tick 失败回调
    pub fn on_failure<F>(&mut self, callback: F)
    where
        F: FnMut(&FieldError) + 'static,
    {
        self.on_failure = Some(Box::new(callback));
    }

    /// Idle → Running，并请求第一帧
    pub fn start(&mut self) {
        match self.state {
            LoopState::Idle => {
                self.state = LoopState::Running;
                tracing::info!(target: "render_loop", "Render loop started");
                self.schedule();
            }
            LoopState::Running => {
                tracing::trace!(target: "render_loop", "start ignored: already running");
            }
            LoopState::Stopped => {
                tracing::warn!(target: "render_loop", "start ignored: loop is stopped");
            }
        }
    }

    /// Running → Stopped；已在途的帧送达后不会 tick
    pub fn cancel(&mut self) {
        if self.state != LoopState::Running {
            return;
        }
        self.state = LoopState::Stopped;
        self.frame_pending = false;
        tracing::info!(
            target: "render_loop",
            "Render loop cancelled after {} frames",
            self.frames
        );
    }

    /// 暂停调度，状态保持 Running
    pub fn pause(&mut self) {
        if self.state == LoopState::Running && !self.paused {
            self.paused = true;
            tracing::debug!(target: "render_loop", "Render loop paused");
        }
    }

    /// 恢复调度并请求一帧
    pub fn resume(&mut self) {
        if self.state == LoopState::Running && self.paused {
            self.paused = false;
            tracing::debug!(target: "render_loop", "Render loop resumed");
            self.schedule();
        }
    }

    /// 处理一个送达的帧
    pub fn run_frame(&mut self) -> FrameOutcome {
        self.frame_pending = false;
        if self.state != LoopState::Running || self.paused {
            return FrameOutcome::Skipped;
        }
        let Some(target) = self.target.as_mut() else {
            return FrameOutcome::Skipped;
        };

        match target.tick() {
            Ok(()) => {
                self.frames += 1;
                self.schedule();
                FrameOutcome::Ticked
            }
            Err(error) => {
                self.state = LoopState::Stopped;
                tracing::error!(
                    target: "render_loop",
                    "Tick {} failed, stopping loop: {}",
                    self.frames + 1,
                    error
                );
                if let Some(callback) = self.on_failure.as_mut() {
                    callback(&error);
                }
                FrameOutcome::Failed
            }
        }
    }

    fn schedule(&mut self) {
        if !self.frame_pending {
            self.frame_pending = true;
            self.scheduler.request_frame();
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// 是否有帧请求在途
    pub fn frame_pending(&self) -> bool {
        self.frame_pending
    }

    /// 成功 tick 的次数
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn target(&self) -> Option<&T> {
        self.target.as_ref()
    }

    /// 帧之间可变访问目标（例如转发 resize）
    pub fn target_mut(&mut self) -> Option<&mut T> {
        self.target.as_mut()
    }

    /// 取回目标；循环运行中返回 `None`
    pub fn take_target(&mut self) -> Option<T> {
        if self.state == LoopState::Running {
            tracing::warn!(target: "render_loop", "Target requested while loop is running");
            return None;
        }
        self.target.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::RenderError;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Counter {
        ticks: u64,
        fail_on: Option<u64>,
    }

    impl FrameTarget for Counter {
        fn tick(&mut self) -> FieldResult<()> {
            self.ticks += 1;
            if self.fail_on == Some(self.ticks) {
                return Err(RenderError::FrameSubmission("boom".to_string()).into());
            }
            Ok(())
        }
    }

    fn drive<S: FrameScheduler, T: FrameTarget>(render_loop: &mut RenderLoop<S, T>, limit: u64) {
        let mut delivered = 0;
        while render_loop.frame_pending() && delivered < limit {
            render_loop.run_frame();
            delivered += 1;
        }
    }

    #[test]
    fn test_new_loop_is_idle() {
        let render_loop = RenderLoop::new(ManualScheduler::new(), Counter::default());
        assert_eq!(render_loop.state(), LoopState::Idle);
        assert!(!render_loop.frame_pending());
        assert_eq!(render_loop.scheduler().requests(), 0);
    }

    #[test]
    fn test_start_twice_requests_one_frame() {
        let mut render_loop = RenderLoop::new(ManualScheduler::new(), Counter::default());
        render_loop.start();
        render_loop.start();
        assert_eq!(render_loop.state(), LoopState::Running);
        assert_eq!(render_loop.scheduler().requests(), 1);
    }

    #[test]
    fn test_one_tick_per_frame() {
        let mut render_loop = RenderLoop::new(ManualScheduler::new(), Counter::default());
        render_loop.start();
        drive(&mut render_loop, 10);
        assert_eq!(render_loop.frames(), 10);
        assert_eq!(render_loop.target().map(|c| c.ticks), Some(10));
        assert_eq!(render_loop.scheduler().requests(), 11);
    }

    #[test]
    fn test_cancel_when_idle_is_noop() {
        let mut render_loop = RenderLoop::new(ManualScheduler::new(), Counter::default());
        render_loop.cancel();
        assert_eq!(render_loop.state(), LoopState::Idle);
    }

    #[test]
    fn test_frame_after_cancel_does_not_tick() {
        let mut render_loop = RenderLoop::new(ManualScheduler::new(), Counter::default());
        render_loop.start();
        render_loop.cancel();
        assert_eq!(render_loop.run_frame(), FrameOutcome::Skipped);
        assert_eq!(render_loop.target().map(|c| c.ticks), Some(0));

        render_loop.start();
        assert_eq!(render_loop.state(), LoopState::Stopped);
    }

    #[test]
    fn test_failure_stops_loop_and_reports_once() {
        let target = Counter {
            fail_on: Some(5),
            ..Default::default()
        };
        let reports = Rc::new(Cell::new(0));
        let mut render_loop = RenderLoop::new(ManualScheduler::new(), target);
        let seen = Rc::clone(&reports);
        render_loop.on_failure(move |_| seen.set(seen.get() + 1));

        render_loop.start();
        drive(&mut render_loop, 100);

        assert_eq!(render_loop.state(), LoopState::Stopped);
        assert_eq!(reports.get(), 1);
        assert_eq!(render_loop.frames(), 4);
        assert!(!render_loop.frame_pending());
        assert_eq!(render_loop.run_frame(), FrameOutcome::Skipped);
        assert_eq!(render_loop.target().map(|c| c.ticks), Some(5));
    }

    #[test]
    fn test_pause_and_resume() {
        let mut render_loop = RenderLoop::new(ManualScheduler::new(), Counter::default());
        render_loop.start();
        render_loop.run_frame();
        render_loop.pause();
        assert!(render_loop.is_paused());
        assert_eq!(render_loop.state(), LoopState::Running);

        assert_eq!(render_loop.run_frame(), FrameOutcome::Skipped);
        assert!(!render_loop.frame_pending());

        render_loop.resume();
        assert!(render_loop.frame_pending());
        assert_eq!(render_loop.run_frame(), FrameOutcome::Ticked);
        assert_eq!(render_loop.frames(), 2);
    }

    #[test]
    fn test_take_target_only_when_not_running() {
        let mut render_loop = RenderLoop::new(ManualScheduler::new(), Counter::default());
        render_loop.start();
        assert!(render_loop.take_target().is_none());
        render_loop.cancel();
        assert!(render_loop.take_target().is_some());
        assert_eq!(render_loop.run_frame(), FrameOutcome::Skipped);
    }
}
