//! 渲染后端抽象
//!
//! `ParticleField` 只通过 [`RenderBackend`] 使用 GPU，使生命周期逻辑可以脱离真实设备测试。
//!
//! - [`crate::render::wgpu::WgpuBackend`]: 基于 wgpu 的实现
//! - [`TrackingBackend`]: 记录资源分配的测试替身，可注入失败

use crate::core::error::{RenderError, RenderResult};
use crate::platform::RenderSurface;
use crate::render::Viewport;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// 缓冲区描述符
#[derive(Debug, Clone)]
pub struct BufferDescriptor {
    /// 标签
    pub label: Option<String>,
    /// 大小（字节）
    pub size: u64,
    /// 用途
    pub usage: BufferUsage,
}

/// 缓冲区用途
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferUsage(pub u32);

impl BufferUsage {
    pub const VERTEX: Self = Self(1);
    pub const UNIFORM: Self = Self(4);
    pub const COPY_DST: Self = Self(32);

    pub fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }
}

impl std::ops::BitOr for BufferUsage {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl From<BufferUsage> for wgpu::BufferUsages {
    fn from(usage: BufferUsage) -> Self {
        let mut out = wgpu::BufferUsages::empty();
        if usage.contains(BufferUsage::VERTEX) {
            out |= wgpu::BufferUsages::VERTEX;
        }
        if usage.contains(BufferUsage::UNIFORM) {
            out |= wgpu::BufferUsages::UNIFORM;
        }
        if usage.contains(BufferUsage::COPY_DST) {
            out |= wgpu::BufferUsages::COPY_DST;
        }
        out
    }
}

/// 混合模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    /// 不透明
    Opaque,
    /// 标准 alpha 混合
    Alpha,
}

/// 点精灵管线描述符
#[derive(Debug, Clone)]
pub struct PointPipelineDescriptor {
    /// 标签
    pub label: Option<String>,
    /// 绑定到 group(0) binding(0) 的 uniform 缓冲区
    pub uniform_buffer: BufferHandle,
    /// 混合模式
    pub blend: BlendMode,
}

/// 渲染命令
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    /// 开始渲染通道并以给定颜色清屏
    BeginRenderPass { clear_color: [f64; 4] },
    /// 结束渲染通道
    EndRenderPass,
    /// 设置管线（连同其 uniform 绑定组）
    SetPipeline { pipeline: PipelineHandle },
    /// 设置顶点缓冲区
    SetVertexBuffer { slot: u32, buffer: BufferHandle },
    /// 绘制
    Draw {
        vertex_count: u32,
        instance_count: u32,
    },
}

/// 抽象缓冲区句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u64);

/// 抽象管线句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineHandle(pub u64);

/// 渲染后端 Trait
///
/// 后端独占一个绘制上下文；`release` 之后所有操作都应返回错误。
pub trait RenderBackend {
    /// 创建缓冲区，`contents` 为 `Some` 时以其内容初始化
    fn create_buffer(
        &mut self,
        desc: &BufferDescriptor,
        contents: Option<&[u8]>,
    ) -> RenderResult<BufferHandle>;

    /// 写入缓冲区数据
    fn write_buffer(&mut self, buffer: BufferHandle, offset: u64, data: &[u8])
        -> RenderResult<()>;

    /// 销毁缓冲区
    fn destroy_buffer(&mut self, buffer: BufferHandle);

    /// 创建点精灵管线
    fn create_point_pipeline(
        &mut self,
        desc: &PointPipelineDescriptor,
    ) -> RenderResult<PipelineHandle>;

    /// 销毁管线
    fn destroy_pipeline(&mut self, pipeline: PipelineHandle);

    /// 按像素尺寸重新配置绘制缓冲区
    fn configure_surface(&mut self, width: u32, height: u32) -> RenderResult<()>;

    /// 提交渲染命令并呈现一帧
    fn submit(&mut self, commands: &[RenderCommand]) -> RenderResult<()>;

    /// 释放绘制上下文
    fn release(&mut self);

    /// 获取后端名称
    fn name(&self) -> &str;
}

// ============================================================================
// 资源跟踪后端（测试替身）
// ============================================================================

/// 资源跟踪统计
///
/// 由 [`TrackingSurface`] 和它创建的所有 [`TrackingBackend`] 共享，
/// 句柄销毁后仍可检查。
#[derive(Debug, Default)]
pub struct TrackingStats {
    live_buffers: AtomicU64,
    live_pipelines: AtomicU64,
    live_buffer_bytes: AtomicU64,
    context_live: AtomicBool,
    buffer_allocations: AtomicU64,
    buffer_writes: AtomicU64,
    surface_configurations: AtomicU64,
    submissions: AtomicU64,
    last_commands: Mutex<Vec<RenderCommand>>,
}

impl TrackingStats {
    pub fn live_buffers(&self) -> u64 {
        self.live_buffers.load(Ordering::SeqCst)
    }

    pub fn live_pipelines(&self) -> u64 {
        self.live_pipelines.load(Ordering::SeqCst)
    }

    pub fn live_buffer_bytes(&self) -> u64 {
        self.live_buffer_bytes.load(Ordering::SeqCst)
    }

    pub fn is_context_live(&self) -> bool {
        self.context_live.load(Ordering::SeqCst)
    }

    /// 存活的 GPU 资源总数（缓冲区 + 管线 + 上下文）
    pub fn live_allocations(&self) -> u64 {
        self.live_buffers() + self.live_pipelines() + u64::from(self.is_context_live())
    }

    /// 累计缓冲区分配次数
    pub fn buffer_allocations(&self) -> u64 {
        self.buffer_allocations.load(Ordering::SeqCst)
    }

    pub fn buffer_writes(&self) -> u64 {
        self.buffer_writes.load(Ordering::SeqCst)
    }

    /// 累计绘制缓冲区配置次数（包括获取上下文时的首次配置）
    pub fn surface_configurations(&self) -> u64 {
        self.surface_configurations.load(Ordering::SeqCst)
    }

    /// 累计提交次数（包括失败的提交）
    pub fn submissions(&self) -> u64 {
        self.submissions.load(Ordering::SeqCst)
    }

    /// 最近一次提交的命令
    pub fn last_commands(&self) -> Vec<RenderCommand> {
        self.last_commands
            .lock()
            .map(|commands| commands.clone())
            .unwrap_or_default()
    }
}

/// 资源跟踪后端
pub struct TrackingBackend {
    stats: Arc<TrackingStats>,
    next_id: u64,
    buffers: HashMap<u64, u64>,
    pipelines: HashSet<u64>,
    fail_submission: Option<u64>,
    released: bool,
}

impl TrackingBackend {
    fn new(stats: Arc<TrackingStats>, fail_submission: Option<u64>) -> Self {
        stats.context_live.store(true, Ordering::SeqCst);
        Self {
            stats,
            next_id: 1,
            buffers: HashMap::new(),
            pipelines: HashSet::new(),
            fail_submission,
            released: false,
        }
    }

    pub fn stats(&self) -> Arc<TrackingStats> {
        Arc::clone(&self.stats)
    }

    fn ensure_live(&self) -> RenderResult<()> {
        if self.released {
            return Err(RenderError::InvalidState("context released".to_string()));
        }
        Ok(())
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn check_command(&self, command: &RenderCommand) -> RenderResult<()> {
        match command {
            RenderCommand::SetPipeline { pipeline } if !self.pipelines.contains(&pipeline.0) => {
                Err(RenderError::InvalidState(format!(
                    "unknown pipeline {}",
                    pipeline.0
                )))
            }
            RenderCommand::SetVertexBuffer { buffer, .. }
                if !self.buffers.contains_key(&buffer.0) =>
            {
                Err(RenderError::InvalidState(format!(
                    "unknown buffer {}",
                    buffer.0
                )))
            }
            _ => Ok(()),
        }
    }
}

impl RenderBackend for TrackingBackend {
    fn create_buffer(
        &mut self,
        desc: &BufferDescriptor,
        contents: Option<&[u8]>,
    ) -> RenderResult<BufferHandle> {
        self.ensure_live()?;
        let size = contents.map_or(desc.size, |bytes| bytes.len() as u64);
        let id = self.allocate_id();
        self.buffers.insert(id, size);
        self.stats.live_buffers.fetch_add(1, Ordering::SeqCst);
        self.stats.live_buffer_bytes.fetch_add(size, Ordering::SeqCst);
        self.stats.buffer_allocations.fetch_add(1, Ordering::SeqCst);
        Ok(BufferHandle(id))
    }

    fn write_buffer(
        &mut self,
        buffer: BufferHandle,
        offset: u64,
        data: &[u8],
    ) -> RenderResult<()> {
        self.ensure_live()?;
        let size = self
            .buffers
            .get(&buffer.0)
            .copied()
            .ok_or_else(|| RenderError::InvalidState(format!("unknown buffer {}", buffer.0)))?;
        if offset + data.len() as u64 > size {
            return Err(RenderError::InvalidState(format!(
                "write of {} bytes at {} overflows buffer of {} bytes",
                data.len(),
                offset,
                size
            )));
        }
        self.stats.buffer_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        if let Some(size) = self.buffers.remove(&buffer.0) {
            self.stats.live_buffers.fetch_sub(1, Ordering::SeqCst);
            self.stats.live_buffer_bytes.fetch_sub(size, Ordering::SeqCst);
        }
    }

    fn create_point_pipeline(
        &mut self,
        desc: &PointPipelineDescriptor,
    ) -> RenderResult<PipelineHandle> {
        self.ensure_live()?;
        if !self.buffers.contains_key(&desc.uniform_buffer.0) {
            return Err(RenderError::PipelineCreation(format!(
                "uniform buffer {} does not exist",
                desc.uniform_buffer.0
            )));
        }
        let id = self.allocate_id();
        self.pipelines.insert(id);
        self.stats.live_pipelines.fetch_add(1, Ordering::SeqCst);
        Ok(PipelineHandle(id))
    }

    fn destroy_pipeline(&mut self, pipeline: PipelineHandle) {
        if self.pipelines.remove(&pipeline.0) {
            self.stats.live_pipelines.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn configure_surface(&mut self, width: u32, height: u32) -> RenderResult<()> {
        self.ensure_live()?;
        if width == 0 || height == 0 {
            return Err(RenderError::Surface(format!(
                "cannot configure {}x{} surface",
                width, height
            )));
        }
        self.stats
            .surface_configurations
            .fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn submit(&mut self, commands: &[RenderCommand]) -> RenderResult<()> {
        self.ensure_live()?;
        let submission = self.stats.submissions.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_submission == Some(submission) {
            return Err(RenderError::FrameSubmission(format!(
                "injected failure on submission {}",
                submission
            )));
        }
        for command in commands {
            self.check_command(command)?;
        }
        if let Ok(mut last) = self.stats.last_commands.lock() {
            *last = commands.to_vec();
        }
        Ok(())
    }

    fn release(&mut self) {
        for (_, size) in self.buffers.drain() {
            self.stats.live_buffers.fetch_sub(1, Ordering::SeqCst);
            self.stats.live_buffer_bytes.fetch_sub(size, Ordering::SeqCst);
        }
        let pipelines = self.pipelines.len() as u64;
        self.pipelines.clear();
        self.stats
            .live_pipelines
            .fetch_sub(pipelines, Ordering::SeqCst);
        self.stats.context_live.store(false, Ordering::SeqCst);
        self.released = true;
    }

    fn name(&self) -> &str {
        "tracking"
    }
}

/// 资源跟踪表面
///
/// # 示例
///
/// ```
/// use particle_backdrop::render::backend::TrackingSurface;
///
/// let surface = TrackingSurface::new().fail_on_submission(5);
/// let stats = surface.stats();
/// assert_eq!(stats.live_allocations(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TrackingSurface {
    stats: Arc<TrackingStats>,
    unavailable: bool,
    fail_submission: Option<u64>,
}

impl TrackingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// 模拟无法提供 GPU 上下文的表面
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// 第 `n` 次提交（从 1 开始）返回错误
    pub fn fail_on_submission(mut self, n: u64) -> Self {
        self.fail_submission = Some(n);
        self
    }

    pub fn stats(&self) -> Arc<TrackingStats> {
        Arc::clone(&self.stats)
    }
}

impl RenderSurface for TrackingSurface {
    type Backend = TrackingBackend;

    fn acquire_context(&self, viewport: Viewport) -> RenderResult<TrackingBackend> {
        if self.unavailable {
            return Err(RenderError::SurfaceCreation(
                "surface has no GPU-backed context".to_string(),
            ));
        }
        let mut backend = TrackingBackend::new(self.stats(), self.fail_submission);
        backend.configure_surface(viewport.width(), viewport.height())?;
        Ok(backend)
    }
}
