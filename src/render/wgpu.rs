use std::collections::HashMap;
use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::config::GraphicsConfig;
use crate::core::error::{RenderError, RenderResult};
use crate::render::backend::{
    BufferDescriptor, BufferHandle, PipelineHandle, PointPipelineDescriptor, RenderBackend,
    RenderCommand,
};
use crate::render::pipeline::PipelineBuilder;
use crate::render::Viewport;

struct PointPipeline {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
}

/// 基于 wgpu 的渲染后端
///
/// 独占窗口表面、设备和队列；`release` 后表面被丢弃，所有操作返回 `InvalidState`。
pub struct WgpuBackend {
    surface: Option<wgpu::Surface<'static>>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    uniform_bgl: wgpu::BindGroupLayout,
    buffers: HashMap<u64, wgpu::Buffer>,
    pipelines: HashMap<u64, PointPipeline>,
    next_id: u64,
}

impl WgpuBackend {
    /// 在窗口上创建表面、适配器和设备，并按初始视口配置表面
    pub async fn new(
        window: Arc<Window>,
        viewport: Viewport,
        graphics: &GraphicsConfig,
    ) -> RenderResult<Self> {
        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(window)
            .map_err(|e| RenderError::SurfaceCreation(e.to_string()))?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: graphics.power_preference.into(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Particle Field Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults()
                        .using_resolution(adapter.limits()),
                },
                None,
            )
            .await
            .map_err(|e| RenderError::DeviceRequest(e.to_string()))?;
        device.on_uncaptured_error(Box::new(|error| {
            tracing::error!(target: "backend", "Uncaptured wgpu error: {}", error);
        }));

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|format| format.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| {
                RenderError::SurfaceCreation("surface reports no supported formats".to_string())
            })?;
        let alpha_mode = [
            wgpu::CompositeAlphaMode::PreMultiplied,
            wgpu::CompositeAlphaMode::PostMultiplied,
        ]
        .into_iter()
        .find(|mode| caps.alpha_modes.contains(mode))
        .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let present_mode = if graphics.vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: viewport.width(),
            height: viewport.height(),
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        tracing::info!(
            target: "backend",
            "Using adapter {:?} with {:?} surface ({:?} alpha)",
            adapter.get_info().name,
            format,
            alpha_mode
        );

        let uniform_bgl = PipelineBuilder::create_uniform_bind_group_layout(&device);

        Ok(Self {
            surface: Some(surface),
            device,
            queue,
            config,
            uniform_bgl,
            buffers: HashMap::new(),
            pipelines: HashMap::new(),
            next_id: 1,
        })
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    fn surface(&self) -> RenderResult<&wgpu::Surface<'static>> {
        self.surface
            .as_ref()
            .ok_or_else(|| RenderError::InvalidState("context released".to_string()))
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// 获取当前帧；表面过期或丢失时重新配置一次
    fn acquire_frame(
        &self,
        surface: &wgpu::Surface<'static>,
    ) -> RenderResult<wgpu::SurfaceTexture> {
        match surface.get_current_texture() {
            Ok(frame) => Ok(frame),
            Err(wgpu::SurfaceError::Outdated) | Err(wgpu::SurfaceError::Lost) => {
                tracing::debug!(target: "backend", "Surface outdated, reconfiguring");
                surface.configure(&self.device, &self.config);
                surface
                    .get_current_texture()
                    .map_err(|e| RenderError::Surface(e.to_string()))
            }
            Err(e) => Err(RenderError::Surface(e.to_string())),
        }
    }

    /// 把命令列表切分为渲染通道逐个编码
    fn encode(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        commands: &[RenderCommand],
    ) -> RenderResult<()> {
        let mut rest = commands;
        while let Some((first, tail)) = rest.split_first() {
            match first {
                RenderCommand::BeginRenderPass { clear_color } => {
                    let end = tail
                        .iter()
                        .position(|command| *command == RenderCommand::EndRenderPass)
                        .ok_or_else(|| {
                            RenderError::InvalidState("unterminated render pass".to_string())
                        })?;
                    self.encode_pass(encoder, view, *clear_color, &tail[..end])?;
                    rest = &tail[end + 1..];
                }
                other => {
                    return Err(RenderError::InvalidState(format!(
                        "{:?} outside of a render pass",
                        other
                    )))
                }
            }
        }
        Ok(())
    }

    fn encode_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        clear_color: [f64; 4],
        commands: &[RenderCommand],
    ) -> RenderResult<()> {
        let [r, g, b, a] = clear_color;
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Particle Field Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        for command in commands {
            match command {
                RenderCommand::SetPipeline { pipeline } => {
                    let point = self.pipelines.get(&pipeline.0).ok_or_else(|| {
                        RenderError::InvalidState(format!("unknown pipeline {}", pipeline.0))
                    })?;
                    pass.set_pipeline(&point.pipeline);
                    pass.set_bind_group(0, &point.bind_group, &[]);
                }
                RenderCommand::SetVertexBuffer { slot, buffer } => {
                    let vertex = self.buffers.get(&buffer.0).ok_or_else(|| {
                        RenderError::InvalidState(format!("unknown buffer {}", buffer.0))
                    })?;
                    pass.set_vertex_buffer(*slot, vertex.slice(..));
                }
                RenderCommand::Draw {
                    vertex_count,
                    instance_count,
                } => pass.draw(0..*vertex_count, 0..*instance_count),
                RenderCommand::BeginRenderPass { .. } | RenderCommand::EndRenderPass => {
                    return Err(RenderError::InvalidState(
                        "nested render pass".to_string(),
                    ))
                }
            }
        }
        Ok(())
    }
}

impl RenderBackend for WgpuBackend {
    fn create_buffer(
        &mut self,
        desc: &BufferDescriptor,
        contents: Option<&[u8]>,
    ) -> RenderResult<BufferHandle> {
        self.surface()?;
        let buffer = match contents {
            Some(bytes) => self
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: desc.label.as_deref(),
                    contents: bytes,
                    usage: desc.usage.into(),
                }),
            None => self.device.create_buffer(&wgpu::BufferDescriptor {
                label: desc.label.as_deref(),
                size: desc.size,
                usage: desc.usage.into(),
                mapped_at_creation: false,
            }),
        };
        let id = self.allocate_id();
        self.buffers.insert(id, buffer);
        Ok(BufferHandle(id))
    }

    fn write_buffer(
        &mut self,
        buffer: BufferHandle,
        offset: u64,
        data: &[u8],
    ) -> RenderResult<()> {
        self.surface()?;
        let target = self
            .buffers
            .get(&buffer.0)
            .ok_or_else(|| RenderError::InvalidState(format!("unknown buffer {}", buffer.0)))?;
        self.queue.write_buffer(target, offset, data);
        Ok(())
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        if let Some(buffer) = self.buffers.remove(&buffer.0) {
            buffer.destroy();
        }
    }

    fn create_point_pipeline(
        &mut self,
        desc: &PointPipelineDescriptor,
    ) -> RenderResult<PipelineHandle> {
        self.surface()?;
        let uniform_buffer = self.buffers.get(&desc.uniform_buffer.0).ok_or_else(|| {
            RenderError::PipelineCreation(format!(
                "uniform buffer {} does not exist",
                desc.uniform_buffer.0
            ))
        })?;
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Field Uniform BG"),
            layout: &self.uniform_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });
        let pipeline = PipelineBuilder::create_point_pipeline(
            &self.device,
            self.config.format,
            &self.uniform_bgl,
            desc.blend,
            desc.label.as_deref(),
        );
        let id = self.allocate_id();
        self.pipelines.insert(
            id,
            PointPipeline {
                pipeline,
                bind_group,
            },
        );
        Ok(PipelineHandle(id))
    }

    fn destroy_pipeline(&mut self, pipeline: PipelineHandle) {
        self.pipelines.remove(&pipeline.0);
    }

    fn configure_surface(&mut self, width: u32, height: u32) -> RenderResult<()> {
        if width == 0 || height == 0 {
            return Err(RenderError::Surface(format!(
                "cannot configure {}x{} surface",
                width, height
            )));
        }
        self.config.width = width;
        self.config.height = height;
        let surface = self.surface()?;
        surface.configure(&self.device, &self.config);
        Ok(())
    }

    fn submit(&mut self, commands: &[RenderCommand]) -> RenderResult<()> {
        let surface = self.surface()?;
        let frame = self.acquire_frame(surface)?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Particle Field Encoder"),
            });

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let encoded = self.encode(&mut encoder, &view, commands);
        if encoded.is_ok() {
            self.queue.submit(Some(encoder.finish()));
        }
        let validation = pollster::block_on(self.device.pop_error_scope());
        encoded?;
        if let Some(error) = validation {
            return Err(RenderError::FrameSubmission(error.to_string()));
        }

        frame.present();
        Ok(())
    }

    fn release(&mut self) {
        for (_, buffer) in self.buffers.drain() {
            buffer.destroy();
        }
        self.pipelines.clear();
        if self.surface.take().is_some() {
            tracing::info!(target: "backend", "wgpu context released");
        }
    }

    fn name(&self) -> &str {
        "wgpu"
    }
}
