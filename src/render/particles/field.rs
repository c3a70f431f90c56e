//! 粒子场
//!
//! `ParticleField` 是无状态服务，所有状态都在 `mount` 返回的 [`FieldHandle`] 中，
//! 之后的每次调用都显式传入该句柄。
//!
//! ```text
//! mount ──► FieldHandle ──► tick / resize ... ──► dispose
//!              │
//!              └─ backend · camera · point cloud · rotation · GPU resources
//! ```

use crate::config::{CameraConfig, FieldConfig};
use crate::core::error::{FieldError, FieldResult, RenderResult};
use crate::core::scheduler::FrameTarget;
use crate::platform::RenderSurface;
use crate::render::backend::{
    BlendMode, BufferDescriptor, BufferHandle, BufferUsage, PipelineHandle,
    PointPipelineDescriptor, RenderBackend, RenderCommand,
};
use crate::render::camera::PerspectiveCamera;
use crate::render::particles::cloud::{PointCloud, PointStyle};
use crate::render::pipeline::{FieldUniforms, VERTICES_PER_POINT};
use crate::render::Viewport;
use glam::Mat4;
use std::f64::consts::TAU;

/// 透明清屏色
pub const CLEAR_COLOR: [f64; 4] = [0.0, 0.0, 0.0, 0.0];

/// 点云整体旋转
///
/// 只保存帧计数，角度在读取时按 `frames × delta mod 2π` 计算，长时间运行也不会累积误差。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation {
    frames: u64,
    delta: [f64; 2],
}

impl Rotation {
    pub fn new(delta: [f64; 2]) -> Self {
        Self { frames: 0, delta }
    }

    /// 前进一帧
    pub fn advance(&mut self) {
        self.frames = self.frames.wrapping_add(1);
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// X/Y 轴角度（弧度），位于 [0, 2π)
    pub fn angles(&self) -> [f64; 2] {
        let frames = self.frames as f64;
        [
            (frames * self.delta[0]).rem_euclid(TAU),
            (frames * self.delta[1]).rem_euclid(TAU),
        ]
    }

    /// 模型矩阵，先绕 X 再绕 Y（XYZ 欧拉顺序）
    pub fn model_matrix(&self) -> Mat4 {
        let [x, y] = self.angles();
        Mat4::from_rotation_x(x as f32) * Mat4::from_rotation_y(y as f32)
    }
}

#[derive(Debug, Clone, Copy)]
struct FieldResources {
    point_buffer: BufferHandle,
    uniform_buffer: BufferHandle,
    pipeline: PipelineHandle,
}

/// 已挂载的粒子场
///
/// 持有绘制上下文和全部 GPU 资源。未经 `dispose` 就被丢弃时会在 `Drop` 中释放并告警。
pub struct FieldHandle<B: RenderBackend> {
    backend: B,
    camera: PerspectiveCamera,
    viewport: Viewport,
    cloud: PointCloud,
    style: PointStyle,
    rotation: Rotation,
    resources: Option<FieldResources>,
}

impl<B: RenderBackend> FieldHandle<B> {
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn point_cloud(&self) -> &PointCloud {
        &self.cloud
    }

    pub fn style(&self) -> &PointStyle {
        &self.style
    }

    pub fn rotation(&self) -> &Rotation {
        &self.rotation
    }

    pub fn model_matrix(&self) -> Mat4 {
        self.rotation.model_matrix()
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn is_disposed(&self) -> bool {
        self.resources.is_none()
    }

    /// 当前帧的 uniform 数据
    pub fn uniforms(&self) -> FieldUniforms {
        let height = self.viewport.height() as f32;
        FieldUniforms {
            view_proj: self.camera.view_projection().to_cols_array_2d(),
            model: self.rotation.model_matrix().to_cols_array_2d(),
            color: self.style.rgba(),
            viewport: [self.viewport.width() as f32, height],
            point_px_scale: self.style.size * height * 0.5,
            min_point_px: self.style.min_px,
        }
    }

    fn render_commands(&self, resources: &FieldResources) -> [RenderCommand; 5] {
        [
            RenderCommand::BeginRenderPass {
                clear_color: CLEAR_COLOR,
            },
            RenderCommand::SetPipeline {
                pipeline: resources.pipeline,
            },
            RenderCommand::SetVertexBuffer {
                slot: 0,
                buffer: resources.point_buffer,
            },
            RenderCommand::Draw {
                vertex_count: VERTICES_PER_POINT,
                instance_count: self.cloud.len() as u32,
            },
            RenderCommand::EndRenderPass,
        ]
    }

    /// 释放全部资源，返回此前是否持有资源
    fn release_resources(&mut self) -> bool {
        match self.resources.take() {
            Some(resources) => {
                self.backend.destroy_pipeline(resources.pipeline);
                self.backend.destroy_buffer(resources.uniform_buffer);
                self.backend.destroy_buffer(resources.point_buffer);
                self.backend.release();
                true
            }
            None => false,
        }
    }
}

impl<B: RenderBackend> Drop for FieldHandle<B> {
    fn drop(&mut self) {
        if self.release_resources() {
            tracing::warn!(
                target: "particle_field",
                "FieldHandle dropped without dispose; GPU resources released in drop"
            );
        }
    }
}

impl<B: RenderBackend> FrameTarget for FieldHandle<B> {
    fn tick(&mut self) -> FieldResult<()> {
        ParticleField::tick(self)
    }
}

/// 粒子场服务
pub struct ParticleField;

impl ParticleField {
    /// 以默认风格挂载粒子场
    pub fn mount<S: RenderSurface>(
        surface: &S,
        viewport: Viewport,
    ) -> FieldResult<FieldHandle<S::Backend>> {
        Self::mount_with(
            surface,
            viewport,
            &FieldConfig::default(),
            &CameraConfig::default(),
        )
    }

    /// 挂载粒子场
    ///
    /// 获取绘制上下文，生成点云并上传，创建 uniform 缓冲区和点精灵管线。
    ///
    /// # 错误
    ///
    /// 配置未通过验证时返回 `FieldError::InvalidConfig`，此时不获取绘制上下文；
    /// 表面无法提供绘制上下文时返回 `FieldError::SurfaceUnavailable`；
    /// 资源创建失败时释放已分配的资源并返回 `FieldError::Render`。
    pub fn mount_with<S: RenderSurface>(
        surface: &S,
        viewport: Viewport,
        field: &FieldConfig,
        camera: &CameraConfig,
    ) -> FieldResult<FieldHandle<S::Backend>> {
        field
            .validate()
            .and_then(|()| camera.validate())
            .map_err(|e| {
                tracing::warn!(target: "particle_field", "Rejected config: {}", e);
                FieldError::InvalidConfig(e.to_string())
            })?;

        let mut backend = surface.acquire_context(viewport).map_err(|e| {
            tracing::warn!(target: "particle_field", "Surface unavailable: {}", e);
            FieldError::SurfaceUnavailable(e.to_string())
        })?;

        let cloud = PointCloud::from_config(field);
        let resources = match Self::create_resources(&mut backend, &cloud) {
            Ok(resources) => resources,
            Err(e) => {
                backend.release();
                return Err(e.into());
            }
        };

        tracing::info!(
            target: "particle_field",
            "Mounted {} points on {} backend at {}x{}",
            cloud.len(),
            backend.name(),
            viewport.width(),
            viewport.height()
        );

        Ok(FieldHandle {
            backend,
            camera: PerspectiveCamera::new(camera, viewport),
            viewport,
            cloud,
            style: PointStyle::from_config(field),
            rotation: Rotation::new(field.rotation_delta),
            resources: Some(resources),
        })
    }

    fn create_resources<B: RenderBackend>(
        backend: &mut B,
        cloud: &PointCloud,
    ) -> RenderResult<FieldResources> {
        let point_buffer = backend.create_buffer(
            &BufferDescriptor {
                label: Some("Point Cloud Buffer".to_string()),
                size: cloud.as_bytes().len() as u64,
                usage: BufferUsage::VERTEX,
            },
            Some(cloud.as_bytes()),
        )?;
        let uniform_buffer = backend.create_buffer(
            &BufferDescriptor {
                label: Some("Field Uniforms".to_string()),
                size: std::mem::size_of::<FieldUniforms>() as u64,
                usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
            },
            None,
        )?;
        let pipeline = backend.create_point_pipeline(&PointPipelineDescriptor {
            label: Some("Point Pipeline".to_string()),
            uniform_buffer,
            blend: BlendMode::Alpha,
        })?;
        Ok(FieldResources {
            point_buffer,
            uniform_buffer,
            pipeline,
        })
    }

    /// 推进一帧旋转并执行一次渲染通道
    pub fn tick<B: RenderBackend>(handle: &mut FieldHandle<B>) -> FieldResult<()> {
        let Some(resources) = Self::live_resources(handle, "tick")? else {
            return Ok(());
        };

        handle.rotation.advance();
        let uniforms = handle.uniforms();
        handle
            .backend
            .write_buffer(resources.uniform_buffer, 0, bytemuck::bytes_of(&uniforms))?;
        let commands = handle.render_commands(&resources);
        handle.backend.submit(&commands)?;
        Ok(())
    }

    /// 更新相机宽高比并调整绘制缓冲区；视口未变化时不做任何事
    pub fn resize<B: RenderBackend>(
        handle: &mut FieldHandle<B>,
        viewport: Viewport,
    ) -> FieldResult<()> {
        if Self::live_resources(handle, "resize")?.is_none() {
            return Ok(());
        }
        if handle.viewport == viewport {
            tracing::trace!(target: "particle_field", "Resize to current viewport ignored");
            return Ok(());
        }

        handle
            .backend
            .configure_surface(viewport.width(), viewport.height())?;
        handle.camera.set_viewport(viewport);
        handle.viewport = viewport;
        tracing::debug!(
            target: "particle_field",
            "Resized to {}x{}",
            viewport.width(),
            viewport.height()
        );
        Ok(())
    }

    /// 释放全部 GPU 资源和绘制上下文
    pub fn dispose<B: RenderBackend>(handle: &mut FieldHandle<B>) -> FieldResult<()> {
        if Self::live_resources(handle, "dispose")?.is_none() {
            return Ok(());
        }
        handle.release_resources();
        tracing::info!(target: "particle_field", "Particle field disposed");
        Ok(())
    }

    /// 已释放的句柄：调试构建下报错，发布构建下记录日志并跳过
    fn live_resources<B: RenderBackend>(
        handle: &FieldHandle<B>,
        operation: &str,
    ) -> FieldResult<Option<FieldResources>> {
        match handle.resources {
            Some(resources) => Ok(Some(resources)),
            None if cfg!(debug_assertions) => Err(FieldError::UseAfterDispose),
            None => {
                tracing::error!(
                    target: "particle_field",
                    "{} called after dispose; ignored",
                    operation
                );
                Ok(None)
            }
        }
    }
}
