//! WGPU 点精灵管线创建
//!
//! 每个点作为一个实例绘制，顶点着色器按 `vertex_index` 展开成面向相机的四边形，
//! 像素尺寸随深度衰减，并不小于 `min_point_px`。

use crate::render::backend::BlendMode;

/// 粒子场 Uniform（对应 WGSL struct `FieldUniforms`）
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FieldUniforms {
    /// 投影 × 视图矩阵
    pub view_proj: [[f32; 4]; 4],
    /// 模型矩阵（点云整体旋转）
    pub model: [[f32; 4]; 4],
    /// RGB + 不透明度
    pub color: [f32; 4],
    /// 视口像素尺寸
    pub viewport: [f32; 2],
    /// 点尺寸 × 视口高度 / 2，除以裁剪空间 w（视图空间深度）即为像素尺寸
    pub point_px_scale: f32,
    /// 最小像素尺寸
    pub min_point_px: f32,
}

/// 每个点展开成两个三角形
pub const VERTICES_PER_POINT: u32 = 6;

/// 单个点的实例数据步长（`vec3<f32>`）
pub const POINT_STRIDE: u64 = std::mem::size_of::<[f32; 3]>() as u64;

pub const POINT_SHADER: &str = r#"
struct FieldUniforms {
    view_proj: mat4x4<f32>,
    model: mat4x4<f32>,
    color: vec4<f32>,
    viewport: vec2<f32>,
    point_px_scale: f32,
    min_point_px: f32,
};
@group(0) @binding(0) var<uniform> uniforms: FieldUniforms;

struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) vi: u32, @location(0) position: vec3<f32>) -> VsOut {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, 1.0)
    );
    let clip = uniforms.view_proj * uniforms.model * vec4<f32>(position, 1.0);
    let w = max(clip.w, 0.0001);
    let size_px = max(uniforms.point_px_scale / w, uniforms.min_point_px);
    let offset = corners[vi % 6u] * size_px / uniforms.viewport * w;
    return VsOut(vec4<f32>(clip.xy + offset, clip.z, clip.w), uniforms.color);
}

@fragment
fn fs_main(@location(0) color: vec4<f32>) -> @location(0) vec4<f32> {
    return color;
}
"#;

/// 管线构建器
pub struct PipelineBuilder;

impl PipelineBuilder {
    /// 创建 Uniform 绑定组布局
    pub fn create_uniform_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Field Uniform BGL"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: std::num::NonZeroU64::new(
                        std::mem::size_of::<FieldUniforms>() as u64,
                    ),
                },
                count: None,
            }],
        })
    }

    /// 创建点精灵渲染管线
    pub fn create_point_pipeline(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        uniform_bgl: &wgpu::BindGroupLayout,
        blend: BlendMode,
        label: Option<&str>,
    ) -> wgpu::RenderPipeline {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Point Shader"),
            source: wgpu::ShaderSource::Wgsl(POINT_SHADER.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Point Pipeline Layout"),
            bind_group_layouts: &[uniform_bgl],
            push_constant_ranges: &[],
        });

        let blend = match blend {
            BlendMode::Opaque => None,
            BlendMode::Alpha => Some(wgpu::BlendState::ALPHA_BLENDING),
        };

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label,
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: POINT_STRIDE,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &[wgpu::VertexAttribute {
                        offset: 0,
                        shader_location: 0,
                        format: wgpu::VertexFormat::Float32x3,
                    }],
                }],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_layout_matches_wgsl() {
        // 2 × mat4 + vec4 + vec2 + 2 × f32，16 字节对齐
        assert_eq!(std::mem::size_of::<FieldUniforms>(), 160);
        assert_eq!(std::mem::size_of::<FieldUniforms>() % 16, 0);
    }

    #[test]
    fn test_shader_entry_points_present() {
        assert!(POINT_SHADER.contains("fn vs_main"));
        assert!(POINT_SHADER.contains("fn fs_main"));
    }
}
