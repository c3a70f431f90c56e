//! 粒子场模块
//!
//! 固定数量的点在立方体内随机分布，作为整体缓慢绕 X/Y 轴旋转。
//!
//! ## 架构设计
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     Particle Field                       │
//! ├─────────────────────────────────────────────────────────┤
//! │  1. Mount                                                │
//! │     - 获取绘制上下文                                      │
//! │     - 生成点云并上传到顶点缓冲区                           │
//! │     - 创建 uniform 缓冲区和点精灵管线                      │
//! │                                                          │
//! │  2. Tick                                                 │
//! │     - 旋转前进一帧                                        │
//! │     - 写入 uniform，执行一次渲染通道                       │
//! │                                                          │
//! │  3. Dispose                                              │
//! │     - 确定性地释放全部 GPU 资源                            │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 使用示例
//!
//! ```
//! use particle_backdrop::render::backend::TrackingSurface;
//! use particle_backdrop::render::particles::ParticleField;
//! use particle_backdrop::render::Viewport;
//!
//! let surface = TrackingSurface::new();
//! let mut handle = ParticleField::mount(&surface, Viewport::new(800, 600).unwrap()).unwrap();
//! ParticleField::tick(&mut handle).unwrap();
//! ParticleField::dispose(&mut handle).unwrap();
//! assert_eq!(surface.stats().live_allocations(), 0);
//! ```

pub mod cloud;
pub mod field;

pub use cloud::{PointCloud, PointStyle};
pub use field::{FieldHandle, ParticleField, Rotation, CLEAR_COLOR};
