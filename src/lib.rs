//! # Particle Backdrop
//!
//! An animated 3D particle-field backdrop rendered with wgpu behind a host application.
//!
//! ## Features
//!
//! - **Particle Field**: a fixed random point cloud rotating slowly as a whole
//! - **Render Loop**: explicit Idle/Running/Stopped state machine, one tick per scheduled frame
//! - **Resize Bridge**: coalesces window size notifications into viewport updates
//! - **Backend Seam**: GPU access through [`render::backend::RenderBackend`], testable
//!   without a GPU
//!
//! ## Architecture Design
//!
//! This crate follows the **Anemic Domain Model (贫血模型)** pattern:
//! - **State**: [`render::particles::FieldHandle`] stores everything a mounted field owns
//! - **Service**: [`render::particles::ParticleField`] owns the lifecycle as static methods
//! - **Loop**: [`core::scheduler::RenderLoop`] orchestrates when the service runs
//!
//! ### Example
//!
//! ```
//! use particle_backdrop::render::backend::TrackingSurface;
//! use particle_backdrop::render::particles::ParticleField;
//! use particle_backdrop::render::Viewport;
//!
//! let surface = TrackingSurface::new();
//! let mut handle = ParticleField::mount(&surface, Viewport::new(800, 600).unwrap()).unwrap();
//! ParticleField::resize(&mut handle, Viewport::new(1024, 768).unwrap()).unwrap();
//! ParticleField::tick(&mut handle).unwrap();
//! ParticleField::dispose(&mut handle).unwrap();
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Host application, errors and the render loop
//! - [`config`]: Configuration loading and validation
//! - [`platform`]: Drawing surfaces
//! - [`render`]: Backend, pipeline, camera and the particle field
//! - [`services`]: Collaborator contracts for the query UI

/// Host application, error types and the render loop
pub mod core;
/// Configuration system
pub mod config;
/// Platform surfaces
pub mod platform;
/// Rendering system
pub mod render;
/// External collaborator contracts
pub mod services;
