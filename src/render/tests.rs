//! 渲染模块测试
//!
//! 通过资源跟踪后端验证粒子场的完整生命周期。

#[cfg(test)]
mod tests {
    use crate::config::{CameraConfig, FieldConfig};
    use crate::core::error::FieldError;
    use crate::core::scheduler::{LoopState, ManualScheduler, RenderLoop};
    use crate::render::backend::{TrackingBackend, TrackingSurface};
    use crate::render::particles::{FieldHandle, ParticleField};
    use crate::render::Viewport;
    use proptest::prelude::*;

    fn mount(surface: &TrackingSurface) -> FieldHandle<TrackingBackend> {
        let field = FieldConfig {
            seed: Some(7),
            ..Default::default()
        };
        ParticleField::mount_with(
            surface,
            Viewport::new(800, 600).unwrap(),
            &field,
            &CameraConfig::default(),
        )
        .unwrap()
    }

    // ========================================
    // 旋转
    // ========================================

    #[test]
    fn test_thousand_ticks_rotate_half_radian() {
        let surface = TrackingSurface::new();
        let mut handle = mount(&surface);
        for _ in 0..1000 {
            ParticleField::tick(&mut handle).unwrap();
        }
        let [x, y] = handle.rotation().angles();
        assert!((x - 0.5).abs() < 1e-9);
        assert!((y - 0.5).abs() < 1e-9);
        assert_eq!(surface.stats().submissions(), 1000);
        ParticleField::dispose(&mut handle).unwrap();
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_rotation_tracks_frame_count(frames in 0u64..2000) {
            let surface = TrackingSurface::new();
            let handle = mount(&surface);
            let mut render_loop = RenderLoop::new(ManualScheduler::new(), handle);
            render_loop.start();
            while render_loop.frames() < frames {
                render_loop.run_frame();
            }
            render_loop.cancel();

            let mut handle = render_loop.take_target().unwrap();
            let expected = (frames as f64 * 0.0005).rem_euclid(std::f64::consts::TAU);
            let [x, y] = handle.rotation().angles();
            prop_assert!((x - expected).abs() < 1e-9);
            prop_assert!((y - expected).abs() < 1e-9);
            ParticleField::dispose(&mut handle).unwrap();
        }
    }

    // ========================================
    // 尺寸变化
    // ========================================

    #[test]
    fn test_resize_updates_aspect_keeps_points() {
        let surface = TrackingSurface::new();
        let mut handle = mount(&surface);
        let before = handle.point_cloud().clone();

        ParticleField::resize(&mut handle, Viewport::new(1024, 768).unwrap()).unwrap();

        assert!((handle.camera().aspect() - 1024.0 / 768.0).abs() < 1e-6);
        assert_eq!(handle.point_cloud(), &before);
        assert_eq!(handle.uniforms().viewport, [1024.0, 768.0]);
        ParticleField::dispose(&mut handle).unwrap();
    }

    #[test]
    fn test_identical_resize_allocates_nothing() {
        let surface = TrackingSurface::new();
        let stats = surface.stats();
        let mut handle = mount(&surface);
        let viewport = Viewport::new(1280, 720).unwrap();

        ParticleField::resize(&mut handle, viewport).unwrap();
        let allocations = stats.buffer_allocations();
        let configurations = stats.surface_configurations();

        ParticleField::resize(&mut handle, viewport).unwrap();
        assert_eq!(stats.buffer_allocations(), allocations);
        assert_eq!(stats.surface_configurations(), configurations);
        ParticleField::dispose(&mut handle).unwrap();
    }

    #[test]
    fn test_tick_never_regenerates_points() {
        let surface = TrackingSurface::new();
        let stats = surface.stats();
        let mut handle = mount(&surface);
        let before = handle.point_cloud().clone();
        for _ in 0..10 {
            ParticleField::tick(&mut handle).unwrap();
        }
        assert_eq!(handle.point_cloud(), &before);
        assert_eq!(stats.buffer_allocations(), 2);
        ParticleField::dispose(&mut handle).unwrap();
    }

    // ========================================
    // 生命周期
    // ========================================

    #[test]
    fn test_mount_dispose_leaves_nothing_live() {
        let surface = TrackingSurface::new();
        let stats = surface.stats();
        let mut handle = mount(&surface);
        assert!(stats.is_context_live());

        ParticleField::dispose(&mut handle).unwrap();
        assert_eq!(stats.live_allocations(), 0);
        assert_eq!(stats.live_buffer_bytes(), 0);
    }

    #[test]
    #[cfg(debug_assertions)]
    fn test_use_after_dispose_is_reported() {
        let surface = TrackingSurface::new();
        let mut handle = mount(&surface);
        ParticleField::dispose(&mut handle).unwrap();

        assert_eq!(
            ParticleField::tick(&mut handle),
            Err(FieldError::UseAfterDispose)
        );
        assert_eq!(
            ParticleField::resize(&mut handle, Viewport::new(10, 10).unwrap()),
            Err(FieldError::UseAfterDispose)
        );
        assert_eq!(surface.stats().submissions(), 0);
    }

    #[test]
    fn test_loop_stops_on_fifth_tick_failure() {
        let surface = TrackingSurface::new().fail_on_submission(5);
        let stats = surface.stats();
        let handle = mount(&surface);

        let failures = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut render_loop = RenderLoop::new(ManualScheduler::new(), handle);
        let seen = std::rc::Rc::clone(&failures);
        render_loop.on_failure(move |error| seen.borrow_mut().push(error.clone()));

        render_loop.start();
        for _ in 0..20 {
            render_loop.run_frame();
        }

        assert_eq!(render_loop.state(), LoopState::Stopped);
        assert_eq!(failures.borrow().len(), 1);
        assert!(matches!(failures.borrow()[0], FieldError::Render(_)));
        assert_eq!(stats.submissions(), 5);

        let mut handle = render_loop.take_target().unwrap();
        ParticleField::dispose(&mut handle).unwrap();
        assert_eq!(stats.live_allocations(), 0);
    }
}
