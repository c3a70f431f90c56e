use particle_backdrop::config::BackdropConfig;
use particle_backdrop::core::error::FieldError;
use particle_backdrop::core::scheduler::{FrameOutcome, LoopState, ManualScheduler, RenderLoop};
use particle_backdrop::render::backend::TrackingSurface;
use particle_backdrop::render::particles::ParticleField;
use particle_backdrop::render::{ResizeBridge, Viewport};
use std::cell::Cell;
use std::rc::Rc;

#[test]
fn test_mount_dispose_releases_everything() -> anyhow::Result<()> {
    let surface = TrackingSurface::new();
    let stats = surface.stats();

    let mut handle = ParticleField::mount(&surface, Viewport::new(800, 600)?)?;
    assert!(stats.live_allocations() > 0);

    ParticleField::dispose(&mut handle)?;
    assert_eq!(stats.live_allocations(), 0);
    Ok(())
}

#[test]
fn test_resize_keeps_geometry() -> anyhow::Result<()> {
    let surface = TrackingSurface::new();
    let stats = surface.stats();
    let mut handle = ParticleField::mount(&surface, Viewport::new(800, 600)?)?;
    let positions = handle.point_cloud().positions().to_vec();
    let allocations = stats.buffer_allocations();

    ParticleField::resize(&mut handle, Viewport::new(1024, 768)?)?;
    ParticleField::resize(&mut handle, Viewport::new(1024, 768)?)?;

    assert!((handle.camera().aspect() - 1024.0 / 768.0).abs() < 1e-6);
    assert_eq!(handle.point_cloud().positions(), positions.as_slice());
    assert_eq!(stats.buffer_allocations(), allocations);
    assert_eq!(stats.surface_configurations(), 2);

    ParticleField::dispose(&mut handle)?;
    Ok(())
}

#[test]
fn test_unavailable_surface_fails_mount() {
    let surface = TrackingSurface::new().unavailable();
    let viewport = Viewport::new(800, 600).unwrap();
    match ParticleField::mount(&surface, viewport) {
        Err(FieldError::SurfaceUnavailable(_)) => {}
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("mount should fail"),
    }
}

#[test]
#[cfg(debug_assertions)]
fn test_use_after_dispose() -> anyhow::Result<()> {
    let surface = TrackingSurface::new();
    let mut handle = ParticleField::mount(&surface, Viewport::new(800, 600)?)?;
    ParticleField::dispose(&mut handle)?;

    assert_eq!(
        ParticleField::tick(&mut handle),
        Err(FieldError::UseAfterDispose)
    );
    assert_eq!(
        ParticleField::dispose(&mut handle),
        Err(FieldError::UseAfterDispose)
    );
    Ok(())
}

#[test]
fn test_loop_with_resize_bridge() -> anyhow::Result<()> {
    let surface = TrackingSurface::new();
    let stats = surface.stats();
    let initial = Viewport::new(800, 600)?;
    let handle = ParticleField::mount(&surface, initial)?;

    let mut render_loop = RenderLoop::new(ManualScheduler::new(), handle);
    let mut bridge = ResizeBridge::new(initial);
    render_loop.start();

    for frame in 0..30u32 {
        bridge.notify(800 + frame, 600);
        bridge.notify(800 + frame, 600);
        if let Some(handle) = render_loop.target_mut() {
            bridge.flush(handle)?;
        }
        assert_eq!(render_loop.run_frame(), FrameOutcome::Ticked);
    }
    render_loop.cancel();

    assert_eq!(bridge.forwarded_count(), 29);
    assert_eq!(stats.submissions(), 30);

    let mut handle = render_loop
        .take_target()
        .ok_or_else(|| anyhow::anyhow!("loop kept the field"))?;
    assert_eq!(handle.viewport(), Viewport::new(829, 600)?);
    ParticleField::dispose(&mut handle)?;
    assert_eq!(stats.live_allocations(), 0);
    Ok(())
}

#[test]
fn test_loop_stops_after_failed_tick() -> anyhow::Result<()> {
    let surface = TrackingSurface::new().fail_on_submission(5);
    let stats = surface.stats();
    let handle = ParticleField::mount(&surface, Viewport::new(800, 600)?)?;

    let failures = Rc::new(Cell::new(0u32));
    let mut render_loop = RenderLoop::new(ManualScheduler::new(), handle);
    let counter = Rc::clone(&failures);
    render_loop.on_failure(move |_| counter.set(counter.get() + 1));
    render_loop.start();

    while render_loop.frame_pending() {
        render_loop.run_frame();
    }

    assert_eq!(render_loop.state(), LoopState::Stopped);
    assert_eq!(failures.get(), 1);
    assert_eq!(stats.submissions(), 5);
    assert_eq!(render_loop.scheduler().requests(), 5);

    let mut handle = render_loop
        .take_target()
        .ok_or_else(|| anyhow::anyhow!("loop kept the field"))?;
    ParticleField::dispose(&mut handle)?;
    Ok(())
}

#[test]
fn test_config_file_drives_mount() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("backdrop.toml");
    std::fs::write(
        &path,
        r#"
[field]
point_count = 250
seed = 9

[camera]
fov_y_degrees = 60.0
"#,
    )?;

    let config = BackdropConfig::from_toml_file(&path)?;
    config.validate()?;

    let surface = TrackingSurface::new();
    let mut handle = ParticleField::mount_with(
        &surface,
        Viewport::new(640, 480)?,
        &config.field,
        &config.camera,
    )?;
    assert_eq!(handle.point_cloud().len(), 250);
    assert!((handle.camera().fov_y() - 60f32.to_radians()).abs() < 1e-6);
    assert_eq!(surface.stats().live_buffer_bytes(), 250 * 12 + 160);

    ParticleField::dispose(&mut handle)?;
    Ok(())
}

#[test]
fn test_invalid_camera_rejected_by_mount_with() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("backdrop.toml");
    std::fs::write(
        &path,
        r#"
[camera]
distance = 0.0
"#,
    )?;

    let config = BackdropConfig::from_toml_file(&path)?;
    let surface = TrackingSurface::new();
    let stats = surface.stats();

    let result = ParticleField::mount_with(
        &surface,
        Viewport::new(640, 480)?,
        &config.field,
        &config.camera,
    );
    assert!(matches!(result, Err(FieldError::InvalidConfig(_))));
    assert_eq!(stats.live_allocations(), 0);
    assert_eq!(stats.surface_configurations(), 0);
    Ok(())
}
