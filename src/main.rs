use particle_backdrop::config::BackdropConfig;
use particle_backdrop::core::BackdropApp;

fn main() {
    let mut config = BackdropConfig::load_or_default();
    config.apply_env_overrides();
    BackdropApp::initialize_logging(&config.logging);

    if let Err(e) = BackdropApp::run(config) {
        tracing::error!(target: "app", "Backdrop failed: {}", e);
        eprintln!("Backdrop failed to start: {}", e);
        std::process::exit(1);
    }
}
