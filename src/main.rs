use std::sync::Arc;

use color_eyre::{eyre::eyre, Result};
use eframe::egui;
use jogwheel::input::gamepad::GamepadHost;
use jogwheel::input::InputHost;
use jogwheel::settings::store::SettingsStore;
use jogwheel::ui::JogWheelApp;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let store = SettingsStore::in_home_dir();
    let settings = store.load().await;
    info!("Loaded settings from {:?}", store.path());

    let (settings_tx, settings_rx) = watch::channel(settings);
    let shutdown = CancellationToken::new();
    let autosave = store.spawn_autosave(settings_rx, shutdown.clone());

    let gamepads = Arc::new(GamepadHost::spawn().await);
    let input_host: Arc<dyn InputHost> = gamepads.clone();

    info!("Starting UI");
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Jog Wheel")
            .with_inner_size([420.0, 460.0]),
        ..Default::default()
    };

    let app_shutdown = shutdown.clone();
    let result = eframe::run_native(
        "Jog Wheel",
        native_options,
        Box::new(move |cc| {
            Ok(Box::new(JogWheelApp::new(
                cc,
                input_host,
                settings_tx,
                app_shutdown,
            )))
        }),
    );

    // Closing the window through an error path skips on_exit
    shutdown.cancel();
    gamepads.shutdown().await;
    if let Err(e) = autosave.await {
        error!("Autosave task failed: {}", e);
    }

    result.map_err(|e| eyre!("UI failed: {}", e))
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
