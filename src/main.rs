use color_eyre::{eyre::eyre, Result};
use eframe::egui;
use mqttconnect::config::AppConfig;
use mqttconnect::mqtt::{AttemptController, ConnectionController, RumqttcConnector};
use mqttconnect::ui::MqttConnectUI;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config = AppConfig::load().map_err(|e| eyre!("Failed to load configuration: {}", e))?;
    let settings = config.connection_settings();
    info!(
        "Connect deadline {} ms, anonymous: {}",
        settings.connect_timeout.as_millis(),
        settings.credentials.is_anonymous()
    );

    let runner = AttemptController::new(Arc::new(RumqttcConnector::default()), settings);
    let controller = ConnectionController::new(runner, tokio::runtime::Handle::current())
        .with_server(config.server.host.clone(), config.server.port.clone());

    info!("Starting UI");
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([380.0, 220.0])
            .with_min_inner_size([320.0, 180.0]),
        ..Default::default()
    };

    eframe::run_native(
        "MQTT Connect",
        native_options,
        Box::new(|cc| Ok(Box::new(MqttConnectUI::new(cc, controller)))),
    )
    .map_err(|e| eyre!("UI terminated with error: {}", e))?;

    info!("UI closed, shutting down");
    Ok(())
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
