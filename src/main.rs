mod common;
mod config;
mod network;
mod state;
mod ui;

use std::time::Duration;

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use network::{ChannelClient, ChannelConfig, Dispatcher};
use tokio::sync::mpsc;
use ui::DashboardApp;

use crate::common::{ChannelEvent, InboundEvent};
use crate::config::{AppConfig, Overrides};
use crate::state::AppState;

/// How long the channel gets to say goodbye after the window closes.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

#[derive(Parser)]
#[command(
    name = "medstudy-hub",
    version,
    about = "Real-time study group dashboard for medical students"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    /// Collaboration server, e.g. http://localhost:5000
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,
    /// Display name used for messages, assignments and sessions
    #[arg(long, value_name = "NAME")]
    user: Option<String>,
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Connect without a window and log inbound events
    Listen,
    /// Write the default config file and exit
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<(), eframe::Error> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();

    if cli.mode == Some(Mode::InitConfig) {
        match config::save_config(&cli.config, &AppConfig::default()) {
            Ok(()) => log::info!("Wrote default config to {}", cli.config),
            Err(err) => log::error!("Failed to write config {}: {err}", cli.config),
        }
        return Ok(());
    }

    let mut app_config = config::load_config(&cli.config);
    Overrides::from_env()
        .merge(Overrides {
            endpoint: cli.endpoint.clone(),
            display_name: cli.user.clone(),
        })
        .apply(&mut app_config);

    if cli.mode == Some(Mode::Listen) {
        run_listener(app_config).await;
        return Ok(());
    }

    run_dashboard(app_config).await
}

fn channel_config(app_config: &AppConfig) -> ChannelConfig {
    ChannelConfig {
        endpoint: app_config.endpoint.clone(),
        identity: app_config.identity.to_identity(),
        reconnect: app_config.reconnect.clone(),
    }
}

async fn run_listener(app_config: AppConfig) {
    let capacity = app_config.queue_capacity.max(1);
    let (cmd_tx, cmd_rx) = mpsc::channel(capacity);
    let (event_tx, mut event_rx) = mpsc::channel(capacity);

    let client = ChannelClient::new(channel_config(&app_config), event_tx, cmd_rx);
    let network = tokio::spawn(async move {
        if let Err(err) = client.run().await {
            log::error!("Network client terminated: {err}");
        }
    });

    loop {
        tokio::select! {
            event = event_rx.recv() => match event {
                Some(event) => log_event(&event),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                log::info!("Interrupted; closing channel");
                Dispatcher::new(cmd_tx.clone()).shutdown();
                break;
            }
        }
    }

    drop(cmd_tx);
    let _ = tokio::time::timeout(SHUTDOWN_GRACE, network).await;
}

fn log_event(event: &ChannelEvent) {
    match event {
        ChannelEvent::Connected { sid } => log::info!("Connected (sid {sid})"),
        ChannelEvent::Disconnected { reason } => log::warn!("Disconnected: {reason}"),
        ChannelEvent::Inbound(InboundEvent::NewMessage(message)) => {
            log::info!("[{}] {}: {}", message.timestamp, message.user, message.text)
        }
        ChannelEvent::Inbound(InboundEvent::AssignmentAdded(assignment)) => log::info!(
            "Assignment \"{}\" added by {}",
            assignment.title,
            assignment.submitted_by
        ),
        ChannelEvent::SendDropped { event } => log::warn!("Dropped outbound `{event}`"),
    }
}

async fn run_dashboard(app_config: AppConfig) -> Result<(), eframe::Error> {
    let capacity = app_config.queue_capacity.max(1);
    // UI -> Network
    let (cmd_tx, cmd_rx) = mpsc::channel(capacity);
    // Network -> UI
    let (event_tx, event_rx) = mpsc::channel(capacity);

    let channel = channel_config(&app_config);
    let state = AppState::new(channel.identity.clone(), app_config.room_id.clone());
    log::info!(
        "Starting session {} as {}",
        channel.identity.session_id,
        channel.identity.display_name
    );

    let network = tokio::spawn(async move {
        let client = ChannelClient::new(channel, event_tx, cmd_rx);
        if let Err(err) = client.run().await {
            log::error!("Network client terminated: {err}");
        }
    });

    let options = eframe::NativeOptions::default();
    let mut startup = Some((state, event_rx));
    let dispatcher = Dispatcher::new(cmd_tx);

    let result = eframe::run_native(
        "MedStudy Hub",
        options,
        Box::new(move |cc| {
            let (state, event_receiver) = startup
                .take()
                .expect("DashboardApp should only be initialized once");

            Ok(Box::new(DashboardApp::new(
                cc,
                state,
                dispatcher,
                event_receiver,
            )))
        }),
    );

    if tokio::time::timeout(SHUTDOWN_GRACE, network).await.is_err() {
        log::warn!("Network client did not close within {SHUTDOWN_GRACE:?}");
    }
    result
}
