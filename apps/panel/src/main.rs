use std::{
    io::{self, Write},
    path::PathBuf,
    sync::Arc,
};

use anyhow::Result;
use clap::Parser;
use client_core::{
    host_page::catalog_from_host_page, HttpDeviceApi, PanelController, PanelEvent, PanelOptions,
    Selection,
};
use shared::{domain::SequenceCatalog, protocol::RpcCommand};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod view;

use commands::{parse_command, PanelCommand, HELP};
use config::{load_settings, SETTINGS_FILE};

#[derive(Parser, Debug)]
struct Args {
    /// Base url of the device, e.g. http://lightsequencer.local
    #[arg(long)]
    device_url: Option<String>,
    #[arg(long, default_value = SETTINGS_FILE)]
    config: PathBuf,
    #[arg(long)]
    max_notifications: Option<usize>,
    /// JSON array of sequence names to use instead of the one embedded in the device page.
    #[arg(long)]
    catalog: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(&args.config)?;
    if let Some(device_url) = args.device_url {
        settings.device_url = device_url;
    }
    if let Some(max_notifications) = args.max_notifications {
        settings.max_notifications = max_notifications;
    }

    let api = Arc::new(HttpDeviceApi::new(&settings.device_url)?);
    let catalog = match args.catalog {
        Some(raw) => SequenceCatalog::from_embedded(&raw),
        None => match api.fetch_host_page().await {
            Ok(page) => catalog_from_host_page(&page),
            Err(error) => {
                warn!(error = %format!("{error:#}"), "failed to load host page; no sequence names");
                SequenceCatalog::default()
            }
        },
    };
    info!(device_url = %api.base_url(), sequences = catalog.len(), "panel ready");

    let controller = PanelController::with_options(
        api,
        catalog,
        PanelOptions {
            max_notifications: settings.max_notifications,
        },
    );

    print_sequences(&controller).await;
    println!("{HELP}");

    let printer = tokio::spawn(print_events(controller.subscribe_events()));
    controller.start().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match parse_command(&line) {
            Ok(PanelCommand::Quit) => break,
            Ok(command) => dispatch(&controller, command).await,
            Err(message) => println!("{message}"),
        }
    }

    controller.stop().await;
    printer.abort();
    Ok(())
}

async fn dispatch(controller: &Arc<PanelController>, command: PanelCommand) {
    match command {
        PanelCommand::Apply(selection) => {
            submit(controller, RpcCommand::SetSequence, selection).await;
        }
        PanelCommand::SetDefault(selection) => {
            submit(controller, RpcCommand::SetDefault, selection).await;
        }
        PanelCommand::Dismiss(id) => {
            if !controller.dismiss_notification(id).await {
                println!("no notification with id {}", id.0);
            }
        }
        PanelCommand::ListNotifications | PanelCommand::Status => {
            for line in view::snapshot_lines(&controller.snapshot().await) {
                println!("{line}");
            }
        }
        PanelCommand::ListSequences => print_sequences(controller).await,
        PanelCommand::Help => println!("{HELP}"),
        PanelCommand::Quit => {}
    }
}

async fn submit(controller: &Arc<PanelController>, command: RpcCommand, selection: Selection) {
    let Some(hold) = controller.try_hold_controls().await else {
        println!("controls are busy; wait for the previous command to finish");
        return;
    };
    let controller = Arc::clone(controller);
    // outcome is reported through notifications
    tokio::spawn(async move {
        let _ = controller
            .apply_command_held(hold, command, selection)
            .await;
    });
}

async fn print_sequences(controller: &PanelController) {
    let choices = controller.sequence_choices().await;
    if choices.is_empty() {
        println!("sequence list unavailable; ids can still be sent");
    }
    for (id, name) in choices {
        println!("  {id}: {name}");
    }
    let speeds: Vec<String> = PanelController::speed_choices()
        .iter()
        .map(|speed| format!("{} ({})", speed.millis(), speed.label()))
        .collect();
    println!("speeds: {}", speeds.join(", "));
}

async fn print_events(mut events: broadcast::Receiver<PanelEvent>) {
    let mut stdout = io::stdout();
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        };
        let Some(line) = view::event_line(&event) else {
            continue;
        };
        // progress redraws in place, everything else gets its own line
        let written = if matches!(event, PanelEvent::ProgressChanged(_)) {
            write!(stdout, "\r{line}")
        } else {
            writeln!(stdout, "\r{line}")
        };
        if written.and_then(|()| stdout.flush()).is_err() {
            break;
        }
    }
}
