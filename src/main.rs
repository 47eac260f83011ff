//! Booth Kiosk - headless photo booth controller.
//!
//! Architecture:
//! - `state` module: pure booth state machine
//! - `orchestrator` module: timers, capture flow and session rules (testable, no I/O)
//! - `app` module: runs the orchestrator on tokio and calls the backend
//! - `api` module: HTTP client for the booth backend
//! - `health` module: device polling and the start guard
//!
//! Guests and operators drive the booth over stdin until a touch front end
//! is attached: enter starts, `r` is the reset button, `q` quits.

use tokio::io::{AsyncBufReadExt, BufReader};

mod api;
mod app;
mod backend;
mod config;
mod error;
mod gesture;
mod health;
mod orchestrator;
mod session;
mod state;

use api::ApiClient;
use app::{BoothApp, BoothNotice, EventSender};
use config::BoothPolicy;
use orchestrator::BoothEvent;

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting Booth Kiosk");

    let base = match config::api_base() {
        Ok(base) => base,
        Err(e) => {
            log::error!("Invalid {}: {}", config::API_BASE_ENV, e);
            std::process::exit(1);
        }
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create tokio runtime");

    runtime.block_on(async move {
        let client = ApiClient::new(base);
        log::info!("Using backend at {}", client.base());
        let (app, notices) = BoothApp::new(client, BoothPolicy::from_env());

        let monitor = app.spawn_health_monitor();
        tokio::spawn(read_input(app.sender()));
        tokio::spawn(present(notices));

        let orchestrator = app.run().await;
        monitor.abort();

        if !orchestrator.print_failures().is_empty() {
            log::warn!(
                "{} print job(s) still failed at shutdown",
                orchestrator.print_failures().len()
            );
        }
    });

    log::info!("Booth Kiosk shutting down");
}

/// Map stdin lines to booth events
async fn read_input(tx: EventSender) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                log::error!("Failed to read input: {}", e);
                break;
            }
        };

        let event = match line.trim() {
            "" | "start" => BoothEvent::StartRequested,
            "r" | "esc" => BoothEvent::ResetGesture,
            "n" => BoothEvent::ReviewNext,
            "p" => BoothEvent::ReviewPrevious,
            "done" => BoothEvent::FinishRequested,
            "retry" => BoothEvent::RetryFailedPrints,
            "q" | "quit" => BoothEvent::Shutdown,
            other => {
                log::warn!("Unknown input: {:?}", other);
                continue;
            }
        };
        tx.send(event);
    }

    // Closed stdin means nobody is left to drive the booth.
    tx.send(BoothEvent::Shutdown);
}

/// Stand-in presentation layer: everything goes to the log
async fn present(mut notices: tokio::sync::mpsc::UnboundedReceiver<BoothNotice>) {
    while let Some(notice) = notices.recv().await {
        match notice {
            BoothNotice::Announce(text) => log::info!("[voice] {}", text),
            BoothNotice::Beep(cue) => log::debug!("[beep] {:?}", cue),
            BoothNotice::Flash => log::info!("[flash]"),
            BoothNotice::Error(message) => log::warn!("[error] {}", message),
            BoothNotice::StartRejected(reason) => log::warn!("[start rejected] {}", reason),
            BoothNotice::ReviewPhoto { index, photo_ref } => {
                log::info!("[review] photo {}: {}", index + 1, photo_ref)
            }
            BoothNotice::Preview { preview_ref } => log::info!("[preview] {}", preview_ref),
            BoothNotice::Navigate(screen) => log::info!("[screen] {:?}", screen),
            BoothNotice::ExitKiosk => log::warn!("[kiosk] operator exit requested"),
            BoothNotice::Snapshot(snapshot) => match serde_json::to_string(&snapshot) {
                Ok(json) => log::debug!("[state] {}", json),
                Err(e) => log::error!("Failed to serialize snapshot: {}", e),
            },
        }
    }
}
