//! Device health polling and the session start guard.
//!
//! The backend has no push channel for device state, so it is polled on a
//! fixed interval. The same poll refreshes settings and the active template.

use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;

use crate::api::{BoothSettings, Template};
use crate::backend::BoothBackend;
use crate::error::StartGuardError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    #[default]
    Unknown,
    Ok,
    Error,
}

/// Latest known state of the booth's devices
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceHealth {
    pub backend: DeviceStatus,
    pub printer: DeviceStatus,
    pub camera: DeviceStatus,
    pub printer_details: String,
    pub camera_details: String,
}

impl DeviceHealth {
    pub fn all_ok() -> Self {
        Self {
            backend: DeviceStatus::Ok,
            printer: DeviceStatus::Ok,
            camera: DeviceStatus::Ok,
            ..Default::default()
        }
    }

    /// Backend and printer must both be healthy before a guest may start.
    /// The camera is not checked here; a camera fault surfaces as a capture
    /// failure and resets the session.
    pub fn start_guard(&self) -> Result<(), StartGuardError> {
        if self.backend != DeviceStatus::Ok {
            return Err(StartGuardError::BackendUnavailable);
        }
        if self.printer != DeviceStatus::Ok {
            return Err(StartGuardError::PrinterUnavailable);
        }
        Ok(())
    }
}

/// Result of one poll
#[derive(Debug, Clone, Default)]
pub struct HealthReport {
    pub health: DeviceHealth,
    /// Present only when the backend answered
    pub settings: Option<BoothSettings>,
    pub template: Option<Template>,
}

/// Query every device once
pub async fn probe<B: BoothBackend>(backend: &B) -> HealthReport {
    let (settings, printers, cameras, template) = tokio::join!(
        backend.settings(),
        backend.printers(),
        backend.cameras(),
        backend.active_template(),
    );

    let mut report = HealthReport::default();

    match settings {
        Ok(settings) => {
            report.health.backend = DeviceStatus::Ok;
            report.settings = Some(settings);
        }
        Err(e) => {
            log::warn!("Backend health check failed: {}", e);
            report.health.backend = DeviceStatus::Error;
        }
    }

    match printers {
        Ok(list) if !list.printers.is_empty() => {
            report.health.printer = DeviceStatus::Ok;
            report.health.printer_details = format!(
                "{} printer(s), default {}",
                list.printers.len(),
                list.default_printer.as_deref().unwrap_or("none")
            );
        }
        Ok(_) => {
            report.health.printer = DeviceStatus::Error;
            report.health.printer_details = "No printers detected".to_string();
        }
        Err(e) => {
            report.health.printer = DeviceStatus::Error;
            report.health.printer_details = format!("Printer check failed: {}", e);
        }
    }

    match cameras {
        Ok(list) if !list.available_cameras.is_empty() => {
            report.health.camera = DeviceStatus::Ok;
            report.health.camera_details = format!(
                "{} camera(s) detected, default {}",
                list.available_cameras.len(),
                list.default_camera
            );
        }
        Ok(_) => {
            report.health.camera = DeviceStatus::Error;
            report.health.camera_details = "No cameras detected".to_string();
        }
        Err(e) => {
            report.health.camera = DeviceStatus::Error;
            report.health.camera_details = format!("Camera check failed: {}", e);
        }
    }

    match template {
        Ok(template) => report.template = template,
        Err(e) => log::debug!("No active template: {}", e),
    }

    report
}

/// Poll immediately and then every `interval`, handing each report to `callback`
pub fn spawn_monitor<B, F>(backend: B, interval: Duration, callback: F) -> JoinHandle<()>
where
    B: BoothBackend + Sync + 'static,
    F: Fn(HealthReport) + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let report = probe(&backend).await;
            log::debug!("Device health: {:?}", report.health);
            callback(report);
        }
    })
}
