//! HTTP API client for the booth backend.

use serde::de::DeserializeOwned;
use thiserror::Error;

use super::models::{
    BoothSettings, CameraListResponse, CaptureRequest, CaptureResponse, ComposeStripRequest,
    ComposeStripResponse, PrintRequest, PrintResponse, PrintersListResponse, StripDesign,
    Template, TemplatesListResponse,
};
use crate::backend::{BoothBackend, CapturedPhoto, ComposedStrip, PrintJob};
use crate::config;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Server error: {0}")]
    Server(String),
    #[error("Rejected by backend: {0}")]
    Rejected(String),
}

/// HTTP client for the booth API
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base: String,
}

impl ApiClient {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base: base.into(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Server(format!("{}: {}", status, body)));
        }
        Ok(response.json().await?)
    }
}

impl BoothBackend for ApiClient {
    async fn capture_photo(&self, session_id: Option<&str>) -> Result<CapturedPhoto, ApiError> {
        let url = config::capture_url(&self.base);
        log::info!("Capturing photo (session {:?}) at {}", session_id, url);

        let request = CaptureRequest {
            camera_id: config::CAMERA_ID,
            session_id: session_id.map(str::to_string),
        };
        let response = self.client.post(&url).json(&request).send().await?;
        let capture: CaptureResponse = Self::read_json(response).await?;

        if !capture.success {
            return Err(ApiError::Rejected(capture.message));
        }

        log::info!("Captured {} for session {}", capture.file_path, capture.session_id);
        Ok(CapturedPhoto {
            session_id: capture.session_id,
            photo_ref: capture.file_path,
        })
    }

    async fn compose_strip(
        &self,
        session_id: Option<&str>,
        photo_refs: &[String],
        design: &StripDesign,
    ) -> Result<ComposedStrip, ApiError> {
        let url = config::compose_strip_url(&self.base);
        log::info!(
            "Composing strip from {} photos (session {:?})",
            photo_refs.len(),
            session_id
        );

        let request = ComposeStripRequest::new(photo_refs, design, session_id);
        let response = self.client.post(&url).json(&request).send().await?;
        let strip: ComposeStripResponse = Self::read_json(response).await?;

        if !strip.success {
            return Err(ApiError::Rejected(format!(
                "composition of {} failed",
                strip.strip_path
            )));
        }

        Ok(ComposedStrip {
            strip_ref: strip.strip_path,
            print_ref: strip.full_page_path,
        })
    }

    async fn compose_preview(
        &self,
        photo_refs: &[String],
        design: &StripDesign,
    ) -> Result<String, ApiError> {
        // Without a session id the backend composes a throwaway strip.
        let strip = self.compose_strip(None, photo_refs, design).await?;
        Ok(strip.strip_ref)
    }

    async fn queue_print(
        &self,
        file_ref: &str,
        copies: u32,
        printer: Option<&str>,
    ) -> Result<PrintJob, ApiError> {
        let url = config::print_queue_url(&self.base);
        log::info!("Queueing {} copies of {} on {:?}", copies, file_ref, printer);

        let request = PrintRequest {
            file_path: file_ref,
            printer_name: printer,
            copies,
        };
        let response = self.client.post(&url).json(&request).send().await?;
        let job: PrintResponse = Self::read_json(response).await?;

        if !job.success {
            return Err(ApiError::Rejected(job.message));
        }

        Ok(PrintJob {
            message: job.message,
            printer: job.printer_used,
        })
    }

    async fn active_template(&self) -> Result<Option<Template>, ApiError> {
        let url = config::templates_url(&self.base);
        log::debug!("Fetching templates from {}", url);

        let response = self.client.get(&url).send().await?;
        let list: TemplatesListResponse = Self::read_json(response).await?;
        Ok(list.active_template)
    }

    async fn settings(&self) -> Result<BoothSettings, ApiError> {
        let url = config::settings_url(&self.base);
        log::debug!("Fetching settings from {}", url);

        let response = self.client.get(&url).send().await?;
        Self::read_json(response).await
    }

    async fn printers(&self) -> Result<PrintersListResponse, ApiError> {
        let response = self
            .client
            .get(config::printers_url(&self.base))
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn cameras(&self) -> Result<CameraListResponse, ApiError> {
        let response = self
            .client
            .get(config::cameras_url(&self.base))
            .send()
            .await?;
        Self::read_json(response).await
    }
}
