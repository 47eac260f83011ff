//! Backend collaborators consumed by the booth.
//!
//! The orchestrator never talks HTTP itself; the app layer calls through this
//! trait so the whole capture flow can run against an in-memory backend.

use crate::api::{
    ApiError, BoothSettings, CameraListResponse, PrintersListResponse, StripDesign, Template,
};

/// Result of a successful capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedPhoto {
    /// Session id issued by the backend on the first capture
    pub session_id: String,
    pub photo_ref: String,
}

/// Result of composing the final strip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedStrip {
    pub strip_ref: String,
    /// Print-ready page (two strips side by side), when the backend made one
    pub print_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintJob {
    pub message: String,
    pub printer: Option<String>,
}

/// Camera, composition, print and settings services
#[trait_variant::make(BoothBackend: Send)]
pub trait LocalBoothBackend {
    /// Fire the shutter. Passing no session id asks the backend to open one.
    async fn capture_photo(&self, session_id: Option<&str>) -> Result<CapturedPhoto, ApiError>;

    /// Compose a preview strip that is not stored with the session
    async fn compose_preview(
        &self,
        photo_refs: &[String],
        design: &StripDesign,
    ) -> Result<String, ApiError>;

    /// Compose the final strip for the session
    async fn compose_strip(
        &self,
        session_id: Option<&str>,
        photo_refs: &[String],
        design: &StripDesign,
    ) -> Result<ComposedStrip, ApiError>;

    async fn queue_print(
        &self,
        file_ref: &str,
        copies: u32,
        printer: Option<&str>,
    ) -> Result<PrintJob, ApiError>;

    /// Active template, `None` when stored settings apply
    async fn active_template(&self) -> Result<Option<Template>, ApiError>;

    async fn settings(&self) -> Result<BoothSettings, ApiError>;

    async fn printers(&self) -> Result<PrintersListResponse, ApiError>;

    async fn cameras(&self) -> Result<CameraListResponse, ApiError>;
}

#[cfg(test)]
pub mod testing {
    //! In-memory backend for driving the booth in tests.

    use std::sync::{Arc, Mutex, MutexGuard};
    use std::time::Duration;

    use super::*;

    #[derive(Debug, Default)]
    pub struct FakeState {
        pub settings: BoothSettings,
        pub template: Option<Template>,
        pub printers: Vec<String>,
        /// Calls made to `capture_photo`, counted on entry
        pub capture_calls: usize,
        /// 1-based capture call that fails
        pub fail_capture_at: Option<usize>,
        pub capture_delay: Duration,
        pub fail_preview: bool,
        pub preview_calls: usize,
        pub strip_calls: usize,
        pub fail_print: bool,
        pub prints: Vec<(String, u32, Option<String>)>,
    }

    #[derive(Debug, Clone, Default)]
    pub struct FakeBackend {
        inner: Arc<Mutex<FakeState>>,
    }

    impl FakeBackend {
        pub fn new(settings: BoothSettings) -> Self {
            let backend = Self::default();
            {
                let mut state = backend.state();
                state.settings = settings;
                state.printers = vec!["DNP-DS620".to_string()];
            }
            backend
        }

        pub fn state(&self) -> MutexGuard<'_, FakeState> {
            self.inner.lock().unwrap()
        }
    }

    impl BoothBackend for FakeBackend {
        async fn capture_photo(&self, session_id: Option<&str>) -> Result<CapturedPhoto, ApiError> {
            let (call, delay, fail) = {
                let mut state = self.state();
                state.capture_calls += 1;
                (
                    state.capture_calls,
                    state.capture_delay,
                    state.fail_capture_at == Some(state.capture_calls),
                )
            };
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if fail {
                return Err(ApiError::Server("503: camera busy".into()));
            }
            Ok(CapturedPhoto {
                session_id: session_id.unwrap_or("fake-session").to_string(),
                photo_ref: format!("/photos/{}.jpg", call),
            })
        }

        async fn compose_preview(
            &self,
            photo_refs: &[String],
            _design: &StripDesign,
        ) -> Result<String, ApiError> {
            let mut state = self.state();
            state.preview_calls += 1;
            if state.fail_preview {
                return Err(ApiError::Server("500: preview".into()));
            }
            Ok(format!("/previews/{}.jpg", photo_refs.len()))
        }

        async fn compose_strip(
            &self,
            session_id: Option<&str>,
            _photo_refs: &[String],
            _design: &StripDesign,
        ) -> Result<ComposedStrip, ApiError> {
            self.state().strip_calls += 1;
            let id = session_id.unwrap_or("preview");
            Ok(ComposedStrip {
                strip_ref: format!("/strips/{}.jpg", id),
                print_ref: Some(format!("/strips/{}_page.jpg", id)),
            })
        }

        async fn queue_print(
            &self,
            file_ref: &str,
            copies: u32,
            printer: Option<&str>,
        ) -> Result<PrintJob, ApiError> {
            let mut state = self.state();
            if state.fail_print {
                return Err(ApiError::Server("500: out of paper".into()));
            }
            state
                .prints
                .push((file_ref.to_string(), copies, printer.map(str::to_string)));
            Ok(PrintJob {
                message: format!("{} copies sent", copies),
                printer: printer.map(str::to_string),
            })
        }

        async fn active_template(&self) -> Result<Option<Template>, ApiError> {
            Ok(self.state().template.clone())
        }

        async fn settings(&self) -> Result<BoothSettings, ApiError> {
            Ok(self.state().settings.clone())
        }

        async fn printers(&self) -> Result<PrintersListResponse, ApiError> {
            let printers = self.state().printers.clone();
            Ok(PrintersListResponse {
                default_printer: printers.first().cloned(),
                printers,
            })
        }

        async fn cameras(&self) -> Result<CameraListResponse, ApiError> {
            Ok(CameraListResponse {
                available_cameras: vec![0],
                default_camera: 0,
            })
        }
    }
}
