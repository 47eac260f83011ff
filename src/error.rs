//! Booth error taxonomy.

use thiserror::Error;

use crate::api::ApiError;

/// Failures of the collaborator calls the booth makes during a session
#[derive(Error, Debug)]
pub enum BoothError {
    /// Camera unavailable or busy. Ends the session.
    #[error("Capture failed: {0}")]
    Capture(#[source] ApiError),
    /// Strip preview or final strip could not be composed
    #[error("Composition failed: {0}")]
    Composition(#[source] ApiError),
    /// Print job could not be queued. Recorded for manual retry.
    #[error("Print failed: {0}")]
    Print(#[source] ApiError),
    #[error(transparent)]
    StartupGuard(#[from] StartGuardError),
}

/// Why a session may not start right now
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartGuardError {
    #[error("The booth is not connected to its backend")]
    BackendUnavailable,
    #[error("The printer is not ready")]
    PrinterUnavailable,
}

impl BoothError {
    /// Message suitable for the guest-facing screen
    pub fn guest_message(&self) -> String {
        match self {
            BoothError::Capture(_) => "We couldn't take that photo. Please try again.".to_string(),
            BoothError::Composition(_) => "We couldn't build your photo strip.".to_string(),
            BoothError::Print(_) => "Printing failed. Staff have been notified.".to_string(),
            BoothError::StartupGuard(e) => e.to_string(),
        }
    }
}
