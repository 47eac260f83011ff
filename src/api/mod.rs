//! API client for booth backend communication.

pub mod http;
pub mod models;

pub use http::{ApiClient, ApiError};
pub use models::{
    BoothSettings, CameraListResponse, PrintersListResponse, StripDesign, StripLayout, Template,
};
