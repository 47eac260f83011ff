//! Wire models for the booth backend.

use serde::{Deserialize, Serialize};

use crate::config;

#[derive(Debug, Clone, Serialize)]
pub struct CaptureRequest {
    pub camera_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaptureResponse {
    pub success: bool,
    pub session_id: String,
    pub file_path: String,
    #[serde(default)]
    pub message: String,
}

/// Strip layouts known to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StripLayout {
    #[serde(rename = "3x1-vertical")]
    Vertical3x1,
    #[serde(rename = "4x1-vertical")]
    Vertical4x1,
    #[serde(rename = "6x1-vertical")]
    Vertical6x1,
    #[serde(rename = "2x2-grid")]
    Grid2x2,
    #[serde(other)]
    Other,
}

impl StripLayout {
    /// Photos needed to fill the layout
    pub fn photo_count(self) -> Option<u32> {
        match self {
            StripLayout::Vertical3x1 => Some(3),
            StripLayout::Vertical4x1 | StripLayout::Grid2x2 => Some(4),
            StripLayout::Vertical6x1 => Some(6),
            StripLayout::Other => None,
        }
    }

    pub fn as_str(self) -> Option<&'static str> {
        match self {
            StripLayout::Vertical3x1 => Some("3x1-vertical"),
            StripLayout::Vertical4x1 => Some("4x1-vertical"),
            StripLayout::Vertical6x1 => Some("6x1-vertical"),
            StripLayout::Grid2x2 => Some("2x2-grid"),
            StripLayout::Other => None,
        }
    }
}

/// Booth template (layout + design). Only the fields the booth uses.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub layout: StripLayout,
    #[serde(default)]
    pub design_file_path: Option<String>,
    #[serde(default)]
    pub design_position: Option<String>,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub photo_spacing: Option<u32>,
    #[serde(default)]
    pub photo_filter: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplatesListResponse {
    #[serde(default)]
    pub active_template: Option<Template>,
}

/// Stored booth settings. Missing fields take the backend's defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BoothSettings {
    pub photos_to_take: u32,
    pub countdown_seconds: u32,
    pub auto_reset_seconds: u32,
    pub default_printer: Option<String>,
    pub auto_print: bool,
    pub kiosk_mode: bool,
    pub print_copies: u32,
    pub photo_filter: String,
    pub audio_enabled: bool,
}

impl Default for BoothSettings {
    fn default() -> Self {
        Self {
            photos_to_take: config::DEFAULT_PHOTOS_TO_TAKE,
            countdown_seconds: config::DEFAULT_COUNTDOWN_SECONDS,
            auto_reset_seconds: config::DEFAULT_AUTO_RESET_SECONDS,
            default_printer: None,
            auto_print: false,
            kiosk_mode: true,
            print_copies: config::DEFAULT_PRINT_COPIES,
            photo_filter: "none".to_string(),
            audio_enabled: true,
        }
    }
}

/// Template metadata forwarded to strip composition
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StripDesign {
    pub design_path: Option<String>,
    pub layout: Option<String>,
    pub design_position: Option<String>,
    pub background_color: Option<String>,
    pub photo_spacing: Option<u32>,
    pub photo_filter: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComposeStripRequest<'a> {
    pub photo_paths: &'a [String],
    pub design_path: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub design_position: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_spacing: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_filter: Option<&'a str>,
}

impl<'a> ComposeStripRequest<'a> {
    pub fn new(photo_paths: &'a [String], design: &'a StripDesign, session_id: Option<&'a str>) -> Self {
        Self {
            photo_paths,
            design_path: design.design_path.as_deref(),
            session_id,
            layout: design.layout.as_deref(),
            design_position: design.design_position.as_deref(),
            background_color: design.background_color.as_deref(),
            photo_spacing: design.photo_spacing,
            photo_filter: design.photo_filter.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComposeStripResponse {
    pub success: bool,
    pub strip_path: String,
    #[serde(default)]
    pub full_page_path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrintRequest<'a> {
    pub file_path: &'a str,
    pub printer_name: Option<&'a str>,
    pub copies: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrintResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub printer_used: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrintersListResponse {
    #[serde(default)]
    pub printers: Vec<String>,
    #[serde(default)]
    pub default_printer: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CameraListResponse {
    #[serde(default)]
    pub available_cameras: Vec<u32>,
    #[serde(default)]
    pub default_camera: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_partial_payload_keeps_defaults() {
        let settings: BoothSettings = serde_json::from_str(
            r#"{"photos_to_take": 4, "auto_print": true, "strip_layout": "vertical-3"}"#,
        )
        .unwrap();
        assert_eq!(settings.photos_to_take, 4);
        assert!(settings.auto_print);
        assert_eq!(settings.countdown_seconds, config::DEFAULT_COUNTDOWN_SECONDS);
        assert_eq!(settings.print_copies, config::DEFAULT_PRINT_COPIES);
        assert!(settings.kiosk_mode);
    }

    #[test]
    fn test_templates_list_with_unknown_layout() {
        let list: TemplatesListResponse = serde_json::from_str(
            r##"{
                "templates": [],
                "active_template": {
                    "id": "t1",
                    "name": "Party",
                    "layout": "5x5-mosaic",
                    "design_file_path": null,
                    "design_position": "top",
                    "overlay_mode": "free",
                    "background_color": "#000000",
                    "photo_spacing": 10,
                    "is_active": true,
                    "created_at": "2025-01-01T00:00:00",
                    "preview_url": null
                }
            }"##,
        )
        .unwrap();
        let active = list.active_template.unwrap();
        assert_eq!(active.layout, StripLayout::Other);
        assert_eq!(active.layout.photo_count(), None);
        assert_eq!(active.photo_spacing, Some(10));
    }

    #[test]
    fn test_compose_request_omits_absent_metadata() {
        let photos = vec!["/data/photos/a.jpg".to_string()];
        let design = StripDesign {
            layout: Some("3x1-vertical".into()),
            ..Default::default()
        };
        let value = serde_json::to_value(ComposeStripRequest::new(&photos, &design, None)).unwrap();
        assert_eq!(value["photo_paths"][0], "/data/photos/a.jpg");
        assert_eq!(value["layout"], "3x1-vertical");
        assert!(value["design_path"].is_null());
        assert!(value.get("session_id").is_none());
        assert!(value.get("background_color").is_none());
    }

    #[test]
    fn test_capture_response_parses() {
        let response: CaptureResponse = serde_json::from_str(
            r#"{"success": true, "session_id": "s-42", "file_path": "/data/photos/s-42/1.jpg"}"#,
        )
        .unwrap();
        assert!(response.success);
        assert_eq!(response.session_id, "s-42");
        assert!(response.message.is_empty());
    }
}
