//! Configuration constants and per-session configuration for the booth.

use std::time::Duration;

use crate::api::{BoothSettings, StripDesign, Template};

/// Default base URL for HTTP API calls
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";

/// Environment variable overriding the backend base URL
pub const API_BASE_ENV: &str = "BOOTH_API_URL";

/// Camera index used for every capture
pub const CAMERA_ID: u32 = 0;

/// Photos per session (backend default and bounds)
pub const DEFAULT_PHOTOS_TO_TAKE: u32 = 3;
pub const MIN_PHOTOS_TO_TAKE: u32 = 1;
pub const MAX_PHOTOS_TO_TAKE: u32 = 6;

/// Countdown before each shot, in seconds
pub const DEFAULT_COUNTDOWN_SECONDS: u32 = 5;
pub const MIN_COUNTDOWN_SECONDS: u32 = 3;
pub const MAX_COUNTDOWN_SECONDS: u32 = 10;

/// Rest between shots, in seconds
pub const PAUSE_BETWEEN_SHOTS_SECONDS: u32 = 2;

/// Success screen auto-reset, in seconds
pub const DEFAULT_AUTO_RESET_SECONDS: u32 = 30;
pub const MIN_AUTO_RESET_SECONDS: u32 = 10;
pub const MAX_AUTO_RESET_SECONDS: u32 = 60;

/// Auto-reset ceiling for unattended kiosks that print automatically
pub const DEFAULT_KIOSK_RESET_CEILING_SECONDS: u32 = 15;

/// Print copies per strip
pub const DEFAULT_PRINT_COPIES: u32 = 2;
pub const MAX_PRINT_COPIES: u32 = 6;

/// Strip preview countdown before processing
pub const PREVIEW_FINAL_SECONDS: u32 = 5;

/// Review duration per photo
pub const REVIEW_PHOTO_MS: u64 = 2500;
pub const REVIEW_LAST_PHOTO_MS: u64 = 3000;

/// Panic exit: presses within the rolling window
pub const PANIC_EXIT_THRESHOLD: usize = 3;
pub const PANIC_EXIT_WINDOW_MS: u64 = 2000;

/// Device health / config refresh interval in seconds
pub const HEALTH_POLL_INTERVAL_SECS: u64 = 30;

/// Error message display duration in milliseconds
pub const ERROR_DISPLAY_DURATION_MS: u64 = 5000;

/// Resolve the backend base URL from the environment, falling back to the default.
pub fn api_base() -> Result<String, url::ParseError> {
    let raw = std::env::var(API_BASE_ENV).unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
    normalize_base(&raw)
}

fn normalize_base(raw: &str) -> Result<String, url::ParseError> {
    let trimmed = raw.trim().trim_end_matches('/');
    url::Url::parse(trimmed)?;
    Ok(trimmed.to_string())
}

/// Build the capture URL
pub fn capture_url(base: &str) -> String {
    format!("{}/api/camera/capture", base)
}

/// Build the camera list URL
pub fn cameras_url(base: &str) -> String {
    format!("{}/api/camera/list", base)
}

/// Build the strip composition URL
pub fn compose_strip_url(base: &str) -> String {
    format!("{}/api/image/compose-strip", base)
}

/// Build the print queue URL
pub fn print_queue_url(base: &str) -> String {
    format!("{}/api/print/queue", base)
}

/// Build the printer list URL
pub fn printers_url(base: &str) -> String {
    format!("{}/api/print/printers", base)
}

/// Build the settings URL
pub fn settings_url(base: &str) -> String {
    format!("{}/api/settings", base)
}

/// Build the template list URL (carries the active template)
pub fn templates_url(base: &str) -> String {
    format!("{}/api/templates/list", base)
}

/// Deployment policy. These encode product decisions that may differ per
/// site, so they are read from the environment instead of being fixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoothPolicy {
    /// Upper bound on the success-screen auto-reset when the kiosk prints unattended
    pub kiosk_reset_ceiling_seconds: u32,
    pub preview_final_seconds: u32,
    pub review_photo: Duration,
    pub review_last_photo: Duration,
    pub panic_threshold: usize,
    pub panic_window: Duration,
    pub health_poll_interval: Duration,
}

impl Default for BoothPolicy {
    fn default() -> Self {
        Self {
            kiosk_reset_ceiling_seconds: DEFAULT_KIOSK_RESET_CEILING_SECONDS,
            preview_final_seconds: PREVIEW_FINAL_SECONDS,
            review_photo: Duration::from_millis(REVIEW_PHOTO_MS),
            review_last_photo: Duration::from_millis(REVIEW_LAST_PHOTO_MS),
            panic_threshold: PANIC_EXIT_THRESHOLD,
            panic_window: Duration::from_millis(PANIC_EXIT_WINDOW_MS),
            health_poll_interval: Duration::from_secs(HEALTH_POLL_INTERVAL_SECS),
        }
    }
}

impl BoothPolicy {
    /// Defaults with `BOOTH_KIOSK_RESET_CEILING` and `BOOTH_HEALTH_POLL_SECS` applied
    pub fn from_env() -> Self {
        let mut policy = Self::default();
        if let Some(secs) = env_number::<u32>("BOOTH_KIOSK_RESET_CEILING") {
            policy.kiosk_reset_ceiling_seconds = secs.max(1);
        }
        if let Some(secs) = env_number::<u64>("BOOTH_HEALTH_POLL_SECS") {
            policy.health_poll_interval = Duration::from_secs(secs.max(1));
        }
        policy
    }

    /// How long photo `index` of `total` stays on screen during review
    pub fn review_duration(&self, index: usize, total: usize) -> Duration {
        if index + 1 >= total {
            self.review_last_photo
        } else {
            self.review_photo
        }
    }
}

fn env_number<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring {}={:?}: not a number", key, raw);
            None
        }
    }
}

/// Configuration frozen for the lifetime of one guest session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub photos_to_take: u32,
    pub countdown_seconds: u32,
    pub pause_seconds: u32,
    pub auto_reset_seconds: u32,
    pub auto_print: bool,
    pub kiosk_mode: bool,
    pub print_copies: u32,
    pub printer: Option<String>,
    pub design: StripDesign,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::resolve(None, None)
    }
}

impl SessionConfig {
    /// Merge stored settings with the active template. The template's layout
    /// wins for the photo count; everything is clamped to the backend's bounds.
    pub fn resolve(settings: Option<&BoothSettings>, template: Option<&Template>) -> Self {
        let defaults = BoothSettings::default();
        let settings = settings.unwrap_or(&defaults);

        let photos_to_take = template
            .and_then(|t| t.layout.photo_count())
            .unwrap_or(settings.photos_to_take)
            .clamp(MIN_PHOTOS_TO_TAKE, MAX_PHOTOS_TO_TAKE);

        let design = StripDesign {
            design_path: template.and_then(|t| t.design_file_path.clone()),
            layout: template
                .and_then(|t| t.layout.as_str())
                .map(str::to_string),
            design_position: template.and_then(|t| t.design_position.clone()),
            background_color: template.and_then(|t| t.background_color.clone()),
            photo_spacing: template.and_then(|t| t.photo_spacing),
            photo_filter: template
                .and_then(|t| t.photo_filter.clone())
                .or_else(|| Some(settings.photo_filter.clone())),
        };

        Self {
            photos_to_take,
            countdown_seconds: settings
                .countdown_seconds
                .clamp(MIN_COUNTDOWN_SECONDS, MAX_COUNTDOWN_SECONDS),
            pause_seconds: PAUSE_BETWEEN_SHOTS_SECONDS,
            auto_reset_seconds: settings
                .auto_reset_seconds
                .clamp(MIN_AUTO_RESET_SECONDS, MAX_AUTO_RESET_SECONDS),
            auto_print: settings.auto_print,
            kiosk_mode: settings.kiosk_mode,
            print_copies: settings.print_copies.clamp(1, MAX_PRINT_COPIES),
            printer: settings.default_printer.clone(),
            design,
        }
    }

    /// Auto-reset actually used on the success screen
    pub fn effective_auto_reset(&self, policy: &BoothPolicy) -> u32 {
        if self.kiosk_mode && self.auto_print {
            self.auto_reset_seconds.min(policy.kiosk_reset_ceiling_seconds)
        } else {
            self.auto_reset_seconds
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::StripLayout;

    fn template(layout: StripLayout) -> Template {
        Template {
            id: "tpl-1".into(),
            name: "Wedding".into(),
            layout,
            design_file_path: Some("data/designs/wedding.png".into()),
            design_position: Some("bottom".into()),
            background_color: Some("#ffffff".into()),
            photo_spacing: Some(20),
            photo_filter: None,
            is_active: true,
        }
    }

    #[test]
    fn test_base_url_trailing_slash_removed() {
        assert_eq!(
            normalize_base("http://10.0.0.5:8000/").unwrap(),
            "http://10.0.0.5:8000"
        );
        assert!(normalize_base("not a url").is_err());
        assert_eq!(
            capture_url("http://10.0.0.5:8000"),
            "http://10.0.0.5:8000/api/camera/capture"
        );
    }

    #[test]
    fn test_resolve_without_inputs_uses_backend_defaults() {
        let config = SessionConfig::resolve(None, None);
        assert_eq!(config.photos_to_take, DEFAULT_PHOTOS_TO_TAKE);
        assert_eq!(config.countdown_seconds, DEFAULT_COUNTDOWN_SECONDS);
        assert_eq!(config.pause_seconds, PAUSE_BETWEEN_SHOTS_SECONDS);
        assert_eq!(config.auto_reset_seconds, DEFAULT_AUTO_RESET_SECONDS);
        assert!(config.design.design_path.is_none());
    }

    #[test]
    fn test_template_layout_overrides_settings_photo_count() {
        let settings = BoothSettings {
            photos_to_take: 2,
            ..Default::default()
        };
        let config = SessionConfig::resolve(Some(&settings), Some(&template(StripLayout::Grid2x2)));
        assert_eq!(config.photos_to_take, 4);
        assert_eq!(config.design.layout.as_deref(), Some("2x2-grid"));
        assert_eq!(
            config.design.design_path.as_deref(),
            Some("data/designs/wedding.png")
        );

        let config = SessionConfig::resolve(Some(&settings), Some(&template(StripLayout::Other)));
        assert_eq!(config.photos_to_take, 2);
    }

    #[test]
    fn test_out_of_range_settings_are_clamped() {
        let settings = BoothSettings {
            photos_to_take: 12,
            countdown_seconds: 1,
            auto_reset_seconds: 600,
            print_copies: 0,
            ..Default::default()
        };
        let config = SessionConfig::resolve(Some(&settings), None);
        assert_eq!(config.photos_to_take, MAX_PHOTOS_TO_TAKE);
        assert_eq!(config.countdown_seconds, MIN_COUNTDOWN_SECONDS);
        assert_eq!(config.auto_reset_seconds, MAX_AUTO_RESET_SECONDS);
        assert_eq!(config.print_copies, 1);
    }

    #[test]
    fn test_kiosk_auto_print_caps_auto_reset() {
        let policy = BoothPolicy::default();
        let mut settings = BoothSettings {
            auto_reset_seconds: 45,
            kiosk_mode: true,
            auto_print: true,
            ..Default::default()
        };
        let config = SessionConfig::resolve(Some(&settings), None);
        assert_eq!(config.effective_auto_reset(&policy), DEFAULT_KIOSK_RESET_CEILING_SECONDS);

        settings.auto_print = false;
        let config = SessionConfig::resolve(Some(&settings), None);
        assert_eq!(config.effective_auto_reset(&policy), 45);

        let relaxed = BoothPolicy {
            kiosk_reset_ceiling_seconds: 60,
            ..Default::default()
        };
        settings.auto_print = true;
        let config = SessionConfig::resolve(Some(&settings), None);
        assert_eq!(config.effective_auto_reset(&relaxed), 45);
    }

    #[test]
    fn test_review_duration_longer_for_last_photo() {
        let policy = BoothPolicy::default();
        assert_eq!(policy.review_duration(0, 3), Duration::from_millis(REVIEW_PHOTO_MS));
        assert_eq!(policy.review_duration(1, 3), Duration::from_millis(REVIEW_PHOTO_MS));
        assert_eq!(
            policy.review_duration(2, 3),
            Duration::from_millis(REVIEW_LAST_PHOTO_MS)
        );
    }
}
