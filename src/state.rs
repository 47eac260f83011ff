//! Booth capture state machine.
//!
//! Pure state and transition function, no I/O and no clock. The orchestrator
//! decides when to dispatch; this module only says what each action does to
//! the state. Every action touches only the fields it names, and counters
//! floor at zero.

use serde::Serialize;

use crate::config::{DEFAULT_AUTO_RESET_SECONDS, PAUSE_BETWEEN_SHOTS_SECONDS};

/// Booth modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoothMode {
    /// Waiting for a guest to start
    Idle,
    /// Ticking down before a shot
    Countdown,
    /// A capture call is in flight
    Capturing,
    /// Rest between shots
    Pausing,
    /// Showing the captured photos one at a time
    Reviewing,
    /// Showing the composed strip before processing
    PreviewFinal,
    /// Final strip handed off to composition/printing
    Processing,
}

/// Booth state, replaced wholesale on every transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoothState {
    pub mode: BoothMode,
    /// Seconds until the next capture
    pub countdown: u32,
    /// Seconds left in the rest between shots
    pub pause_countdown: u32,
    /// Seconds until a terminal screen returns to idle
    pub auto_reset_timer: u32,
}

/// Actions accepted by [`transition`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoothAction {
    ResetAll { countdown_seconds: u32 },
    /// Arms a fresh countdown, from idle or at the end of a pause
    StartSession { countdown_seconds: u32 },
    TickCountdown,
    ToCapturing,
    ToPausing { pause_seconds: u32 },
    TickPause,
    ToReviewing,
    ToPreviewFinal,
    ToProcessing,
    ToIdle,
    TickAutoReset,
    ArmAutoReset { seconds: u32 },
}

impl BoothState {
    /// Idle state with all counters seeded
    pub fn initial(countdown_seconds: u32) -> Self {
        Self {
            mode: BoothMode::Idle,
            countdown: countdown_seconds,
            pause_countdown: PAUSE_BETWEEN_SHOTS_SECONDS,
            auto_reset_timer: DEFAULT_AUTO_RESET_SECONDS,
        }
    }

    pub fn apply(self, action: BoothAction) -> Self {
        transition(self, action)
    }
}

pub fn transition(state: BoothState, action: BoothAction) -> BoothState {
    match action {
        BoothAction::ResetAll { countdown_seconds } => BoothState::initial(countdown_seconds),
        BoothAction::StartSession { countdown_seconds } => BoothState {
            mode: BoothMode::Countdown,
            countdown: countdown_seconds,
            ..state
        },
        BoothAction::TickCountdown => BoothState {
            countdown: state.countdown.saturating_sub(1),
            ..state
        },
        BoothAction::ToCapturing => BoothState {
            mode: BoothMode::Capturing,
            ..state
        },
        BoothAction::ToPausing { pause_seconds } => BoothState {
            mode: BoothMode::Pausing,
            pause_countdown: pause_seconds,
            ..state
        },
        BoothAction::TickPause => BoothState {
            pause_countdown: state.pause_countdown.saturating_sub(1),
            ..state
        },
        BoothAction::ToReviewing => BoothState {
            mode: BoothMode::Reviewing,
            ..state
        },
        BoothAction::ToPreviewFinal => BoothState {
            mode: BoothMode::PreviewFinal,
            ..state
        },
        BoothAction::ToProcessing => BoothState {
            mode: BoothMode::Processing,
            ..state
        },
        BoothAction::ToIdle => BoothState {
            mode: BoothMode::Idle,
            ..state
        },
        BoothAction::TickAutoReset => BoothState {
            auto_reset_timer: state.auto_reset_timer.saturating_sub(1),
            ..state
        },
        BoothAction::ArmAutoReset { seconds } => BoothState {
            auto_reset_timer: seconds,
            ..state
        },
    }
}
