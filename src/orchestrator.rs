//! Booth orchestrator: turns timer ticks, guest input and backend results
//! into FSM actions, and emits the side effects the FSM itself must not make.
//!
//! Like the state machine it drives, this type performs no I/O. It returns
//! [`BoothCommand`]s and the app layer executes them, feeding results back as
//! [`BoothEvent`]s. Time comes in as an argument so the whole flow can be
//! replayed in tests.
//!
//! Two rules keep stale work out of the current session:
//! - Mode timers live in one slot. Arming replaces the previous timer and a
//!   tick whose id is not the armed one is dropped.
//! - Every backend call carries the session epoch. Starting or resetting bumps
//!   the epoch, so results from an abandoned session are dropped.

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::api::{BoothSettings, StripDesign, Template};
use crate::config::{BoothPolicy, SessionConfig};
use crate::error::{BoothError, StartGuardError};
use crate::gesture::PanicDetector;
use crate::health::DeviceHealth;
use crate::session::Session;
use crate::state::{transition, BoothAction, BoothMode, BoothState};

const TICK: Duration = Duration::from_secs(1);

/// Which mode a timer belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimerKind {
    Countdown,
    Pause,
    Review,
    PreviewFinal,
    AutoReset,
}

/// Screen shown by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Screen {
    Booth,
    Processing,
    Success,
}

/// Audible cues
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// Countdown second
    Tick,
    /// Final second before the shutter
    Go,
    /// Review advanced to the next photo
    Advance,
    Success,
}

/// Events that drive the orchestrator
#[derive(Debug, Clone)]
pub enum BoothEvent {
    // Guest / operator input
    StartRequested,
    ResetGesture,
    FinishRequested,
    ReviewNext,
    ReviewPrevious,
    RetryFailedPrints,

    // Timer slot
    TimerFired { timer_id: u64 },

    // Backend results
    CaptureSucceeded { epoch: u64, session_id: String, photo_ref: String },
    CaptureFailed { epoch: u64, error: String, message: String },
    PreviewComposed { epoch: u64, preview_ref: String },
    PreviewFailed { epoch: u64, error: String },
    StripComposed { epoch: u64, strip_ref: String, print_ref: Option<String> },
    StripFailed { epoch: u64, error: String, message: String },
    PrintQueued { file_ref: String, printer: Option<String> },
    PrintFailed { job: PrintRequest, error: String, message: String },

    // Polling
    HealthUpdated(DeviceHealth),
    ConfigLoaded { settings: Option<BoothSettings>, template: Option<Template> },

    // Internal
    /// Clears the error raised with this generation, if it is still shown
    ClearError { generation: u64 },
    Shutdown,
}

/// A print job, kept so failures can be retried
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrintRequest {
    pub file_ref: String,
    pub copies: u32,
    pub printer: Option<String>,
}

/// A print job that failed, waiting for a staff retry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrintFailure {
    pub job: PrintRequest,
    pub error: String,
}

/// Commands emitted for the app layer to execute
#[derive(Debug, Clone, PartialEq)]
pub enum BoothCommand {
    /// Arm the single timer slot, replacing whatever was armed
    ArmTimer { timer_id: u64, after: Duration },
    CancelTimer,
    CapturePhoto { epoch: u64, session_id: Option<String> },
    ComposePreview { epoch: u64, photo_refs: Vec<String>, design: StripDesign },
    ComposeStrip {
        epoch: u64,
        session_id: Option<String>,
        photo_refs: Vec<String>,
        design: StripDesign,
    },
    QueuePrint(PrintRequest),
    Announce(String),
    Beep(Cue),
    Flash,
    ShowError(String),
    ScheduleErrorClear { generation: u64 },
    RejectStart(StartGuardError),
    ShowReviewPhoto { index: usize, photo_ref: String },
    ShowPreview { preview_ref: String },
    Navigate(Screen),
    /// Leave the OS-level kiosk lock
    ExitKiosk,
    UpdateUI,
}

/// Read-only view for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoothSnapshot {
    pub state: BoothState,
    pub screen: Screen,
    pub photos_taken: usize,
    pub photos_to_take: u32,
    pub review_index: usize,
    pub preview_countdown: u32,
    pub error: Option<String>,
    pub health: DeviceHealth,
    pub failed_prints: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActiveTimer {
    id: u64,
    kind: TimerKind,
}

/// The booth orchestrator
#[derive(Debug)]
pub struct BoothOrchestrator {
    state: BoothState,
    screen: Screen,
    session: Session,
    /// Frozen at session start
    config: SessionConfig,
    policy: BoothPolicy,
    settings: Option<BoothSettings>,
    template: Option<Template>,
    health: DeviceHealth,
    active_timer: Option<ActiveTimer>,
    next_timer_id: u64,
    epoch: u64,
    /// Set when the shutter call goes out, cleared by its result
    capture_in_flight: bool,
    review_index: usize,
    preview_countdown: u32,
    panic: PanicDetector,
    error: Option<String>,
    /// Bumped by every error shown; a clear for an older one is ignored
    error_generation: u64,
    print_failures: Vec<PrintFailure>,
}

impl BoothOrchestrator {
    pub fn new(policy: BoothPolicy) -> Self {
        let config = SessionConfig::default();
        Self {
            state: BoothState::initial(config.countdown_seconds),
            screen: Screen::Booth,
            session: Session::new(),
            panic: PanicDetector::new(policy.panic_threshold, policy.panic_window),
            preview_countdown: policy.preview_final_seconds,
            config,
            policy,
            settings: None,
            template: None,
            health: DeviceHealth::default(),
            active_timer: None,
            next_timer_id: 0,
            epoch: 0,
            capture_in_flight: false,
            review_index: 0,
            error: None,
            error_generation: 0,
            print_failures: Vec::new(),
        }
    }

    pub fn state(&self) -> BoothState {
        self.state
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn review_index(&self) -> usize {
        self.review_index
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn print_failures(&self) -> &[PrintFailure] {
        &self.print_failures
    }

    /// Kind of the armed timer, if any
    pub fn active_timer(&self) -> Option<TimerKind> {
        self.active_timer.map(|t| t.kind)
    }

    pub fn snapshot(&self) -> BoothSnapshot {
        BoothSnapshot {
            state: self.state,
            screen: self.screen,
            photos_taken: self.session.photos_taken(),
            photos_to_take: self.config.photos_to_take,
            review_index: self.review_index,
            preview_countdown: self.preview_countdown,
            error: self.error.clone(),
            health: self.health.clone(),
            failed_prints: self.print_failures.len(),
        }
    }

    fn is_idle(&self) -> bool {
        self.state.mode == BoothMode::Idle && self.screen == Screen::Booth
    }

    fn is_current(&self, epoch: u64) -> bool {
        if epoch != self.epoch {
            log::debug!("Dropping result from session epoch {} (now {})", epoch, self.epoch);
            return false;
        }
        true
    }

    /// Process an event and return commands to execute
    pub fn handle(&mut self, event: BoothEvent, now: Instant) -> Vec<BoothCommand> {
        let mut commands = Vec::new();

        match event {
            BoothEvent::StartRequested => self.on_start(&mut commands),

            BoothEvent::ResetGesture => {
                if self.panic.record(now) {
                    log::warn!("Panic exit triggered");
                    commands.push(BoothCommand::ExitKiosk);
                    self.reset_all("Operator override. Resetting the booth.", &mut commands);
                } else if !self.is_idle() {
                    self.reset_all("Session cancelled.", &mut commands);
                }
            }

            BoothEvent::FinishRequested => {
                if self.screen == Screen::Success {
                    self.reset_all("Thanks for visiting!", &mut commands);
                }
            }

            BoothEvent::ReviewNext => {
                if self.can_navigate_review() && self.review_index + 1 < self.session.photos_taken() {
                    self.review_index += 1;
                    self.show_review_photo(&mut commands);
                }
            }

            BoothEvent::ReviewPrevious => {
                if self.can_navigate_review() && self.review_index > 0 {
                    self.review_index -= 1;
                    self.show_review_photo(&mut commands);
                }
            }

            BoothEvent::RetryFailedPrints => {
                for failure in std::mem::take(&mut self.print_failures) {
                    log::info!("Retrying print of {}", failure.job.file_ref);
                    commands.push(BoothCommand::QueuePrint(failure.job));
                }
                commands.push(BoothCommand::UpdateUI);
            }

            BoothEvent::TimerFired { timer_id } => self.on_timer(timer_id, &mut commands),

            BoothEvent::CaptureSucceeded {
                epoch,
                session_id,
                photo_ref,
            } => {
                if self.is_current(epoch) && self.state.mode == BoothMode::Capturing {
                    self.capture_in_flight = false;
                    self.session.record_capture(session_id, photo_ref);
                    self.after_capture(&mut commands);
                }
            }

            BoothEvent::CaptureFailed {
                epoch,
                error,
                message,
            } => {
                if self.is_current(epoch) && self.state.mode == BoothMode::Capturing {
                    self.capture_in_flight = false;
                    log::error!("{}", error);
                    self.show_error(message, &mut commands);
                    self.reset_all("We couldn't take that photo. Please try again.", &mut commands);
                }
            }

            BoothEvent::PreviewComposed { epoch, preview_ref } => {
                if self.is_current(epoch) && self.state.mode == BoothMode::Reviewing {
                    self.dispatch(BoothAction::ToPreviewFinal);
                    self.preview_countdown = self.policy.preview_final_seconds;
                    commands.push(BoothCommand::ShowPreview { preview_ref });
                    self.arm(TimerKind::PreviewFinal, TICK, &mut commands);
                    commands.push(BoothCommand::UpdateUI);
                }
            }

            BoothEvent::PreviewFailed { epoch, error } => {
                if self.is_current(epoch) && self.state.mode == BoothMode::Reviewing {
                    // A broken preview must not hold back the photos.
                    log::warn!("Preview failed, skipping to processing: {}", error);
                    self.show_error("Preview unavailable".to_string(), &mut commands);
                    self.begin_processing(&mut commands);
                }
            }

            BoothEvent::StripComposed {
                epoch,
                strip_ref,
                print_ref,
            } => {
                if self.is_current(epoch) && self.screen == Screen::Processing {
                    self.on_strip_ready(strip_ref, print_ref, &mut commands);
                }
            }

            BoothEvent::StripFailed {
                epoch,
                error,
                message,
            } => {
                if self.is_current(epoch) && self.screen == Screen::Processing {
                    log::error!("{}", error);
                    self.show_error(message, &mut commands);
                    self.reset_all(
                        "We couldn't process your photos. Please try again.",
                        &mut commands,
                    );
                }
            }

            BoothEvent::PrintQueued { file_ref, printer } => {
                log::info!("Print queued for {} on {:?}", file_ref, printer);
            }

            BoothEvent::PrintFailed {
                job,
                error,
                message,
            } => {
                log::warn!("Print of {} failed: {}", job.file_ref, error);
                self.print_failures.push(PrintFailure { job, error });
                self.show_error(message, &mut commands);
                commands.push(BoothCommand::UpdateUI);
            }

            BoothEvent::HealthUpdated(health) => {
                if health != self.health {
                    self.health = health;
                    commands.push(BoothCommand::UpdateUI);
                }
            }

            BoothEvent::ConfigLoaded { settings, template } => {
                // Applies from the next session; the running one keeps its config.
                if settings.is_some() {
                    self.settings = settings;
                }
                self.template = template;
            }

            BoothEvent::ClearError { generation } => {
                if generation == self.error_generation && self.error.take().is_some() {
                    commands.push(BoothCommand::UpdateUI);
                }
            }

            BoothEvent::Shutdown => {}
        }

        if !self.audio_enabled() {
            commands.retain(|c| !matches!(c, BoothCommand::Announce(_) | BoothCommand::Beep(_)));
        }
        commands
    }

    /// Voice and beep cues follow the latest settings, not the frozen session
    fn audio_enabled(&self) -> bool {
        self.settings.as_ref().map_or(true, |s| s.audio_enabled)
    }

    fn dispatch(&mut self, action: BoothAction) {
        let next = transition(self.state, action);
        if next.mode != self.state.mode {
            log::debug!("Booth {:?} -> {:?} ({:?})", self.state.mode, next.mode, action);
        }
        self.state = next;
    }

    fn arm(&mut self, kind: TimerKind, after: Duration, commands: &mut Vec<BoothCommand>) {
        self.next_timer_id += 1;
        self.active_timer = Some(ActiveTimer {
            id: self.next_timer_id,
            kind,
        });
        commands.push(BoothCommand::ArmTimer {
            timer_id: self.next_timer_id,
            after,
        });
    }

    fn disarm(&mut self, commands: &mut Vec<BoothCommand>) {
        if self.active_timer.take().is_some() {
            commands.push(BoothCommand::CancelTimer);
        }
    }

    fn show_error(&mut self, message: String, commands: &mut Vec<BoothCommand>) {
        self.error_generation += 1;
        self.error = Some(message.clone());
        commands.push(BoothCommand::ShowError(message));
        commands.push(BoothCommand::ScheduleErrorClear {
            generation: self.error_generation,
        });
    }

    /// Countdown used when idle, from the latest settings
    fn idle_countdown(&self) -> u32 {
        SessionConfig::resolve(self.settings.as_ref(), self.template.as_ref()).countdown_seconds
    }

    /// Abandon whatever is running and return to idle. Always announced.
    fn reset_all(&mut self, message: &str, commands: &mut Vec<BoothCommand>) {
        log::info!("Resetting booth from {:?}: {}", self.state.mode, message);
        commands.push(BoothCommand::Announce(message.to_string()));

        self.disarm(commands);
        self.epoch += 1;
        self.session.clear();
        self.capture_in_flight = false;
        self.review_index = 0;
        self.preview_countdown = self.policy.preview_final_seconds;

        let countdown_seconds = self.idle_countdown();
        self.dispatch(BoothAction::ResetAll { countdown_seconds });

        if self.screen != Screen::Booth {
            self.screen = Screen::Booth;
            commands.push(BoothCommand::Navigate(Screen::Booth));
        }
        commands.push(BoothCommand::UpdateUI);
    }

    fn on_start(&mut self, commands: &mut Vec<BoothCommand>) {
        if !self.is_idle() {
            log::debug!("Start ignored in {:?}", self.state.mode);
            return;
        }

        if let Err(reason) = self.health.start_guard() {
            log::warn!("Start rejected: {}", reason);
            commands.push(BoothCommand::RejectStart(reason));
            self.show_error(BoothError::from(reason).guest_message(), commands);
            commands.push(BoothCommand::UpdateUI);
            return;
        }

        self.config = SessionConfig::resolve(self.settings.as_ref(), self.template.as_ref());
        self.epoch += 1;
        self.session.clear();
        self.error = None;
        log::info!(
            "Session started: {} photos, {}s countdown",
            self.config.photos_to_take,
            self.config.countdown_seconds
        );

        commands.push(BoothCommand::Announce(format!(
            "Get ready. First photo in {} seconds.",
            self.config.countdown_seconds
        )));
        self.arm_countdown(commands);
        commands.push(BoothCommand::UpdateUI);
    }

    /// Begin a countdown cycle, from idle or at the end of a pause
    fn arm_countdown(&mut self, commands: &mut Vec<BoothCommand>) {
        self.capture_in_flight = false;
        self.dispatch(BoothAction::StartSession {
            countdown_seconds: self.config.countdown_seconds,
        });
        self.arm(TimerKind::Countdown, TICK, commands);
    }

    fn on_timer(&mut self, timer_id: u64, commands: &mut Vec<BoothCommand>) {
        let kind = match self.active_timer {
            Some(timer) if timer.id == timer_id => timer.kind,
            _ => {
                log::warn!("Dropping stale timer {}", timer_id);
                return;
            }
        };
        // Timers are one-shot; each handler re-arms if it needs another tick.
        self.active_timer = None;

        match kind {
            TimerKind::Countdown => self.on_countdown_tick(commands),
            TimerKind::Pause => self.on_pause_tick(commands),
            TimerKind::Review => self.on_review_elapsed(commands),
            TimerKind::PreviewFinal => self.on_preview_tick(commands),
            TimerKind::AutoReset => self.on_auto_reset_tick(commands),
        }
    }

    fn on_countdown_tick(&mut self, commands: &mut Vec<BoothCommand>) {
        if self.state.mode != BoothMode::Countdown || self.capture_in_flight {
            return;
        }

        let value = self.state.countdown;
        if value > 0 {
            commands.push(BoothCommand::Beep(if value == 1 { Cue::Go } else { Cue::Tick }));
            commands.push(BoothCommand::Announce(value.to_string()));
            self.dispatch(BoothAction::TickCountdown);
        }

        if self.state.countdown == 0 {
            self.begin_capture(commands);
        } else {
            self.arm(TimerKind::Countdown, TICK, commands);
        }
        commands.push(BoothCommand::UpdateUI);
    }

    fn begin_capture(&mut self, commands: &mut Vec<BoothCommand>) {
        // A second capture in the same cycle would put the photo count out of
        // step with the countdown.
        if self.capture_in_flight {
            return;
        }
        self.capture_in_flight = true;
        self.dispatch(BoothAction::ToCapturing);
        commands.push(BoothCommand::Flash);
        commands.push(BoothCommand::CapturePhoto {
            epoch: self.epoch,
            session_id: self.session.id().map(str::to_string),
        });
    }

    fn after_capture(&mut self, commands: &mut Vec<BoothCommand>) {
        let taken = self.session.photos_taken();
        let target = self.config.photos_to_take as usize;
        log::info!("Photo {} of {} captured", taken, target);

        if taken >= target {
            commands.push(BoothCommand::Beep(Cue::Success));
            commands.push(BoothCommand::Announce(
                "Perfect! Take a look at your photos.".to_string(),
            ));
            self.dispatch(BoothAction::ToReviewing);
            self.review_index = 0;
            self.show_review_photo(commands);
        } else {
            let message = if target - taken == 1 {
                "One more to go. Last shot."
            } else {
                "Nice. Next photo."
            };
            commands.push(BoothCommand::Announce(message.to_string()));
            self.dispatch(BoothAction::ToPausing {
                pause_seconds: self.config.pause_seconds,
            });
            self.arm(TimerKind::Pause, TICK, commands);
        }
        commands.push(BoothCommand::UpdateUI);
    }

    fn on_pause_tick(&mut self, commands: &mut Vec<BoothCommand>) {
        if self.state.mode != BoothMode::Pausing {
            return;
        }
        self.dispatch(BoothAction::TickPause);
        if self.state.pause_countdown == 0 {
            self.arm_countdown(commands);
        } else {
            self.arm(TimerKind::Pause, TICK, commands);
        }
        commands.push(BoothCommand::UpdateUI);
    }

    /// Review navigation only while a photo is on screen, not while the
    /// preview is being composed
    fn can_navigate_review(&self) -> bool {
        self.state.mode == BoothMode::Reviewing && self.active_timer() == Some(TimerKind::Review)
    }

    /// Show the photo at `review_index` and restart its review timer
    fn show_review_photo(&mut self, commands: &mut Vec<BoothCommand>) {
        let Some(photo_ref) = self.session.photo_refs().get(self.review_index).cloned() else {
            return;
        };
        commands.push(BoothCommand::ShowReviewPhoto {
            index: self.review_index,
            photo_ref,
        });
        let after = self
            .policy
            .review_duration(self.review_index, self.session.photos_taken());
        self.arm(TimerKind::Review, after, commands);
        commands.push(BoothCommand::UpdateUI);
    }

    fn on_review_elapsed(&mut self, commands: &mut Vec<BoothCommand>) {
        if self.state.mode != BoothMode::Reviewing {
            return;
        }
        if self.review_index + 1 < self.session.photos_taken() {
            self.review_index += 1;
            commands.push(BoothCommand::Beep(Cue::Advance));
            self.show_review_photo(commands);
            return;
        }

        commands.push(BoothCommand::Announce(
            "Building your strip preview.".to_string(),
        ));
        commands.push(BoothCommand::ComposePreview {
            epoch: self.epoch,
            photo_refs: self.session.photo_refs().to_vec(),
            design: self.config.design.clone(),
        });
        commands.push(BoothCommand::UpdateUI);
    }

    fn on_preview_tick(&mut self, commands: &mut Vec<BoothCommand>) {
        if self.state.mode != BoothMode::PreviewFinal {
            return;
        }
        self.preview_countdown = self.preview_countdown.saturating_sub(1);
        if self.preview_countdown == 0 {
            self.begin_processing(commands);
        } else {
            self.arm(TimerKind::PreviewFinal, TICK, commands);
            commands.push(BoothCommand::UpdateUI);
        }
    }

    fn begin_processing(&mut self, commands: &mut Vec<BoothCommand>) {
        self.disarm(commands);
        commands.push(BoothCommand::Announce(
            "Processing your photo strip.".to_string(),
        ));
        self.dispatch(BoothAction::ToProcessing);
        self.screen = Screen::Processing;
        commands.push(BoothCommand::Navigate(Screen::Processing));
        commands.push(BoothCommand::ComposeStrip {
            epoch: self.epoch,
            session_id: self.session.id().map(str::to_string),
            photo_refs: self.session.photo_refs().to_vec(),
            design: self.config.design.clone(),
        });
        commands.push(BoothCommand::UpdateUI);
    }

    fn on_strip_ready(
        &mut self,
        strip_ref: String,
        print_ref: Option<String>,
        commands: &mut Vec<BoothCommand>,
    ) {
        log::info!("Strip ready: {}", strip_ref);
        if self.config.auto_print {
            commands.push(BoothCommand::QueuePrint(PrintRequest {
                file_ref: print_ref.unwrap_or(strip_ref),
                copies: self.config.print_copies,
                printer: self.config.printer.clone(),
            }));
        }

        commands.push(BoothCommand::Beep(Cue::Success));
        commands.push(BoothCommand::Announce("Your photos are ready!".to_string()));
        self.screen = Screen::Success;
        commands.push(BoothCommand::Navigate(Screen::Success));

        let seconds = self.config.effective_auto_reset(&self.policy);
        self.dispatch(BoothAction::ArmAutoReset { seconds });
        self.arm(TimerKind::AutoReset, TICK, commands);
        commands.push(BoothCommand::UpdateUI);
    }

    fn on_auto_reset_tick(&mut self, commands: &mut Vec<BoothCommand>) {
        if self.screen != Screen::Success {
            return;
        }
        self.dispatch(BoothAction::TickAutoReset);
        if self.state.auto_reset_timer == 0 {
            self.reset_all("Thanks for visiting!", commands);
        } else {
            self.arm(TimerKind::AutoReset, TICK, commands);
            commands.push(BoothCommand::UpdateUI);
        }
    }
}
