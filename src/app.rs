//! Application driver - runs the orchestrator on the tokio runtime.
//!
//! Owns the single timer slot, executes backend calls in spawned tasks and
//! feeds their results back through the event channel. Everything meant for
//! the screen or speakers leaves as a [`BoothNotice`].

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::backend::BoothBackend;
use crate::config::{self, BoothPolicy};
use crate::error::{BoothError, StartGuardError};
use crate::health;
use crate::orchestrator::{
    BoothCommand, BoothEvent, BoothOrchestrator, BoothSnapshot, Cue, Screen,
};

/// Output for the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum BoothNotice {
    Announce(String),
    Beep(Cue),
    Flash,
    Error(String),
    StartRejected(StartGuardError),
    ReviewPhoto { index: usize, photo_ref: String },
    Preview { preview_ref: String },
    Navigate(Screen),
    ExitKiosk,
    Snapshot(BoothSnapshot),
}

/// Sender that can dispatch events to the booth from any task
#[derive(Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<BoothEvent>,
}

impl EventSender {
    pub fn send(&self, event: BoothEvent) {
        let _ = self.tx.send(event);
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingTimer {
    id: u64,
    deadline: Instant,
}

/// The booth application: orchestrator plus the runtime plumbing around it
pub struct BoothApp<B> {
    orchestrator: BoothOrchestrator,
    backend: B,
    policy: BoothPolicy,
    events_tx: EventSender,
    events_rx: mpsc::UnboundedReceiver<BoothEvent>,
    notices: mpsc::UnboundedSender<BoothNotice>,
    timer: Option<PendingTimer>,
}

impl<B> BoothApp<B>
where
    B: BoothBackend + Clone + Sync + 'static,
{
    pub fn new(backend: B, policy: BoothPolicy) -> (Self, mpsc::UnboundedReceiver<BoothNotice>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (notices, notices_rx) = mpsc::unbounded_channel();

        let app = Self {
            orchestrator: BoothOrchestrator::new(policy.clone()),
            backend,
            policy,
            events_tx: EventSender { tx: events_tx },
            events_rx,
            notices,
            timer: None,
        };

        (app, notices_rx)
    }

    pub fn sender(&self) -> EventSender {
        self.events_tx.clone()
    }

    /// Poll device health, settings and template on the policy interval
    pub fn spawn_health_monitor(&self) -> JoinHandle<()> {
        let tx = self.sender();
        health::spawn_monitor(
            self.backend.clone(),
            self.policy.health_poll_interval,
            move |report| {
                tx.send(BoothEvent::HealthUpdated(report.health));
                if report.settings.is_some() {
                    tx.send(BoothEvent::ConfigLoaded {
                        settings: report.settings,
                        template: report.template,
                    });
                }
            },
        )
    }

    /// Run until a `Shutdown` event arrives. Returns the orchestrator in its
    /// final state.
    pub async fn run(mut self) -> BoothOrchestrator {
        log::info!("Booth running");
        self.notify(BoothNotice::Snapshot(self.orchestrator.snapshot()));

        loop {
            let deadline = self.timer.map(|t| t.deadline);

            tokio::select! {
                event = self.events_rx.recv() => match event {
                    Some(BoothEvent::Shutdown) | None => break,
                    Some(event) => self.process_event(event),
                },
                _ = sleep_until(deadline) => {
                    if let Some(timer) = self.timer.take() {
                        self.process_event(BoothEvent::TimerFired { timer_id: timer.id });
                    }
                }
            }
        }

        log::info!("Booth stopped");
        self.orchestrator
    }

    /// Process an event and execute resulting commands
    fn process_event(&mut self, event: BoothEvent) {
        let commands = self
            .orchestrator
            .handle(event, std::time::Instant::now());

        for cmd in commands {
            self.execute_command(cmd);
        }
    }

    fn notify(&self, notice: BoothNotice) {
        let _ = self.notices.send(notice);
    }

    /// Execute a command from the orchestrator
    fn execute_command(&mut self, cmd: BoothCommand) {
        match cmd {
            BoothCommand::ArmTimer { timer_id, after } => {
                self.timer = Some(PendingTimer {
                    id: timer_id,
                    deadline: Instant::now() + after,
                });
            }

            BoothCommand::CancelTimer => {
                self.timer = None;
            }

            BoothCommand::CapturePhoto { epoch, session_id } => {
                let tx = self.sender();
                let backend = self.backend.clone();

                tokio::spawn(async move {
                    match backend.capture_photo(session_id.as_deref()).await {
                        Ok(photo) => tx.send(BoothEvent::CaptureSucceeded {
                            epoch,
                            session_id: photo.session_id,
                            photo_ref: photo.photo_ref,
                        }),
                        Err(e) => {
                            let err = BoothError::Capture(e);
                            log::debug!("Backend call failed: {:?}", err);
                            tx.send(BoothEvent::CaptureFailed {
                                epoch,
                                error: err.to_string(),
                                message: err.guest_message(),
                            });
                        }
                    }
                });
            }

            BoothCommand::ComposePreview {
                epoch,
                photo_refs,
                design,
            } => {
                let tx = self.sender();
                let backend = self.backend.clone();

                tokio::spawn(async move {
                    match backend.compose_preview(&photo_refs, &design).await {
                        Ok(preview_ref) => {
                            tx.send(BoothEvent::PreviewComposed { epoch, preview_ref })
                        }
                        Err(e) => {
                            let err = BoothError::Composition(e);
                            log::debug!("Backend call failed: {:?}", err);
                            tx.send(BoothEvent::PreviewFailed {
                                epoch,
                                error: err.to_string(),
                            });
                        }
                    }
                });
            }

            BoothCommand::ComposeStrip {
                epoch,
                session_id,
                photo_refs,
                design,
            } => {
                let tx = self.sender();
                let backend = self.backend.clone();

                tokio::spawn(async move {
                    match backend
                        .compose_strip(session_id.as_deref(), &photo_refs, &design)
                        .await
                    {
                        Ok(strip) => tx.send(BoothEvent::StripComposed {
                            epoch,
                            strip_ref: strip.strip_ref,
                            print_ref: strip.print_ref,
                        }),
                        Err(e) => {
                            let err = BoothError::Composition(e);
                            log::debug!("Backend call failed: {:?}", err);
                            tx.send(BoothEvent::StripFailed {
                                epoch,
                                error: err.to_string(),
                                message: err.guest_message(),
                            });
                        }
                    }
                });
            }

            BoothCommand::QueuePrint(job) => {
                let tx = self.sender();
                let backend = self.backend.clone();

                tokio::spawn(async move {
                    let result = backend
                        .queue_print(&job.file_ref, job.copies, job.printer.as_deref())
                        .await;
                    match result {
                        Ok(printed) => tx.send(BoothEvent::PrintQueued {
                            file_ref: job.file_ref,
                            printer: printed.printer,
                        }),
                        Err(e) => {
                            let err = BoothError::Print(e);
                            log::debug!("Backend call failed: {:?}", err);
                            tx.send(BoothEvent::PrintFailed {
                                job,
                                error: err.to_string(),
                                message: err.guest_message(),
                            });
                        }
                    }
                });
            }

            BoothCommand::ScheduleErrorClear { generation } => {
                let tx = self.sender();
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(config::ERROR_DISPLAY_DURATION_MS))
                        .await;
                    tx.send(BoothEvent::ClearError { generation });
                });
            }

            BoothCommand::Announce(message) => self.notify(BoothNotice::Announce(message)),
            BoothCommand::Beep(cue) => self.notify(BoothNotice::Beep(cue)),
            BoothCommand::Flash => self.notify(BoothNotice::Flash),
            BoothCommand::ShowError(message) => self.notify(BoothNotice::Error(message)),
            BoothCommand::RejectStart(reason) => self.notify(BoothNotice::StartRejected(reason)),
            BoothCommand::ShowReviewPhoto { index, photo_ref } => {
                self.notify(BoothNotice::ReviewPhoto { index, photo_ref })
            }
            BoothCommand::ShowPreview { preview_ref } => {
                self.notify(BoothNotice::Preview { preview_ref })
            }
            BoothCommand::Navigate(screen) => self.notify(BoothNotice::Navigate(screen)),
            BoothCommand::ExitKiosk => self.notify(BoothNotice::ExitKiosk),

            BoothCommand::UpdateUI => {
                self.notify(BoothNotice::Snapshot(self.orchestrator.snapshot()));
            }
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
