//! Panic-exit detection for the reset gesture.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Counts reset presses inside a rolling window. Reaching the threshold is an
/// operator override; anything less is an ordinary reset request.
#[derive(Debug, Clone)]
pub struct PanicDetector {
    threshold: usize,
    window: Duration,
    presses: VecDeque<Instant>,
}

impl PanicDetector {
    pub fn new(threshold: usize, window: Duration) -> Self {
        Self {
            threshold: threshold.max(1),
            window,
            presses: VecDeque::new(),
        }
    }

    /// Record a press at `now`. Returns true when this press completes a
    /// panic sequence; the history is cleared in that case.
    pub fn record(&mut self, now: Instant) -> bool {
        while let Some(first) = self.presses.front() {
            if now.saturating_duration_since(*first) > self.window {
                self.presses.pop_front();
            } else {
                break;
            }
        }
        self.presses.push_back(now);

        if self.presses.len() >= self.threshold {
            self.presses.clear();
            true
        } else {
            false
        }
    }

    pub fn pending(&self) -> usize {
        self.presses.len()
    }
}
