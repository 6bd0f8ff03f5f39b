use crate::clock::Clock;
use crate::events::{DueTrigger, ScheduledTrigger};
use std::sync::Arc;

/// The session's running clock and the triggers placed on it.
///
/// Position only advances while running. Triggers are handed out in the
/// order they were scheduled, once the position comes within the lookahead
/// window of their time.
pub struct Transport {
    clock: Arc<dyn Clock>,
    running: bool,
    /// Position at `anchor`
    base: f64,
    /// Clock reading when `base` was set
    anchor: f64,
    queue: Vec<ScheduledTrigger>,
    cursor: usize,
}

impl Transport {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            running: false,
            base: 0.0,
            anchor: 0.0,
            queue: Vec::new(),
            cursor: 0,
        }
    }

    pub fn start(&mut self) {
        self.running = true;
        self.base = 0.0;
        self.anchor = self.clock.now();
        self.cursor = 0;
    }

    /// Halts the clock and drops every pending trigger.
    pub fn stop(&mut self) {
        self.running = false;
        self.base = 0.0;
        self.queue.clear();
        self.cursor = 0;
    }

    /// Current position in seconds. Zero while stopped.
    pub fn now(&self) -> f64 {
        if self.running {
            self.base + (self.clock.now() - self.anchor)
        } else {
            0.0
        }
    }

    /// Jumps to `position`. Triggers before it are skipped, triggers at or
    /// after it will fire as the transport reaches them.
    pub fn seek(&mut self, position: f64) {
        self.base = position;
        self.anchor = self.clock.now();
        self.cursor = self.queue.partition_point(|t| t.time < position);
    }

    pub fn schedule(&mut self, scheduled: ScheduledTrigger) {
        let at = self.queue.partition_point(|t| t.time <= scheduled.time);
        if at < self.cursor {
            self.cursor += 1;
        }
        self.queue.insert(at, scheduled);
    }

    pub fn pending(&self) -> usize {
        self.queue.len() - self.cursor
    }

    /// Takes the triggers due before `position + lookahead`.
    pub fn drain_due(&mut self, lookahead: f64) -> Vec<DueTrigger> {
        if !self.running {
            return Vec::new();
        }
        let position = self.now();
        let horizon = position + lookahead;
        if !horizon.is_finite() {
            return Vec::new();
        }

        let mut due = Vec::new();
        while let Some(next) = self.queue.get(self.cursor) {
            if next.time >= horizon {
                break;
            }
            due.push(DueTrigger {
                offset: (next.time - position).max(0.0),
                trigger: next.trigger.clone(),
            });
            self.cursor += 1;
        }
        due
    }
}
