use crate::events::{DueTrigger, Trigger};

/// Beat pulse running alongside the transport.
///
/// Beats fall on transport times `k * period`. Muting silences the output
/// but the beat counter keeps moving, so unmuting never needs a resync.
pub struct Metronome {
    period: f64,
    click_freq: f64,
    click_duration: f64,
    muted: bool,
    running: bool,
    next_beat: u64,
}

impl Metronome {
    pub fn new(click_freq: f64, click_duration: f64) -> Self {
        Self {
            period: 0.5,
            click_freq,
            click_duration,
            muted: false,
            running: false,
            next_beat: 0,
        }
    }

    pub fn start(&mut self, period: f64) {
        self.period = period;
        self.running = true;
        self.muted = false;
        self.next_beat = 0;
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.next_beat = 0;
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Realigns to the first beat at or after `position`.
    pub fn seek(&mut self, position: f64) {
        if !position.is_finite() {
            return;
        }
        let beats = position / self.period;
        let nearest = beats.round();
        // Float noise must not skip a beat that lands exactly on the target.
        self.next_beat = if (beats - nearest).abs() < 1e-9 {
            nearest as u64
        } else {
            beats.ceil() as u64
        };
    }

    /// Beats due before `position + lookahead`. Muted beats are consumed
    /// without producing a click.
    pub fn drain_due(&mut self, position: f64, lookahead: f64) -> Vec<DueTrigger> {
        if !self.running {
            return Vec::new();
        }
        let horizon = position + lookahead;
        if !horizon.is_finite() {
            return Vec::new();
        }

        let mut due = Vec::new();
        loop {
            let time = self.next_beat as f64 * self.period;
            if time >= horizon {
                break;
            }
            if !self.muted {
                due.push(DueTrigger {
                    offset: (time - position).max(0.0),
                    trigger: Trigger::Click {
                        freq: self.click_freq,
                        duration: self.click_duration,
                    },
                });
            }
            match self.next_beat.checked_add(1) {
                Some(next) => self.next_beat = next,
                None => {
                    self.running = false;
                    break;
                }
            }
        }
        due
    }
}
