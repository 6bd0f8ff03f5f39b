use super::Tempo;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PollOutcome {
    /// Not armed, or the next sample is not due yet.
    Idle,
    /// Playhead position in beats.
    Progress(f64),
    /// The session is over. `reached_end` is set when the transport ran past
    /// the end of the timeline rather than being stopped.
    Ended { reached_end: bool },
}

/// Samples the transport for the UI playhead.
///
/// Each sample schedules the next one `interval` after itself, so a late
/// tick pushes the following ones back instead of bunching up. Disarms
/// itself on the sample that reports the end.
#[derive(Debug, Clone)]
pub struct PlayheadPoller {
    interval: f64,
    total_duration: f64,
    next_due: f64,
    armed: bool,
}

impl PlayheadPoller {
    pub fn new(interval: f64) -> Self {
        Self {
            interval,
            total_duration: 0.0,
            next_due: 0.0,
            armed: false,
        }
    }

    /// Arms for a session; the first sample is due immediately.
    pub fn arm(&mut self, total_duration: f64, now: f64) {
        self.total_duration = total_duration;
        self.next_due = now;
        self.armed = true;
    }

    pub fn next_due(&self) -> Option<f64> {
        self.armed.then_some(self.next_due)
    }

    pub fn sample(&mut self, now: f64, playing: bool, position: f64, tempo: Tempo) -> PollOutcome {
        if !self.armed || now < self.next_due {
            return PollOutcome::Idle;
        }

        let reached_end = position > self.total_duration;
        if !playing || reached_end {
            self.armed = false;
            return PollOutcome::Ended { reached_end };
        }

        self.next_due = now + self.interval;
        PollOutcome::Progress(tempo.seconds_to_beats(position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tempo() -> Tempo {
        Tempo::new(120.0).unwrap()
    }

    #[test]
    fn reports_progress_in_beats_and_reschedules() {
        let mut poller = PlayheadPoller::new(0.01);
        poller.arm(4.0, 0.0);

        assert_eq!(poller.sample(0.0, true, 1.0, tempo()), PollOutcome::Progress(2.0));
        assert_eq!(poller.next_due(), Some(0.01));
        assert_eq!(poller.sample(0.005, true, 1.005, tempo()), PollOutcome::Idle);
    }

    #[test]
    fn ends_once_past_total_duration() {
        let mut poller = PlayheadPoller::new(0.01);
        poller.arm(4.0, 0.0);

        // exactly at the end is still progress
        assert_eq!(poller.sample(0.0, true, 4.0, tempo()), PollOutcome::Progress(8.0));
        assert_eq!(
            poller.sample(1.0, true, 4.01, tempo()),
            PollOutcome::Ended { reached_end: true }
        );
        assert_eq!(poller.next_due(), None);
        assert_eq!(poller.sample(2.0, true, 5.0, tempo()), PollOutcome::Idle);
    }

    #[test]
    fn ends_when_no_longer_playing() {
        let mut poller = PlayheadPoller::new(0.01);
        poller.arm(4.0, 0.0);

        assert_eq!(
            poller.sample(0.0, false, 0.0, tempo()),
            PollOutcome::Ended { reached_end: false }
        );
        assert_eq!(poller.next_due(), None);
    }
}
