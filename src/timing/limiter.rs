use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    PreviewNotes,
    PreviewChord,
    SeekCatchUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cooldowns {
    pub preview_notes_ms: f64,
    pub preview_chord_ms: f64,
    pub seek_ms: f64,
}

impl Default for Cooldowns {
    fn default() -> Self {
        Self {
            preview_notes_ms: 100.0,
            preview_chord_ms: 200.0,
            seek_ms: 500.0,
        }
    }
}

impl Cooldowns {
    pub fn for_source(&self, source: TriggerSource) -> f64 {
        match source {
            TriggerSource::PreviewNotes => self.preview_notes_ms,
            TriggerSource::PreviewChord => self.preview_chord_ms,
            TriggerSource::SeekCatchUp => self.seek_ms,
        }
    }
}

/// Cooldown gate for live triggers.
///
/// All sources share one last-trigger timestamp: an accepted trigger from
/// any source restarts the window for every other source.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    cooldowns: Cooldowns,
    last_trigger_ms: Option<f64>,
}

impl RateLimiter {
    pub fn new(cooldowns: Cooldowns) -> Self {
        Self {
            cooldowns,
            last_trigger_ms: None,
        }
    }

    /// Records `now_ms` and returns true when the source's cooldown has
    /// elapsed since the last accepted trigger.
    pub fn try_acquire(&mut self, source: TriggerSource, now_ms: f64) -> bool {
        if let Some(last) = self.last_trigger_ms {
            if last + self.cooldowns.for_source(source) > now_ms {
                return false;
            }
        }
        self.last_trigger_ms = Some(now_ms);
        true
    }

    pub fn last_trigger_ms(&self) -> Option<f64> {
        self.last_trigger_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_trigger_always_passes() {
        let mut limiter = RateLimiter::new(Cooldowns::default());
        assert!(limiter.try_acquire(TriggerSource::SeekCatchUp, 0.0));
        assert_eq!(limiter.last_trigger_ms(), Some(0.0));
    }

    #[test]
    fn rejects_inside_window() {
        let mut limiter = RateLimiter::new(Cooldowns::default());
        assert!(limiter.try_acquire(TriggerSource::PreviewNotes, 1000.0));
        assert!(!limiter.try_acquire(TriggerSource::PreviewNotes, 1099.0));
        assert!(limiter.try_acquire(TriggerSource::PreviewNotes, 1100.0));
    }

    #[test]
    fn rejected_calls_do_not_extend_window() {
        let mut limiter = RateLimiter::new(Cooldowns::default());
        assert!(limiter.try_acquire(TriggerSource::PreviewChord, 0.0));
        assert!(!limiter.try_acquire(TriggerSource::PreviewChord, 150.0));
        assert!(limiter.try_acquire(TriggerSource::PreviewChord, 200.0));
    }

    #[test]
    fn sources_share_one_window() {
        let mut limiter = RateLimiter::new(Cooldowns::default());
        assert!(limiter.try_acquire(TriggerSource::PreviewNotes, 0.0));
        // a notes preview 300 ms ago still blocks a seek catch-up
        assert!(!limiter.try_acquire(TriggerSource::SeekCatchUp, 300.0));
        assert!(limiter.try_acquire(TriggerSource::PreviewChord, 300.0));
        assert!(!limiter.try_acquire(TriggerSource::PreviewNotes, 350.0));
    }
}
