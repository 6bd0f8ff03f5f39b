/// A trigger placed on the transport timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledTrigger {
    /// Transport position in seconds
    pub time: f64,
    pub trigger: Trigger,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    AttackRelease { freq: f64, duration: f64 },
    Click { freq: f64, duration: f64 },
}

/// A trigger that came due, with its offset from the current transport position.
#[derive(Debug, Clone, PartialEq)]
pub struct DueTrigger {
    pub offset: f64,
    pub trigger: Trigger,
}
