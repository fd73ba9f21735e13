use crate::alarm::Alarm;

/// sent to the thread that owns the monitor
#[derive(Debug, Clone)]
pub enum Command {
    Dismiss,
    Snooze,
    // the alarm list changed (config reload, edit)
    ReplaceAlarms(Vec<Alarm>),
    Shutdown,
}

/// sent from the monitor thread to whoever presents the overlay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    AlarmTriggered(Alarm),
    AlarmCleared { alarm: Alarm, reason: ClearReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearReason {
    Dismissed,
    Snoozed,
}
