//! Decides, once per tick, whether an active alarm's minute has arrived.
//!
//! The monitor holds a single triggered slot. While it is occupied no
//! alarm is evaluated, so a second alarm for the same minute never
//! replaces the one the user is currently looking at.

use std::collections::HashMap;

use chrono::{NaiveDateTime, Timelike};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::alarm::{format_hh_mm, Alarm, AlarmId};

/// when a matching alarm is allowed to fire
#[derive(Debug, Serialize, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TriggerPolicy {
    /// only fire on a tick that lands exactly on second zero.
    /// a stalled tick loop skips the alarm for the day
    ExactSecond,
    /// fire on the first tick inside the matching minute, once per alarm per minute
    #[default]
    OncePerMinute,
}

#[derive(Debug, Default)]
pub struct AlarmMonitor {
    policy: TriggerPolicy,
    triggered: Option<Alarm>,
    // minute (seconds truncated) each alarm last fired in
    fired: HashMap<AlarmId, NaiveDateTime>,
}

impl AlarmMonitor {
    #[must_use]
    pub fn new(policy: TriggerPolicy) -> Self {
        Self {
            policy,
            triggered: None,
            fired: HashMap::new(),
        }
    }

    #[must_use]
    pub const fn policy(&self) -> TriggerPolicy {
        self.policy
    }

    #[must_use]
    pub const fn triggered(&self) -> Option<&Alarm> {
        self.triggered.as_ref()
    }

    #[must_use]
    pub const fn is_triggered(&self) -> bool {
        self.triggered.is_some()
    }

    /// evaluates `alarms` against `now`
    /// returns the alarm that became triggered on this tick, if any
    pub fn tick(&mut self, alarms: &[Alarm], now: NaiveDateTime) -> Option<&Alarm> {
        if self.triggered.is_some() {
            return None;
        }
        let minute = truncate_to_minute(now);
        self.fired.retain(|_, fired_at| *fired_at == minute);

        let current = format_hh_mm(now);
        // only the first match is considered, even if it already fired this minute
        let candidate = alarms.iter().find(|alarm| alarm.matches(&current))?;

        let not_fired_yet = self.fired.get(&candidate.id) != Some(&minute);
        let should_fire = match self.policy {
            TriggerPolicy::ExactSecond => now.second() == 0 && not_fired_yet,
            TriggerPolicy::OncePerMinute => not_fired_yet,
        };
        if !should_fire {
            debug!("alarm {} matches {current} but is not due", candidate.id);
            return None;
        }

        info!("alarm {candidate} triggered at {now}");
        self.fired.insert(candidate.id, minute);
        self.triggered = Some(candidate.clone());
        self.triggered.as_ref()
    }

    /// clears the triggered slot, returning what was in it
    pub fn dismiss(&mut self) -> Option<Alarm> {
        let cleared = self.triggered.take();
        if let Some(alarm) = &cleared {
            info!("alarm {alarm} dismissed");
        }
        cleared
    }

    /// same as [`Self::dismiss`], the alarm's scheduled time is left alone
    pub fn snooze(&mut self) -> Option<Alarm> {
        let cleared = self.triggered.take();
        if let Some(alarm) = &cleared {
            info!("alarm {alarm} snoozed");
        }
        cleared
    }
}

fn truncate_to_minute(now: NaiveDateTime) -> NaiveDateTime {
    now.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now)
}
