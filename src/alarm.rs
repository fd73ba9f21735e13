use std::fmt;

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub type AlarmId = u64;

/// format used both for alarm times and for the current minute
pub const HH_MM: &str = "%H:%M";

#[inline]
#[must_use]
pub const fn always_true() -> bool {
    true
}

/// represents an alarm
/// the time is kept as the raw "HH:MM" string it was configured with,
/// the monitor only ever compares it against the formatted current minute
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Alarm {
    pub id: AlarmId,
    pub time: String,
    #[serde(default = "always_true")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Alarm {
    #[must_use]
    pub fn new(id: AlarmId, time: impl Into<String>, name: Option<String>) -> Self {
        Self {
            id,
            time: time.into(),
            is_active: true,
            name,
        }
    }

    /// an alarm matches if it is active and its time string is exactly the current minute
    /// malformed times never match
    #[must_use]
    pub fn matches(&self, current_hh_mm: &str) -> bool {
        self.is_active && self.time == current_hh_mm
    }

    /// strict 24-hour "HH:MM" check, used when a user types in a new alarm
    ///
    /// # Errors
    /// if `time` is not two digit hours and minutes separated by a colon,
    /// or is out of range
    pub fn validate_time(time: &str) -> Result<NaiveTime, ConfigError> {
        let bytes = time.as_bytes();
        // chrono accepts "7:30" and " 7:30" for %H:%M, neither equals a formatted minute
        if bytes.len() != 5
            || bytes[2] != b':'
            || !bytes[..2].iter().all(u8::is_ascii_digit)
            || !bytes[3..].iter().all(u8::is_ascii_digit)
        {
            return Err(ConfigError::InvalidTime(time.to_string()));
        }
        NaiveTime::parse_from_str(time, HH_MM)
            .map_err(|_| ConfigError::InvalidTime(time.to_string()))
    }
}

#[must_use]
pub fn format_hh_mm(now: NaiveDateTime) -> String {
    now.format(HH_MM).to_string()
}

impl fmt::Display for Alarm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} ({})", self.time)?,
            None => write!(f, "alarm {} ({})", self.id, self.time)?,
        }
        if !self.is_active {
            write!(f, " [off]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn format_pads_hours_and_minutes() {
        assert_eq!(format_hh_mm(at(7, 5, 59)), "07:05");
        assert_eq!(format_hh_mm(at(23, 59, 0)), "23:59");
    }

    #[test]
    fn inactive_alarm_never_matches() {
        let mut alarm = Alarm::new(1, "07:30", None);
        assert!(alarm.matches("07:30"));
        alarm.is_active = false;
        assert!(!alarm.matches("07:30"));
    }

    #[test]
    fn malformed_time_is_skipped_not_an_error() {
        let alarm = Alarm::new(1, "7:30", None);
        assert!(!alarm.matches(&format_hh_mm(at(7, 30, 0))));
    }

    #[test]
    fn validate_time_is_strict() {
        assert!(Alarm::validate_time("07:30").is_ok());
        assert!(Alarm::validate_time("23:59").is_ok());
        assert!(Alarm::validate_time("7:30").is_err());
        assert!(Alarm::validate_time(" 7:30").is_err());
        assert!(Alarm::validate_time("07: 5").is_err());
        assert!(Alarm::validate_time("7:30 ").is_err());
        assert!(Alarm::validate_time("24:00").is_err());
        assert!(Alarm::validate_time("07:60").is_err());
        assert!(Alarm::validate_time("07-30").is_err());
        assert!(Alarm::validate_time("").is_err());
    }

    #[test]
    fn display_uses_name_when_present() {
        let named = Alarm::new(3, "06:45", Some("gym".to_string()));
        assert_eq!(named.to_string(), "gym (06:45)");
        let mut unnamed = Alarm::new(4, "06:45", None);
        unnamed.is_active = false;
        assert_eq!(unnamed.to_string(), "alarm 4 (06:45) [off]");
    }

    #[test]
    fn missing_is_active_defaults_to_true() {
        let alarm: Alarm = toml::from_str("id = 9\ntime = \"08:00\"").unwrap();
        assert!(alarm.is_active);
        assert_eq!(alarm.name, None);
    }
}
