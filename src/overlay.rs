use std::fmt::Write;

use chrono::NaiveDateTime;

use crate::{
    alarm::{Alarm, HH_MM},
    config::{Settings, TextDirection},
};

// unicode right-to-left embedding and pop directional formatting
const RLE: char = '\u{202B}';
const PDF: char = '\u{202C}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayAction {
    Dismiss,
    Snooze,
    Quit,
}

/// one line banner shown while an alarm is triggered
#[must_use]
pub fn render(alarm: &Alarm, settings: &Settings, now: NaiveDateTime, time_format: &str) -> String {
    let banner = format!(
        "⏰ {alarm} is ringing, it is {} | [d]ismiss [s]nooze",
        format_now(now, time_format)
    );
    match settings.text_direction() {
        TextDirection::Ltr => banner,
        TextDirection::Rtl => format!("{RLE}{banner}{PDF}"),
    }
}

// a bad format string makes chrono's Display fail, which `format!` would turn into a panic
fn format_now(now: NaiveDateTime, time_format: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", now.format(time_format)).is_err() {
        return now.format(HH_MM).to_string();
    }
    out
}

#[must_use]
pub fn parse_action(input: &str) -> Option<OverlayAction> {
    match input.trim().to_lowercase().as_str() {
        "d" | "dismiss" => Some(OverlayAction::Dismiss),
        "s" | "snooze" => Some(OverlayAction::Snooze),
        "q" | "quit" => Some(OverlayAction::Quit),
        _ => None,
    }
}
