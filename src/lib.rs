#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]
#![deny(clippy::use_self, rust_2018_idioms)]
#![allow(clippy::multiple_crate_versions, clippy::module_name_repetitions)]

pub mod alarm;
pub mod communication;
pub mod config;
pub mod error;
pub mod monitor;
/// terminal rendering of a triggered alarm and parsing of the user's answer
pub mod overlay;
pub mod ticker;

pub use alarm::{Alarm, AlarmId};
pub use config::{Config, Settings};
pub use error::ConfigError;
pub use monitor::{AlarmMonitor, TriggerPolicy};
pub use ticker::{MonitorHandle, Remote};
