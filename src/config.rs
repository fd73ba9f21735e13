use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use chrono::format::{Item, StrftimeItems};
use log::{info, warn};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};

use crate::{
    alarm::{Alarm, AlarmId},
    error::ConfigError,
    monitor::TriggerPolicy,
    ticker::Remote,
};

pub const DEFAULT_THEME: &str = "dark_space";
pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_TIME_FORMAT: &str = "%H:%M:%S";
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;
pub const MIN_TICK_INTERVAL_MS: u64 = 100;
pub const MAX_TICK_INTERVAL_MS: u64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDirection {
    Ltr,
    Rtl,
}

/// presentation settings, the monitor never looks at these
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Settings {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_theme() -> String {
    DEFAULT_THEME.to_string()
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_time_format() -> String {
    DEFAULT_TIME_FORMAT.to_string()
}

const fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            language: default_language(),
        }
    }
}

impl Settings {
    #[must_use]
    pub fn text_direction(&self) -> TextDirection {
        if self.language == "ar" {
            TextDirection::Rtl
        } else {
            TextDirection::Ltr
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Config {
    #[serde(default = "default_time_format")]
    pub time_format: String,
    #[serde(default)]
    pub trigger_policy: TriggerPolicy,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    // tables last so the file serializes cleanly
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub alarms: Vec<Alarm>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            time_format: default_time_format(),
            trigger_policy: TriggerPolicy::default(),
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            settings: Settings::default(),
            alarms: vec![],
        }
    }
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// if the file can't be read, isn't valid toml or has an unusable `time_format`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&config).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        check_time_format(&config.time_format)?;
        Ok(config)
    }

    /// like [`Self::load`] but a missing file gives the default config
    ///
    /// # Errors
    /// if the file exists but can't be read or parsed
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            info!("no config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// # Errors
    /// if the config can't be serialized or the file/its directory can't be written
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let config = toml::to_string(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, config).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// # Errors
    /// if the platform has no home/config directory
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let mut path = directories::ProjectDirs::from("", "", "clockwatch")
            .ok_or(ConfigError::NoConfigDir)?
            .config_dir()
            .to_path_buf();
        path.push("config.toml");
        Ok(path)
    }

    #[must_use]
    pub fn is_config_present() -> bool {
        Self::config_path().is_ok_and(|path| path.exists())
    }

    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(
            self.tick_interval_ms
                .clamp(MIN_TICK_INTERVAL_MS, MAX_TICK_INTERVAL_MS),
        )
    }

    /// adds an active alarm at `time` and returns its new id
    ///
    /// # Errors
    /// if `time` is not a valid HH:MM time
    pub fn add_alarm(&mut self, time: &str, name: Option<String>) -> Result<AlarmId, ConfigError> {
        Alarm::validate_time(time)?;
        let id = self.alarms.iter().map(|alarm| alarm.id).max().map_or(1, |max| max + 1);
        self.alarms.push(Alarm::new(id, time, name));
        Ok(id)
    }

    /// # Errors
    /// if there is no alarm with this id
    pub fn set_active(&mut self, id: AlarmId, is_active: bool) -> Result<(), ConfigError> {
        let alarm = self
            .alarms
            .iter_mut()
            .find(|alarm| alarm.id == id)
            .ok_or(ConfigError::UnknownAlarm(id))?;
        alarm.is_active = is_active;
        Ok(())
    }

    /// # Errors
    /// if there is no alarm with this id
    pub fn remove_alarm(&mut self, id: AlarmId) -> Result<Alarm, ConfigError> {
        let index = self
            .alarms
            .iter()
            .position(|alarm| alarm.id == id)
            .ok_or(ConfigError::UnknownAlarm(id))?;
        Ok(self.alarms.remove(index))
    }
}

/// # Errors
/// if `time_format` contains a specifier chrono can't format
pub fn check_time_format(time_format: &str) -> Result<(), ConfigError> {
    if StrftimeItems::new(time_format).any(|item| matches!(item, Item::Error)) {
        return Err(ConfigError::InvalidTimeFormat(time_format.to_string()));
    }
    Ok(())
}

/// Watches the config file and pushes its alarm list to a running monitor
/// whenever the file is written. The watcher stops when the returned value
/// is dropped.
///
/// # Errors
/// if the file's directory can't be created or watched
pub fn watch(path: &Path, remote: Remote) -> notify::Result<RecommendedWatcher> {
    let config_path = path.to_path_buf();
    // watch the directory so editors that save via rename are still seen
    let watch_dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    // the file itself may not exist yet, a later `init` or `add` creates it
    fs::create_dir_all(&watch_dir)?;

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        let event = match res {
            Ok(event) => event,
            Err(e) => {
                warn!("config watcher error: {e}");
                return;
            }
        };
        let is_write = matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_));
        let affects_config = event
            .paths
            .iter()
            .any(|p| p.file_name() == config_path.file_name());
        if !(is_write && affects_config) {
            return;
        }
        match Config::load(&config_path) {
            Ok(config) => {
                info!("config reloaded, {} alarms", config.alarms.len());
                remote.replace_alarms(config.alarms);
            }
            // half written files show up here too, the next event will pick up the rest
            Err(e) => warn!("couldn't reload config, keeping previous alarms: {e}"),
        }
    })?;
    watcher.watch(&watch_dir, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}
