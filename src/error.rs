use std::{io, path::PathBuf};

use crate::alarm::AlarmId;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("couldn't read or write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("couldn't parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("couldn't serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("couldn't determine a config directory for this platform")]
    NoConfigDir,
    #[error("invalid alarm time {0:?}, expected 24-hour HH:MM")]
    InvalidTime(String),
    #[error("invalid time format {0:?}")]
    InvalidTimeFormat(String),
    #[error("no alarm with id {0}")]
    UnknownAlarm(AlarmId),
}
