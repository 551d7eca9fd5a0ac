use serde_derive::Deserialize;
use std::{fmt, fs::File, path::Path, str::FromStr};

pub const DEFAULT_PATH: &str = "config/settings.ron";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unable to open settings {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },
    #[error("unable to parse settings {path}: {message}")]
    Parse { path: String, message: String },
    #[error("unknown output format '{0}'")]
    UnknownFormat(String),
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub enum Format {
    Ms3d,
    Obj,
    Ron,
}

impl Format {
    pub fn extension(self) -> &'static str {
        match self {
            Format::Ms3d => "ms3d",
            Format::Obj => "obj",
            Format::Ron => "ron",
        }
    }
}

impl FromStr for Format {
    type Err = ConfigError;

    fn from_str(name: &str) -> Result<Self, ConfigError> {
        match name.to_ascii_lowercase().as_str() {
            "ms3d" => Ok(Format::Ms3d),
            "obj" => Ok(Format::Obj),
            "ron" => Ok(Format::Ron),
            _ => Err(ConfigError::UnknownFormat(name.to_string())),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Handling of names that overflow fixed-width fields.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub enum Names {
    Truncate,
    Fail,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub format: Format,
    pub names: Names,
    /// Worker threads for multi-file conversion, 0 picks the core count.
    pub threads: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            format: Format::Ms3d,
            names: Names::Truncate,
            threads: 0,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path).map_err(|source| ConfigError::Open {
            path: path.display().to_string(),
            source,
        })?;
        ron::de::from_reader(file).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Load `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            log::info!("Loading settings from {}", path.display());
            Self::load(path)
        } else {
            log::debug!("No settings at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn ms3d_options(&self) -> ms3d::Options {
        ms3d::Options {
            names: match self.names {
                Names::Truncate => ms3d::NamePolicy::Truncate,
                Names::Fail => ms3d::NamePolicy::Fail,
            },
        }
    }
}
