use std::time::Duration;
use std::{env, fmt, fs, path};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::validation;

/// URLs polled when no config file exists yet.
pub const DEFAULT_URLS: [&str; 3] =
    ["http://www.google.com", "http://golang.org", "http://blog.golang.org"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Endpoints to poll, in seeding order.
    pub urls: Vec<String>,
    pub polling: Polling,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Polling {
    /// Number of concurrent probing workers.
    pub pollers: usize,
    /// How often each healthy URL is polled.
    pub poll_interval_seconds: u64,
    /// How often the current state is logged.
    pub status_interval_seconds: u64,
    /// Extra delay added per consecutive failure.
    pub backoff_seconds: u64,
    /// Per-request timeout of a probe.
    pub timeout_seconds: u64,
}

impl Polling {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_secs(self.status_interval_seconds)
    }

    pub fn backoff_unit(&self) -> Duration {
        Duration::from_secs(self.backoff_seconds)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for Polling {
    fn default() -> Self {
        Self {
            pollers: 2,
            poll_interval_seconds: 60,
            status_interval_seconds: 10,
            backoff_seconds: 10,
            timeout_seconds: 10,
        }
    }
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/pollwatch/config.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<path::PathBuf, ConfigError> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Some(home_dir) = env::home_dir() {
        home_dir.join(".config")
    } else {
        return Err(ConfigError::ConfigPathUnavailable);
    };

    Ok(path.join("pollwatch/config.toml"))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            urls: DEFAULT_URLS.iter().map(|url| url.to_string()).collect(),
            polling: Polling::default(),
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| {
                writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
            }
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);
        let write_2 = write_indented(2);

        writeln!(f, "Current Internal Configuration State:")?;
        write_title_1(f, "Polling")?;
        write_1(f, "Pollers", &self.polling.pollers)?;
        write_1(f, "Poll Interval (s)", &self.polling.poll_interval_seconds)?;
        write_1(f, "Status Interval (s)", &self.polling.status_interval_seconds)?;
        write_1(f, "Backoff Unit (s)", &self.polling.backoff_seconds)?;
        write_1(f, "Timeout (s)", &self.polling.timeout_seconds)?;
        write_title_1(f, "URLs")?;
        for (index, url) in self.urls.iter().enumerate() {
            write_2(f, &index.to_string(), url)?;
        }

        Ok(())
    }
}

impl Config {
    /// Generate Config structure from file
    ///
    /// Creates a default config in ~/.config/pollwatch/config.toml
    ///  or the specified path, with the name config.toml if one does not exist
    ///
    /// ```no_run
    /// use pollwatch::config::Config;
    ///
    /// let cfg = Config::from_config(None::<&std::path::Path>)?;
    /// println!("{}", cfg);
    /// # Ok::<(), pollwatch::error::ConfigError>(())
    /// ```
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, ConfigError> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        if config_path.exists() {
            let raw_string = fs::read_to_string(&config_path)
                .map_err(|source| ConfigError::ReadFailed { path: config_path.clone(), source })?;
            toml::from_str(raw_string.as_str())
                .map_err(|source| ConfigError::ParseFailed { path: config_path, source })
        } else {
            let config = Self::default();
            config.write_config(&config_path)?;
            Ok(config)
        }
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let config_str: String = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|source| ConfigError::WriteFailed { path: parent.to_path_buf(), source })?;
        }

        std::fs::write(path, config_str)
            .map_err(|source| ConfigError::WriteFailed { path: path.to_path_buf(), source })
    }

    /// Reject configurations the monitor cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validation::validate_targets(&self.urls)?;
        validation::validate_pollers(self.polling.pollers)?;
        validation::validate_interval("poll interval", self.polling.poll_interval_seconds)?;
        validation::validate_interval("status interval", self.polling.status_interval_seconds)?;
        validation::validate_interval("backoff unit", self.polling.backoff_seconds)?;
        validation::validate_timeout(self.polling.timeout_seconds)
    }
}
