use std::time::Duration;
use std::{env, fmt, fs, io, path};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const WEBHOOK_ENV: &str = "STATUSWATCH_WEBHOOK_URL";
const INTERVAL_ENV: &str = "STATUSWATCH_INTERVAL_SECONDS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub monitor: Monitor,
    pub storage: Storage,
    pub notify: Notify,
    pub server: Server,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Monitor {
    pub interval_seconds: u64,
    pub max_concurrency: usize,
    pub http_timeout_seconds: u64,
    pub ping_timeout_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Storage {
    pub targets_path: path::PathBuf,
    pub status_path: path::PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Notify {
    pub webhook_url: Option<String>,
    pub log_alerts: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Server {
    pub bind: String,
    pub port: u16,
}

impl Default for Monitor {
    fn default() -> Self {
        Self { interval_seconds: 60, max_concurrency: 10, http_timeout_seconds: 5, ping_timeout_seconds: 2 }
    }
}

impl Default for Storage {
    fn default() -> Self {
        Self { targets_path: "machines.json".into(), status_path: "status_history.json".into() }
    }
}

impl Default for Notify {
    fn default() -> Self {
        Self { webhook_url: None, log_alerts: true }
    }
}

impl Default for Server {
    fn default() -> Self {
        Self { bind: "0.0.0.0".into(), port: 5000 }
    }
}

impl Monitor {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_seconds)
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_secs(self.ping_timeout_seconds)
    }
}

/// Force a `.toml` extension on user supplied paths
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    match path.extension() {
        Some(ext) if ext == "toml" => path.to_path_buf(),
        _ => path.with_extension("toml"),
    }
}

/// `$XDG_CONFIG_HOME/statuswatch/config.toml`, falling back to `~/.config`
fn default_config_path() -> Result<path::PathBuf, ConfigError> {
    let base = env::var_os("XDG_CONFIG_HOME")
        .filter(|dir| !dir.is_empty())
        .map(path::PathBuf::from)
        .or_else(|| env::home_dir().map(|home| home.join(".config")))
        .ok_or(ConfigError::ConfigPathUnavailable)?;

    Ok(base.join("statuswatch").join("config.toml"))
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let webhook = self.notify.webhook_url.as_deref().unwrap_or("<none>");
        let sections = [
            ("Monitor", vec![
                ("Interval (s)", self.monitor.interval_seconds.to_string()),
                ("Max Concurrency", self.monitor.max_concurrency.to_string()),
                ("HTTP Timeout (s)", self.monitor.http_timeout_seconds.to_string()),
                ("Ping Timeout (s)", self.monitor.ping_timeout_seconds.to_string()),
            ]),
            ("Storage", vec![
                ("Targets", self.storage.targets_path.display().to_string()),
                ("Status", self.storage.status_path.display().to_string()),
            ]),
            ("Notify", vec![("Webhook", webhook.to_string()), ("Log Alerts", self.notify.log_alerts.to_string())]),
            ("Server", vec![("Bind Address", self.server.bind.clone()), ("Port", self.server.port.to_string())]),
        ];

        writeln!(f, "Effective configuration:")?;
        for (title, entries) in sections {
            writeln!(f, "  {title}")?;
            for (label, value) in entries {
                writeln!(f, "    {label}: {value}")?;
            }
        }
        Ok(())
    }
}

impl Config {
    /// Load the config at `optional_path`, or at the default location.
    /// A missing file is created with the defaults, which are then returned.
    ///
    /// ```rust,no_run
    /// # use statuswatch::config::Config;
    /// let config = Config::from_config(Some("statuswatch.toml"))?;
    /// println!("{config}");
    /// # Ok::<(), statuswatch::error::ConfigError>(())
    /// ```
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, ConfigError> {
        let config_path = match optional_path {
            Some(path) => normalize_toml_path(path.as_ref()),
            None => default_config_path()?,
        };

        match fs::read_to_string(&config_path) {
            Ok(raw) => Ok(toml::from_str(&raw)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let config = Self::default();
                config.write_config(&config_path)?;
                Ok(config)
            }
            Err(source) => Err(ConfigError::Read { path: config_path, source }),
        }
    }

    /// Write this config as TOML, creating parent directories
    pub fn write_config(&self, path: &path::Path) -> Result<(), ConfigError> {
        let encoded = toml::to_string_pretty(self)?;
        let write_failed = |source| ConfigError::Write { path: path.to_path_buf(), source };

        match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir).map_err(write_failed)?,
            _ => {}
        }
        fs::write(path, encoded).map_err(write_failed)
    }

    /// Apply `STATUSWATCH_*` environment overrides
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(env::var(WEBHOOK_ENV).ok(), env::var(INTERVAL_ENV).ok())
    }

    fn with_overrides(mut self, webhook_url: Option<String>, interval: Option<String>) -> Self {
        if let Some(url) = webhook_url.filter(|url| !url.trim().is_empty()) {
            self.notify.webhook_url = Some(url);
        }
        if let Some(seconds) = interval.and_then(|raw| raw.trim().parse().ok()) {
            self.monitor.interval_seconds = seconds;
        }
        self
    }

    /// Reject values the monitor cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        const MAX_TIMEOUT: u64 = 300;

        if self.monitor.max_concurrency == 0 {
            return Err(ConfigError::Invalid("monitor.max_concurrency must be at least 1".into()));
        }
        if self.monitor.interval_seconds == 0 {
            return Err(ConfigError::Invalid("monitor.interval_seconds must be at least 1".into()));
        }
        for (name, value) in [
            ("monitor.http_timeout_seconds", self.monitor.http_timeout_seconds),
            ("monitor.ping_timeout_seconds", self.monitor.ping_timeout_seconds),
        ] {
            if !(1..=MAX_TIMEOUT).contains(&value) {
                return Err(ConfigError::Invalid(format!("{name} must be between 1 and {MAX_TIMEOUT}, got {value}")));
            }
        }
        if let Some(url) = &self.notify.webhook_url {
            url::Url::parse(url).map_err(|e| ConfigError::Invalid(format!("notify.webhook_url: {e}")))?;
        }
        Ok(())
    }
}
