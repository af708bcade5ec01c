use std::{fs, io, path::Path, time::Duration};

use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;

pub const SETTINGS_FILE: &str = "classifier.toml";
const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_UPLOAD_STATUS_WINDOW: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub base_url: Url,
    /// How long a finished upload stays visible before the status clears.
    pub upload_status_window: Duration,
}

impl ClientSettings {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            upload_status_window: DEFAULT_UPLOAD_STATUS_WINDOW,
        }
    }

    pub fn from_base_url(raw: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(parse_base_url(raw)?))
    }

    pub fn with_base_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.base_url = parse_base_url(raw)?;
        Ok(self)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_url: Option<String>,
    upload_status_window_ms: Option<u64>,
}

/// Defaults, then `classifier.toml` in the working directory, then the
/// environment (`API_URL`, `APP__API_URL`, `APP__UPLOAD_STATUS_WINDOW_MS`).
pub fn load_settings() -> Result<ClientSettings, ConfigError> {
    let file = match fs::read_to_string(SETTINGS_FILE) {
        Ok(raw) => Some(raw),
        Err(err) if err.kind() == io::ErrorKind::NotFound => None,
        Err(source) => {
            return Err(ConfigError::ReadFile {
                path: SETTINGS_FILE.to_string(),
                source,
            })
        }
    };
    resolve_settings(
        Path::new(SETTINGS_FILE),
        file.as_deref(),
        |key| std::env::var(key).ok(),
    )
}

fn resolve_settings(
    path: &Path,
    file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ClientSettings, ConfigError> {
    let mut settings = ClientSettings::from_base_url(DEFAULT_API_URL)?;

    if let Some(raw) = file {
        let file_cfg: FileSettings =
            toml::from_str(raw).map_err(|source| ConfigError::ParseFile {
                path: path.display().to_string(),
                source,
            })?;
        if let Some(v) = file_cfg.api_url {
            settings.base_url = parse_base_url(&v)?;
        }
        if let Some(v) = file_cfg.upload_status_window_ms {
            settings.upload_status_window = Duration::from_millis(v);
        }
    }

    if let Some(v) = env("API_URL") {
        settings.base_url = parse_base_url(&v)?;
    }
    if let Some(v) = env("APP__API_URL") {
        settings.base_url = parse_base_url(&v)?;
    }

    if let Some(v) = env("APP__UPLOAD_STATUS_WINDOW_MS") {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.upload_status_window = Duration::from_millis(parsed);
        }
    }

    Ok(settings)
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed).map_err(|source| ConfigError::InvalidBaseUrl {
        value: trimmed.to_string(),
        source,
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::UnsupportedScheme(trimmed.to_string()));
    }
    Ok(url)
}
