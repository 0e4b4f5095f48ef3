use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use super::database::Database;
use super::location::Location;
use crate::config;

const SETTINGS_KEY: &str = "app_settings";
const LOCATION_KEY: &str = "last_location";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    pub api_base_url: String,
    pub app_url: String,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default = "default_render_markdown")]
    pub render_markdown: bool,
}

fn default_render_markdown() -> bool {
    true
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_base_url: config::DEFAULT_API_BASE_URL.to_string(),
            app_url: config::DEFAULT_APP_URL.to_string(),
            request_timeout_secs: None,
            render_markdown: true,
        }
    }
}

impl AppSettings {
    pub fn with_api_url(mut self, api_url: Option<String>) -> Self {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url;
        }
        self
    }

    /// Base location of the chat surface, without any session.
    pub fn app_location(&self) -> Result<Location> {
        Location::parse(&self.app_url)
            .with_context(|| format!("Invalid app_url: {}", self.app_url))
    }
}

/// Changes requested from the command line. Unset fields keep their value.
#[derive(Debug, Default)]
pub struct SettingsUpdate {
    pub api_base_url: Option<String>,
    pub app_url: Option<String>,
    /// `Some(0)` clears the timeout.
    pub request_timeout_secs: Option<u64>,
    pub render_markdown: Option<bool>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self.api_base_url.is_none()
            && self.app_url.is_none()
            && self.request_timeout_secs.is_none()
            && self.render_markdown.is_none()
    }

    pub fn apply(self, mut settings: AppSettings) -> Result<AppSettings> {
        if let Some(url) = self.api_base_url {
            let url = url.trim().trim_end_matches('/').to_string();
            let parsed =
                Url::parse(&url).with_context(|| format!("Invalid api_base_url: {}", url))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                anyhow::bail!("api_base_url must be an http(s) URL: {}", url);
            }
            settings.api_base_url = url;
        }
        if let Some(url) = self.app_url {
            settings.app_url = url.trim().to_string();
            settings.app_location()?;
        }
        if let Some(secs) = self.request_timeout_secs {
            settings.request_timeout_secs = (secs > 0).then_some(secs);
        }
        if let Some(render) = self.render_markdown {
            settings.render_markdown = render;
        }
        Ok(settings)
    }
}

pub struct SettingsService;

impl SettingsService {
    pub async fn load(db: &Database) -> AppSettings {
        match db.get_setting(SETTINGS_KEY).await {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_default(),
            Ok(None) => AppSettings::default(),
            Err(e) => {
                tracing::warn!("Failed to load settings: {}", e);
                AppSettings::default()
            }
        }
    }

    pub async fn save(db: &Database, settings: &AppSettings) -> Result<()> {
        let json = serde_json::to_string(settings)?;
        db.set_setting(SETTINGS_KEY, &json).await
    }

    /// The location the previous run ended on, if it is still parseable.
    pub async fn last_location(db: &Database) -> Option<Location> {
        match db.get_setting(LOCATION_KEY).await {
            Ok(Some(raw)) => Location::parse(&raw).ok(),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Failed to load last location: {}", e);
                None
            }
        }
    }

    pub async fn save_location(db: &Database, location: &Location) -> Result<()> {
        db.set_setting(LOCATION_KEY, location.as_str()).await
    }
}
