//! Configuration for order-desk.
//!
//! Read from `order-desk.toml`, then overridden by the environment, then by
//! CLI flags in `main`.
//!
//! ```toml
//! [api]
//! base_url = "http://localhost:8888"
//! timeout_secs = 30
//!
//! [auth]
//! token = "eyJhbGciOi..."
//! username = "alice"
//! admin = false
//!
//! [page]
//! buffer_size = 32
//! default_sort = "newest"
//! default_status = "ALL"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::actors::PageSettings;
use crate::auth::Credentials;
use crate::error::ConfigError;
use crate::order_list::{SortBy, StatusFilter};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSection {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthSection {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub admin: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSection {
    /// Capacity of the page service's message queue.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    #[serde(default = "default_sort")]
    pub default_sort: String,
    #[serde(default = "default_status")]
    pub default_status: String,
}

impl Default for PageSection {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
            default_sort: default_sort(),
            default_status: default_status(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8888".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_buffer_size() -> usize {
    32
}

fn default_sort() -> String {
    "newest".to_string()
}

fn default_status() -> String {
    "ALL".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeskConfig {
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub auth: AuthSection,
    #[serde(default)]
    pub page: PageSection,
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}

impl DeskConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Returns the default configuration if the file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Applies `ORDER_DESK_*` overrides from the process environment.
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(url) = lookup("ORDER_DESK_API_URL") {
            self.api.base_url = url;
        }
        if let Some(token) = lookup("ORDER_DESK_TOKEN") {
            self.auth.token = Some(token);
        }
        if let Some(username) = lookup("ORDER_DESK_USERNAME") {
            self.auth.username = Some(username);
        }
        if let Some(admin) = lookup("ORDER_DESK_ADMIN") {
            self.auth.admin = parse_flag("ORDER_DESK_ADMIN", &admin)?;
        }
        Ok(self)
    }

    pub fn credentials(&self) -> Option<Credentials> {
        let token = self.auth.token.as_deref().filter(|t| !t.trim().is_empty())?;
        let username = self.auth.username.clone().unwrap_or_else(|| "me".to_string());
        Some(Credentials::new(token, username, self.auth.admin))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// An unknown sort key falls back to server order; an unknown status is
    /// a configuration error.
    pub fn page_settings(&self) -> Result<PageSettings, ConfigError> {
        let status_filter = self
            .page
            .default_status
            .parse::<StatusFilter>()
            .map_err(|_| ConfigError::InvalidValue {
                key: "page.default_status",
                value: self.page.default_status.clone(),
            })?;
        Ok(PageSettings {
            status_filter,
            sort_by: SortBy::from_key(&self.page.default_sort),
        })
    }
}
