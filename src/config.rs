// File: ./src/config.rs
// Settings file plus resolution of the active credential and list id.
use crate::client::DEFAULT_API_URL;
use crate::context::AppContext;
use crate::error::{Result as TimelineResult, TimelineError};
use crate::model::adapter::{DEFAULT_DATE_FORMAT, DateStyle, Normalizer};
use crate::model::status::StatusRules;
use crate::storage::{FileStore, KEY_API_KEY, KEY_LIST_ID, SharedStore, get_non_empty};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use tokio::sync::watch;
use url::{Url, form_urlencoded};

/// Environment variable supplying the default credential.
pub const ENV_API_KEY: &str = "CLICKUP_API_KEY";

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_user_agent() -> String {
    concat!("clientline/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

/// Contents of `config.toml`. Every field is optional in the file.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Settings {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_date_format")]
    pub date_format: String,
    /// Fixed offset for rendered dates; local time when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utc_offset_minutes: Option<i32>,
    /// Replaces the built-in status rule table when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_rules: Option<StatusRules>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            user_agent: default_user_agent(),
            date_format: default_date_format(),
            utc_offset_minutes: None,
            status_rules: None,
        }
    }
}

impl Settings {
    /// A missing file yields defaults; an unreadable or malformed one is an error.
    pub fn load(ctx: &dyn AppContext) -> Result<Self> {
        let path = ctx.get_config_file_path()?;
        if !path.exists() {
            log::debug!("No settings file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        let settings: Settings = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file '{}'", path.display()))?;
        Ok(settings)
    }

    pub fn save(&self, ctx: &dyn AppContext) -> Result<()> {
        let path = ctx.get_config_file_path()?;
        FileStore::with_lock(&path, || {
            let toml_str = toml::to_string_pretty(self)?;
            FileStore::atomic_write(&path, toml_str)?;
            Ok(())
        })
    }

    pub fn date_style(&self) -> DateStyle {
        DateStyle::new(&self.date_format, self.utc_offset_minutes)
    }

    pub fn rules(&self) -> StatusRules {
        self.status_rules.clone().unwrap_or_default()
    }

    pub fn normalizer(&self) -> Normalizer {
        Normalizer::new(self.rules(), self.date_style())
    }
}

/// The resolved pair passed explicitly into every provider call.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub credential: String,
    pub list_id: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("credential", &redact(&self.credential))
            .field("list_id", &self.list_id)
            .finish()
    }
}

/// Never shows more than the last four characters.
pub fn redact(secret: &str) -> String {
    let count = secret.chars().count();
    if count == 0 {
        return "<unset>".to_string();
    }
    if count <= 8 {
        return "****".to_string();
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("****{}", tail)
}

impl Config {
    pub fn is_complete(&self) -> bool {
        !self.credential.trim().is_empty() && !self.list_id.trim().is_empty()
    }

    /// Fails with a configuration error naming the first missing value.
    pub fn require(&self) -> TimelineResult<()> {
        if self.credential.trim().is_empty() {
            return Err(TimelineError::Config("API credential is not set".to_string()));
        }
        if self.list_id.trim().is_empty() {
            return Err(TimelineError::Config("list id is not set".to_string()));
        }
        Ok(())
    }
}

/// Extracts the `id` query parameter from a full timeline URL or a bare
/// query string. Keys and values are form-decoded; empty values count as absent.
pub fn list_id_from_url(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let pairs: Vec<(String, String)> = match Url::parse(raw) {
        Ok(url) => url.query_pairs().into_owned().collect(),
        Err(_) => {
            // Relative URL or bare query string.
            let query = match raw.split_once('?') {
                Some((_, query)) => query,
                None if raw.contains('=') => raw,
                None => return None,
            };
            let query = query.split('#').next().unwrap_or_default();
            form_urlencoded::parse(query.as_bytes()).into_owned().collect()
        }
    };
    pairs
        .into_iter()
        .find(|(key, _)| key == "id")
        .map(|(_, value)| value.trim().to_string())
        .filter(|id| !id.is_empty())
}

/// Owns the active [`Config`] and its persistence.
///
/// The list id comes from the URL override when one is given (which is also
/// persisted), otherwise from the store. The credential comes from the store,
/// then the environment default, then empty.
#[derive(Debug)]
pub struct ConfigResolver {
    store: SharedStore,
    env_credential: Option<String>,
    tx: watch::Sender<Config>,
}

impl ConfigResolver {
    pub fn load(
        store: SharedStore,
        env_credential: Option<String>,
        url_list_id: Option<&str>,
    ) -> TimelineResult<Self> {
        let env_credential = env_credential.filter(|v| !v.trim().is_empty());

        let list_id = match url_list_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => {
                store.set(KEY_LIST_ID, id)?;
                log::info!("List id {} taken from URL", id);
                id.to_string()
            }
            None => get_non_empty(store.as_ref(), KEY_LIST_ID)?.unwrap_or_default(),
        };

        let credential = match get_non_empty(store.as_ref(), KEY_API_KEY)? {
            Some(stored) => stored,
            None => env_credential.clone().unwrap_or_default(),
        };

        let config = Config {
            credential,
            list_id,
        };
        log::debug!("Resolved {:?}", config);
        Ok(Self {
            store,
            env_credential,
            tx: watch::Sender::new(config),
        })
    }

    /// Same as [`load`](Self::load) with the default credential read from `CLICKUP_API_KEY`.
    pub fn from_env(store: SharedStore, url_list_id: Option<&str>) -> TimelineResult<Self> {
        Self::load(store, std::env::var(ENV_API_KEY).ok(), url_list_id)
    }

    pub fn current(&self) -> Config {
        self.tx.borrow().clone()
    }

    /// Receiver notified whenever the credential or list id changes.
    pub fn on_change(&self) -> watch::Receiver<Config> {
        self.tx.subscribe()
    }

    pub fn env_credential(&self) -> Option<&str> {
        self.env_credential.as_deref()
    }

    /// Persists a new credential. Clearing it falls back to the environment default.
    pub fn set_credential(&self, credential: &str) -> TimelineResult<()> {
        let credential = credential.trim();
        self.store.set(KEY_API_KEY, credential)?;
        let effective = if credential.is_empty() {
            self.env_credential.clone().unwrap_or_default()
        } else {
            credential.to_string()
        };
        self.tx.send_if_modified(|config| {
            if config.credential == effective {
                return false;
            }
            config.credential = effective;
            true
        });
        Ok(())
    }

    pub fn set_list_id(&self, list_id: &str) -> TimelineResult<()> {
        let list_id = list_id.trim().to_string();
        self.store.set(KEY_LIST_ID, &list_id)?;
        self.tx.send_if_modified(|config| {
            if config.list_id == list_id {
                return false;
            }
            config.list_id = list_id;
            true
        });
        Ok(())
    }

    /// Applies the `id` parameter of `url`, if any. Returns whether one was found.
    pub fn apply_url_override(&self, url: &str) -> TimelineResult<bool> {
        match list_id_from_url(url) {
            Some(id) => {
                self.set_list_id(&id)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
