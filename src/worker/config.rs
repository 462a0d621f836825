//! Process-wide worker configuration.
//!
//! A `WorkerConfig` is built once per deployed generation and handed to the
//! [`ServiceWorker`](crate::worker::ServiceWorker). When a newer generation is
//! installed the host drops the old worker together with its configuration.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::logger::LogLevel;
use crate::push::ClickMatch;
use crate::worker::constants::{
    DEFAULT_API_HOSTS, DEFAULT_CACHE_NAME, DEFAULT_FONT_HOSTS, DEFAULT_NOTIFICATION_BADGE,
    DEFAULT_NOTIFICATION_BODY, DEFAULT_NOTIFICATION_ICON, DEFAULT_NOTIFICATION_TITLE,
    DEFAULT_SCOPE, DEFAULT_STATIC_ASSETS, DEFAULT_VIBRATE_PATTERN, EMPTY_PUSH_BODY, OPEN_ACTION,
    OPEN_ACTION_TITLE, PAYMENT_ALERT_TAG,
};
use crate::worker::error::{invalid_config, WorkerResult};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkerConfig {
    pub cache_name: String,
    pub scope: Url,
    pub static_assets: Vec<String>,
    pub api_hosts: Vec<String>,
    pub font_hosts: Vec<String>,
    /// Serve `/` and `index.html` network-first instead of stale-while-revalidate.
    pub network_first_shell: bool,
    pub notification: NotificationDefaults,
    pub click_match: ClickMatch,
    /// Threshold for the worker logger, applied when the worker is built.
    pub log_level: LogLevel,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            cache_name: DEFAULT_CACHE_NAME.to_string(),
            scope: default_scope(),
            static_assets: DEFAULT_STATIC_ASSETS.iter().map(|s| s.to_string()).collect(),
            api_hosts: DEFAULT_API_HOSTS.iter().map(|s| s.to_string()).collect(),
            font_hosts: DEFAULT_FONT_HOSTS.iter().map(|s| s.to_string()).collect(),
            network_first_shell: true,
            notification: NotificationDefaults::default(),
            click_match: ClickMatch::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl WorkerConfig {
    /// Parses a JSON configuration; absent fields keep their defaults.
    pub fn from_json(raw: &str) -> WorkerResult<Self> {
        let config: WorkerConfig = serde_json::from_str(raw)
            .map_err(|err| invalid_config(format!("Failed to parse worker config: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_scope(mut self, scope: &str) -> WorkerResult<Self> {
        self.scope = Url::parse(scope)
            .map_err(|err| invalid_config(format!("Invalid scope '{scope}': {err}")))?;
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> WorkerResult<()> {
        if self.cache_name.trim().is_empty() {
            return Err(invalid_config("cacheName must not be empty"));
        }
        if self.scope.cannot_be_a_base() || self.scope.host_str().is_none() {
            return Err(invalid_config(format!(
                "scope '{}' must be an absolute http(s) URL",
                self.scope
            )));
        }
        Ok(())
    }

    /// Origin of the controlled scope, the fallback click-target.
    pub fn origin(&self) -> String {
        self.scope.origin().ascii_serialization()
    }

    pub fn resolve(&self, path: &str) -> WorkerResult<Url> {
        self.scope
            .join(path)
            .map_err(|err| invalid_config(format!("Cannot resolve '{path}' against scope: {err}")))
    }

    pub fn static_asset_urls(&self) -> WorkerResult<Vec<Url>> {
        self.static_assets
            .iter()
            .map(|asset| self.resolve(asset))
            .collect()
    }

    pub fn is_api_host(&self, host: &str) -> bool {
        host_listed(&self.api_hosts, host)
    }

    pub fn is_font_host(&self, host: &str) -> bool {
        host_listed(&self.font_hosts, host)
    }
}

fn host_listed(hosts: &[String], host: &str) -> bool {
    hosts.iter().any(|candidate| candidate.eq_ignore_ascii_case(host))
}

fn default_scope() -> Url {
    Url::parse(DEFAULT_SCOPE).expect("DEFAULT_SCOPE is a valid absolute URL")
}

/// Fallback values and fixed rendering options for push notifications.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationDefaults {
    pub title: String,
    pub body: String,
    /// Body used when the push carried no data at all.
    pub empty_body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub tag: String,
    pub renotify: bool,
    pub actions: Vec<NotificationAction>,
}

impl Default for NotificationDefaults {
    fn default() -> Self {
        Self {
            title: DEFAULT_NOTIFICATION_TITLE.to_string(),
            body: DEFAULT_NOTIFICATION_BODY.to_string(),
            empty_body: EMPTY_PUSH_BODY.to_string(),
            icon: DEFAULT_NOTIFICATION_ICON.to_string(),
            badge: DEFAULT_NOTIFICATION_BADGE.to_string(),
            vibrate: DEFAULT_VIBRATE_PATTERN.to_vec(),
            tag: PAYMENT_ALERT_TAG.to_string(),
            renotify: true,
            actions: vec![NotificationAction {
                action: OPEN_ACTION.to_string(),
                title: OPEN_ACTION_TITLE.to_string(),
            }],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}
