use std::sync::Arc;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::logger::{log_arg, LogLevel};
use crate::push::clients::Clients;
use crate::push::payload::NotificationDescriptor;
use crate::worker::config::{NotificationAction, NotificationDefaults};
use crate::worker::error::WorkerResult;
use crate::worker::LOGGER;

/// How an open window's URL is compared with a notification's click-target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClickMatch {
    Exact,
    /// The window URL starts with the click-target.
    #[default]
    Prefix,
}

impl ClickMatch {
    pub fn matches(self, window_url: &str, target: &str) -> bool {
        match self {
            ClickMatch::Exact => window_url == target,
            ClickMatch::Prefix => window_url.starts_with(target),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    pub url: String,
}

/// Options record passed to `showNotification`, in the host's field names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationOptions {
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub data: NotificationData,
    /// Collapse key: a new alert replaces an undismissed one with the same tag.
    pub tag: String,
    /// Alert again even when replacing.
    pub renotify: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<NotificationAction>,
}

impl NotificationOptions {
    pub fn from_descriptor(descriptor: &NotificationDescriptor, defaults: &NotificationDefaults) -> Self {
        Self {
            body: descriptor.body.clone(),
            icon: descriptor.icon.clone(),
            badge: defaults.badge.clone(),
            vibrate: defaults.vibrate.clone(),
            data: NotificationData {
                url: descriptor.target_url.clone(),
            },
            tag: defaults.tag.clone(),
            renotify: defaults.renotify,
            actions: defaults.actions.clone(),
        }
    }
}

/// The host's notification surface.
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
pub trait NotificationCenter: Send + Sync {
    async fn show_notification(&self, title: &str, options: &NotificationOptions) -> WorkerResult<()>;

    /// Dismisses displayed notifications carrying `tag`.
    async fn close(&self, tag: &str) -> WorkerResult<()>;
}

/// A user activation of a displayed notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotificationClick {
    pub tag: String,
    /// The `data.url` attached when the notification was shown.
    pub target_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    Focused(String),
    Opened(String),
}

pub struct ClickHandler {
    center: Arc<dyn NotificationCenter>,
    clients: Arc<dyn Clients>,
    click_match: ClickMatch,
    scope: Url,
}

impl ClickHandler {
    pub fn new(
        center: Arc<dyn NotificationCenter>,
        clients: Arc<dyn Clients>,
        click_match: ClickMatch,
        scope: Url,
    ) -> Self {
        Self {
            center,
            clients,
            click_match,
            scope,
        }
    }

    /// Absolute click-target. Relative targets resolve against the scope, so
    /// they compare against the absolute URLs hosts report for windows; a
    /// missing target is the scope origin.
    pub fn target(&self, click: &NotificationClick) -> String {
        match click.target_url.as_deref().filter(|url| !url.is_empty()) {
            Some(target) => self
                .scope
                .join(target)
                .map(String::from)
                .unwrap_or_else(|_| target.to_string()),
            None => self.scope.origin().ascii_serialization(),
        }
    }

    /// Closes the notification, then focuses a matching window or opens one.
    ///
    /// Windows not controlled by this worker are considered too, so a tab
    /// opened before the current generation activated is still reused.
    pub async fn handle(&self, click: &NotificationClick) -> WorkerResult<ClickOutcome> {
        if let Err(err) = self.center.close(&click.tag).await {
            log::debug!("closing notification '{}' failed: {err}", click.tag);
        }

        let target = self.target(click);

        let windows = self.clients.match_windows(true).await?;
        if let Some(window) = windows
            .iter()
            .find(|window| self.click_match.matches(&window.url, &target))
        {
            self.clients.focus(&window.id).await?;
            LOGGER.log_with(
                LogLevel::Debug,
                [log_arg("Focused existing window:"), log_arg(&window.url)],
            );
            return Ok(ClickOutcome::Focused(window.id.clone()));
        }

        self.clients.open_window(&target).await?;
        LOGGER.log_with(LogLevel::Debug, [log_arg("Opened window:"), log_arg(&target)]);
        Ok(ClickOutcome::Opened(target))
    }
}
