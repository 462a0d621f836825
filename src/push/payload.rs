//! Push payload recognition.
//!
//! A push may carry nothing, a flat JSON record, a JSON envelope with a
//! nested `message` record (the ntfy.sh shape), plain text, or bytes that are
//! not even text. [`PushPayload::parse`] decides which, and
//! [`PushPayload::describe`] turns any of them into a complete
//! [`NotificationDescriptor`] by falling back field by field:
//! nested message, then top level, then the configured default.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::worker::config::NotificationDefaults;

#[derive(Clone, Debug, PartialEq)]
pub enum PushPayload {
    Empty,
    Flat(Map<String, Value>),
    Nested {
        message: Map<String, Value>,
        envelope: Map<String, Value>,
    },
    Text(String),
    Unreadable,
}

impl PushPayload {
    pub fn parse(data: Option<&[u8]>) -> Self {
        let bytes = match data {
            Some(bytes) if !bytes.is_empty() => bytes,
            _ => return PushPayload::Empty,
        };

        match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::Object(mut envelope)) => match envelope.remove("message") {
                Some(Value::Object(message)) => PushPayload::Nested { message, envelope },
                Some(other) => {
                    envelope.insert("message".to_string(), other);
                    PushPayload::Flat(envelope)
                }
                None => PushPayload::Flat(envelope),
            },
            // Scalars and arrays carry no recognizable fields.
            Ok(Value::Null) => PushPayload::Text(String::from_utf8_lossy(bytes).into_owned()),
            Ok(_) => PushPayload::Flat(Map::new()),
            Err(_) => match std::str::from_utf8(bytes) {
                Ok(text) => PushPayload::Text(text.to_string()),
                Err(_) => PushPayload::Unreadable,
            },
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PushPayload::Empty => "empty",
            PushPayload::Flat(_) => "flat",
            PushPayload::Nested { .. } => "nested",
            PushPayload::Text(_) => "text",
            PushPayload::Unreadable => "unreadable",
        }
    }

    /// Resolves every notification field. `origin` is the click-target used
    /// when the payload names none.
    pub fn describe(&self, defaults: &NotificationDefaults, origin: &str) -> NotificationDescriptor {
        let mut descriptor = NotificationDescriptor {
            title: defaults.title.clone(),
            body: defaults.body.clone(),
            icon: defaults.icon.clone(),
            target_url: origin.to_string(),
        };

        let sources: Vec<&Map<String, Value>> = match self {
            PushPayload::Empty => {
                descriptor.body = defaults.empty_body.clone();
                return descriptor;
            }
            PushPayload::Text(text) => {
                descriptor.body = text.clone();
                return descriptor;
            }
            PushPayload::Unreadable => return descriptor,
            PushPayload::Flat(record) => vec![record],
            PushPayload::Nested { message, envelope } => vec![message, envelope],
        };

        if let Some(title) = lookup(&sources, &["title"]) {
            descriptor.title = title.to_string();
        }
        if let Some(body) = lookup(&sources, &["message", "body"]) {
            descriptor.body = body.to_string();
        }
        if let Some(icon) = lookup(&sources, &["icon"]) {
            descriptor.icon = icon.to_string();
        }
        if let Some(target) =
            lookup(&sources, &["click"]).or_else(|| lookup(&sources, &["topic_url"]))
        {
            descriptor.target_url = target.to_string();
        }
        descriptor
    }
}

// Sources are searched in order; within a source, keys in order. Only
// non-empty strings count.
fn lookup<'a>(sources: &[&'a Map<String, Value>], keys: &[&str]) -> Option<&'a str> {
    sources.iter().find_map(|source| {
        keys.iter().find_map(|key| {
            source
                .get(*key)
                .and_then(Value::as_str)
                .filter(|value| !value.is_empty())
        })
    })
}

/// Fixed-shape description of the notification to display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDescriptor {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub target_url: String,
}
