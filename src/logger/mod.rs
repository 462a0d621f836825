//! Named, levelled logging for the service worker.
//!
//! Natively the default output is a timestamped line on stdout or stderr. In
//! the browser it goes to the devtools console, where JSON arguments stay
//! inspectable objects. A sink replaces the default output for embedders that
//! collect worker logs themselves.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type LogSink = Arc<dyn Fn(&LogRecord) + Send + Sync + 'static>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Silent,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Silent => "silent",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => LogLevel::Debug,
            1 => LogLevel::Info,
            2 => LogLevel::Warn,
            3 => LogLevel::Error,
            _ => LogLevel::Silent,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum LogArgument {
    Text(String),
    Value(Value),
}

impl LogArgument {
    fn render(&self) -> String {
        match self {
            LogArgument::Text(text) => text.clone(),
            LogArgument::Value(value) => value.to_string(),
        }
    }

    #[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
    fn to_js(&self) -> wasm_bindgen::JsValue {
        use wasm_bindgen::JsValue;
        match self {
            LogArgument::Text(text) => JsValue::from_str(text),
            LogArgument::Value(value) => value
                .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
                .unwrap_or_else(|_| JsValue::from_str(&value.to_string())),
        }
    }
}

pub trait IntoLogArgument {
    fn into_log_argument(self) -> LogArgument;
}

impl IntoLogArgument for LogArgument {
    fn into_log_argument(self) -> LogArgument {
        self
    }
}

impl IntoLogArgument for String {
    fn into_log_argument(self) -> LogArgument {
        LogArgument::Text(self)
    }
}

impl IntoLogArgument for &String {
    fn into_log_argument(self) -> LogArgument {
        LogArgument::Text(self.clone())
    }
}

impl IntoLogArgument for &str {
    fn into_log_argument(self) -> LogArgument {
        LogArgument::Text(self.to_string())
    }
}

impl IntoLogArgument for usize {
    fn into_log_argument(self) -> LogArgument {
        LogArgument::Text(self.to_string())
    }
}

impl IntoLogArgument for Value {
    fn into_log_argument(self) -> LogArgument {
        LogArgument::Value(self)
    }
}

pub fn log_arg<T: IntoLogArgument>(value: T) -> LogArgument {
    value.into_log_argument()
}

/// One emitted log call, as handed to a sink.
#[derive(Clone, Debug, PartialEq)]
pub struct LogRecord {
    pub logger: String,
    pub level: LogLevel,
    pub args: Vec<LogArgument>,
}

impl LogRecord {
    /// Arguments joined by spaces, the way the console prints them.
    pub fn message(&self) -> String {
        self.args
            .iter()
            .map(LogArgument::render)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub struct Logger {
    name: String,
    level: AtomicU8,
    sink: RwLock<Option<LogSink>>,
}

impl Logger {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: AtomicU8::new(LogLevel::default() as u8),
            sink: RwLock::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn log_level(&self) -> LogLevel {
        LogLevel::from_u8(self.level.load(Ordering::SeqCst))
    }

    /// Calls below `level` are dropped. `Silent` drops everything.
    pub fn set_log_level(&self, level: LogLevel) {
        self.level.store(level as u8, Ordering::SeqCst);
    }

    /// Routes records to `sink` instead of the default output; `None` restores it.
    pub fn set_sink(&self, sink: Option<LogSink>) {
        if let Ok(mut slot) = self.sink.write() {
            *slot = sink;
        }
    }

    pub fn debug<T: IntoLogArgument>(&self, message: T) {
        self.log_with(LogLevel::Debug, [log_arg(message)]);
    }

    pub fn info<T: IntoLogArgument>(&self, message: T) {
        self.log_with(LogLevel::Info, [log_arg(message)]);
    }

    pub fn warn<T: IntoLogArgument>(&self, message: T) {
        self.log_with(LogLevel::Warn, [log_arg(message)]);
    }

    pub fn error<T: IntoLogArgument>(&self, message: T) {
        self.log_with(LogLevel::Error, [log_arg(message)]);
    }

    pub fn log_with<I>(&self, level: LogLevel, args: I)
    where
        I: IntoIterator<Item = LogArgument>,
    {
        if level == LogLevel::Silent || level < self.log_level() {
            return;
        }
        let record = LogRecord {
            logger: self.name.clone(),
            level,
            args: args.into_iter().collect(),
        };
        let sink = self.sink.read().ok().and_then(|slot| slot.clone());
        match sink {
            Some(sink) => sink(&record),
            None => default_output(&record),
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("level", &self.log_level())
            .finish()
    }
}

#[cfg(not(all(feature = "wasm-web", target_arch = "wasm32")))]
fn format_line(record: &LogRecord, timestamp: &str) -> String {
    format!("[{timestamp}]  {}: {}", record.logger, record.message())
}

#[cfg(not(all(feature = "wasm-web", target_arch = "wasm32")))]
fn default_output(record: &LogRecord) {
    use chrono::{SecondsFormat, Utc};

    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let line = format_line(record, &timestamp);
    match record.level {
        LogLevel::Warn | LogLevel::Error => eprintln!("{line}"),
        _ => println!("{line}"),
    }
}

#[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
fn default_output(record: &LogRecord) {
    use wasm_bindgen::JsValue;

    let args = js_sys::Array::new();
    args.push(&JsValue::from_str(&format!("{}:", record.logger)));
    for arg in &record.args {
        args.push(&arg.to_js());
    }
    match record.level {
        LogLevel::Debug => web_sys::console::debug(&args),
        LogLevel::Info => web_sys::console::log(&args),
        LogLevel::Warn => web_sys::console::warn(&args),
        _ => web_sys::console::error(&args),
    }
}
