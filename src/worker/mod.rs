//! The service worker: configuration, lifecycle events and dispatch.
//!
//! A [`ServiceWorker`] is created once per deployed generation from a
//! [`WorkerConfig`] and a [`WorkerHost`] bundling the host capabilities
//! (cache storage, network, notifications, clients). Hosts feed it
//! [`LifecycleEvent`]s and await the returned [`Dispatched`] value, which
//! carries the event outcome plus any work the worker must be kept alive
//! for.
//!
//! # Examples
//!
//! ```
//! use cms_mobile_sw::worker::{Request, Route, WorkerConfig};
//!
//! let config = WorkerConfig::default();
//! let request = Request::parse("GET", "https://fonts.gstatic.com/s/inter.woff2").unwrap();
//! assert_eq!(Route::classify(&config, &request), Route::CacheFirst);
//! ```

mod api;
pub mod config;
pub mod constants;
pub mod error;
pub mod lifecycle;
pub mod pending;
pub mod types;

use std::sync::LazyLock;

use crate::logger::Logger;

pub use api::{
    Dispatched, EventKind, EventOutcome, LifecycleEvent, PushMessage, ServiceWorker, WorkerHost,
};
pub use config::{NotificationAction, NotificationDefaults, WorkerConfig};
pub use error::{WorkerError, WorkerErrorCode, WorkerResult};
pub use pending::PendingTask;
pub use types::{CacheKey, Request, Response};

pub use crate::offline::Route;

pub static LOGGER: LazyLock<Logger> =
    LazyLock::new(|| Logger::new(constants::WORKER_LOGGER_NAME));
