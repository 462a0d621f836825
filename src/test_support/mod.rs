//! Test doubles for the host seams, shared by unit tests across the crate.

pub mod http;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::offline::{MemoryCacheStorage, Network};
use crate::push::{Clients, NotificationCenter, NotificationOptions, WindowClient};
use crate::worker::error::{network_error, notification_error, WorkerResult};
use crate::worker::{Request, Response, ServiceWorker, WorkerConfig, WorkerHost};

pub use http::asset_origin;

/// Network answering from a per-URL script. Unscripted URLs fail.
#[derive(Default)]
pub struct ScriptedNetwork {
    script: Mutex<HashMap<String, Option<Response>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, response: Response) {
        self.script
            .lock()
            .unwrap()
            .insert(url.to_string(), Some(response));
    }

    pub fn fail(&self, url: &str) {
        self.script.lock().unwrap().insert(url.to_string(), None);
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|called| called.as_str() == url)
            .count()
    }
}

#[async_trait::async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &Request) -> WorkerResult<Response> {
        let url = request.url.as_str().to_string();
        self.calls.lock().unwrap().push(url.clone());
        match self.script.lock().unwrap().get(&url) {
            Some(Some(response)) => Ok(response.clone()),
            _ => Err(network_error(format!("offline: {url}"))),
        }
    }
}

#[derive(Default)]
pub struct RecordingNotifications {
    shown: Mutex<Vec<(String, NotificationOptions)>>,
    closed: Mutex<Vec<String>>,
    fail_next: Mutex<bool>,
}

impl RecordingNotifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown(&self) -> Vec<(String, NotificationOptions)> {
        self.shown.lock().unwrap().clone()
    }

    pub fn closed(&self) -> Vec<String> {
        self.closed.lock().unwrap().clone()
    }

    pub fn fail_next_show(&self) {
        *self.fail_next.lock().unwrap() = true;
    }
}

#[async_trait::async_trait]
impl NotificationCenter for RecordingNotifications {
    async fn show_notification(&self, title: &str, options: &NotificationOptions) -> WorkerResult<()> {
        let fail = std::mem::take(&mut *self.fail_next.lock().unwrap());
        if fail {
            return Err(notification_error("permission denied"));
        }
        self.shown
            .lock()
            .unwrap()
            .push((title.to_string(), options.clone()));
        Ok(())
    }

    async fn close(&self, tag: &str) -> WorkerResult<()> {
        self.closed.lock().unwrap().push(tag.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingClients {
    /// Open windows with their controlled flag.
    windows: Mutex<Vec<(WindowClient, bool)>>,
    focused: Mutex<Vec<String>>,
    opened: Mutex<Vec<String>>,
    claims: Mutex<usize>,
    skip_waiting: Mutex<usize>,
}

impl RecordingClients {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(id, url, controlled)` triples.
    pub fn with_windows(windows: &[(&str, &str, bool)]) -> Self {
        let clients = Self::default();
        *clients.windows.lock().unwrap() = windows
            .iter()
            .map(|(id, url, controlled)| {
                let window = WindowClient {
                    id: id.to_string(),
                    url: url.to_string(),
                };
                (window, *controlled)
            })
            .collect();
        clients
    }

    pub fn focused(&self) -> Vec<String> {
        self.focused.lock().unwrap().clone()
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }

    pub fn claim_calls(&self) -> usize {
        *self.claims.lock().unwrap()
    }

    pub fn skip_waiting_calls(&self) -> usize {
        *self.skip_waiting.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl Clients for RecordingClients {
    async fn match_windows(&self, include_uncontrolled: bool) -> WorkerResult<Vec<WindowClient>> {
        Ok(self
            .windows
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, controlled)| include_uncontrolled || *controlled)
            .map(|(window, _)| window.clone())
            .collect())
    }

    async fn focus(&self, client_id: &str) -> WorkerResult<()> {
        self.focused.lock().unwrap().push(client_id.to_string());
        Ok(())
    }

    async fn open_window(&self, url: &str) -> WorkerResult<()> {
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn claim(&self) -> WorkerResult<()> {
        let mut windows = self.windows.lock().unwrap();
        windows.iter_mut().for_each(|(_, controlled)| *controlled = true);
        *self.claims.lock().unwrap() += 1;
        Ok(())
    }

    async fn skip_waiting(&self) -> WorkerResult<()> {
        *self.skip_waiting.lock().unwrap() += 1;
        Ok(())
    }
}

pub type TestWorker = (
    ServiceWorker,
    Arc<MemoryCacheStorage>,
    Arc<ScriptedNetwork>,
    Arc<RecordingNotifications>,
    Arc<RecordingClients>,
);

/// Worker wired to fresh in-memory fakes.
pub fn test_worker(config: WorkerConfig) -> TestWorker {
    let caches = Arc::new(MemoryCacheStorage::new());
    let network = Arc::new(ScriptedNetwork::new());
    let notifications = Arc::new(RecordingNotifications::new());
    let clients = Arc::new(RecordingClients::new());
    let worker = ServiceWorker::new(
        config,
        WorkerHost {
            caches: caches.clone(),
            network: network.clone(),
            notifications: notifications.clone(),
            clients: clients.clone(),
        },
    )
    .expect("valid test config");
    (worker, caches, network, notifications, clients)
}
