use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;

use crate::logger::{log_arg, LogLevel};
use crate::offline::{CacheRouter, CacheStorage, FetchOutcome, Network, Route};
use crate::push::{
    ClickHandler, ClickOutcome, Clients, NotificationCenter, NotificationClick,
    NotificationDescriptor, NotificationOptions, PushPayload,
};
use crate::worker::config::WorkerConfig;
use crate::worker::error::WorkerResult;
use crate::worker::lifecycle;
use crate::worker::pending::{detach_all, settle_all, PendingTask};
use crate::worker::types::Request;
use crate::worker::LOGGER;

/// Host capabilities the worker runs against.
#[derive(Clone)]
pub struct WorkerHost {
    pub caches: Arc<dyn CacheStorage>,
    pub network: Arc<dyn Network>,
    pub notifications: Arc<dyn NotificationCenter>,
    pub clients: Arc<dyn Clients>,
}

/// Raw push delivery; `data` is `None` when the push carried no payload.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PushMessage {
    pub data: Option<Bytes>,
}

impl PushMessage {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: Some(data.into()),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Install,
    Activate,
    Fetch,
    Push,
    NotificationClick,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Install => "install",
            EventKind::Activate => "activate",
            EventKind::Fetch => "fetch",
            EventKind::Push => "push",
            EventKind::NotificationClick => "notificationclick",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LifecycleEvent {
    Install,
    Activate,
    Fetch(Request),
    Push(PushMessage),
    NotificationClick(NotificationClick),
}

impl LifecycleEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            LifecycleEvent::Install => EventKind::Install,
            LifecycleEvent::Activate => EventKind::Activate,
            LifecycleEvent::Fetch(_) => EventKind::Fetch,
            LifecycleEvent::Push(_) => EventKind::Push,
            LifecycleEvent::NotificationClick(_) => EventKind::NotificationClick,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventOutcome {
    Installed { precached: usize },
    Activated { deleted: Vec<String> },
    Fetch(FetchOutcome),
    NotificationShown(NotificationDescriptor),
    NotificationClicked(ClickOutcome),
}

/// Result of a dispatched event plus the work the host must wait for.
pub struct Dispatched {
    pub outcome: EventOutcome,
    pending: Vec<PendingTask>,
}

impl Dispatched {
    fn completed(outcome: EventOutcome) -> Self {
        Self {
            outcome,
            pending: Vec::new(),
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Waits for every pending task, then returns the outcome.
    pub async fn settle(self) -> EventOutcome {
        settle_all(self.pending).await;
        self.outcome
    }

    /// Leaves pending tasks running in the background.
    pub fn detach(self) -> EventOutcome {
        detach_all(self.pending);
        self.outcome
    }

    pub fn into_parts(self) -> (EventOutcome, Vec<PendingTask>) {
        (self.outcome, self.pending)
    }
}

impl fmt::Debug for Dispatched {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatched")
            .field("outcome", &self.outcome)
            .field("pending", &self.pending.len())
            .finish()
    }
}

/// One deployed worker generation.
///
/// Each event is handled independently; the only state shared between
/// events is the host's cache storage.
#[derive(Clone)]
pub struct ServiceWorker {
    config: Arc<WorkerConfig>,
    host: WorkerHost,
    router: CacheRouter,
    clicks: Arc<ClickHandler>,
}

impl ServiceWorker {
    pub fn new(config: WorkerConfig, host: WorkerHost) -> WorkerResult<Self> {
        config.validate()?;
        LOGGER.set_log_level(config.log_level);
        let config = Arc::new(config);
        let router = CacheRouter::new(
            Arc::clone(&config),
            Arc::clone(&host.caches),
            Arc::clone(&host.network),
        );
        let clicks = Arc::new(ClickHandler::new(
            Arc::clone(&host.notifications),
            Arc::clone(&host.clients),
            config.click_match,
            config.scope.clone(),
        ));
        Ok(Self {
            config,
            host,
            router,
            clicks,
        })
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Synchronous routing decision, for hosts that must decide whether to
    /// intercept before responding.
    pub fn route(&self, request: &Request) -> Route {
        self.router.route(request)
    }

    pub async fn dispatch(&self, event: LifecycleEvent) -> WorkerResult<Dispatched> {
        let kind = event.kind();
        let result = match event {
            LifecycleEvent::Install => self.on_install().await,
            LifecycleEvent::Activate => self.on_activate().await,
            LifecycleEvent::Fetch(request) => Ok(self.on_fetch(request).await),
            LifecycleEvent::Push(message) => self.on_push(message).await,
            LifecycleEvent::NotificationClick(click) => self.on_notification_click(click).await,
        };
        if let Err(err) = &result {
            LOGGER.log_with(
                LogLevel::Error,
                [log_arg(format!("{} handler failed:", kind.as_str())), log_arg(err.to_string())],
            );
        }
        result
    }

    async fn on_install(&self) -> WorkerResult<Dispatched> {
        let precached = lifecycle::install(
            &self.config,
            self.host.caches.as_ref(),
            self.host.network.as_ref(),
            self.host.clients.as_ref(),
        )
        .await?;
        Ok(Dispatched::completed(EventOutcome::Installed { precached }))
    }

    async fn on_activate(&self) -> WorkerResult<Dispatched> {
        let deleted = lifecycle::activate(
            &self.config,
            self.host.caches.as_ref(),
            self.host.clients.as_ref(),
        )
        .await?;
        Ok(Dispatched::completed(EventOutcome::Activated { deleted }))
    }

    async fn on_fetch(&self, request: Request) -> Dispatched {
        let routed = self.router.handle(request).await;
        Dispatched {
            outcome: EventOutcome::Fetch(routed.outcome),
            pending: routed.pending,
        }
    }

    async fn on_push(&self, message: PushMessage) -> WorkerResult<Dispatched> {
        let payload = PushPayload::parse(message.data.as_deref());
        log_push(&payload);

        let defaults = &self.config.notification;
        let descriptor = payload.describe(defaults, &self.config.origin());
        let options = NotificationOptions::from_descriptor(&descriptor, defaults);
        self.host
            .notifications
            .show_notification(&descriptor.title, &options)
            .await?;
        Ok(Dispatched::completed(EventOutcome::NotificationShown(descriptor)))
    }

    async fn on_notification_click(&self, click: NotificationClick) -> WorkerResult<Dispatched> {
        let outcome = self.clicks.handle(&click).await?;
        Ok(Dispatched::completed(EventOutcome::NotificationClicked(outcome)))
    }
}

fn log_push(payload: &PushPayload) {
    match payload {
        PushPayload::Flat(record) => LOGGER.log_with(
            LogLevel::Info,
            [log_arg("Push received (JSON):"), log_arg(Value::Object(record.clone()))],
        ),
        PushPayload::Nested { message, envelope } => {
            let mut raw = envelope.clone();
            raw.insert("message".to_string(), Value::Object(message.clone()));
            LOGGER.log_with(
                LogLevel::Info,
                [log_arg("Push received (JSON):"), log_arg(Value::Object(raw))],
            );
        }
        PushPayload::Empty => LOGGER.warn("Push received: no data"),
        PushPayload::Text(text) => LOGGER.log_with(
            LogLevel::Warn,
            [log_arg("Push payload is not JSON, using text:"), log_arg(text)],
        ),
        PushPayload::Unreadable => LOGGER.error("Push payload is neither JSON nor text"),
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::offline::MemoryCacheStorage;
    use crate::push::ClickMatch;
    use crate::test_support::{test_worker, RecordingClients, RecordingNotifications, ScriptedNetwork};
    use crate::worker::types::Response;

    #[tokio::test(flavor = "current_thread")]
    async fn event_kinds_are_closed_and_named() {
        let click = LifecycleEvent::NotificationClick(NotificationClick {
            tag: "payment-alert".into(),
            target_url: None,
        });
        assert_eq!(click.kind().as_str(), "notificationclick");
        assert_eq!(LifecycleEvent::Push(PushMessage::empty()).kind(), EventKind::Push);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn activation_leaves_only_current_generation() {
        let (worker, caches, _network, _notifications, clients) = test_worker(WorkerConfig::default());
        caches.open("cms-mobile-cache-v10").await.unwrap();
        caches.open("cms-mobile-cache-v11").await.unwrap();
        caches.open("cms-mobile-cache-v12").await.unwrap();

        let outcome = worker
            .dispatch(LifecycleEvent::Activate)
            .await
            .unwrap()
            .settle()
            .await;

        assert_eq!(
            outcome,
            EventOutcome::Activated {
                deleted: vec!["cms-mobile-cache-v10".into(), "cms-mobile-cache-v11".into()]
            }
        );
        assert_eq!(caches.keys().await.unwrap(), vec!["cms-mobile-cache-v12"]);
        assert_eq!(clients.claim_calls(), 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn install_then_offline_shell_is_served_from_cache() {
        let config = WorkerConfig::default();
        let (worker, _caches, network, _notifications, _clients) = test_worker(config.clone());
        for url in config.static_asset_urls().unwrap() {
            network.respond(url.as_str(), Response::ok_with(url.path().to_string()));
        }

        let installed = worker.dispatch(LifecycleEvent::Install).await.unwrap();
        assert_eq!(installed.outcome, EventOutcome::Installed { precached: 5 });

        network.fail("http://localhost/");
        let request = Request::parse("GET", "http://localhost/").unwrap();
        assert_eq!(worker.route(&request), Route::NetworkFirst);
        let dispatched = worker.dispatch(LifecycleEvent::Fetch(request)).await.unwrap();
        match dispatched.settle().await {
            EventOutcome::Fetch(FetchOutcome::Respond(Some(response))) => {
                assert_eq!(response.text(), "/");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn push_shows_nested_title_with_fixed_options() {
        let (worker, _caches, _network, notifications, _clients) = test_worker(WorkerConfig::default());
        let body = r#"{"topic_url":"https://ntfy.sh/pay","message":{"title":"₹1,200 received","message":"From Ravi"}}"#;

        let outcome = worker
            .dispatch(LifecycleEvent::Push(PushMessage::new(body)))
            .await
            .unwrap()
            .settle()
            .await;

        let shown = notifications.shown();
        assert_eq!(shown.len(), 1);
        let (title, options) = &shown[0];
        assert_eq!(title, "₹1,200 received");
        assert_eq!(options.body, "From Ravi");
        assert_eq!(options.badge, "./icon-192.png");
        assert_eq!(options.vibrate, vec![200, 100, 200, 100, 200]);
        assert_eq!(options.tag, "payment-alert");
        assert!(options.renotify);
        assert_eq!(options.data.url, "https://ntfy.sh/pay");
        match outcome {
            EventOutcome::NotificationShown(descriptor) => assert_eq!(descriptor.title, "₹1,200 received"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn push_text_and_empty_payloads() {
        let (worker, _caches, _network, notifications, _clients) = test_worker(WorkerConfig::default());

        worker
            .dispatch(LifecycleEvent::Push(PushMessage::new("Payment of 50 received")))
            .await
            .unwrap();
        worker
            .dispatch(LifecycleEvent::Push(PushMessage::empty()))
            .await
            .unwrap();

        let shown = notifications.shown();
        assert_eq!(shown[0].0, "💰 Payment Received");
        assert_eq!(shown[0].1.body, "Payment of 50 received");
        assert_eq!(shown[0].1.data.url, "http://localhost");
        assert_eq!(shown[1].0, "💰 Payment Received");
        assert_eq!(shown[1].1.body, "Tap to see what's new!");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn push_display_failure_is_reported() {
        let (worker, _caches, _network, notifications, _clients) = test_worker(WorkerConfig::default());
        notifications.fail_next_show();

        let err = worker
            .dispatch(LifecycleEvent::Push(PushMessage::empty()))
            .await
            .unwrap_err();
        assert_eq!(err.code_str(), "sw/notification");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn click_focuses_open_window_or_opens_one() {
        let mut config = WorkerConfig::default();
        config.click_match = ClickMatch::Exact;
        let caches = Arc::new(MemoryCacheStorage::new());
        let network = Arc::new(ScriptedNetwork::new());
        let notifications = Arc::new(RecordingNotifications::new());
        let clients = Arc::new(RecordingClients::with_windows(&[(
            "tab-1",
            "http://localhost/txn/7",
            false,
        )]));
        let worker = ServiceWorker::new(
            config,
            WorkerHost {
                caches,
                network,
                notifications,
                clients: clients.clone(),
            },
        )
        .unwrap();

        let click = |url: &str| {
            LifecycleEvent::NotificationClick(NotificationClick {
                tag: "payment-alert".into(),
                target_url: Some(url.to_string()),
            })
        };

        let focused = worker.dispatch(click("http://localhost/txn/7")).await.unwrap();
        assert_eq!(
            focused.outcome,
            EventOutcome::NotificationClicked(ClickOutcome::Focused("tab-1".into()))
        );
        assert!(clients.opened().is_empty());

        let opened = worker.dispatch(click("http://localhost/txn/8")).await.unwrap();
        assert_eq!(
            opened.outcome,
            EventOutcome::NotificationClicked(ClickOutcome::Opened("http://localhost/txn/8".into()))
        );
        assert_eq!(clients.opened(), vec!["http://localhost/txn/8"]);
        assert_eq!(clients.focused(), vec!["tab-1"]);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn fetch_pending_tasks_can_be_detached() {
        let (worker, caches, network, _notifications, _clients) = test_worker(WorkerConfig::default());
        let url = "http://localhost/icon-192.png";
        network.respond(url, Response::ok_with("icon"));

        let dispatched = worker
            .dispatch(LifecycleEvent::Fetch(Request::parse("GET", url).unwrap()))
            .await
            .unwrap();
        assert_eq!(dispatched.pending_count(), 1);
        let (outcome, pending) = dispatched.into_parts();
        assert_eq!(outcome, EventOutcome::Fetch(FetchOutcome::Respond(Some(Response::ok_with("icon")))));

        settle_all(pending).await;
        assert_eq!(caches.entry_count("cms-mobile-cache-v12"), Some(1));
    }

    #[test]
    fn rejects_invalid_configuration() {
        let mut config = WorkerConfig::default();
        config.cache_name = String::new();
        let (_, caches, network, notifications, clients) = test_worker(WorkerConfig::default());
        let result = ServiceWorker::new(
            config,
            WorkerHost {
                caches,
                network,
                notifications,
                clients,
            },
        );
        assert!(matches!(result, Err(err) if err.code_str() == "sw/invalid-config"));
    }
}
