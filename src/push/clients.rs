use crate::worker::error::WorkerResult;

/// An open application window as reported by the host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowClient {
    pub id: String,
    pub url: String,
}

/// The host's client registry (`self.clients` plus `skipWaiting`).
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
pub trait Clients: Send + Sync {
    /// Open windows of the application, optionally including windows not
    /// controlled by this worker.
    async fn match_windows(&self, include_uncontrolled: bool) -> WorkerResult<Vec<WindowClient>>;

    async fn focus(&self, client_id: &str) -> WorkerResult<()>;

    async fn open_window(&self, url: &str) -> WorkerResult<()>;

    /// Takes control of every open client in scope.
    async fn claim(&self) -> WorkerResult<()>;

    /// Activates the installing generation without waiting for old clients.
    async fn skip_waiting(&self) -> WorkerResult<()>;
}
