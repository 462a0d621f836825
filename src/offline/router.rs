//! Fetch routing.
//!
//! Rules are evaluated in order and the first match wins:
//!
//! 1. API hosts bypass the worker entirely.
//! 2. Font hosts are cache-first and never revalidated.
//! 3. The application shell (`/` or `index.html`) is network-first, when enabled.
//! 4. Everything else is stale-while-revalidate.
//!
//! Every successful network fetch under rules 2-4 queues a write of a fresh
//! copy into the current store. Writes and background revalidation are
//! returned as pending tasks rather than awaited.

use std::sync::Arc;

use crate::logger::{log_arg, LogLevel};
use crate::offline::cache::CacheStorage;
use crate::offline::network::Network;
use crate::worker::config::WorkerConfig;
use crate::worker::pending::{pending, PendingTask};
use crate::worker::types::{Request, Response};
use crate::worker::LOGGER;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Bypass,
    CacheFirst,
    NetworkFirst,
    StaleWhileRevalidate,
}

impl Route {
    pub fn classify(config: &WorkerConfig, request: &Request) -> Route {
        if !matches!(request.url.scheme(), "http" | "https") {
            return Route::Bypass;
        }
        let host = request.host().unwrap_or_default();
        if config.is_api_host(host) {
            return Route::Bypass;
        }
        if config.is_font_host(host) {
            return Route::CacheFirst;
        }
        if config.network_first_shell && is_shell_path(request.path()) {
            return Route::NetworkFirst;
        }
        Route::StaleWhileRevalidate
    }
}

fn is_shell_path(path: &str) -> bool {
    path.ends_with('/') || path.ends_with("index.html")
}

/// What the worker answers to an intercepted request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The worker does not respond; the host performs the request itself.
    Passthrough,
    /// The worker responds. `None` means neither cache nor network had an answer.
    Respond(Option<Response>),
}

impl FetchOutcome {
    pub fn response(&self) -> Option<&Response> {
        match self {
            FetchOutcome::Respond(response) => response.as_ref(),
            FetchOutcome::Passthrough => None,
        }
    }
}

pub struct Routed {
    pub outcome: FetchOutcome,
    pub pending: Vec<PendingTask>,
}

impl Routed {
    fn respond(response: Option<Response>, pending: Vec<PendingTask>) -> Self {
        Self {
            outcome: FetchOutcome::Respond(response),
            pending,
        }
    }
}

#[derive(Clone)]
pub struct CacheRouter {
    config: Arc<WorkerConfig>,
    caches: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
}

impl CacheRouter {
    pub fn new(
        config: Arc<WorkerConfig>,
        caches: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
    ) -> Self {
        Self {
            config,
            caches,
            network,
        }
    }

    pub fn route(&self, request: &Request) -> Route {
        Route::classify(&self.config, request)
    }

    pub async fn handle(&self, request: Request) -> Routed {
        match self.route(&request) {
            Route::Bypass => Routed {
                outcome: FetchOutcome::Passthrough,
                pending: Vec::new(),
            },
            Route::CacheFirst => self.cache_first(request).await,
            Route::NetworkFirst => self.network_first(request).await,
            Route::StaleWhileRevalidate => self.stale_while_revalidate(request).await,
        }
    }

    async fn cache_first(&self, request: Request) -> Routed {
        if let Some(cached) = self.cached(&request).await {
            return Routed::respond(Some(cached), Vec::new());
        }
        match self.network.fetch(&request).await {
            Ok(response) => {
                let write = self.store_copy(request, response.clone());
                Routed::respond(Some(response), vec![write])
            }
            Err(err) => {
                LOGGER.log_with(
                    LogLevel::Warn,
                    [log_arg("Cache-first fetch failed:"), log_arg(err.to_string())],
                );
                Routed::respond(None, Vec::new())
            }
        }
    }

    async fn network_first(&self, request: Request) -> Routed {
        match self.network.fetch(&request).await {
            Ok(response) => {
                let write = self.store_copy(request, response.clone());
                Routed::respond(Some(response), vec![write])
            }
            Err(err) => {
                LOGGER.log_with(
                    LogLevel::Debug,
                    [log_arg("Network-first fell back to cache:"), log_arg(err.to_string())],
                );
                let cached = self.cached(&request).await;
                Routed::respond(cached, Vec::new())
            }
        }
    }

    async fn stale_while_revalidate(&self, request: Request) -> Routed {
        match self.cached(&request).await {
            Some(cached) => {
                let revalidate = self.revalidate(request);
                Routed::respond(Some(cached), vec![revalidate])
            }
            None => match self.network.fetch(&request).await {
                Ok(response) => {
                    let write = self.store_copy(request, response.clone());
                    Routed::respond(Some(response), vec![write])
                }
                Err(err) => {
                    log::debug!("no cached copy and network failed for {}: {err}", request.url);
                    Routed::respond(None, Vec::new())
                }
            },
        }
    }

    async fn cached(&self, request: &Request) -> Option<Response> {
        match self.caches.match_request(request).await {
            Ok(hit) => hit,
            Err(err) => {
                log::debug!("cache lookup failed for {}: {err}", request.url);
                None
            }
        }
    }

    fn store_copy(&self, request: Request, response: Response) -> PendingTask {
        let caches = Arc::clone(&self.caches);
        let cache_name = self.config.cache_name.clone();
        pending(async move {
            write_copy(caches.as_ref(), &cache_name, &request, response).await;
        })
    }

    fn revalidate(&self, request: Request) -> PendingTask {
        let caches = Arc::clone(&self.caches);
        let network = Arc::clone(&self.network);
        let cache_name = self.config.cache_name.clone();
        pending(async move {
            match network.fetch(&request).await {
                Ok(response) => {
                    write_copy(caches.as_ref(), &cache_name, &request, response).await;
                }
                Err(err) => {
                    log::debug!("revalidation of {} failed: {err}", request.url);
                }
            }
        })
    }
}

async fn write_copy(caches: &dyn CacheStorage, cache_name: &str, request: &Request, response: Response) {
    if let Err(err) = caches.put(cache_name, request, response).await {
        log::debug!("cache write for {} dropped: {err}", request.url);
    }
}
