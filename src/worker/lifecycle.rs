//! Install and activate.

use futures::future::join_all;

use crate::logger::{log_arg, LogLevel};
use crate::offline::{CacheStorage, Network};
use crate::push::Clients;
use crate::worker::config::WorkerConfig;
use crate::worker::error::{network_error, WorkerResult};
use crate::worker::types::Request;
use crate::worker::LOGGER;

/// Pre-populates the current store with the static assets.
///
/// Every asset is fetched before anything is written; a single failed or
/// non-2xx asset fails the install and leaves the store untouched. Returns
/// the number of assets stored.
pub async fn install(
    config: &WorkerConfig,
    caches: &dyn CacheStorage,
    network: &dyn Network,
    clients: &dyn Clients,
) -> WorkerResult<usize> {
    if let Err(err) = clients.skip_waiting().await {
        LOGGER.log_with(
            LogLevel::Warn,
            [log_arg("skipWaiting failed:"), log_arg(err.to_string())],
        );
    }

    let requests: Vec<Request> = config
        .static_asset_urls()?
        .into_iter()
        .map(Request::get)
        .collect();

    let responses = join_all(requests.iter().map(|request| network.fetch(request))).await;
    let mut fetched = Vec::with_capacity(requests.len());
    for (request, response) in requests.iter().zip(responses) {
        let response = response?;
        if !response.ok() {
            return Err(network_error(format!(
                "Pre-caching {} failed with status {}",
                request.url, response.status
            )));
        }
        fetched.push((request, response));
    }

    caches.open(&config.cache_name).await?;
    for (request, response) in fetched {
        caches.put(&config.cache_name, request, response).await?;
    }

    LOGGER.log_with(
        LogLevel::Info,
        [
            log_arg("Installed"),
            log_arg(&config.cache_name),
            log_arg("with"),
            log_arg(requests.len()),
            log_arg("static assets"),
        ],
    );
    Ok(requests.len())
}

/// Deletes every store but the current generation, then claims open clients.
///
/// Returns the names of the deleted stores.
pub async fn activate(
    config: &WorkerConfig,
    caches: &dyn CacheStorage,
    clients: &dyn Clients,
) -> WorkerResult<Vec<String>> {
    let stale: Vec<String> = caches
        .keys()
        .await?
        .into_iter()
        .filter(|name| name != &config.cache_name)
        .collect();

    let results = join_all(stale.iter().map(|name| caches.delete(name))).await;
    let mut deleted = Vec::with_capacity(stale.len());
    for (name, result) in stale.into_iter().zip(results) {
        if result? {
            deleted.push(name);
        }
    }

    clients.claim().await?;

    if !deleted.is_empty() {
        LOGGER.log_with(
            LogLevel::Info,
            [log_arg("Deleted stale caches:"), log_arg(deleted.join(", "))],
        );
    }
    Ok(deleted)
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::offline::MemoryCacheStorage;
    use crate::test_support::{RecordingClients, ScriptedNetwork};
    use crate::worker::types::Response;

    fn config() -> WorkerConfig {
        WorkerConfig::default()
            .with_scope("https://pay.example.com/app/")
            .unwrap()
    }

    fn script_assets(network: &ScriptedNetwork, config: &WorkerConfig) {
        for url in config.static_asset_urls().unwrap() {
            network.respond(url.as_str(), Response::ok_with(format!("asset {}", url.path())));
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn install_precaches_every_static_asset() {
        let config = config();
        let caches = MemoryCacheStorage::new();
        let network = ScriptedNetwork::new();
        let clients = RecordingClients::new();
        script_assets(&network, &config);

        let stored = install(&config, &caches, &network, &clients).await.unwrap();

        assert_eq!(stored, 5);
        assert_eq!(caches.entry_count("cms-mobile-cache-v12"), Some(5));
        assert_eq!(clients.skip_waiting_calls(), 1);
        let shell = caches
            .match_request(&Request::parse("GET", "https://pay.example.com/app/index.html").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(shell.text(), "asset /app/index.html");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn install_is_all_or_nothing() {
        let config = config();
        let caches = MemoryCacheStorage::new();
        let network = ScriptedNetwork::new();
        let clients = RecordingClients::new();
        script_assets(&network, &config);
        network.respond(
            "https://pay.example.com/app/icon-512.png",
            Response::new(404, "missing"),
        );

        let err = install(&config, &caches, &network, &clients)
            .await
            .unwrap_err();
        assert_eq!(err.code_str(), "sw/network");
        assert_eq!(caches.entry_count("cms-mobile-cache-v12"), None);

        network.fail("https://pay.example.com/app/icon-512.png");
        let err = install(&config, &caches, &network, &clients)
            .await
            .unwrap_err();
        assert_eq!(err.code_str(), "sw/network");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn activate_removes_stale_generations_and_claims() {
        let config = config();
        let caches = MemoryCacheStorage::new();
        let clients = RecordingClients::new();
        caches.open("cms-mobile-cache-v10").await.unwrap();
        caches.open("cms-mobile-cache-v12").await.unwrap();
        caches.open("cms-mobile-cache-v11").await.unwrap();

        let deleted = activate(&config, &caches, &clients).await.unwrap();

        assert_eq!(deleted, vec!["cms-mobile-cache-v10", "cms-mobile-cache-v11"]);
        assert_eq!(caches.keys().await.unwrap(), vec!["cms-mobile-cache-v12"]);
        assert_eq!(clients.claim_calls(), 1);
    }
}
