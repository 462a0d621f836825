//! Named response stores.
//!
//! The worker only ever writes to the store named by the current generation
//! identifier; lookups search every store, which is how the host's
//! `caches.match` behaves while an old generation is still around.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::worker::error::{cache_storage_error, WorkerResult};
use crate::worker::types::{CacheKey, Request, Response};

#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
pub trait CacheStorage: Send + Sync {
    /// Names of all stores in creation order.
    async fn keys(&self) -> WorkerResult<Vec<String>>;

    /// Creates the named store if it does not exist yet.
    async fn open(&self, cache_name: &str) -> WorkerResult<()>;

    async fn has(&self, cache_name: &str) -> WorkerResult<bool>;

    /// Removes a store and every entry in it. Returns whether it existed.
    async fn delete(&self, cache_name: &str) -> WorkerResult<bool>;

    async fn match_request(&self, request: &Request) -> WorkerResult<Option<Response>>;

    /// Stores `response` under `request`, replacing any previous entry.
    async fn put(&self, cache_name: &str, request: &Request, response: Response)
        -> WorkerResult<()>;
}

type Store = HashMap<CacheKey, Response>;

/// In-process cache storage used on native targets.
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    stores: Mutex<Vec<(String, Store)>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries in the named store, `None` if the store is missing.
    pub fn entry_count(&self, cache_name: &str) -> Option<usize> {
        let stores = self.stores.lock().ok()?;
        stores
            .iter()
            .find(|(name, _)| name == cache_name)
            .map(|(_, store)| store.len())
    }

    fn lock(&self) -> WorkerResult<MutexGuard<'_, Vec<(String, Store)>>> {
        self.stores
            .lock()
            .map_err(|_| cache_storage_error("Cache storage lock poisoned"))
    }
}

fn ensure_store<'a>(stores: &'a mut Vec<(String, Store)>, cache_name: &str) -> &'a mut Store {
    let index = match stores.iter().position(|(name, _)| name == cache_name) {
        Some(index) => index,
        None => {
            stores.push((cache_name.to_string(), Store::new()));
            stores.len() - 1
        }
    };
    &mut stores[index].1
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
impl CacheStorage for MemoryCacheStorage {
    async fn keys(&self) -> WorkerResult<Vec<String>> {
        Ok(self.lock()?.iter().map(|(name, _)| name.clone()).collect())
    }

    async fn open(&self, cache_name: &str) -> WorkerResult<()> {
        let mut stores = self.lock()?;
        ensure_store(&mut stores, cache_name);
        Ok(())
    }

    async fn has(&self, cache_name: &str) -> WorkerResult<bool> {
        Ok(self.lock()?.iter().any(|(name, _)| name == cache_name))
    }

    async fn delete(&self, cache_name: &str) -> WorkerResult<bool> {
        let mut stores = self.lock()?;
        let before = stores.len();
        stores.retain(|(name, _)| name != cache_name);
        Ok(stores.len() != before)
    }

    async fn match_request(&self, request: &Request) -> WorkerResult<Option<Response>> {
        let key = request.cache_key();
        Ok(self
            .lock()?
            .iter()
            .find_map(|(_, store)| store.get(&key).cloned()))
    }

    async fn put(
        &self,
        cache_name: &str,
        request: &Request,
        response: Response,
    ) -> WorkerResult<()> {
        if !request.is_get() {
            return Err(cache_storage_error(format!(
                "Request method '{}' is unsupported",
                request.method
            )));
        }
        if response.status == 206 {
            return Err(cache_storage_error("Partial response (status code 206) is unsupported"));
        }
        let mut stores = self.lock()?;
        ensure_store(&mut stores, cache_name).insert(request.cache_key(), response);
        Ok(())
    }
}
