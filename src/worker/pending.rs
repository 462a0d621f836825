//! Work the host must keep the worker alive for (`waitUntil`).

use std::future::Future;

use futures::future::{join_all, FutureExt};

use crate::platform::runtime::spawn_detached;

#[cfg(not(target_arch = "wasm32"))]
pub type PendingTask = futures::future::BoxFuture<'static, ()>;
#[cfg(target_arch = "wasm32")]
pub type PendingTask = futures::future::LocalBoxFuture<'static, ()>;

#[cfg(not(target_arch = "wasm32"))]
pub fn pending<F>(future: F) -> PendingTask
where
    F: Future<Output = ()> + Send + 'static,
{
    future.boxed()
}

#[cfg(target_arch = "wasm32")]
pub fn pending<F>(future: F) -> PendingTask
where
    F: Future<Output = ()> + 'static,
{
    future.boxed_local()
}

/// Drives every task to completion.
pub async fn settle_all(tasks: Vec<PendingTask>) {
    if tasks.is_empty() {
        return;
    }
    join_all(tasks).await;
}

/// Hands the tasks to the background executor.
pub fn detach_all(tasks: Vec<PendingTask>) {
    for task in tasks {
        spawn_detached(task);
    }
}
