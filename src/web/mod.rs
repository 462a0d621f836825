//! Browser bindings: the host seams backed by the service worker global
//! scope, plus the exported entry points the JS listener shim calls.
//!
//! Intercepted requests and host responses travel through the router as
//! handles: the browser objects are reused for `fetch`, `caches.match` and
//! `cache.put`, and response bodies are never read on the Rust side.

use std::cell::RefCell;
use std::sync::Arc;

use bytes::Bytes;
use js_sys::{Array, Promise, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, JsFuture};
use web_sys::{
    Cache, ClientQueryOptions, ClientType, GetNotificationOptions, Headers, Notification,
    RequestInit, ResponseInit, ServiceWorkerGlobalScope,
};

use crate::offline::{CacheStorage, FetchOutcome, Network, Route};
use crate::platform::environment::worker_config_from_environment;
use crate::push::{Clients, NotificationCenter, NotificationClick, NotificationOptions, WindowClient};
use crate::worker::constants::DEFAULT_SCOPE;
use crate::worker::error::{
    cache_storage_error, clients_error, internal_error, network_error, notification_error,
    WorkerError, WorkerResult,
};
use crate::worker::{
    EventOutcome, LifecycleEvent, PushMessage, Request, Response, ServiceWorker, WorkerHost,
};

fn js_value_to_string(value: &JsValue) -> String {
    if let Some(s) = value.as_string() {
        s
    } else if let Some(err) = value.dyn_ref::<web_sys::DomException>() {
        format!("{}: {}", err.name(), err.message())
    } else if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        String::from(err.message())
    } else {
        format!("{:?}", value)
    }
}

fn global_scope() -> WorkerResult<ServiceWorkerGlobalScope> {
    js_sys::global()
        .dyn_into::<ServiceWorkerGlobalScope>()
        .map_err(|_| internal_error("Not running inside a service worker global scope"))
}

async fn await_promise(
    promise: Promise,
    map_err: fn(String) -> WorkerError,
) -> WorkerResult<JsValue> {
    JsFuture::from(promise)
        .await
        .map_err(|err| map_err(js_value_to_string(&err)))
}

/// The host request to pass to `fetch`/`match`/`put`: the intercepted one when
/// there is one, a fresh same-policy request otherwise (pre-cache assets).
fn to_web_request(request: &Request) -> WorkerResult<web_sys::Request> {
    if let Some(raw) = &request.raw {
        return Ok(Clone::clone(raw));
    }
    let init = RequestInit::new();
    init.set_method(&request.method);
    let web_request = web_sys::Request::new_with_str_and_init(request.url.as_str(), &init)
        .map_err(|err| internal_error(js_value_to_string(&err)))?;
    let headers = web_request.headers();
    for (name, value) in &request.headers {
        headers
            .set(name, value)
            .map_err(|err| internal_error(js_value_to_string(&err)))?;
    }
    Ok(web_request)
}

fn from_web_request(request: &web_sys::Request) -> WorkerResult<Request> {
    let mut converted = Request::parse(&request.method(), &request.url())?;
    converted.headers = header_pairs(&request.headers());
    converted.raw = Some(Clone::clone(request));
    Ok(converted)
}

fn header_pairs(headers: &Headers) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    if let Ok(Some(entries)) = js_sys::try_iter(headers.as_ref()) {
        for entry in entries.flatten() {
            let entry = Array::from(&entry);
            if let (Some(name), Some(value)) = (entry.get(0).as_string(), entry.get(1).as_string()) {
                pairs.push((name, value));
            }
        }
    }
    pairs
}

/// Wraps a host response without reading its body.
fn from_web_response(response: web_sys::Response) -> Response {
    Response {
        status: response.status(),
        status_text: response.status_text(),
        headers: header_pairs(&response.headers()),
        body: Bytes::new(),
        raw: Some(response),
    }
}

/// Every hand-off gets its own `Response.clone()`, so the wrapped body is
/// never consumed and can be given to both `respondWith` and `cache.put`.
fn to_web_response(response: &Response) -> WorkerResult<web_sys::Response> {
    if let Some(raw) = &response.raw {
        return web_sys::Response::clone(raw).map_err(|err| internal_error(js_value_to_string(&err)));
    }
    let headers = Headers::new().map_err(|err| internal_error(js_value_to_string(&err)))?;
    for (name, value) in &response.headers {
        headers
            .append(name, value)
            .map_err(|err| internal_error(js_value_to_string(&err)))?;
    }
    let init = ResponseInit::new();
    init.set_status(response.status);
    init.set_status_text(&response.status_text);
    init.set_headers(&headers);
    if response.is_null_body_status() {
        return web_sys::Response::new_with_opt_buffer_source_and_init(None, &init)
            .map_err(|err| internal_error(js_value_to_string(&err)));
    }
    let body: js_sys::Object = Uint8Array::from(response.body.as_ref()).into();
    web_sys::Response::new_with_opt_buffer_source_and_init(Some(&body), &init)
        .map_err(|err| internal_error(js_value_to_string(&err)))
}

/// `self.caches`.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebCacheStorage;

impl WebCacheStorage {
    fn storage(&self) -> WorkerResult<web_sys::CacheStorage> {
        global_scope()?
            .caches()
            .map_err(|err| cache_storage_error(js_value_to_string(&err)))
    }

    async fn open_cache(&self, cache_name: &str) -> WorkerResult<Cache> {
        let value = await_promise(self.storage()?.open(cache_name), cache_storage_error).await?;
        value
            .dyn_into::<Cache>()
            .map_err(|_| cache_storage_error("caches.open did not return a Cache"))
    }
}

#[async_trait::async_trait(?Send)]
impl CacheStorage for WebCacheStorage {
    async fn keys(&self) -> WorkerResult<Vec<String>> {
        let value = await_promise(self.storage()?.keys(), cache_storage_error).await?;
        Ok(Array::from(&value)
            .iter()
            .filter_map(|name| name.as_string())
            .collect())
    }

    async fn open(&self, cache_name: &str) -> WorkerResult<()> {
        self.open_cache(cache_name).await.map(|_| ())
    }

    async fn has(&self, cache_name: &str) -> WorkerResult<bool> {
        let value = await_promise(self.storage()?.has(cache_name), cache_storage_error).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn delete(&self, cache_name: &str) -> WorkerResult<bool> {
        let value = await_promise(self.storage()?.delete(cache_name), cache_storage_error).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn match_request(&self, request: &Request) -> WorkerResult<Option<Response>> {
        let web_request = to_web_request(request)?;
        let value = await_promise(
            self.storage()?.match_with_request(&web_request),
            cache_storage_error,
        )
        .await?;
        if value.is_undefined() || value.is_null() {
            return Ok(None);
        }
        let response = value
            .dyn_into::<web_sys::Response>()
            .map_err(|_| cache_storage_error("caches.match did not return a Response"))?;
        Ok(Some(from_web_response(response)))
    }

    async fn put(
        &self,
        cache_name: &str,
        request: &Request,
        response: Response,
    ) -> WorkerResult<()> {
        let cache = self.open_cache(cache_name).await?;
        let web_request = to_web_request(request)?;
        let web_response = to_web_response(&response)?;
        await_promise(
            cache.put_with_request(&web_request, &web_response),
            cache_storage_error,
        )
        .await
        .map(|_| ())
    }
}

/// `self.fetch`.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebNetwork;

#[async_trait::async_trait(?Send)]
impl Network for WebNetwork {
    async fn fetch(&self, request: &Request) -> WorkerResult<Response> {
        let web_request = to_web_request(request)?;
        let value = await_promise(global_scope()?.fetch_with_request(&web_request), network_error)
            .await?;
        let response = value
            .dyn_into::<web_sys::Response>()
            .map_err(|_| network_error("fetch did not return a Response"))?;
        Ok(from_web_response(response))
    }
}

/// `self.registration` notifications.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebNotifications;

#[async_trait::async_trait(?Send)]
impl NotificationCenter for WebNotifications {
    async fn show_notification(&self, title: &str, options: &NotificationOptions) -> WorkerResult<()> {
        let js_options = serde_wasm_bindgen::to_value(options)
            .map_err(|err| notification_error(err.to_string()))?
            .unchecked_into::<web_sys::NotificationOptions>();
        let promise = global_scope()?
            .registration()
            .show_notification_with_options(title, &js_options)
            .map_err(|err| notification_error(js_value_to_string(&err)))?;
        await_promise(promise, notification_error).await.map(|_| ())
    }

    async fn close(&self, tag: &str) -> WorkerResult<()> {
        let filter = GetNotificationOptions::new();
        filter.set_tag(tag);
        let promise = global_scope()?
            .registration()
            .get_notifications_with_filter(&filter)
            .map_err(|err| notification_error(js_value_to_string(&err)))?;
        let value = await_promise(promise, notification_error).await?;
        for notification in Array::from(&value).iter() {
            if let Ok(notification) = notification.dyn_into::<Notification>() {
                notification.close();
            }
        }
        Ok(())
    }
}

/// `self.clients` and `self.skipWaiting`.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebClients;

impl WebClients {
    async fn window_clients(&self, include_uncontrolled: bool) -> WorkerResult<Vec<web_sys::WindowClient>> {
        let options = ClientQueryOptions::new();
        options.set_type(ClientType::Window);
        options.set_include_uncontrolled(include_uncontrolled);
        let value = await_promise(
            global_scope()?.clients().match_all_with_options(&options),
            clients_error,
        )
        .await?;
        Ok(Array::from(&value)
            .iter()
            .filter_map(|client| client.dyn_into::<web_sys::WindowClient>().ok())
            .collect())
    }
}

#[async_trait::async_trait(?Send)]
impl Clients for WebClients {
    async fn match_windows(&self, include_uncontrolled: bool) -> WorkerResult<Vec<WindowClient>> {
        Ok(self
            .window_clients(include_uncontrolled)
            .await?
            .iter()
            .map(|client| WindowClient {
                id: client.id(),
                url: client.url(),
            })
            .collect())
    }

    async fn focus(&self, client_id: &str) -> WorkerResult<()> {
        let value = await_promise(global_scope()?.clients().get(client_id), clients_error).await?;
        let client = value
            .dyn_into::<web_sys::WindowClient>()
            .map_err(|_| clients_error(format!("Client '{client_id}' is not an open window")))?;
        let promise = client
            .focus()
            .map_err(|err| clients_error(js_value_to_string(&err)))?;
        await_promise(promise, clients_error).await.map(|_| ())
    }

    async fn open_window(&self, url: &str) -> WorkerResult<()> {
        await_promise(global_scope()?.clients().open_window(url), clients_error)
            .await
            .map(|_| ())
    }

    async fn claim(&self) -> WorkerResult<()> {
        await_promise(global_scope()?.clients().claim(), clients_error)
            .await
            .map(|_| ())
    }

    async fn skip_waiting(&self) -> WorkerResult<()> {
        let promise = global_scope()?
            .skip_waiting()
            .map_err(|err| clients_error(js_value_to_string(&err)))?;
        await_promise(promise, clients_error).await.map(|_| ())
    }
}

pub fn web_host() -> WorkerHost {
    WorkerHost {
        caches: Arc::new(WebCacheStorage),
        network: Arc::new(WebNetwork),
        notifications: Arc::new(WebNotifications),
        clients: Arc::new(WebClients),
    }
}

thread_local! {
    static WORKER: RefCell<Option<ServiceWorker>> = const { RefCell::new(None) };
}

/// The worker for this global scope, created on first use.
///
/// A configuration without an explicit scope takes the registration scope.
fn current_worker() -> WorkerResult<ServiceWorker> {
    if let Some(worker) = WORKER.with(|slot| slot.borrow().clone()) {
        return Ok(worker);
    }

    let mut config = worker_config_from_environment();
    if config.scope.as_str() == DEFAULT_SCOPE {
        let registration_scope = global_scope()?.registration().scope();
        config = config.with_scope(&registration_scope)?;
    }
    let worker = ServiceWorker::new(config, web_host())?;
    WORKER.with(|slot| *slot.borrow_mut() = Some(worker.clone()));
    Ok(worker)
}

fn to_js_error(err: WorkerError) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

async fn run(event: LifecycleEvent) -> Result<EventOutcome, JsValue> {
    let worker = current_worker().map_err(to_js_error)?;
    let dispatched = worker.dispatch(event).await.map_err(to_js_error)?;
    Ok(dispatched.detach())
}

/// Whether the fetch listener should call `respondWith` at all.
#[wasm_bindgen(js_name = swShouldIntercept)]
pub fn sw_should_intercept(url: &str, method: &str) -> bool {
    if !method.eq_ignore_ascii_case("GET") {
        return false;
    }
    let Ok(worker) = current_worker() else {
        return false;
    };
    match Request::parse(method, url) {
        Ok(request) => worker.route(&request) != Route::Bypass,
        Err(_) => false,
    }
}

#[wasm_bindgen(js_name = swInstall)]
pub fn sw_install() -> Promise {
    future_to_promise(async move {
        run(LifecycleEvent::Install).await?;
        Ok(JsValue::UNDEFINED)
    })
}

#[wasm_bindgen(js_name = swActivate)]
pub fn sw_activate() -> Promise {
    future_to_promise(async move {
        run(LifecycleEvent::Activate).await?;
        Ok(JsValue::UNDEFINED)
    })
}

/// Resolves to the `Response` to answer with, or `undefined` when neither
/// the cache nor the network had one.
#[wasm_bindgen(js_name = swFetch)]
pub fn sw_fetch(request: web_sys::Request) -> Promise {
    future_to_promise(async move {
        let request = from_web_request(&request).map_err(to_js_error)?;
        match run(LifecycleEvent::Fetch(request)).await? {
            EventOutcome::Fetch(FetchOutcome::Respond(Some(response))) => {
                Ok(to_web_response(&response).map_err(to_js_error)?.into())
            }
            _ => Ok(JsValue::UNDEFINED),
        }
    })
}

#[wasm_bindgen(js_name = swPush)]
pub fn sw_push(data: Option<Uint8Array>) -> Promise {
    future_to_promise(async move {
        let message = PushMessage {
            data: data.map(|bytes| Bytes::from(bytes.to_vec())),
        };
        run(LifecycleEvent::Push(message)).await?;
        Ok(JsValue::UNDEFINED)
    })
}

#[wasm_bindgen(js_name = swNotificationClick)]
pub fn sw_notification_click(tag: String, url: Option<String>) -> Promise {
    future_to_promise(async move {
        let click = NotificationClick {
            tag,
            target_url: url,
        };
        run(LifecycleEvent::NotificationClick(click)).await?;
        Ok(JsValue::UNDEFINED)
    })
}

static LISTENER_TEMPLATE: &str = r#"import init, { swShouldIntercept, swInstall, swActivate, swFetch, swPush, swNotificationClick } from 'MODULE_URL';
let wasmReady = false;
const ready = init().then(() => { wasmReady = true; });
self.addEventListener('install', (e) => e.waitUntil(ready.then(() => swInstall())));
self.addEventListener('activate', (e) => e.waitUntil(ready.then(() => swActivate())));
self.addEventListener('fetch', (e) => {
    if (!wasmReady || !swShouldIntercept(e.request.url, e.request.method)) return;
    e.respondWith(swFetch(e.request));
});
self.addEventListener('push', (e) => e.waitUntil(ready.then(() =>
    swPush(e.data ? new Uint8Array(e.data.arrayBuffer()) : undefined))));
self.addEventListener('notificationclick', (e) => e.waitUntil(ready.then(() =>
    swNotificationClick(e.notification.tag, (e.notification.data || {}).url))));
"#;

/// JS module that registers the worker listeners and forwards each event
/// to the exported entry points. Register it with `{ type: 'module' }`.
#[wasm_bindgen(js_name = listenerScript)]
pub fn listener_script(module_url: &str) -> String {
    LISTENER_TEMPLATE.replace("MODULE_URL", module_url)
}
