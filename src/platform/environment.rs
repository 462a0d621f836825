//! Worker configuration sourced from the runtime environment.
//!
//! Native hosts read `CMS_SW_CONFIG`, which holds either inline JSON or a
//! path to a JSON file. In the browser the configuration is an object
//! assigned to the `__CMS_SW_CONFIG__` global before the worker module loads.
//! A missing source yields the defaults; an invalid one is logged and also
//! yields the defaults, so a bad deployment still caches and notifies.

use crate::worker::{WorkerConfig, LOGGER};

/// Resolves the worker configuration for this process.
pub fn worker_config_from_environment() -> WorkerConfig {
    match raw_config() {
        Some(raw) => match WorkerConfig::from_json(&raw) {
            Ok(config) => config,
            Err(err) => {
                LOGGER.warn(format!("{err}; falling back to default worker config"));
                WorkerConfig::default()
            }
        },
        None => WorkerConfig::default(),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn raw_config() -> Option<String> {
    use crate::worker::constants::CONFIG_ENV_VAR;

    let raw = std::env::var(CONFIG_ENV_VAR).ok()?;
    let trimmed = raw.trim();
    if trimmed.starts_with('{') {
        return Some(trimmed.to_string());
    }
    match std::fs::read_to_string(trimmed) {
        Ok(contents) => Some(contents),
        Err(err) => {
            LOGGER.warn(format!("Cannot read {CONFIG_ENV_VAR} file '{trimmed}': {err}"));
            None
        }
    }
}

#[cfg(all(target_arch = "wasm32", feature = "wasm-web"))]
fn raw_config() -> Option<String> {
    use crate::worker::constants::CONFIG_GLOBAL;
    use wasm_bindgen::JsValue;

    let global = js_sys::global();
    let value = js_sys::Reflect::get(&global, &JsValue::from_str(CONFIG_GLOBAL)).ok()?;
    if value.is_null() || value.is_undefined() {
        return None;
    }
    if let Some(text) = value.as_string() {
        return Some(text);
    }
    js_sys::JSON::stringify(&value).ok()?.as_string()
}

#[cfg(all(target_arch = "wasm32", not(feature = "wasm-web")))]
fn raw_config() -> Option<String> {
    None
}
