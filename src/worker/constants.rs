pub const WORKER_LOGGER_NAME: &str = "@cms-mobile/sw";

/// Generation identifier of the deployed cache store. Bump per release.
pub const DEFAULT_CACHE_NAME: &str = "cms-mobile-cache-v12";
pub const DEFAULT_SCOPE: &str = "http://localhost/";

pub const DEFAULT_STATIC_ASSETS: [&str; 5] = [
    "./",
    "./index.html",
    "./manifest.json",
    "./icon-192.png",
    "./icon-512.png",
];

pub const DEFAULT_API_HOSTS: [&str; 2] = ["script.google.com", "script.googleusercontent.com"];
pub const DEFAULT_FONT_HOSTS: [&str; 2] = ["fonts.googleapis.com", "fonts.gstatic.com"];

pub const DEFAULT_NOTIFICATION_TITLE: &str = "💰 Payment Received";
pub const DEFAULT_NOTIFICATION_BODY: &str = "New payment details incoming...";
pub const EMPTY_PUSH_BODY: &str = "Tap to see what's new!";
pub const DEFAULT_NOTIFICATION_ICON: &str = "./icon-192.png";
pub const DEFAULT_NOTIFICATION_BADGE: &str = "./icon-192.png";
pub const DEFAULT_VIBRATE_PATTERN: [u32; 5] = [200, 100, 200, 100, 200];
pub const PAYMENT_ALERT_TAG: &str = "payment-alert";
pub const OPEN_ACTION: &str = "open";
pub const OPEN_ACTION_TITLE: &str = "Open App";

/// Environment variable holding inline JSON or a path to a JSON file.
#[cfg(not(target_arch = "wasm32"))]
pub const CONFIG_ENV_VAR: &str = "CMS_SW_CONFIG";
/// Global read from the worker scope on wasm.
#[cfg(target_arch = "wasm32")]
pub const CONFIG_GLOBAL: &str = "__CMS_SW_CONFIG__";
