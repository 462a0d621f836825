#![doc = include_str!("../README.md")]

pub mod logger;
pub mod offline;
pub mod platform;
pub mod push;
pub mod worker;

#[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
pub mod web;

#[cfg(all(test, not(target_arch = "wasm32")))]
pub mod test_support;
