//! Target-specific plumbing shared by the worker modules.

pub mod environment;
pub mod runtime;
