//! Paramtree: path-addressed device model
//!
//! A hierarchical store of typed device parameters, composed from JSON
//! documents at load time, navigated by JSON-Pointer-style addresses, and
//! mutated under a selectable concurrency policy with per-parameter
//! constraint enforcement.

pub mod codec;
pub mod concurrency;
pub mod config;
pub mod constraint;
pub mod device;
pub mod error;
pub mod fetch;
pub mod import;
pub mod logging;
pub mod model;
pub mod path;
pub mod types;
