//! Iamlog library crate.
//!
//! Normalizes identity server user and admin events into reports for an
//! event-monitoring sink.

pub mod core;
pub mod formats;
pub mod sources;

pub use crate::core::config;
pub use crate::core::event;
pub use crate::core::listener;
pub use crate::core::normalize;
pub use crate::core::report;
pub use crate::core::traits;
