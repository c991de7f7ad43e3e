//! Report sinks.

pub mod json;
pub mod memory;
pub mod queue;
