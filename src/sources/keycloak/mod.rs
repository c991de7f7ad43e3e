//! Keycloak event exports: user events and admin events as JSON records.

pub mod model;
pub mod reader;

pub use reader::{parse_line, JsonlEventReader, SourceError};
