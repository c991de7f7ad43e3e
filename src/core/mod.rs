//! Event model, normalization, and collaborator seams.

pub mod config;
pub mod event;
pub mod listener;
pub mod normalize;
pub mod report;
pub mod traits;
