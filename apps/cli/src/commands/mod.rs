//! Command implementations for the Wayfare CLI.

pub mod create;
pub mod event_renderer;
pub mod plan;
pub mod show;
