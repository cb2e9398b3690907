//! Home screen panels.
//!
//! - `grid` - App grid bound to the icon cache
//! - `events` - Launcher event bus shared by panels and services

pub mod events;
pub mod grid;
