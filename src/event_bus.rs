//! Event bus for cross-thread communication.
//!
//! Background services (catalog scans, icon loads) publish on a tokio
//! broadcast channel; the home screen drains it in batches.
//!
//! Event types live in panels/events.rs.

/// Broadcast channel capacity.
/// Lagging receivers skip old events; icon events are idempotent refresh
/// hints so losing some is harmless.
pub const CHANNEL_CAPACITY: usize = 64;
