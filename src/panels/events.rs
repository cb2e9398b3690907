//! Home screen event definitions and broadcast event bus.
//!
//! Uses tokio::sync::broadcast so every subscriber receives every event.

use crate::event_bus::CHANNEL_CAPACITY;
use std::sync::OnceLock;
use tokio::sync::broadcast::{self, Receiver, Sender};

/// Events from background services that the home screen reacts to.
#[derive(Clone, Debug, PartialEq)]
pub enum LauncherEvent {
    /// A grid icon finished rendering; redraw cells showing this package.
    IconReady(String),
    /// Rendering failed; the cell keeps its placeholder.
    IconFailed(String),
    /// The installed app catalog was rescanned.
    CatalogRefreshed { app_count: usize },
    /// A grid slot was assigned a new app.
    SlotChanged(usize),
}

impl LauncherEvent {
    /// Key used to collapse repeated events when draining.
    fn dedup_key(&self) -> (u8, Option<&str>, Option<usize>) {
        match self {
            LauncherEvent::IconReady(key) => (0, Some(key.as_str()), None),
            LauncherEvent::IconFailed(key) => (1, Some(key.as_str()), None),
            LauncherEvent::CatalogRefreshed { .. } => (2, None, None),
            LauncherEvent::SlotChanged(position) => (3, None, Some(*position)),
        }
    }
}

// Static broadcast sender - subscribers get their own receiver via subscribe()
static LAUNCHER_SENDER: OnceLock<Sender<LauncherEvent>> = OnceLock::new();

fn get_sender() -> &'static Sender<LauncherEvent> {
    LAUNCHER_SENDER.get_or_init(|| {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        tx
    })
}

/// Send an event to every subscriber. Non-blocking.
/// If nobody is subscribed the event is dropped.
#[inline]
pub fn send(event: LauncherEvent) {
    let _ = get_sender().send(event);
}

#[inline]
pub fn send_icon_ready(key: &str) {
    send(LauncherEvent::IconReady(key.to_string()));
}

#[inline]
pub fn send_icon_failed(key: &str) {
    send(LauncherEvent::IconFailed(key.to_string()));
}

/// Subscribe to the event bus.
pub fn subscribe() -> Receiver<LauncherEvent> {
    get_sender().subscribe()
}

/// Drain all pending events, keeping only the latest of each distinct event.
/// Handles RecvError::Lagged by continuing to drain.
pub fn drain_latest(rx: &mut Receiver<LauncherEvent>) -> Vec<LauncherEvent> {
    let mut events = Vec::new();

    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(broadcast::error::TryRecvError::Empty) => break,
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(broadcast::error::TryRecvError::Closed) => break,
        }
    }

    if events.len() <= 1 {
        return events;
    }

    let mut result: Vec<LauncherEvent> = Vec::with_capacity(events.len());
    for event in events.into_iter().rev() {
        if !result.iter().any(|seen| seen.dedup_key() == event.dedup_key()) {
            result.push(event);
        }
    }

    result.reverse();
    result
}
