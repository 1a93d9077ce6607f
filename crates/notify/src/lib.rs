//! Notification system for Repsignal monitoring events.
//!
//! This crate dispatches content-alert events to in-process listeners
//! (the status panel, audible cues) and to outbound channels (webhooks)
//! in a fire-and-forget manner.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use notify::{NotifyEvent, Notifier, Severity};
//!
//! let notifier = Notifier::from_env();
//!
//! let handle = notifier.register(Arc::new(|event: &NotifyEvent| {
//!     println!("{}", event.title());
//! }));
//!
//! notifier.dispatch(&NotifyEvent::AlertDetected {
//!     alert_id: "a1".to_string(),
//!     entity: "Acme Corp".to_string(),
//!     platform: "reddit".to_string(),
//!     severity: Severity::Warning,
//!     preview: "negative thread gaining traction".to_string(),
//!     timestamp: chrono::Utc::now(),
//! });
//!
//! notifier.unregister(handle);
//! ```
//!
//! # Delivery contract
//!
//! - When enabled, each alert id is surfaced at most once for the lifetime
//!   of the dispatcher, to every registered listener, in registration order.
//! - When disabled, nothing fires; re-enabling does not replay events that
//!   were dispatched while disabled.
//! - Registering a listener does not back-deliver previously surfaced
//!   events.
//! - Audible cue playback failures are logged and swallowed.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod channels;
pub mod error;
pub mod events;

pub use channels::webhook::WebhookChannel;
pub use channels::NotifyChannel;
pub use error::{ChannelError, CueError};
pub use events::{CueKind, NotifyEvent, Severity};

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, info, warn};

/// Environment variable to disable all notifications.
const ENV_NOTIFY_DISABLED: &str = "NOTIFY_DISABLED";

/// Opaque handle returned by [`Notifier::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle(u64);

/// Trait for in-process alert listeners.
///
/// Implemented for any `Fn(&NotifyEvent)` closure, so UI hooks can be
/// registered without a dedicated type.
pub trait AlertListener: Send + Sync {
    /// Called once per surfaced event, in registration order.
    fn on_event(&self, event: &NotifyEvent);
}

impl<F> AlertListener for F
where
    F: Fn(&NotifyEvent) + Send + Sync,
{
    fn on_event(&self, event: &NotifyEvent) {
        self(event);
    }
}

/// Trait for audible cue backends.
pub trait CuePlayer: Send + Sync {
    /// Play the cue for an event. Failures are swallowed by the dispatcher.
    fn play(&self, cue: CueKind) -> Result<(), CueError>;
}

/// Central notification dispatcher.
///
/// The `Notifier` delivers events to registered listeners synchronously
/// and fans out to outbound channels as spawned fire-and-forget tasks.
/// Events carrying an alert id are deduplicated for the lifetime of the
/// dispatcher.
pub struct Notifier {
    listeners: Mutex<Vec<(ListenerHandle, Arc<dyn AlertListener>)>>,
    surfaced: Mutex<HashSet<String>>,
    enabled: AtomicBool,
    next_handle: AtomicU64,
    channels: Vec<Arc<dyn NotifyChannel>>,
    cue_player: Option<Arc<dyn CuePlayer>>,
}

impl Notifier {
    /// Create an enabled notifier with no outbound channels.
    #[must_use]
    pub fn new() -> Self {
        Self::with_channels(vec![])
    }

    /// Create a new notifier from environment variables.
    ///
    /// Auto-detects which outbound channels are configured and enables
    /// them accordingly. `NOTIFY_DISABLED=true` starts the dispatcher in
    /// the disabled state.
    #[must_use]
    pub fn from_env() -> Self {
        let disabled = std::env::var(ENV_NOTIFY_DISABLED)
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false);

        let mut channels: Vec<Arc<dyn NotifyChannel>> = vec![];

        let webhook = WebhookChannel::from_env();
        if webhook.enabled() {
            info!("Webhook notifications enabled");
            channels.push(Arc::new(webhook));
        }

        if channels.is_empty() {
            debug!("No outbound notification channels configured");
        } else {
            info!(
                channel_count = channels.len(),
                "Notification system initialized"
            );
        }

        let notifier = Self::with_channels(channels);
        if disabled {
            info!("Notifications disabled via NOTIFY_DISABLED");
            notifier.set_enabled(false);
        }
        notifier
    }

    /// Create a notifier with specific outbound channels.
    #[must_use]
    pub fn with_channels(channels: Vec<Arc<dyn NotifyChannel>>) -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
            surfaced: Mutex::new(HashSet::new()),
            enabled: AtomicBool::new(true),
            next_handle: AtomicU64::new(1),
            channels,
            cue_player: None,
        }
    }

    /// Attach an audible cue backend.
    #[must_use]
    pub fn with_cue_player(mut self, player: Arc<dyn CuePlayer>) -> Self {
        self.cue_player = Some(player);
        self
    }

    /// Register a listener. Returns a handle for [`Self::unregister`].
    ///
    /// The listener only receives events surfaced after registration.
    pub fn register(&self, listener: Arc<dyn AlertListener>) -> ListenerHandle {
        let handle = ListenerHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((handle, listener));
        handle
    }

    /// Remove a listener. Returns false if the handle was not registered.
    pub fn unregister(&self, handle: ListenerHandle) -> bool {
        let mut listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(h, _)| *h != handle);
        listeners.len() != before
    }

    /// Toggle event delivery. Alerts arriving while disabled are not
    /// replayed on re-enable.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Check whether delivery is currently enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Check if any outbound channels are configured.
    #[must_use]
    pub fn has_channels(&self) -> bool {
        !self.channels.is_empty()
    }

    /// Get the number of outbound channels.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Dispatch an event to listeners and outbound channels.
    ///
    /// Returns true if the event was surfaced. Events are dropped (false)
    /// when the dispatcher is disabled or when the event's alert id has
    /// already been surfaced.
    pub fn dispatch(&self, event: &NotifyEvent) -> bool {
        if !self.is_enabled() {
            debug!(title = %event.title(), "Notifications disabled, skipping event");
            return false;
        }

        if let Some(id) = event.alert_id() {
            let mut surfaced = self
                .surfaced
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if !surfaced.insert(id.to_string()) {
                debug!(alert_id = id, "Alert already surfaced, skipping");
                return false;
            }
        }

        if let Some(player) = &self.cue_player {
            if let Err(e) = player.play(event.severity().cue()) {
                warn!(error = %e, "Audible cue failed");
            }
        }

        // Snapshot under the lock so listener callbacks run without it.
        let listeners: Vec<Arc<dyn AlertListener>> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();

        for listener in listeners {
            listener.on_event(event);
        }

        if !self.channels.is_empty() {
            let shared = Arc::new(event.clone());
            for channel in &self.channels {
                let channel = Arc::clone(channel);
                let event = Arc::clone(&shared);

                tokio::spawn(async move {
                    let channel_name = channel.name();

                    if !channel.enabled() {
                        debug!(channel = channel_name, "Channel disabled, skipping");
                        return;
                    }

                    match channel.send(&event).await {
                        Ok(()) => {
                            debug!(channel = channel_name, "Notification sent");
                        }
                        Err(e) => {
                            error!(
                                channel = channel_name,
                                error = %e,
                                "Failed to send notification"
                            );
                        }
                    }
                });
            }
        }

        true
    }

    /// Send an event to all channels and wait for delivery results.
    ///
    /// Unlike `dispatch()`, this bypasses listeners and dedup and collects
    /// per-channel errors. Useful for tests and one-shot CLI sends.
    pub async fn dispatch_and_wait(
        &self,
        event: &NotifyEvent,
    ) -> Vec<(String, Result<(), ChannelError>)> {
        let mut results = vec![];

        for channel in &self.channels {
            let channel_name = channel.name().to_string();
            let result = channel.send(event).await;
            results.push((channel_name, result));
        }

        results
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn alert(id: &str, severity: Severity) -> NotifyEvent {
        NotifyEvent::AlertDetected {
            alert_id: id.to_string(),
            entity: "Acme Corp".to_string(),
            platform: "reddit".to_string(),
            severity,
            preview: "preview".to_string(),
            timestamp: chrono::Utc::now(),
        }
    }

    struct RecordingCue {
        cues: Mutex<Vec<CueKind>>,
    }

    impl CuePlayer for RecordingCue {
        fn play(&self, cue: CueKind) -> Result<(), CueError> {
            self.cues.lock().unwrap().push(cue);
            Ok(())
        }
    }

    struct BrokenCue;

    impl CuePlayer for BrokenCue {
        fn play(&self, _cue: CueKind) -> Result<(), CueError> {
            Err(CueError("audio device unavailable".to_string()))
        }
    }

    #[test]
    fn test_alert_surfaced_at_most_once() {
        let notifier = Notifier::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        notifier.register(Arc::new(move |_: &NotifyEvent| {
            c.fetch_add(1, Ordering::SeqCst);
        }));

        assert!(notifier.dispatch(&alert("a1", Severity::Info)));
        assert!(!notifier.dispatch(&alert("a1", Severity::Info)));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_listeners_fire_in_registration_order() {
        let notifier = Notifier::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in 1..=3u32 {
            let order = Arc::clone(&order);
            notifier.register(Arc::new(move |_: &NotifyEvent| {
                order.lock().unwrap().push(tag);
            }));
        }

        notifier.dispatch(&alert("a1", Severity::Info));
        assert_eq!(*order.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_late_registrant_gets_no_back_delivery() {
        let notifier = Notifier::new();
        notifier.dispatch(&alert("a1", Severity::Info));
        notifier.dispatch(&alert("a2", Severity::Info));

        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        notifier.register(Arc::new(move |_: &NotifyEvent| {
            c.fetch_add(1, Ordering::SeqCst);
        }));

        notifier.dispatch(&alert("a3", Severity::Info));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unregister_stops_delivery() {
        let notifier = Notifier::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let handle = notifier.register(Arc::new(move |_: &NotifyEvent| {
            c.fetch_add(1, Ordering::SeqCst);
        }));

        notifier.dispatch(&alert("a1", Severity::Info));
        assert!(notifier.unregister(handle));
        assert!(!notifier.unregister(handle));
        notifier.dispatch(&alert("a2", Severity::Info));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_disabled_dispatch_is_dropped_without_replay() {
        let notifier = Notifier::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        notifier.register(Arc::new(move |_: &NotifyEvent| {
            c.fetch_add(1, Ordering::SeqCst);
        }));

        notifier.set_enabled(false);
        assert!(!notifier.dispatch(&alert("a1", Severity::Info)));
        assert_eq!(count.load(Ordering::SeqCst), 0);

        // Re-enabling does not replay a1; it was dropped, not queued.
        notifier.set_enabled(true);
        notifier.dispatch(&alert("a2", Severity::Info));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cue_classified_by_severity() {
        let cue = Arc::new(RecordingCue {
            cues: Mutex::new(Vec::new()),
        });
        let notifier = Notifier::new().with_cue_player(Arc::clone(&cue) as Arc<dyn CuePlayer>);

        notifier.dispatch(&alert("a1", Severity::Critical));
        notifier.dispatch(&alert("a2", Severity::Info));

        assert_eq!(*cue.cues.lock().unwrap(), vec![CueKind::Alarm, CueKind::Chime]);
    }

    #[test]
    fn test_cue_failure_is_swallowed() {
        let notifier = Notifier::new().with_cue_player(Arc::new(BrokenCue));
        assert!(notifier.dispatch(&alert("a1", Severity::Critical)));
    }

    #[test]
    fn test_scan_events_are_not_deduplicated() {
        let notifier = Notifier::new();
        let event = NotifyEvent::ScanCompleted {
            entity: "Acme Corp".to_string(),
            fetched: 1,
            stored: 1,
            timestamp: chrono::Utc::now(),
        };
        assert!(notifier.dispatch(&event));
        assert!(notifier.dispatch(&event));
    }
}
