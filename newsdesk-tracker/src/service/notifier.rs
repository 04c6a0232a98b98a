//! Notification sink
//!
//! User-visible messages emitted by the tracker. Delivery is fire-and-forget:
//! nothing in the tracker depends on a notification being seen.

use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info};

/// How a notification should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

impl Severity {
    /// How long a notification of this severity stays on screen by default
    pub fn default_duration(self) -> Duration {
        match self {
            Severity::Info => Duration::from_secs(2),
            Severity::Success => Duration::from_secs(3),
            Severity::Error => Duration::from_secs(5),
        }
    }
}

/// A user-visible message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
    /// Display hint; sinks are free to ignore it
    pub duration: Duration,
}

impl Notification {
    /// Creates a notification with the severity's default duration
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            duration: severity.default_duration(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Overrides the display duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

/// Sink for user-visible notifications
pub trait Notifier: Send + Sync {
    /// Emits a notification; must not block
    fn notify(&self, notification: Notification);
}

/// Notifier that writes every notification to the tracing log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Error => error!("{}", notification.message),
            Severity::Info | Severity::Success => info!("{}", notification.message),
        }
    }
}

/// Notifier that forwards notifications over an unbounded channel
///
/// The receiving side renders them; if it is gone, notifications are dropped.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    /// Creates a notifier and the receiver its notifications arrive on
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        let _ = self.tx.send(notification);
    }
}
