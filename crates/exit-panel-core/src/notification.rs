use std::time::Duration;

use serde::Serialize;

use crate::config::PanelConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPhase {
    Visible,
    Fading,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub phase: NotificationPhase,
}

/// Identifies the notification a pending timer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationTicket(u64);

/// Single-slot transient notification surface.
///
/// Lifecycle: visible for `display`, then fading for `fade`, then removed.
/// Showing a new message replaces the current one and invalidates the timers
/// scheduled for it.
#[derive(Debug, Clone)]
pub struct NotificationCenter {
    current: Option<Notification>,
    next_id: u64,
    display: Duration,
    fade: Duration,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        let config = PanelConfig::default();
        Self::new(config.notification_display, config.notification_fade)
    }
}

impl NotificationCenter {
    pub fn new(display: Duration, fade: Duration) -> Self {
        Self {
            current: None,
            next_id: 1,
            display,
            fade,
        }
    }

    pub fn from_config(config: &PanelConfig) -> Self {
        Self::new(config.notification_display, config.notification_fade)
    }

    pub fn display_duration(&self) -> Duration {
        self.display
    }

    pub fn fade_duration(&self) -> Duration {
        self.fade
    }

    pub fn current(&self) -> Option<&Notification> {
        self.current.as_ref()
    }

    pub fn show(&mut self, message: impl Into<String>) -> NotificationTicket {
        let id = self.next_id;
        self.next_id += 1;
        self.current = Some(Notification {
            id,
            message: message.into(),
            phase: NotificationPhase::Visible,
        });
        NotificationTicket(id)
    }

    /// Display window elapsed. Returns `false` when the ticket is stale.
    pub fn begin_fade(&mut self, ticket: NotificationTicket) -> bool {
        match self.current.as_mut() {
            Some(notification)
                if notification.id == ticket.0
                    && notification.phase == NotificationPhase::Visible =>
            {
                notification.phase = NotificationPhase::Fading;
                true
            }
            _ => false,
        }
    }

    /// Fade finished. Returns `false` when the ticket is stale.
    pub fn remove(&mut self, ticket: NotificationTicket) -> bool {
        if self
            .current
            .as_ref()
            .is_some_and(|notification| notification.id == ticket.0)
        {
            self.current = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_visible_fading_removed() {
        let mut center = NotificationCenter::default();
        let ticket = center.show("Switched to direct");
        assert_eq!(
            center.current().map(|n| n.phase),
            Some(NotificationPhase::Visible)
        );
        assert!(center.begin_fade(ticket));
        assert_eq!(
            center.current().map(|n| n.phase),
            Some(NotificationPhase::Fading)
        );
        assert!(center.remove(ticket));
        assert!(center.current().is_none());
        assert_eq!(center.display_duration(), Duration::from_millis(3_000));
        assert_eq!(center.fade_duration(), Duration::from_millis(500));
    }

    #[test]
    fn newer_notification_invalidates_old_timers() {
        let mut center = NotificationCenter::default();
        let first = center.show("first");
        let second = center.show("second");

        assert!(!center.begin_fade(first));
        assert!(!center.remove(first));
        assert_eq!(
            center.current().map(|n| n.message.as_str()),
            Some("second")
        );

        assert!(center.begin_fade(second));
        assert!(center.remove(second));
    }
}
