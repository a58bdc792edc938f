//! Terminal rendering of panel events.

use client_core::{Notification, PanelEvent, PanelSnapshot, PROGRESS_MAX};

const BAR_WIDTH: usize = 20;

pub fn progress_bar(progress: u8) -> String {
    let progress = progress.min(PROGRESS_MAX);
    let filled = usize::from(progress) * BAR_WIDTH / usize::from(PROGRESS_MAX);
    format!(
        "[{}{}] {progress:>3}%",
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH - filled)
    )
}

pub fn notification_line(notification: &Notification) -> String {
    format!("  ({}) {}", notification.id.0, notification.message)
}

/// One terminal line per event. Progress lines are meant to overwrite each other in place.
pub fn event_line(event: &PanelEvent) -> Option<String> {
    match event {
        PanelEvent::DisplayChanged(text) => Some(format!("current: {text}")),
        PanelEvent::ProgressChanged(progress) => Some(progress_bar(*progress)),
        PanelEvent::ControlsChanged { enabled: true } => Some("controls ready".to_string()),
        PanelEvent::ControlsChanged { enabled: false } => None,
        PanelEvent::NotificationAdded(notification) => {
            Some(format!("notice{}", notification_line(notification)))
        }
        PanelEvent::NotificationRemoved(_) => None,
    }
}

pub fn snapshot_lines(snapshot: &PanelSnapshot) -> Vec<String> {
    let mut lines = vec![
        format!("current: {}", snapshot.display),
        progress_bar(snapshot.progress),
        format!(
            "controls: {}",
            if snapshot.controls_enabled {
                "ready"
            } else {
                "busy"
            }
        ),
    ];
    if snapshot.notifications.is_empty() {
        lines.push("no notifications".to_string());
    } else {
        lines.extend(snapshot.notifications.iter().map(notification_line));
    }
    lines
}

#[cfg(test)]
mod tests {
    use client_core::NotificationId;

    use super::*;

    #[test]
    fn progress_bar_scales_to_width() {
        assert_eq!(progress_bar(0), format!("[{}]   0%", ".".repeat(20)));
        assert_eq!(
            progress_bar(50),
            format!("[{}{}]  50%", "#".repeat(10), ".".repeat(10))
        );
        assert_eq!(progress_bar(250), format!("[{}] 100%", "#".repeat(20)));
    }

    #[test]
    fn hides_internal_events() {
        assert!(event_line(&PanelEvent::ControlsChanged { enabled: false }).is_none());
        assert!(event_line(&PanelEvent::NotificationRemoved(NotificationId(1))).is_none());
        assert_eq!(
            event_line(&PanelEvent::DisplayChanged("ON | Fast".to_string())).as_deref(),
            Some("current: ON | Fast")
        );
    }

    #[test]
    fn snapshot_lists_notifications_with_ids() {
        let snapshot = PanelSnapshot {
            display: "Lost connection...".to_string(),
            progress: 35,
            controls_enabled: false,
            notifications: vec![Notification {
                id: NotificationId(3),
                message: "Invalid command: reboot".to_string(),
            }],
        };
        let lines = snapshot_lines(&snapshot);
        assert_eq!(lines[0], "current: Lost connection...");
        assert_eq!(lines[2], "controls: busy");
        assert_eq!(lines[3], "  (3) Invalid command: reboot");
    }
}
