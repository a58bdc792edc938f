use std::collections::VecDeque;

use shared::{
    domain::{SequenceCatalog, SequenceId, Speed},
    protocol::DeviceStatus,
};

pub const DEFAULT_MAX_NOTIFICATIONS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotificationId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: NotificationId,
    pub message: String,
}

/// Insertion-ordered notification cards. Once `capacity` is reached the oldest card is evicted.
#[derive(Debug, Clone)]
pub struct NotificationList {
    items: VecDeque<Notification>,
    capacity: usize,
    next_id: u64,
}

impl NotificationList {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::new(),
            capacity: capacity.max(1),
            next_id: 1,
        }
    }

    /// Appends a card and returns it together with the card it displaced, if any.
    pub fn push(&mut self, message: impl Into<String>) -> (Notification, Option<Notification>) {
        let evicted = if self.items.len() >= self.capacity {
            self.items.pop_front()
        } else {
            None
        };

        let notification = Notification {
            id: NotificationId(self.next_id),
            message: message.into(),
        };
        self.next_id += 1;
        self.items.push_back(notification.clone());
        (notification, evicted)
    }

    pub fn dismiss(&mut self, id: NotificationId) -> Option<Notification> {
        let position = self.items.iter().position(|item| item.id == id)?;
        self.items.remove(position)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }
}

impl Default for NotificationList {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_NOTIFICATIONS)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelOptions {
    pub max_notifications: usize,
}

impl Default for PanelOptions {
    fn default() -> Self {
        Self {
            max_notifications: DEFAULT_MAX_NOTIFICATIONS,
        }
    }
}

/// Everything the panel shows. Owned by the controller and mutated only behind its lock.
#[derive(Debug)]
pub(crate) struct PanelState {
    pub(crate) catalog: SequenceCatalog,
    pub(crate) display: String,
    pub(crate) progress: u8,
    pub(crate) control_holds: u32,
    pub(crate) notifications: NotificationList,
    pub(crate) next_ticket: u64,
    pub(crate) rendered_ticket: u64,
}

impl PanelState {
    pub(crate) fn new(catalog: SequenceCatalog, options: PanelOptions) -> Self {
        Self {
            catalog,
            display: String::new(),
            progress: 0,
            control_holds: 0,
            notifications: NotificationList::new(options.max_notifications),
            next_ticket: 0,
            rendered_ticket: 0,
        }
    }

    pub(crate) fn controls_enabled(&self) -> bool {
        self.control_holds == 0
    }

    pub(crate) fn issue_ticket(&mut self) -> RenderTicket {
        self.next_ticket += 1;
        RenderTicket(self.next_ticket)
    }

    /// Applies `text` only if no request issued later has rendered already.
    pub(crate) fn render_if_fresh(&mut self, ticket: RenderTicket, text: String) -> bool {
        if ticket.0 <= self.rendered_ticket {
            return false;
        }
        self.rendered_ticket = ticket.0;
        self.display = text;
        true
    }

    pub(crate) fn snapshot(&self) -> PanelSnapshot {
        PanelSnapshot {
            display: self.display.clone(),
            progress: self.progress,
            controls_enabled: self.controls_enabled(),
            notifications: self.notifications.iter().cloned().collect(),
        }
    }
}

/// Issue order of a status-producing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct RenderTicket(pub(crate) u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelSnapshot {
    pub display: String,
    pub progress: u8,
    pub controls_enabled: bool,
    pub notifications: Vec<Notification>,
}

/// User's current picks on the panel. Values are forwarded to the device unvalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub sequence_id: SequenceId,
    pub speed: i64,
}

impl Selection {
    pub fn new(sequence_id: SequenceId, speed: Speed) -> Self {
        Self {
            sequence_id,
            speed: speed.millis(),
        }
    }
}

impl From<DeviceStatus> for Selection {
    fn from(status: DeviceStatus) -> Self {
        Self {
            sequence_id: status.sequence_id,
            speed: status.speed,
        }
    }
}
