//! crates/educonnect_core/src/notifications.rs
//!
//! Local notification badge and panel state.
//!
//! Server snapshots are authoritative on arrival: `apply_snapshot` replaces
//! the unread count and, when a list was fetched, the list itself. A snapshot
//! that was requested before a local mark-read but lands after it will show
//! the notification unread again until the next tick. Local transitions are
//! one-way (unread to read, present to removed).

use uuid::Uuid;

use crate::domain::Notification;

/// One poll result. `items` is only present when the panel was open.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NotificationSnapshot {
    pub unread_count: u64,
    pub items: Option<Vec<Notification>>,
}

#[derive(Debug, Clone, Default)]
pub struct NotificationState {
    unread_count: u64,
    items: Vec<Notification>,
    panel_open: bool,
}

impl NotificationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unread_count(&self) -> u64 {
        self.unread_count
    }

    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    pub fn panel_open(&self) -> bool {
        self.panel_open
    }

    pub fn set_panel_open(&mut self, open: bool) {
        self.panel_open = open;
    }

    pub fn apply_snapshot(&mut self, snapshot: NotificationSnapshot) {
        self.unread_count = snapshot.unread_count;
        if let Some(items) = snapshot.items {
            self.items = items;
        }
    }

    /// Returns whether the notification was unread before the call.
    pub fn mark_read(&mut self, id: Uuid) -> bool {
        let Some(item) = self.items.iter_mut().find(|n| n.id == id) else {
            return false;
        };
        if item.is_read {
            return false;
        }
        item.is_read = true;
        self.unread_count = self.unread_count.saturating_sub(1);
        true
    }

    pub fn mark_all_read(&mut self) {
        for item in &mut self.items {
            item.is_read = true;
        }
        self.unread_count = 0;
    }

    pub fn remove(&mut self, id: Uuid) -> Option<Notification> {
        let index = self.items.iter().position(|n| n.id == id)?;
        let removed = self.items.remove(index);
        if !removed.is_read {
            self.unread_count = self.unread_count.saturating_sub(1);
        }
        Some(removed)
    }
}
