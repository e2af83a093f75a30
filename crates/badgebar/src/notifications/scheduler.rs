use std::{collections::VecDeque, num::NonZeroU32};

use badgebar_dbus::CloseReason;

use super::{Expiry, Notification, NotificationId};

/// Seconds each permanent notification stays on screen before the next one is shown.
pub const DEFAULT_CYCLE_INTERVAL: f64 = 10.0;

/// Multiplexes any number of notifications onto a single display slot.
///
/// Expiring notifications are shown one at a time in arrival order, and only the head of their
/// queue counts down. While none are queued, the permanent notifications take turns, switching
/// every cycle interval.
#[derive(Debug, Clone)]
pub struct Scheduler {
    permanent: VecDeque<Notification>,
    expiring: VecDeque<Notification>,
    /// Index into `permanent` of the notification whose turn it is.
    current: Option<usize>,
    cycle_interval: f64,
    cycle_timer: f64,
    next_id: u32,
    displayed: Option<NotificationId>,
    removed: Vec<(NotificationId, CloseReason)>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(DEFAULT_CYCLE_INTERVAL)
    }
}

impl Scheduler {
    pub fn new(cycle_interval: f64) -> Self {
        Scheduler {
            permanent: VecDeque::new(),
            expiring: VecDeque::new(),
            current: None,
            cycle_interval,
            cycle_timer: cycle_interval,
            next_id: 1,
            displayed: None,
            removed: Vec::new(),
        }
    }

    fn generate_id(&mut self) -> NotificationId {
        let id = NonZeroU32::new(self.next_id).unwrap_or(NonZeroU32::MIN);
        self.next_id = self.next_id.wrapping_add(1).max(1);
        NotificationId(id)
    }

    /// Store a new notification and return its freshly generated id.
    pub fn notify(&mut self, app_name: &str, summary: &str, body: &str, expiry: Expiry) -> NotificationId {
        let id = self.generate_id();
        match expiry {
            Expiry::Permanent => {
                self.permanent.push_back(Notification::new(id, app_name, summary, body, 0.0));
                if self.current.is_none() {
                    self.current = Some(self.permanent.len() - 1);
                }
            }
            Expiry::Expiring(seconds) => {
                self.expiring.push_back(Notification::new(id, app_name, summary, body, seconds));
            }
        }
        log::debug!("Stored notification {} ({:?})", id, expiry);
        id
    }

    /// Remove the notification with the given id from whichever queue holds it.
    /// Returns `false` if there is none, which is always the case for id 0.
    pub fn close(&mut self, id: u32) -> bool {
        if id == 0 {
            return false;
        }

        if let Some(pos) = self.permanent.iter().position(|n| n.id.get() == id) {
            if let Some(removed) = self.permanent.remove(pos) {
                self.removed.push((removed.id, CloseReason::Closed));
            }
            self.current = match self.current {
                Some(current) if current == pos => {
                    if self.permanent.is_empty() {
                        None
                    } else if pos < self.permanent.len() {
                        Some(pos)
                    } else {
                        Some(0)
                    }
                }
                Some(current) if current > pos => Some(current - 1),
                other => other,
            };
            return true;
        }

        if let Some(pos) = self.expiring.iter().position(|n| n.id.get() == id) {
            if let Some(removed) = self.expiring.remove(pos) {
                self.removed.push((removed.id, CloseReason::Closed));
            }
            return true;
        }

        false
    }

    /// Dismiss the oldest permanent notification and refresh the display right away.
    pub fn pop_top(&mut self) {
        if let Some(head) = self.permanent.pop_front() {
            self.current = match self.current {
                None | Some(0) => None,
                Some(current) => Some(current - 1),
            };
            self.removed.push((head.id, CloseReason::Dismissed));
        }
        self.tick(0.0);
    }

    /// Let `dt` seconds pass and decide what is displayed now.
    pub fn tick(&mut self, dt: f64) {
        if let Some(head) = self.expiring.front_mut() {
            head.time_remaining -= dt;
            if head.time_remaining <= 0.0 {
                if let Some(expired) = self.expiring.pop_front() {
                    self.removed.push((expired.id, CloseReason::Expired));
                }
            }
        }

        self.displayed = match self.expiring.front() {
            Some(head) => Some(head.id),
            None => {
                self.cycle_timer -= dt;
                if self.cycle_timer <= 0.0 {
                    self.current = match self.current {
                        _ if self.permanent.is_empty() => None,
                        Some(current) => Some((current + 1) % self.permanent.len()),
                        None => Some(0),
                    };
                    self.cycle_timer = self.cycle_interval;
                }
                self.current.and_then(|current| self.permanent.get(current)).map(|n| n.id)
            }
        };
    }

    /// The notification chosen by the last [`Scheduler::tick`], if it still exists.
    pub fn displayed(&self) -> Option<&Notification> {
        let id = self.displayed?;
        self.expiring.iter().chain(self.permanent.iter()).find(|n| n.id == id)
    }

    /// The permanent notification whose turn it is.
    #[cfg(test)]
    pub fn current(&self) -> Option<&Notification> {
        self.current.and_then(|current| self.permanent.get(current))
    }

    #[cfg(test)]
    pub fn permanent(&self) -> impl Iterator<Item = &Notification> {
        self.permanent.iter()
    }

    #[cfg(test)]
    pub fn expiring(&self) -> impl Iterator<Item = &Notification> {
        self.expiring.iter()
    }

    /// Hand out the notifications removed since the last call, with the reason for each removal.
    pub fn take_removed(&mut self) -> Vec<(NotificationId, CloseReason)> {
        std::mem::take(&mut self.removed)
    }
}
