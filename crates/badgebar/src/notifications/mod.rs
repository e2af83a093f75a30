//! Notifications as the scheduler stores them, and the scheduler deciding which one is shown.

use std::num::NonZeroU32;

use itertools::Itertools;

use crate::{regex, util::truncate_to};

mod scheduler;
pub use scheduler::*;

pub const APP_NAME_MAX: usize = 31;
pub const SUMMARY_MAX: usize = 127;
pub const BODY_MAX: usize = 127;
/// Cap of the formatted text that ends up on the badge.
pub const DISPLAY_MAX: usize = 511;

/// Id of a notification, as handed out to bus clients. Never 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[display("{_0}")]
pub struct NotificationId(NonZeroU32);

impl NotificationId {
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

/// How long a notification stays around, derived from the timeout a client asked for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Expiry {
    /// Cycled through until explicitly closed.
    Permanent,
    /// Removed after this many seconds as head of the expiring queue.
    Expiring(f64),
}

impl Expiry {
    /// `0` means "never expire", negative values ("let the server decide") map to the default.
    pub fn from_timeout_ms(timeout: i32, default_timeout_ms: u32) -> Self {
        match timeout {
            0 => Expiry::Permanent,
            t if t < 0 => Expiry::Expiring(f64::from(default_timeout_ms) / 1000.0),
            t => Expiry::Expiring(f64::from(t) / 1000.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: NotificationId,
    pub app_name: String,
    pub summary: String,
    pub body: String,
    /// Seconds left before expiry. Unused for permanent notifications.
    pub time_remaining: f64,
}

impl Notification {
    fn new(id: NotificationId, app_name: &str, summary: &str, body: &str, time_remaining: f64) -> Self {
        Notification {
            id,
            app_name: sanitize(app_name, APP_NAME_MAX),
            summary: sanitize(summary, SUMMARY_MAX),
            body: sanitize(body, BODY_MAX),
            time_remaining,
        }
    }

    /// The text shown on the badge while this notification is displayed.
    pub fn display_text(&self) -> String {
        let mut text = format!("{} - {}: {}", self.app_name, self.summary, self.body);
        truncate_to(&mut text, DISPLAY_MAX);
        text
    }
}

/// Make client-provided text safe to show as a single line of literal text:
/// markup tags are dropped, basic entities decoded and whitespace runs folded into one space.
pub fn sanitize(text: &str, max_bytes: usize) -> String {
    let stripped = regex!(r"<[^>]*>").replace_all(text, "");
    let decoded = stripped
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&");
    let mut folded = decoded.split_whitespace().join(" ");
    truncate_to(&mut folded, max_bytes);
    folded
}
