use std::{os::unix::net::UnixStream, path::Path};

use super::{allocate_badge, release, show, GroupKind};
use crate::{
    badges::{BadgeGroup, BadgeHandle, BadgePool, Quality},
    sway_ipc::{self, InputEvents},
};

/// Follows the keyboard layout sway reports.
#[derive(Debug)]
pub struct LayoutWatcher {
    events: InputEvents,
    layout: String,
}

impl LayoutWatcher {
    /// Ask sway for the current layout once, then subscribe to layout changes.
    pub fn connect(socket: &Path) -> sway_ipc::Result<Self> {
        let mut requests = UnixStream::connect(socket)?;
        let inputs = sway_ipc::request(&mut requests, sway_ipc::GET_INPUTS, b"")?;
        let inputs: Vec<sway_ipc::Input> = serde_json::from_slice(&inputs.payload)?;
        let layout = sway_ipc::keyboard_layout(&inputs).unwrap_or_default().to_string();
        Ok(LayoutWatcher { events: InputEvents::subscribe(socket)?, layout })
    }

    /// The active layout, after taking in every event that arrived since the last call.
    pub fn current_layout(&mut self) -> &str {
        for event in self.events.drain() {
            if !matches!(event.change.as_str(), "xkb_layout" | "xkb_keymap") {
                continue;
            }
            if let Some(layout) = sway_ipc::keyboard_layout(std::slice::from_ref(&event.input)) {
                log::debug!("Keyboard layout changed to {}", layout);
                self.layout = layout.to_string();
            }
        }
        &self.layout
    }
}

#[derive(Debug)]
pub struct KbdLayoutGroup {
    badge: Option<BadgeHandle>,
    watcher: Option<LayoutWatcher>,
}

impl KbdLayoutGroup {
    /// Without a sway session the group stays around but never shows anything.
    pub fn connect(pool: &mut BadgePool) -> Self {
        let watcher = sway_ipc::socket_path().and_then(|socket| LayoutWatcher::connect(&socket));
        match watcher {
            Ok(watcher) => Self::with_watcher(pool, watcher),
            Err(e) => {
                log::error!("Keyboard layout is unavailable: {}", e);
                KbdLayoutGroup { badge: None, watcher: None }
            }
        }
    }

    pub fn with_watcher(pool: &mut BadgePool, watcher: LayoutWatcher) -> Self {
        let mut group = KbdLayoutGroup { badge: allocate_badge(pool, GroupKind::KbdLayout), watcher: Some(watcher) };
        group.update(pool, 0.0);
        group
    }
}

impl BadgeGroup for KbdLayoutGroup {
    fn update(&mut self, pool: &mut BadgePool, _dt: f64) {
        let Some(watcher) = &mut self.watcher else { return };
        let layout = watcher.current_layout();
        show(pool, self.badge, (!layout.is_empty()).then_some((layout, Quality::Normal)));
        if watcher.events.is_closed() {
            log::warn!("Lost the sway IPC connection, keeping the last keyboard layout");
            self.watcher = None;
        }
    }

    fn cleanup(&mut self, pool: &mut BadgePool) {
        release(pool, &mut self.badge);
    }
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use super::*;
    use crate::sway_ipc::{encode_frame, EVENT_INPUT};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_layout_follows_events() {
        let (client, mut server) = UnixStream::pair().unwrap();
        let watcher = LayoutWatcher { events: InputEvents::from_stream(client).unwrap(), layout: "English (US)".to_string() };
        let mut pool = BadgePool::default();
        let mut group = KbdLayoutGroup::with_watcher(&mut pool, watcher);
        let index = group.badge.unwrap().index();
        assert_eq!(Some("English (US)"), pool.text_at(index));

        let other_change = br#"{"change": "added", "input": {"type": "keyboard", "xkb_active_layout_name": "Dvorak"}}"#;
        server.write_all(&encode_frame(EVENT_INPUT, other_change)).unwrap();
        group.update(&mut pool, 0.1);
        assert_eq!(Some("English (US)"), pool.text_at(index));

        let layout_change = br#"{"change": "xkb_layout", "input": {"type": "keyboard", "xkb_active_layout_name": "German"}}"#;
        server.write_all(&encode_frame(EVENT_INPUT, layout_change)).unwrap();
        group.update(&mut pool, 0.1);
        assert_eq!(Some("German"), pool.text_at(index));

        group.cleanup(&mut pool);
        assert_eq!(0, pool.live_count());
    }

    #[test]
    fn test_lost_connection_keeps_last_layout() {
        let (client, mut server) = UnixStream::pair().unwrap();
        let watcher = LayoutWatcher { events: InputEvents::from_stream(client).unwrap(), layout: "English (US)".to_string() };
        let mut pool = BadgePool::default();
        let mut group = KbdLayoutGroup::with_watcher(&mut pool, watcher);
        let index = group.badge.unwrap().index();

        let layout_change = br#"{"change": "xkb_keymap", "input": {"type": "keyboard", "xkb_active_layout_name": "French"}}"#;
        server.write_all(&encode_frame(EVENT_INPUT, layout_change)).unwrap();
        drop(server);
        group.update(&mut pool, 0.1);
        assert!(group.watcher.is_none());
        assert_eq!(Some("French"), pool.text_at(index));

        group.update(&mut pool, 0.1);
        assert_eq!(Some("French"), pool.text_at(index));
    }
}
