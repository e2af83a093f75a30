use std::process::Child;

use tokio::sync::watch;

use super::{allocate_badge, release, show, GroupKind};
use crate::{
    badges::{BadgeGroup, BadgeHandle, BadgePool},
    pulse::{self, AudioSnapshot},
};

/// Output volume. The badge only exists while there is at least one sink.
#[derive(Debug)]
pub struct AudioGroup {
    output_badge: Option<BadgeHandle>,
    snapshots: Option<watch::Receiver<AudioSnapshot>>,
    backend: Option<Child>,
}

impl AudioGroup {
    pub fn spawn() -> Self {
        match pulse::spawn_backend() {
            Ok((backend, snapshots)) => Self::with_snapshots(snapshots, Some(backend)),
            Err(e) => {
                log::error!("Audio is unavailable: {:?}", e);
                AudioGroup { output_badge: None, snapshots: None, backend: None }
            }
        }
    }

    pub fn with_snapshots(snapshots: watch::Receiver<AudioSnapshot>, backend: Option<Child>) -> Self {
        AudioGroup { output_badge: None, snapshots: Some(snapshots), backend }
    }

    fn apply(&mut self, pool: &mut BadgePool, snapshot: &AudioSnapshot) {
        if !snapshot.has_sink {
            if self.output_badge.is_some() {
                log::debug!("Last sink is gone, removing output badge");
            }
            release(pool, &mut self.output_badge);
            return;
        }
        if self.output_badge.is_none() {
            log::debug!("Creating output badge");
            self.output_badge = allocate_badge(pool, GroupKind::Audio);
        }
        show(pool, self.output_badge, Some((snapshot.text.as_str(), snapshot.quality)));
    }
}

impl BadgeGroup for AudioGroup {
    fn update(&mut self, pool: &mut BadgePool, _dt: f64) {
        let Some(snapshots) = &mut self.snapshots else { return };
        let snapshot = match snapshots.has_changed() {
            Ok(false) => return,
            Ok(true) => snapshots.borrow_and_update().clone(),
            Err(_) => {
                log::warn!("Audio backend stopped");
                self.snapshots = None;
                AudioSnapshot::default()
            }
        };
        self.apply(pool, &snapshot);
    }

    fn cleanup(&mut self, pool: &mut BadgePool) {
        if let Some(mut backend) = self.backend.take() {
            crate::print_result_err!("stopping pactl subscribe", backend.kill());
            crate::print_result_err!("waiting for pactl subscribe", backend.wait());
        }
        self.snapshots = None;
        release(pool, &mut self.output_badge);
    }
}
