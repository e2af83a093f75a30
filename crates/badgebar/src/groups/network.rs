use std::path::PathBuf;

use super::{allocate_badge, release, show, GroupKind};
use crate::{
    badges::{BadgeGroup, BadgeHandle, BadgePool, Quality},
    config::system_stats::{read_network, NetworkStatus},
};

#[derive(Debug)]
pub struct NetworkGroup {
    badge: Option<BadgeHandle>,
    net_dir: PathBuf,
    wireless_stats_file: PathBuf,
}

impl NetworkGroup {
    pub fn new(pool: &mut BadgePool, net_dir: PathBuf, wireless_stats_file: PathBuf) -> Self {
        NetworkGroup { badge: allocate_badge(pool, GroupKind::Network), net_dir, wireless_stats_file }
    }
}

/// An active VPN paints the badge gold and says so.
fn network_display(status: NetworkStatus) -> (String, Quality) {
    if status.vpn_active {
        (format!("{} VPN", status.display_text), Quality::Gold)
    } else {
        (status.display_text, status.quality)
    }
}

impl BadgeGroup for NetworkGroup {
    fn update(&mut self, pool: &mut BadgePool, _dt: f64) {
        let display = read_network(&self.net_dir, &self.wireless_stats_file).map(network_display);
        show(pool, self.badge, display.as_ref().map(|(text, quality)| (text.as_str(), *quality)));
    }

    fn cleanup(&mut self, pool: &mut BadgePool) {
        release(pool, &mut self.badge);
    }
}
