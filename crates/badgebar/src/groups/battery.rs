use std::path::PathBuf;

use super::{allocate_badge, release, show, GroupKind};
use crate::{
    badges::{BadgeGroup, BadgeHandle, BadgePool, Quality},
    config::system_stats::{read_battery, BatteryStatus},
};

#[derive(Debug)]
pub struct BatteryGroup {
    badge: Option<BadgeHandle>,
    power_supply_dir: PathBuf,
    low_threshold: u8,
}

impl BatteryGroup {
    pub fn new(pool: &mut BadgePool, power_supply_dir: PathBuf, low_threshold: u8) -> Self {
        BatteryGroup { badge: allocate_badge(pool, GroupKind::Battery), power_supply_dir, low_threshold }
    }
}

fn battery_display(status: BatteryStatus, low_threshold: u8) -> Option<(String, Quality)> {
    match status {
        BatteryStatus::Charging => Some(("Charging".to_string(), Quality::Normal)),
        BatteryStatus::Capacity(capacity) => {
            let quality = if capacity < low_threshold { Quality::Error } else { Quality::Normal };
            Some((format!("BAT {}%", capacity), quality))
        }
        BatteryStatus::Unknown => None,
    }
}

impl BadgeGroup for BatteryGroup {
    fn update(&mut self, pool: &mut BadgePool, _dt: f64) {
        let display = battery_display(read_battery(&self.power_supply_dir), self.low_threshold);
        show(pool, self.badge, display.as_ref().map(|(text, quality)| (text.as_str(), *quality)));
    }

    fn cleanup(&mut self, pool: &mut BadgePool) {
        release(pool, &mut self.badge);
    }
}
