use super::{allocate_badge, release, show, GroupKind};
use crate::{
    badges::{BadgeGroup, BadgeHandle, BadgePool, Quality},
    config::system_stats::{read_cpu_temp, read_load_1min},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadThresholds {
    /// Load above which the badge is shown at all.
    pub noteworthy: f64,
    /// Load from which the badge turns red.
    pub high: f64,
    /// CPU temperature in °C above which it is shown, in red.
    pub temperature_high: f32,
}

/// Shows the load average, but only while the machine is busy. The badge is created the first
/// time the load is noteworthy and then kept around, hidden while the load is low.
#[derive(Debug)]
pub struct LoadGroup {
    badge: Option<BadgeHandle>,
    thresholds: LoadThresholds,
}

impl LoadGroup {
    pub fn new(thresholds: LoadThresholds) -> Self {
        LoadGroup { badge: None, thresholds }
    }

    fn on_load(&mut self, pool: &mut BadgePool, load: f64, temperature: Option<f32>) {
        let display = load_display(&self.thresholds, load, temperature);
        if display.is_some() && self.badge.is_none() {
            self.badge = allocate_badge(pool, GroupKind::Load);
        }
        show(pool, self.badge, display.as_ref().map(|(text, quality)| (text.as_str(), *quality)));
    }
}

fn load_display(thresholds: &LoadThresholds, load: f64, temperature: Option<f32>) -> Option<(String, Quality)> {
    if load <= thresholds.noteworthy {
        return None;
    }
    let mut text = format!("LOAD {:.2}", load);
    let mut quality = if load >= thresholds.high { Quality::Error } else { Quality::Normal };
    if let Some(temperature) = temperature.filter(|temperature| *temperature > thresholds.temperature_high) {
        text.push_str(&format!(" {:.0}°C", temperature));
        quality = Quality::Error;
    }
    Some((text, quality))
}

impl BadgeGroup for LoadGroup {
    fn update(&mut self, pool: &mut BadgePool, _dt: f64) {
        match read_load_1min() {
            Some(load) => self.on_load(pool, load, read_cpu_temp()),
            None => log::debug!("System load is unknown"),
        }
    }

    fn cleanup(&mut self, pool: &mut BadgePool) {
        release(pool, &mut self.badge);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    const THRESHOLDS: LoadThresholds = LoadThresholds { noteworthy: 0.6, high: 1.0, temperature_high: 80.0 };

    #[test]
    fn test_load_display() {
        assert_eq!(None, load_display(&THRESHOLDS, 0.6, None));
        assert_eq!(Some(("LOAD 0.75".to_string(), Quality::Normal)), load_display(&THRESHOLDS, 0.75, Some(50.0)));
        assert_eq!(Some(("LOAD 1.00".to_string(), Quality::Error)), load_display(&THRESHOLDS, 1.0, None));
        assert_eq!(Some(("LOAD 0.70 85°C".to_string(), Quality::Error)), load_display(&THRESHOLDS, 0.7, Some(85.2)));
    }

    #[test]
    fn test_badge_is_created_lazily_and_kept() {
        let mut pool = BadgePool::default();
        let mut group = LoadGroup::new(THRESHOLDS);

        group.on_load(&mut pool, 0.2, None);
        assert_eq!(0, pool.live_count());

        group.on_load(&mut pool, 1.5, None);
        let handle = group.badge.unwrap();
        assert_eq!(Some("LOAD 1.50"), pool.text_at(handle.index()));
        assert_eq!(Some(Quality::Error.palette()), pool.colors_at(handle.index()));

        group.on_load(&mut pool, 0.1, None);
        assert_eq!(Some(handle), group.badge);
        assert!(!pool.get(handle).unwrap().anim.target_visible);

        group.cleanup(&mut pool);
        assert_eq!(0, pool.live_count());
    }
}
