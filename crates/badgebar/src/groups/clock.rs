use chrono::{
    format::{Item, StrftimeItems},
    Local, NaiveDateTime,
};

use super::{allocate_badge, release, show, GroupKind};
use crate::badges::{BadgeGroup, BadgeHandle, BadgePool, Quality};

const FALLBACK_FORMAT: &str = "%D %l:%M%p";

/// Always visible badge with the local time.
#[derive(Debug)]
pub struct ClockGroup {
    badge: Option<BadgeHandle>,
    items: Vec<Item<'static>>,
}

impl ClockGroup {
    pub fn new(pool: &mut BadgePool, format: &str) -> Self {
        let items = parse_format(format).unwrap_or_else(|| {
            log::error!("Invalid clock format {:?}, using {:?}", format, FALLBACK_FORMAT);
            parse_format(FALLBACK_FORMAT).unwrap_or_default()
        });
        let mut group = ClockGroup { badge: allocate_badge(pool, GroupKind::Clock), items };
        group.update(pool, 0.0);
        group
    }
}

/// Owned strftime items, or `None` if the format contains an invalid specifier.
fn parse_format(format: &str) -> Option<Vec<Item<'static>>> {
    StrftimeItems::new(format)
        .map(|item| match item {
            Item::Error => None,
            other => Some(Item::to_owned(other)),
        })
        .collect()
}

fn format_time(time: &NaiveDateTime, items: &[Item<'static>]) -> String {
    time.format_with_items(items.iter()).to_string().trim().to_string()
}

impl BadgeGroup for ClockGroup {
    fn update(&mut self, pool: &mut BadgePool, _dt: f64) {
        let text = format_time(&Local::now().naive_local(), &self.items);
        show(pool, self.badge, Some((text.as_str(), Quality::Normal)));
    }

    fn cleanup(&mut self, pool: &mut BadgePool) {
        release(pool, &mut self.badge);
    }
}
