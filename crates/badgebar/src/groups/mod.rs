//! The provider groups: every source of badges the bar knows about.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::{
    badges::{BadgeGroup, BadgeHandle, BadgePool, Engine, Quality},
    config::BarConfig,
};

pub mod audio;
pub mod battery;
pub mod clock;
pub mod external;
pub mod kbd_layout;
pub mod load;
pub mod network;
pub mod notifications;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GroupKind {
    Clock,
    Battery,
    Network,
    KbdLayout,
    Load,
    Audio,
    Notifications,
    External,
}

/// What a group may need while it is being set up.
#[derive(Debug, Clone)]
pub struct SetupContext<'a> {
    pub config: &'a BarConfig,
    /// Runtime the bus services are served on.
    pub runtime: tokio::runtime::Handle,
}

impl GroupKind {
    /// Every group, in the order they are laid out on the bar by default.
    pub fn default_order() -> Vec<GroupKind> {
        GroupKind::iter().collect()
    }

    pub fn setup(self, ctx: &SetupContext, pool: &mut BadgePool) -> Box<dyn BadgeGroup> {
        let config = ctx.config;
        match self {
            GroupKind::Clock => Box::new(clock::ClockGroup::new(pool, &config.clock_format)),
            GroupKind::Battery => {
                Box::new(battery::BatteryGroup::new(pool, config.power_supply_dir.clone(), config.battery_low_threshold))
            }
            GroupKind::Network => {
                Box::new(network::NetworkGroup::new(pool, config.net_dir.clone(), config.wireless_stats_file.clone()))
            }
            GroupKind::KbdLayout => Box::new(kbd_layout::KbdLayoutGroup::connect(pool)),
            GroupKind::Load => Box::new(load::LoadGroup::new(load::LoadThresholds {
                noteworthy: config.load_noteworthy,
                high: config.load_high,
                temperature_high: config.temperature_high,
            })),
            GroupKind::Audio => Box::new(audio::AudioGroup::spawn()),
            GroupKind::Notifications => Box::new(notifications::NotificationGroup::serve(
                pool,
                &ctx.runtime,
                config.notification_cycle_secs,
                config.notification_default_timeout_ms,
            )),
            GroupKind::External => Box::new(external::ExternalGroup::serve(&ctx.runtime)),
        }
    }
}

/// Register the configured groups, in the configured order.
pub fn register_all(engine: &mut Engine, ctx: &SetupContext) {
    for kind in &ctx.config.groups {
        engine.register(kind.to_string(), |pool| kind.setup(ctx, pool));
    }
}

/// Allocate the single badge of a group, logging if the pool has no room left.
fn allocate_badge(pool: &mut BadgePool, group: GroupKind) -> Option<BadgeHandle> {
    let handle = pool.allocate();
    if handle.is_none() {
        log::warn!("Badge pool is full, the {} group will not show anything", group);
    }
    handle
}

/// Show `content` on a badge, or let it slide out with its last text if there is nothing to show.
fn show(pool: &mut BadgePool, handle: Option<BadgeHandle>, content: Option<(&str, Quality)>) {
    let Some(handle) = handle else { return };
    match content {
        Some((text, quality)) => {
            pool.set_text(handle, text);
            pool.set_quality(handle, quality);
            pool.set_visible(handle, true);
        }
        None => pool.set_visible(handle, false),
    }
}

/// Release a badge the group may or may not have.
fn release(pool: &mut BadgePool, handle: &mut Option<BadgeHandle>) {
    if let Some(handle) = handle.take() {
        pool.release(handle);
    }
}
