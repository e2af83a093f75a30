use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;

use crate::groups::GroupKind;

pub mod system_stats;

/// Contents of `badgebar.json`. Every field may be left out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SmartDefault)]
#[serde(default)]
pub struct BarConfig {
    /// Frame period while nothing is animating.
    #[default = 33]
    pub tick_rate_ms: u64,
    /// Frame period while a badge is sliding.
    #[default = 16]
    pub fast_tick_rate_ms: u64,

    /// strftime-style format of the clock badge.
    #[default = "%D %l:%M%p"]
    pub clock_format: String,

    /// Battery capacity (percent) below which the battery badge turns red.
    #[default = 30]
    pub battery_low_threshold: u8,
    #[default(PathBuf::from("/sys/class/power_supply"))]
    pub power_supply_dir: PathBuf,

    #[default(PathBuf::from("/sys/class/net"))]
    pub net_dir: PathBuf,
    #[default(PathBuf::from("/proc/net/wireless"))]
    pub wireless_stats_file: PathBuf,

    /// 1-minute load average above which the load badge appears.
    #[default = 0.6]
    pub load_noteworthy: f64,
    /// 1-minute load average at which the load badge turns red.
    #[default = 1.0]
    pub load_high: f64,
    /// CPU temperature in °C that is shown on the load badge and turns it red.
    #[default = 80.0]
    pub temperature_high: f32,

    #[default = 10.0]
    pub notification_cycle_secs: f64,
    /// Timeout used for notifications that leave the decision to the server.
    #[default = 1000]
    pub notification_default_timeout_ms: u32,

    /// Groups to register, in order.
    #[default(GroupKind::default_order())]
    pub groups: Vec<GroupKind>,
}

/// Read the configuration, falling back to the defaults if the file does not exist.
pub fn read_from_file(path: &Path) -> Result<BarConfig> {
    if !path.exists() {
        log::info!("No configuration at {}, using defaults", path.display());
        return Ok(BarConfig::default());
    }
    let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse configuration {}", path.display()))
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_config() {
        let config: BarConfig = serde_json::from_str(r#"{ "clock_format": "%H:%M", "groups": ["clock", "notifications"] }"#).unwrap();
        assert_eq!("%H:%M", config.clock_format);
        assert_eq!(vec![GroupKind::Clock, GroupKind::Notifications], config.groups);
        assert_eq!(33, config.tick_rate_ms);
        assert_eq!(10.0, config.notification_cycle_secs);
    }

    #[test]
    fn test_unknown_group_is_rejected() {
        assert!(serde_json::from_str::<BarConfig>(r#"{ "groups": ["weather"] }"#).is_err());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = read_from_file(Path::new("/nonexistent/badgebar/badgebar.json")).unwrap();
        assert_eq!(BarConfig::default(), config);
        assert_eq!(GroupKind::default_order(), config.groups);
    }
}
