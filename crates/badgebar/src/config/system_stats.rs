//! Probes reading the state of the machine: power supply, network interfaces, load and
//! temperature. Every probe answers "no data" instead of failing, so a missing battery or an
//! unreadable file simply hides the corresponding badge until the next tick.

use std::{path::Path, sync::Mutex};

use once_cell::sync::Lazy;
use sysinfo::{Components, System};

use crate::{badges::Quality, util::read_trimmed};

static COMPONENTS: Lazy<Mutex<Components>> = Lazy::new(|| Mutex::new(Components::new_with_refreshed_list()));

const MAX_BATTERY_INDEX: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatteryStatus {
    Charging,
    /// Remaining capacity in percent, 0..=100.
    Capacity(u8),
    Unknown,
}

/// Read the battery state from a `/sys/class/power_supply`-like directory.
///
/// A connected AC adapter wins over any battery reading.
pub fn read_battery(power_supply_dir: &Path) -> BatteryStatus {
    if read_trimmed(power_supply_dir.join("AC/online")).is_ok_and(|online| online == "1") {
        return BatteryStatus::Charging;
    }

    (0..MAX_BATTERY_INDEX)
        .find_map(|idx| {
            let capacity = read_trimmed(power_supply_dir.join(format!("BAT{}/capacity", idx))).ok()?;
            capacity.parse::<u8>().ok().filter(|capacity| *capacity <= 100)
        })
        .map_or(BatteryStatus::Unknown, BatteryStatus::Capacity)
}

#[derive(Debug, Clone, PartialEq)]
pub struct NetworkStatus {
    pub display_text: String,
    pub quality: Quality,
    pub vpn_active: bool,
}

const VPN_PREFIXES: &[&str] = &["tun", "tap", "wg"];
const WIRELESS_QUALITY_LOW: u32 = 30;
/// Maximum link quality reported in /proc/net/wireless.
const WIRELESS_QUALITY_MAX: f64 = 70.0;

/// Summarize the network interfaces of a `/sys/class/net`-like directory.
///
/// Returns `None` if the directory can't be read at all. Wired links are preferred over
/// wireless ones.
pub fn read_network(net_dir: &Path, wireless_stats_file: &Path) -> Option<NetworkStatus> {
    let mut names: Vec<String> = net_dir
        .read_dir()
        .map_err(|e| log::debug!("Can't read {}: {}", net_dir.display(), e))
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name != "lo")
        .collect();
    names.sort();

    let is_up = |name: &str| read_trimmed(net_dir.join(name).join("operstate")).is_ok_and(|state| state == "up");
    let is_vpn = |name: &str| VPN_PREFIXES.iter().any(|prefix| name.starts_with(prefix));
    let is_wireless = |name: &str| net_dir.join(name).join("wireless").exists();

    let up: Vec<&str> = names.iter().map(String::as_str).filter(|name| is_up(*name)).collect();
    let vpn_active = up.iter().any(|name| is_vpn(*name));
    let (wireless, wired): (Vec<&str>, Vec<&str>) = up.iter().copied().filter(|name| !is_vpn(*name)).partition(|name| is_wireless(*name));
    let wired = wired.first();
    let wireless = wireless.first();

    let (display_text, quality) = match (wired, wireless) {
        (Some(_), _) => ("ETH".to_string(), Quality::Normal),
        (None, Some(name)) => match read_wireless_quality(wireless_stats_file, name) {
            Some(percent) if percent < WIRELESS_QUALITY_LOW => (format!("WLAN {}%", percent), Quality::Error),
            Some(percent) => (format!("WLAN {}%", percent), Quality::Normal),
            None => ("WLAN".to_string(), Quality::Normal),
        },
        (None, None) => ("OFFLINE".to_string(), Quality::Error),
    };
    Some(NetworkStatus { display_text, quality, vpn_active })
}

/// Link quality of an interface in percent, read from a `/proc/net/wireless`-like table.
fn read_wireless_quality(wireless_stats_file: &Path, interface: &str) -> Option<u32> {
    let table = std::fs::read_to_string(wireless_stats_file).ok()?;
    parse_wireless_quality(&table, interface)
}

fn parse_wireless_quality(table: &str, interface: &str) -> Option<u32> {
    // Inter-| sta-|   Quality        |   Discarded packets
    //  face | tus | link level noise |  nwid  crypt ...
    // wlan0: 0000   54.  -56.  -256        0      0 ...
    table.lines().skip(2).find_map(|line| {
        let (name, rest) = line.split_once(':')?;
        if name.trim() != interface {
            return None;
        }
        let link: f64 = rest.split_whitespace().nth(1)?.trim_end_matches('.').parse().ok()?;
        Some(((link / WIRELESS_QUALITY_MAX) * 100.0).round().clamp(0.0, 100.0) as u32)
    })
}

/// 1-minute load average, if this platform reports one.
pub fn read_load_1min() -> Option<f64> {
    if !sysinfo::IS_SUPPORTED_SYSTEM {
        return None;
    }
    let load = System::load_average().one;
    load.is_finite().then_some(load)
}

/// Highest temperature reported by a CPU sensor, in °C.
pub fn read_cpu_temp() -> Option<f32> {
    let mut components = COMPONENTS.lock().unwrap(); // unwrap: mutex poisoning is okay
    components.refresh();
    components
        .iter()
        .filter(|c| {
            let label = c.label().to_lowercase();
            ["cpu", "package", "tctl", "core"].iter().any(|needle| label.contains(needle))
        })
        .map(|c| c.temperature())
        .filter(|temp| !temp.is_nan())
        .fold(None, |max: Option<f32>, temp| Some(max.map_or(temp, |max| max.max(temp))))
}
