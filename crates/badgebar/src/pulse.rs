//! Audio sink state, followed through `pactl`.
//!
//! A background thread reads `pactl subscribe`, queries the sinks whenever they change and
//! publishes an [`AudioSnapshot`] after each event. The tick thread only ever reads snapshots.

use std::{
    io::{BufRead, BufReader},
    process::{Child, ChildStdout, Command, Stdio},
};

use anyhow::{Context, Result};
use tokio::sync::watch;

use crate::{badges::Quality, regex};

/// Number of sinks that are tracked at the same time.
pub const MAX_SINKS: usize = 4;
/// Raw volume of a sink at 100%.
const VOLUME_NORM: u64 = 0x10000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Volume {
    Percent(u32),
    Muted,
}

/// What the audio badge should look like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSnapshot {
    pub has_sink: bool,
    pub text: String,
    pub quality: Quality,
}

impl Default for AudioSnapshot {
    fn default() -> Self {
        AudioSnapshot { has_sink: false, text: String::new(), quality: Quality::Normal }
    }
}

/// Keeps track of which sinks exist and of the last volume reported.
#[derive(Debug, Clone, Default)]
pub struct SinkTracker {
    sinks: Vec<u32>,
    volume: Option<Volume>,
}

impl SinkTracker {
    /// Record the state of a sink, adding it to the known sinks if needed.
    pub fn sink_info(&mut self, index: u32, volume: Volume) {
        if self.track(index) {
            self.volume = Some(volume);
        }
    }

    /// Apply the result of listing every sink. All listed sinks become known. With `changed`,
    /// only the volume of that sink is taken; otherwise the listing is applied in order.
    pub fn apply_listing(&mut self, sinks: &[(u32, Volume)], changed: Option<u32>) {
        for &(index, volume) in sinks {
            match changed {
                Some(changed) if changed != index => {
                    self.track(index);
                }
                _ => self.sink_info(index, volume),
            }
        }
    }

    /// Add a sink to the known ones. Returns `false` if it can't be tracked.
    fn track(&mut self, index: u32) -> bool {
        if self.sinks.contains(&index) {
            return true;
        }
        if self.sinks.len() >= MAX_SINKS {
            log::warn!("Already tracking {} sinks, ignoring sink #{}", MAX_SINKS, index);
            return false;
        }
        log::debug!("New sink detected: #{}", index);
        self.sinks.push(index);
        true
    }

    pub fn sink_removed(&mut self, index: u32) {
        self.sinks.retain(|known| *known != index);
        if self.sinks.is_empty() {
            self.volume = None;
        }
    }

    pub fn knows(&self, index: u32) -> bool {
        self.sinks.contains(&index)
    }

    pub fn snapshot(&self) -> AudioSnapshot {
        if self.sinks.is_empty() {
            return AudioSnapshot::default();
        }
        let (text, quality) = match self.volume {
            Some(Volume::Percent(percent)) => (format!("VOL {}%", percent), Quality::Normal),
            Some(Volume::Muted) => ("VOL MUTED".to_string(), Quality::Error),
            None => (String::new(), Quality::Normal),
        };
        AudioSnapshot { has_sink: true, text, quality }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkEvent {
    Changed(u32),
    Removed(u32),
}

/// Parse a line of `pactl subscribe` output, e.g. `Event 'change' on sink #0`.
/// Events on anything but sinks are `None`.
pub fn parse_subscribe_event(line: &str) -> Option<SinkEvent> {
    let captures = regex!(r"^Event '(\w+)' on sink #(\d+)$").captures(line.trim())?;
    let index = captures[2].parse().ok()?;
    Some(match &captures[1] {
        "remove" => SinkEvent::Removed(index),
        _ => SinkEvent::Changed(index),
    })
}

/// Parse the output of `pactl list sinks` into the index and volume of every sink.
pub fn parse_sinks(output: &str) -> Vec<(u32, Volume)> {
    let mut sinks = Vec::new();
    let mut current: Option<(u32, bool, Option<u64>)> = None;
    let mut finish = |current: Option<(u32, bool, Option<u64>)>| {
        if let Some((index, muted, raw)) = current {
            let volume = match raw {
                Some(raw) if !muted && raw > 0 => Volume::Percent((raw * 100 / VOLUME_NORM) as u32),
                _ => Volume::Muted,
            };
            sinks.push((index, volume));
        }
    };

    for line in output.lines() {
        if let Some(index) = line.strip_prefix("Sink #") {
            finish(current.take());
            current = index.trim().parse().ok().map(|index| (index, false, None));
            continue;
        }
        let Some((_, muted, raw)) = &mut current else { continue };
        let line = line.trim();
        if let Some(mute) = line.strip_prefix("Mute:") {
            *muted = mute.trim() == "yes";
        } else if let Some(channels) = line.strip_prefix("Volume:") {
            let values: Vec<u64> = regex!(r"(\d+) / +\d+%")
                .captures_iter(channels)
                .filter_map(|captures| captures[1].parse().ok())
                .collect();
            if !values.is_empty() {
                *raw = Some(values.iter().sum::<u64>() / values.len() as u64);
            }
        }
    }
    finish(current);
    sinks
}

fn query_sinks() -> Result<Vec<(u32, Volume)>> {
    let output = Command::new("pactl").args(["list", "sinks"]).output().context("Failed to run pactl list sinks")?;
    Ok(parse_sinks(&String::from_utf8_lossy(&output.stdout)))
}

fn refresh(tracker: &mut SinkTracker, changed: Option<u32>) {
    match query_sinks() {
        Ok(sinks) => tracker.apply_listing(&sinks, changed),
        Err(e) => log::error!("{:?}", e),
    }
}

/// Start following the sinks. The returned child is `pactl subscribe`; killing it ends the
/// background thread.
pub fn spawn_backend() -> Result<(Child, watch::Receiver<AudioSnapshot>)> {
    let mut child = Command::new("pactl")
        .arg("subscribe")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .context("Failed to run pactl subscribe")?;
    let stdout = child.stdout.take().context("pactl subscribe has no stdout")?;
    let (sender, receiver) = watch::channel(AudioSnapshot::default());
    let spawned = std::thread::Builder::new().name("audio".to_string()).spawn(move || follow_sinks(stdout, sender));
    if let Err(e) = spawned {
        let _ = child.kill();
        return Err(e).context("Failed to start the audio thread");
    }
    Ok((child, receiver))
}

fn follow_sinks(stdout: ChildStdout, sender: watch::Sender<AudioSnapshot>) {
    let mut tracker = SinkTracker::default();
    refresh(&mut tracker, None);
    sender.send_replace(tracker.snapshot());

    for line in BufReader::new(stdout).lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                log::error!("Failed to read from pactl subscribe: {}", e);
                break;
            }
        };
        match parse_subscribe_event(&line) {
            Some(SinkEvent::Removed(index)) if !tracker.knows(index) => continue,
            Some(SinkEvent::Removed(index)) => tracker.sink_removed(index),
            Some(SinkEvent::Changed(index)) => refresh(&mut tracker, Some(index)),
            None => continue,
        }
        if sender.send(tracker.snapshot()).is_err() {
            break;
        }
    }
    log::debug!("Audio thread is done");
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    const SINKS: &str = "Sink #0
\tState: RUNNING
\tName: alsa_output.pci-0000_00_1f.3.analog-stereo
\tMute: no
\tVolume: front-left: 32768 /  50% / -18.06 dB,   front-right: 39322 /  60% / -13.31 dB
\t        balance 0.00
Sink #3
\tName: bluez_output
\tMute: yes
\tVolume: front-left: 65536 / 100% / 0.00 dB,   front-right: 65536 / 100% / 0.00 dB
";

    #[test]
    fn test_parse_sinks() {
        assert_eq!(vec![(0, Volume::Percent(55)), (3, Volume::Muted)], parse_sinks(SINKS));
        assert_eq!(Vec::<(u32, Volume)>::new(), parse_sinks(""));
    }

    #[test]
    fn test_parse_subscribe_event() {
        assert_eq!(Some(SinkEvent::Changed(0)), parse_subscribe_event("Event 'change' on sink #0"));
        assert_eq!(Some(SinkEvent::Changed(12)), parse_subscribe_event("Event 'new' on sink #12\n"));
        assert_eq!(Some(SinkEvent::Removed(12)), parse_subscribe_event("Event 'remove' on sink #12"));
        assert_eq!(None, parse_subscribe_event("Event 'change' on source #1"));
    }

    #[test]
    fn test_tracker_first_and_last_sink() {
        let mut tracker = SinkTracker::default();
        assert_eq!(AudioSnapshot::default(), tracker.snapshot());

        tracker.sink_info(5, Volume::Percent(40));
        assert_eq!(AudioSnapshot { has_sink: true, text: "VOL 40%".to_string(), quality: Quality::Normal }, tracker.snapshot());

        tracker.sink_info(6, Volume::Muted);
        assert_eq!(AudioSnapshot { has_sink: true, text: "VOL MUTED".to_string(), quality: Quality::Error }, tracker.snapshot());

        tracker.sink_removed(5);
        assert!(tracker.snapshot().has_sink);
        tracker.sink_removed(6);
        assert!(!tracker.snapshot().has_sink);
    }

    #[test]
    fn test_change_shows_the_changed_sink() {
        let mut tracker = SinkTracker::default();
        tracker.apply_listing(&[(0, Volume::Percent(30)), (3, Volume::Percent(80))], None);
        assert_eq!("VOL 80%", tracker.snapshot().text);

        tracker.apply_listing(&[(0, Volume::Percent(35)), (3, Volume::Percent(80))], Some(0));
        assert_eq!("VOL 35%", tracker.snapshot().text);

        tracker.apply_listing(&[(0, Volume::Percent(35)), (3, Volume::Muted)], Some(3));
        assert_eq!("VOL MUTED", tracker.snapshot().text);
    }

    #[test]
    fn test_listing_tracks_unchanged_sinks() {
        let mut tracker = SinkTracker::default();
        tracker.apply_listing(&[(0, Volume::Percent(30))], None);
        tracker.apply_listing(&[(0, Volume::Percent(30)), (7, Volume::Percent(90))], Some(0));
        assert!(tracker.knows(7));
        assert_eq!("VOL 30%", tracker.snapshot().text);

        tracker.sink_removed(0);
        assert!(tracker.snapshot().has_sink);
    }

    #[test]
    fn test_tracker_is_bounded() {
        let mut tracker = SinkTracker::default();
        for index in 0..MAX_SINKS as u32 + 2 {
            tracker.sink_info(index, Volume::Percent(10));
        }
        assert!(tracker.knows(3));
        assert!(!tracker.knows(4));
    }
}
