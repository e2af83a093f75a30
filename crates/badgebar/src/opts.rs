use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Struct that gets generated from `RawOpt`.
#[derive(Debug, PartialEq)]
pub struct Opt {
    pub log_debug: bool,
    pub config_path: Option<PathBuf>,
    pub action: Action,
}

#[derive(Parser, Debug, PartialEq)]
#[command(version, about, long_about = None)]
pub(super) struct RawOpt {
    /// Write out debug logs.
    #[arg(long = "debug", global = true)]
    log_debug: bool,

    /// Override the path to the configuration directory (the directory that contains badgebar.json).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    action: Option<Action>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Action {
    /// Generate a shell completion script
    ShellCompletions {
        #[arg(short, long)]
        shell: clap_complete::shells::Shell,
    },

    /// Run the bar. This is what happens when no command is given.
    #[command(name = "daemon", alias = "d")]
    Daemon,

    /// Send a notification to the running bar.
    #[command(name = "notify", alias = "n")]
    Notify {
        summary: String,
        #[arg(default_value = "")]
        body: String,

        /// Application the notification claims to come from.
        #[arg(long, default_value = "badgebar")]
        app_name: String,

        /// Milliseconds until the notification expires. 0 keeps it until it is closed,
        /// -1 leaves the decision to the bar.
        #[arg(short, long, default_value_t = -1, allow_negative_numbers = true)]
        timeout: i32,
    },

    /// Close the notification with the given id.
    #[command(name = "close", alias = "c")]
    Close { id: u32 },

    /// Dismiss the oldest permanent notification.
    #[command(name = "pop-top")]
    PopTop,

    /// Print what the running notification server reports about itself.
    #[command(name = "server-info")]
    ServerInfo,
}

impl Opt {
    pub fn from_env() -> Self {
        let raw: RawOpt = RawOpt::parse();
        raw.into()
    }
}

impl From<RawOpt> for Opt {
    fn from(other: RawOpt) -> Self {
        let RawOpt { action, log_debug, config } = other;
        Opt { action: action.unwrap_or(Action::Daemon), log_debug, config_path: config }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Opt {
        RawOpt::try_parse_from(std::iter::once("badgebar").chain(args.iter().copied())).unwrap().into()
    }

    #[test]
    fn test_daemon_is_the_default() {
        assert_eq!(Opt { log_debug: false, config_path: None, action: Action::Daemon }, parse(&[]));
        assert_eq!(Action::Daemon, parse(&["--debug", "daemon"]).action);
    }

    #[test]
    fn test_notify_args() {
        let opt = parse(&["notify", "Hello", "--timeout", "-1", "--config", "/tmp/bar"]);
        assert_eq!(Some(PathBuf::from("/tmp/bar")), opt.config_path);
        assert_eq!(
            Action::Notify { summary: "Hello".to_string(), body: String::new(), app_name: "badgebar".to_string(), timeout: -1 },
            opt.action
        );
        assert_eq!(Action::Close { id: 4 }, parse(&["close", "4"]).action);
        assert_eq!(Action::PopTop, parse(&["pop-top"]).action);
    }
}
