use anyhow::{Context, Result};
use clap::CommandFactory as _;
use paths::BarPaths;

mod application_lifecycle;
mod badges;
mod client;
mod config;
mod groups;
mod notifications;
mod opts;
mod paths;
mod pulse;
mod render;
mod server;
mod sway_ipc;
mod util;

fn main() {
    let opts: opts::Opt = opts::Opt::from_env();

    let log_level_filter = if opts.log_debug { log::LevelFilter::Debug } else { log::LevelFilter::Info };
    if std::env::var("RUST_LOG").is_ok() {
        pretty_env_logger::init_timed();
    } else {
        pretty_env_logger::formatted_timed_builder()
            .filter(Some("badgebar"), log_level_filter)
            .filter(Some("badgebar_dbus"), log_level_filter)
            .init();
    }

    if let opts::Action::ShellCompletions { shell } = opts.action {
        clap_complete::generate(shell, &mut opts::RawOpt::command(), "badgebar", &mut std::io::stdout());
        return;
    }

    if let Err(err) = run(opts) {
        util::print_error(err);
        std::process::exit(1);
    }
}

fn run(opts: opts::Opt) -> Result<()> {
    match opts.action {
        opts::Action::ShellCompletions { .. } => unreachable!(),
        opts::Action::Daemon => {
            let paths = opts
                .config_path
                .map(BarPaths::from_config_dir)
                .unwrap_or_else(BarPaths::default)
                .context("Failed to initialize badgebar paths")?;
            server::initialize_server(paths)
        }
        action => client::handle_client_action(action),
    }
}
