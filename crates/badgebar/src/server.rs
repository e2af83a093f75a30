use std::{io::Write, time::Duration};

use anyhow::{Context, Result};
use itertools::Itertools;
use tokio::runtime::Runtime;

use crate::{
    application_lifecycle::{self, exit_requested, recv_exit},
    badges::Engine,
    config::{self, BarConfig},
    groups::{self, SetupContext},
    paths::BarPaths,
    render::TextRenderer,
    util::print_error,
};

pub fn version_string() -> String {
    match env!("GIT_HASH") {
        "" => env!("CARGO_PKG_VERSION").to_string(),
        hash => format!("{} ({})", env!("CARGO_PKG_VERSION"), hash),
    }
}

/// Run the bar until SIGINT or SIGTERM, writing the badges to stdout.
pub fn initialize_server(paths: BarPaths) -> Result<()> {
    log::info!("Loading paths: {}", &paths);
    let bar_config = match config::read_from_file(&paths.get_config_file()) {
        Ok(config) => config,
        Err(err) => {
            print_error(err);
            BarConfig::default()
        }
    };

    log::info!("Initializing badgebar daemon {}", version_string());
    application_lifecycle::exit_on_signals();

    let rt = tokio::runtime::Builder::new_multi_thread().enable_all().build().context("Failed to initialize tokio runtime")?;

    let mut engine = Engine::default();
    let ctx = SetupContext { config: &bar_config, runtime: rt.handle().clone() };
    groups::register_all(&mut engine, &ctx);
    log::info!("Registered groups: {}", engine.group_names().join(", "));
    log::debug!("{} of {} badges allocated", engine.pool().live_count(), engine.badge_count());

    let mut renderer = TextRenderer::new(std::io::stdout().lock());
    let result = run_tick_loop(&rt, &bar_config, &mut engine, &mut renderer);

    engine.shutdown();
    log::info!("main application thread finished");
    result
}

fn run_tick_loop<W: Write>(rt: &Runtime, bar_config: &BarConfig, engine: &mut Engine, renderer: &mut TextRenderer<W>) -> Result<()> {
    let tick_rate = Duration::from_millis(bar_config.tick_rate_ms);
    let fast_tick_rate = Duration::from_millis(bar_config.fast_tick_rate_ms);

    while !exit_requested() {
        engine.tick();
        renderer.render(engine)?;
        let period = if engine.should_fast_redraw() { fast_tick_rate } else { tick_rate };
        if wait_for_next_frame(rt, period) {
            break;
        }
    }
    Ok(())
}

/// Sleep until the next frame is due. Returns `true` if the application is exiting instead.
fn wait_for_next_frame(rt: &Runtime, period: Duration) -> bool {
    rt.block_on(async {
        tokio::select! {
            Ok(()) = recv_exit() => true,
            _ = tokio::time::sleep(period) => false,
        }
    })
}
