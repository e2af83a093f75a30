//! Module concerned with handling the global application lifecycle of badgebar.
//! Currently, this only means handling application exit by providing a global
//! `recv_exit()` function which can be awaited to receive an event in case of application termination,
//! and `exit_requested()` for the tick loop, which never awaits.

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use tokio::sync::broadcast;

pub static APPLICATION_EXIT_SENDER: Lazy<broadcast::Sender<()>> = Lazy::new(|| broadcast::channel(2).0);
static EXIT_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Notify all listening tasks of the termination of the badgebar process.
pub fn send_exit() -> Result<()> {
    EXIT_REQUESTED.store(true, Ordering::SeqCst);
    // nobody might be listening yet, which is fine as the flag is set
    if APPLICATION_EXIT_SENDER.receiver_count() == 0 {
        return Ok(());
    }
    (APPLICATION_EXIT_SENDER).send(()).context("Failed to send exit lifecycle event")?;
    Ok(())
}

/// Yields Ok(()) on application termination. Await on this in all long-running tasks
/// and perform any cleanup if necessary.
pub async fn recv_exit() -> Result<()> {
    (APPLICATION_EXIT_SENDER).subscribe().recv().await.context("Failed to receive lifecycle event")
}

/// Whether [`send_exit`] has been called.
pub fn exit_requested() -> bool {
    EXIT_REQUESTED.load(Ordering::SeqCst)
}

/// Call [`send_exit`] when the process receives SIGINT or SIGTERM.
pub fn exit_on_signals() {
    simple_signal::set_handler(&[simple_signal::Signal::Int, simple_signal::Signal::Term], |_| {
        log::info!("Shutting down badgebar daemon...");
        if let Err(e) = send_exit() {
            log::error!("Failed to send application shutdown event to workers: {:?}", e);
            std::process::exit(1);
        }
    });
}
