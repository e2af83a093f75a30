use std::collections::HashMap;

use anyhow::{Context, Result};
use badgebar_dbus::proxy::NotificationsProxy;

use crate::opts::Action;

/// Run a command against the notification server of a running bar.
pub fn handle_client_action(action: Action) -> Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().context("Failed to initialize tokio runtime")?;
    rt.block_on(async move {
        let con = zbus::Connection::session().await.context("Failed to connect to the session bus")?;
        let proxy = NotificationsProxy::new(&con).await?;
        do_server_call(&proxy, action).await
    })
}

async fn do_server_call(proxy: &NotificationsProxy<'_>, action: Action) -> Result<()> {
    log::debug!("Forwarding {:?} to the notification server", action);
    match action {
        Action::Notify { summary, body, app_name, timeout } => {
            let id = proxy
                .notify(&app_name, 0, "", &summary, &body, &[], HashMap::new(), timeout)
                .await
                .context("Failed to send notification")?;
            println!("{}", id);
        }
        Action::Close { id } => {
            proxy.close_notification(id).await.with_context(|| format!("Failed to close notification {}", id))?;
        }
        Action::PopTop => {
            proxy.pop_top_notification().await.context("Failed to dismiss the top notification")?;
        }
        Action::ServerInfo => {
            let (name, vendor, version, spec_version) = proxy.get_server_information().await?;
            let capabilities = proxy.get_capabilities().await?;
            println!("name: {}", name);
            println!("vendor: {}", vendor);
            println!("version: {}", version);
            println!("spec version: {}", spec_version);
            println!("capabilities: {}", capabilities.join(", "));
        }
        Action::Daemon | Action::ShellCompletions { .. } => unreachable!("not a client action"),
    }
    Ok(())
}
