use std::collections::HashMap;

use tokio::sync::mpsc::UnboundedSender;
use zbus::{dbus_interface, zvariant::OwnedValue, SignalContext};

use crate::{names, request::forward, Reply, Result, ServiceError};

const RECEIVER: &str = "notification scheduler";

pub const SERVER_NAME: &str = "badgebar";
pub const SERVER_VENDOR: &str = "badgebar";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const SERVER_SPEC_VERSION: &str = "1.2";

/// A call on the `org.freedesktop.Notifications` object, waiting to be handled by the scheduler.
#[derive(Debug)]
pub enum NotificationRequest {
    Notify { app_name: String, summary: String, body: String, expire_timeout: i32, reply: Reply<u32> },
    Close { id: u32, reply: Reply<()> },
    PopTop { reply: Reply<()> },
}

/// Reasons carried by the `NotificationClosed` signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Expired = 1,
    Dismissed = 2,
    Closed = 3,
}

/// The `org.freedesktop.Notifications` server object.
///
/// It keeps no notifications itself, see [`NotificationRequest`].
#[derive(Debug)]
pub struct NotificationServer {
    requests: UnboundedSender<NotificationRequest>,
}

#[dbus_interface(name = "org.freedesktop.Notifications")]
impl NotificationServer {
    /// Notify method. `replaces_id`, `app_icon`, `actions` and `hints` are accepted but ignored.
    #[allow(clippy::too_many_arguments)]
    async fn notify(
        &self,
        app_name: String,
        replaces_id: u32,
        app_icon: String,
        summary: String,
        body: String,
        actions: Vec<String>,
        hints: HashMap<String, OwnedValue>,
        expire_timeout: i32,
    ) -> std::result::Result<u32, ServiceError> {
        log::debug!(
            "Notify from {:?}: {:?} (replaces_id={}, icon={:?}, {} actions, {} hints)",
            app_name,
            summary,
            replaces_id,
            app_icon,
            actions.len(),
            hints.len()
        );
        forward(&self.requests, RECEIVER, |reply| NotificationRequest::Notify { app_name, summary, body, expire_timeout, reply })
            .await
    }

    /// CloseNotification method
    async fn close_notification(&self, id: u32) -> std::result::Result<(), ServiceError> {
        log::debug!("CloseNotification {}", id);
        forward(&self.requests, RECEIVER, |reply| NotificationRequest::Close { id, reply }).await
    }

    /// GetCapabilities method
    async fn get_capabilities(&self) -> Vec<String> {
        vec!["body".to_string()]
    }

    /// GetServerInformation method
    #[dbus_interface(out_args("name", "vendor", "version", "spec_version"))]
    async fn get_server_information(&self) -> (String, String, String, String) {
        (SERVER_NAME.to_string(), SERVER_VENDOR.to_string(), SERVER_VERSION.to_string(), SERVER_SPEC_VERSION.to_string())
    }

    /// PopTopNotification method, dismissing the oldest permanent notification.
    async fn pop_top_notification(&self) -> std::result::Result<(), ServiceError> {
        log::debug!("PopTopNotification");
        forward(&self.requests, RECEIVER, |reply| NotificationRequest::PopTop { reply }).await
    }

    /// NotificationClosed signal
    #[dbus_interface(signal)]
    async fn notification_closed(ctxt: &SignalContext<'_>, id: u32, reason: u32) -> zbus::Result<()>;
}

/// Connect to the session bus, export the notification server and claim
/// `org.freedesktop.Notifications`.
///
/// The returned connection has to be kept alive for as long as the service should stay up.
pub async fn serve_notifications(requests: UnboundedSender<NotificationRequest>) -> Result<zbus::Connection> {
    let con = zbus::ConnectionBuilder::session()?.serve_at(names::NOTIFICATIONS_OBJECT, NotificationServer { requests })?.build().await?;
    crate::claim_name(&con, names::NOTIFICATIONS_BUS).await?;
    log::info!("Serving {} on {}", names::NOTIFICATIONS_BUS, names::NOTIFICATIONS_OBJECT);
    Ok(con)
}

/// Emit `NotificationClosed` from the notification server object on `con`.
pub async fn emit_notification_closed(con: &zbus::Connection, id: u32, reason: CloseReason) -> zbus::Result<()> {
    let ctxt = SignalContext::new(con, names::NOTIFICATIONS_OBJECT)?;
    NotificationServer::notification_closed(&ctxt, id, reason as u32).await
}
