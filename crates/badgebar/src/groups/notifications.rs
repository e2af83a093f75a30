use badgebar_dbus::{CloseReason, NotificationRequest, ServiceError};
use tokio::{
    runtime::Handle,
    sync::mpsc::{self, UnboundedReceiver},
};

use super::{allocate_badge, release, show, GroupKind};
use crate::{
    badges::{BadgeGroup, BadgeHandle, BadgePool, Quality},
    notifications::{Expiry, NotificationId, Scheduler},
};

/// The connection the notification server runs on, used to announce closed notifications.
#[derive(Debug)]
struct Bus {
    connection: zbus::Connection,
    runtime: Handle,
}

/// Shows notifications received on `org.freedesktop.Notifications`, one at a time.
#[derive(Debug)]
pub struct NotificationGroup {
    badge: Option<BadgeHandle>,
    scheduler: Scheduler,
    requests: UnboundedReceiver<NotificationRequest>,
    default_timeout_ms: u32,
    bus: Option<Bus>,
}

impl NotificationGroup {
    /// Claim the notification service on the session bus. If that fails the group never shows
    /// anything.
    pub fn serve(pool: &mut BadgePool, runtime: &Handle, cycle_interval: f64, default_timeout_ms: u32) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        match runtime.block_on(badgebar_dbus::serve_notifications(sender)) {
            Ok(connection) => {
                log::info!("Serving notifications");
                let mut group = Self::new(pool, receiver, cycle_interval, default_timeout_ms);
                group.bus = Some(Bus { connection, runtime: runtime.clone() });
                group
            }
            Err(e) => {
                log::error!("Failed to serve notifications, they will not be shown: {}", e);
                NotificationGroup {
                    badge: None,
                    scheduler: Scheduler::new(cycle_interval),
                    requests: receiver,
                    default_timeout_ms,
                    bus: None,
                }
            }
        }
    }

    /// A group fed by `requests`, without a bus to report closed notifications on.
    pub fn new(
        pool: &mut BadgePool,
        requests: UnboundedReceiver<NotificationRequest>,
        cycle_interval: f64,
        default_timeout_ms: u32,
    ) -> Self {
        NotificationGroup {
            badge: allocate_badge(pool, GroupKind::Notifications),
            scheduler: Scheduler::new(cycle_interval),
            requests,
            default_timeout_ms,
            bus: None,
        }
    }

    #[cfg(test)]
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    fn handle_request(&mut self, request: NotificationRequest) {
        match request {
            NotificationRequest::Notify { app_name, summary, body, expire_timeout, reply } => {
                let expiry = Expiry::from_timeout_ms(expire_timeout, self.default_timeout_ms);
                let id = self.scheduler.notify(&app_name, &summary, &body, expiry);
                let _ = reply.send(Ok(id.get()));
            }
            NotificationRequest::Close { id, reply } => {
                let result = if self.scheduler.close(id) {
                    Ok(())
                } else {
                    Err(ServiceError::NotFound(format!("There is no notification with id {}", id)))
                };
                let _ = reply.send(result);
            }
            NotificationRequest::PopTop { reply } => {
                self.scheduler.pop_top();
                let _ = reply.send(Ok(()));
            }
        }
    }

    fn announce_closed(&self, id: NotificationId, reason: CloseReason) {
        log::debug!("Notification {} closed ({:?})", id, reason);
        let Some(bus) = &self.bus else { return };
        let connection = bus.connection.clone();
        bus.runtime.spawn(async move {
            let result = badgebar_dbus::emit_notification_closed(&connection, id.get(), reason).await;
            crate::print_result_err!("emitting NotificationClosed", result);
        });
    }
}

impl BadgeGroup for NotificationGroup {
    fn update(&mut self, pool: &mut BadgePool, dt: f64) {
        while let Ok(request) = self.requests.try_recv() {
            self.handle_request(request);
        }
        self.scheduler.tick(dt);
        for (id, reason) in self.scheduler.take_removed() {
            self.announce_closed(id, reason);
        }

        let text = self.scheduler.displayed().map(|notification| notification.display_text());
        show(pool, self.badge, text.as_deref().map(|text| (text, Quality::Normal)));
    }

    fn cleanup(&mut self, pool: &mut BadgePool) {
        self.requests.close();
        release(pool, &mut self.badge);
    }
}

#[cfg(test)]
mod test {
    use badgebar_dbus::Reply;
    use tokio::sync::{mpsc::UnboundedSender, oneshot};

    use super::*;
    use pretty_assertions::assert_eq;

    fn setup() -> (BadgePool, NotificationGroup, UnboundedSender<NotificationRequest>) {
        let mut pool = BadgePool::default();
        let (sender, receiver) = mpsc::unbounded_channel();
        let group = NotificationGroup::new(&mut pool, receiver, 10.0, 1000);
        (pool, group, sender)
    }

    fn reply<T>() -> (Reply<T>, oneshot::Receiver<Result<T, ServiceError>>) {
        oneshot::channel()
    }

    fn notify(
        sender: &UnboundedSender<NotificationRequest>,
        summary: &str,
        expire_timeout: i32,
    ) -> oneshot::Receiver<Result<u32, ServiceError>> {
        let (reply, response) = reply();
        let request = NotificationRequest::Notify {
            app_name: "mail".to_string(),
            summary: summary.to_string(),
            body: "hi".to_string(),
            expire_timeout,
            reply,
        };
        sender.send(request).unwrap();
        response
    }

    #[test]
    fn test_notify_shows_and_expires() {
        let (mut pool, mut group, sender) = setup();
        let badge = group.badge.unwrap();

        let mut response = notify(&sender, "New <b>mail</b>", -1);
        group.update(&mut pool, 0.0);
        assert_eq!(1, response.try_recv().unwrap().unwrap());
        assert_eq!(Some("mail - New mail: hi"), pool.text_at(badge.index()));
        assert!(pool.get(badge).unwrap().anim.target_visible);

        group.update(&mut pool, 1.0);
        assert_eq!(0, group.scheduler().expiring().count());
        assert!(!pool.get(badge).unwrap().anim.target_visible);
        // fades out with its last text
        assert_eq!(Some("mail - New mail: hi"), pool.text_at(badge.index()));
    }

    #[test]
    fn test_close_unknown_is_not_found() {
        let (mut pool, mut group, sender) = setup();
        let (reply_a, mut response_a) = reply();
        sender.send(NotificationRequest::Close { id: 0, reply: reply_a }).unwrap();
        let (reply_b, mut response_b) = reply();
        sender.send(NotificationRequest::Close { id: 42, reply: reply_b }).unwrap();
        group.update(&mut pool, 0.1);
        assert!(matches!(response_a.try_recv().unwrap(), Err(ServiceError::NotFound(_))));
        assert!(matches!(response_b.try_recv().unwrap(), Err(ServiceError::NotFound(_))));
    }

    #[test]
    fn test_close_and_pop_top() {
        let (mut pool, mut group, sender) = setup();
        let badge = group.badge.unwrap();
        let mut first = notify(&sender, "first", 0);
        notify(&sender, "second", 0);
        group.update(&mut pool, 0.0);
        let first = first.try_recv().unwrap().unwrap();
        assert_eq!(Some("mail - first: hi"), pool.text_at(badge.index()));

        let (reply_close, mut closed) = reply();
        sender.send(NotificationRequest::Close { id: first, reply: reply_close }).unwrap();
        group.update(&mut pool, 0.0);
        assert!(closed.try_recv().unwrap().is_ok());
        assert_eq!(Some("mail - second: hi"), pool.text_at(badge.index()));

        let (reply_pop, mut popped) = reply();
        sender.send(NotificationRequest::PopTop { reply: reply_pop }).unwrap();
        group.update(&mut pool, 0.0);
        assert!(popped.try_recv().unwrap().is_ok());
        assert_eq!(0, group.scheduler().permanent().count());
        assert!(!pool.get(badge).unwrap().anim.target_visible);

        group.cleanup(&mut pool);
        assert_eq!(0, pool.live_count());
    }
}
