use badgebar_dbus::{BadgeRequest, ServiceError};
use tokio::{
    runtime::Handle,
    sync::mpsc::{self, UnboundedReceiver},
};

use crate::{
    badges::{BadgeGroup, BadgeHandle, BadgePool, Quality},
    util::truncate_to,
};

/// Number of badges other processes can own at the same time.
pub const EXTERNAL_CAPACITY: usize = 8;
/// Longest text a client may put on its badge, in bytes.
pub const EXTERNAL_TEXT_MAX: usize = 255;

/// Badges owned by other processes through `org.badgebar.Badges`.
#[derive(Debug)]
pub struct ExternalGroup {
    entries: Vec<Option<BadgeHandle>>,
    requests: UnboundedReceiver<BadgeRequest>,
    connection: Option<zbus::Connection>,
}

impl ExternalGroup {
    pub fn serve(runtime: &Handle) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let connection = match runtime.block_on(badgebar_dbus::serve_badges(sender)) {
            Ok(connection) => Some(connection),
            Err(e) => {
                log::error!("Failed to serve the external badge service: {}", e);
                None
            }
        };
        ExternalGroup { connection, ..Self::new(receiver) }
    }

    pub fn new(requests: UnboundedReceiver<BadgeRequest>) -> Self {
        ExternalGroup { entries: vec![None; EXTERNAL_CAPACITY], requests, connection: None }
    }

    fn entry(&self, index: u32) -> Result<BadgeHandle, ServiceError> {
        self.entries
            .get(index as usize)
            .copied()
            .flatten()
            .ok_or_else(|| ServiceError::NotFound(format!("There is no external badge {}", index)))
    }

    fn create(&mut self, pool: &mut BadgePool) -> Result<u32, ServiceError> {
        let Some(index) = self.entries.iter().position(Option::is_none) else {
            log::warn!("External badge table is full");
            return Err(ServiceError::OutOfSpace(format!("At most {} external badges can exist", EXTERNAL_CAPACITY)));
        };
        let Some(handle) = pool.allocate() else {
            log::warn!("Badge pool is full, can't create an external badge");
            return Err(ServiceError::OutOfSpace("The badge pool is full".to_string()));
        };
        self.entries[index] = Some(handle);
        log::debug!("External badge {} is {}", index, handle);
        Ok(index as u32)
    }

    fn handle_request(&mut self, pool: &mut BadgePool, request: BadgeRequest) {
        match request {
            BadgeRequest::Create { reply } => {
                let _ = reply.send(self.create(pool));
            }
            BadgeRequest::Destroy { index, reply } => {
                let result = self.entry(index).map(|handle| {
                    pool.release(handle);
                    self.entries[index as usize] = None;
                });
                let _ = reply.send(result);
            }
            BadgeRequest::SetVisible { index, visible, reply } => {
                let _ = reply.send(self.entry(index).map(|handle| pool.set_visible(handle, visible)));
            }
            BadgeRequest::SetText { index, mut text, reply } => {
                truncate_to(&mut text, EXTERNAL_TEXT_MAX);
                let _ = reply.send(self.entry(index).map(|handle| pool.set_text(handle, &text)));
            }
            BadgeRequest::SetQuality { index, quality, reply } => {
                let result = self.entry(index).and_then(|handle| {
                    let quality = Quality::try_from(quality).map_err(|e| ServiceError::InvalidArgument(e.to_string()))?;
                    pool.set_quality(handle, quality);
                    Ok(())
                });
                let _ = reply.send(result);
            }
        }
    }
}

impl BadgeGroup for ExternalGroup {
    fn update(&mut self, pool: &mut BadgePool, _dt: f64) {
        while let Ok(request) = self.requests.try_recv() {
            self.handle_request(pool, request);
        }
    }

    fn cleanup(&mut self, pool: &mut BadgePool) {
        self.requests.close();
        for handle in self.entries.iter_mut().filter_map(Option::take) {
            pool.release(handle);
        }
        self.connection = None;
    }
}

#[cfg(test)]
mod test {
    use badgebar_dbus::Reply;
    use tokio::sync::{mpsc::UnboundedSender, oneshot};

    use super::*;
    use pretty_assertions::assert_eq;

    struct Client {
        sender: UnboundedSender<BadgeRequest>,
        group: ExternalGroup,
        pool: BadgePool,
    }

    impl Client {
        fn new(pool: BadgePool) -> Self {
            let (sender, receiver) = mpsc::unbounded_channel();
            Client { sender, group: ExternalGroup::new(receiver), pool }
        }

        /// Send a request and let the group answer it.
        fn call<T>(&mut self, make: impl FnOnce(Reply<T>) -> BadgeRequest) -> Result<T, ServiceError> {
            let (reply, mut response) = oneshot::channel();
            self.sender.send(make(reply)).unwrap();
            self.group.update(&mut self.pool, 0.1);
            response.try_recv().unwrap()
        }
    }

    #[test]
    fn test_external_badge_lifecycle() {
        let mut client = Client::new(BadgePool::default());
        let index = client.call(|reply| BadgeRequest::Create { reply }).unwrap();
        assert_eq!(0, index);

        client.call(|reply| BadgeRequest::SetText { index, text: "x".repeat(300), reply }).unwrap();
        client.call(|reply| BadgeRequest::SetQuality { index, quality: 2, reply }).unwrap();
        client.call(|reply| BadgeRequest::SetVisible { index, visible: true, reply }).unwrap();

        let handle = client.group.entries[0].unwrap();
        let badge = client.pool.get(handle).unwrap();
        assert_eq!(EXTERNAL_TEXT_MAX, badge.text.len());
        assert_eq!(Quality::Gold.palette(), badge.colors);
        assert!(badge.anim.target_visible);

        client.call(|reply| BadgeRequest::Destroy { index, reply }).unwrap();
        assert_eq!(0, client.pool.live_count());
        assert!(matches!(client.call(|reply| BadgeRequest::Destroy { index, reply }), Err(ServiceError::NotFound(_))));
    }

    #[test]
    fn test_table_is_bounded() {
        let mut client = Client::new(BadgePool::default());
        for _ in 0..EXTERNAL_CAPACITY {
            client.call(|reply| BadgeRequest::Create { reply }).unwrap();
        }
        assert!(matches!(client.call(|reply| BadgeRequest::Create { reply }), Err(ServiceError::OutOfSpace(_))));

        client.group.cleanup(&mut client.pool);
        assert_eq!(0, client.pool.live_count());
    }

    #[test]
    fn test_full_pool_is_out_of_space() {
        let mut client = Client::new(BadgePool::with_capacity(1));
        client.call(|reply| BadgeRequest::Create { reply }).unwrap();
        assert!(matches!(client.call(|reply| BadgeRequest::Create { reply }), Err(ServiceError::OutOfSpace(_))));
    }

    #[test]
    fn test_invalid_requests() {
        let mut client = Client::new(BadgePool::default());
        let index = client.call(|reply| BadgeRequest::Create { reply }).unwrap();
        assert!(matches!(
            client.call(|reply| BadgeRequest::SetQuality { index, quality: 3, reply }),
            Err(ServiceError::InvalidArgument(_))
        ));
        assert!(matches!(
            client.call(|reply| BadgeRequest::SetVisible { index: 5, visible: true, reply }),
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            client.call(|reply| BadgeRequest::SetText { index: 99, text: String::new(), reply }),
            Err(ServiceError::NotFound(_))
        ));
    }
}
