use tokio::sync::mpsc::UnboundedSender;
use zbus::{dbus_interface, zvariant::OwnedObjectPath, ObjectServer};

use crate::{names, request::forward, Reply, Result, ServiceError};

const RECEIVER: &str = "external badge group";

/// A call on the external badge service, waiting to be handled by the external badge group.
/// Badges are addressed by their index in the group's table.
#[derive(Debug)]
pub enum BadgeRequest {
    Create { reply: Reply<u32> },
    Destroy { index: u32, reply: Reply<()> },
    SetVisible { index: u32, visible: bool, reply: Reply<()> },
    SetText { index: u32, text: String, reply: Reply<()> },
    SetQuality { index: u32, quality: i32, reply: Reply<()> },
}

pub fn badge_object_path(index: u32) -> String {
    format!("{}{}", names::BADGE_OBJECT_PREFIX, index)
}

/// Inverse of [`badge_object_path`].
pub fn parse_badge_object_path(path: &str) -> Option<u32> {
    path.strip_prefix(names::BADGE_OBJECT_PREFIX)?.parse().ok()
}

/// `org.badgebar.badges.BadgeGroup1`: creates and destroys badges owned by other processes.
#[derive(Debug)]
pub struct BadgeGroupService {
    requests: UnboundedSender<BadgeRequest>,
}

#[dbus_interface(name = "org.badgebar.badges.BadgeGroup1")]
impl BadgeGroupService {
    /// Create method. Returns the path of the new `Badge1` object.
    async fn create(&self, #[zbus(object_server)] server: &ObjectServer) -> std::result::Result<OwnedObjectPath, ServiceError> {
        let index = forward(&self.requests, RECEIVER, |reply| BadgeRequest::Create { reply }).await?;
        let path = badge_object_path(index);
        let badge = BadgeObject { index, requests: self.requests.clone() };
        if !server.at(path.as_str(), badge).await? {
            log::warn!("Badge object {} was already registered", path);
        }
        log::debug!("Created external badge {}", path);
        Ok(OwnedObjectPath::try_from(path).map_err(zbus::Error::from)?)
    }

    /// Destroy method
    async fn destroy(
        &self,
        path: OwnedObjectPath,
        #[zbus(object_server)] server: &ObjectServer,
    ) -> std::result::Result<(), ServiceError> {
        let index = parse_badge_object_path(path.as_str())
            .ok_or_else(|| ServiceError::NotFound(format!("{} is not a badge object", path.as_str())))?;
        // The index stays taken until the group handles the request, so the object has to go first.
        match server.remove::<BadgeObject, _>(path.as_str()).await {
            Ok(_) => {}
            Err(zbus::Error::InterfaceNotFound) => {
                return Err(ServiceError::NotFound(format!("No badge at {}", path.as_str())));
            }
            Err(e) => return Err(e.into()),
        }
        forward(&self.requests, RECEIVER, |reply| BadgeRequest::Destroy { index, reply }).await?;
        log::debug!("Destroyed external badge {}", path.as_str());
        Ok(())
    }
}

/// `org.badgebar.badges.Badge1`: a single badge owned by another process.
#[derive(Debug)]
pub struct BadgeObject {
    index: u32,
    requests: UnboundedSender<BadgeRequest>,
}

#[dbus_interface(name = "org.badgebar.badges.Badge1")]
impl BadgeObject {
    /// SetVisible method
    async fn set_visible(&self, visible: bool) -> std::result::Result<(), ServiceError> {
        let index = self.index;
        forward(&self.requests, RECEIVER, |reply| BadgeRequest::SetVisible { index, visible, reply }).await
    }

    /// SetText method
    async fn set_text(&self, text: String) -> std::result::Result<(), ServiceError> {
        let index = self.index;
        forward(&self.requests, RECEIVER, |reply| BadgeRequest::SetText { index, text, reply }).await
    }

    /// SetQuality method. Valid qualities are 0 (normal), 1 (error) and 2 (gold).
    async fn set_quality(&self, quality: i32) -> std::result::Result<(), ServiceError> {
        let index = self.index;
        forward(&self.requests, RECEIVER, |reply| BadgeRequest::SetQuality { index, quality, reply }).await
    }
}

/// Connect to the session bus, export the badge group object and claim `org.badgebar.Badges`.
pub async fn serve_badges(requests: UnboundedSender<BadgeRequest>) -> Result<zbus::Connection> {
    let con = zbus::ConnectionBuilder::session()?.serve_at(names::BADGE_GROUP_OBJECT, BadgeGroupService { requests })?.build().await?;
    crate::claim_name(&con, names::BADGES_BUS).await?;
    log::info!("Serving {} on {}", names::BADGES_BUS, names::BADGE_GROUP_OBJECT);
    Ok(con)
}
