//! DBus services exposed by badgebar.
//!
//! Nothing in here touches the badge pool. Every incoming method call is turned into a request
//! that is sent to the bar's tick thread, which answers it through a one-shot [`Reply`] the next
//! time it drains its queue.

mod error;
pub use error::*;

pub mod names;

mod request;
pub use request::*;

mod notifications;
pub use notifications::*;

mod badges;
pub use badges::*;

pub mod proxy;

/// Request a well-known name for a connection, failing if somebody else already owns it.
pub(crate) async fn claim_name(con: &zbus::Connection, name: &'static str) -> Result<()> {
    let flags = [zbus::fdo::RequestNameFlags::DoNotQueue];

    use zbus::fdo::RequestNameReply::*;
    match con.request_name_with_flags(name, flags.into_iter().collect()).await? {
        PrimaryOwner | AlreadyOwner => Ok(()),
        Exists | InQueue => Err(Error::NameTaken(name)),
    }
}
