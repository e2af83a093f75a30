use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Dbus connection error")]
    DbusError(#[from] zbus::Error),
    #[error("Bus name {0} is already owned by another process")]
    NameTaken(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Errors that are sent back to bus clients as structured DBus errors, named
/// `org.badgebar.Error.<Variant>`.
#[derive(zbus::DBusError, Debug)]
#[dbus_error(prefix = "org.badgebar.Error")]
pub enum ServiceError {
    #[dbus_error(zbus_error)]
    ZBus(zbus::Error),
    /// No entity with the given id or path.
    NotFound(String),
    /// An argument was out of its allowed range.
    InvalidArgument(String),
    /// The provider-side table or the badge pool is full.
    OutOfSpace(String),
    /// The group that should answer the request is not running.
    Unavailable(String),
}
