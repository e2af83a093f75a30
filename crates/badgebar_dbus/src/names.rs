pub const NOTIFICATIONS_BUS: &str = "org.freedesktop.Notifications";
pub const NOTIFICATIONS_OBJECT: &str = "/org/freedesktop/Notifications";

pub const BADGES_BUS: &str = "org.badgebar.Badges";
pub const BADGE_GROUP_OBJECT: &str = "/org/badgebar/Badges/BadgeGroup1";
pub const BADGE_OBJECT_PREFIX: &str = "/org/badgebar/Badges/";
