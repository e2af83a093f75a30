use serde::{Deserialize, Serialize};

/// Closed set of looks a badge can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum::Display, strum::EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Quality {
    #[default]
    Normal,
    Error,
    Gold,
}

/// Background, border and text color of a badge, each packed as `0xRRGGBBAA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Palette {
    pub background: u32,
    pub border: u32,
    pub text: u32,
}

impl Quality {
    pub fn palette(self) -> Palette {
        match self {
            Quality::Normal => Palette { background: 0x285577FF, border: 0x4C7899FF, text: 0xFFFFFFFF },
            Quality::Error => Palette { background: 0xA54242FF, border: 0xCC6666FF, text: 0xC5C8C6FF },
            Quality::Gold => Palette { background: 0xDE935FFF, border: 0xF0C674FF, text: 0xFFFFFFFF },
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Quality::default().palette()
    }
}

/// Returned when an integer does not name a [`Quality`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{0} is not a badge quality, expected 0 (normal), 1 (error) or 2 (gold)")]
pub struct InvalidQuality(pub i32);

impl TryFrom<i32> for Quality {
    type Error = InvalidQuality;

    fn try_from(value: i32) -> Result<Self, InvalidQuality> {
        match value {
            0 => Ok(Quality::Normal),
            1 => Ok(Quality::Error),
            2 => Ok(Quality::Gold),
            other => Err(InvalidQuality(other)),
        }
    }
}
