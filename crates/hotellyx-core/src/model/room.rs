use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ParseEnumError, iso, normalize};

/// Guest-set room status, independent of any request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    #[default]
    Normal,
    Dnd,
    PleaseClean,
    MaintenanceNeeded,
}

impl RoomStatus {
    pub const ALL: [Self; 4] = [
        Self::Normal,
        Self::Dnd,
        Self::PleaseClean,
        Self::MaintenanceNeeded,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Dnd => "dnd",
            Self::PleaseClean => "please_clean",
            Self::MaintenanceNeeded => "maintenance_needed",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Dnd => "Do not disturb",
            Self::PleaseClean => "Please clean",
            Self::MaintenanceNeeded => "Maintenance needed",
        }
    }

    /// Parse a persisted value, accepting the legacy `do_not_disturb` alias.
    #[must_use]
    pub fn from_stored(raw: &str) -> Option<Self> {
        match raw {
            "normal" => Some(Self::Normal),
            "dnd" | "do_not_disturb" => Some(Self::Dnd),
            "please_clean" => Some(Self::PleaseClean),
            "maintenance_needed" => Some(Self::MaintenanceNeeded),
            _ => None,
        }
    }
}

/// A physical room and its guest-facing access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub room_number: String,
    pub token: String,
    #[serde(with = "iso")]
    pub created_at: DateTime<Utc>,
    pub room_status: RoomStatus,
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoomStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        Self::from_stored(normalized.as_str()).ok_or_else(|| ParseEnumError {
            expected: "room status",
            got: s.to_string(),
        })
    }
}
