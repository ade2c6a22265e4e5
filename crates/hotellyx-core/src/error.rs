use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Machine-readable error codes surfaced by the CLI and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    InvalidConfigOverride,
    RequestNotFound,
    RoomNotFound,
    ServiceNotFound,
    InvalidRoomToken,
    TransitionNotOffered,
    InvalidServiceSlot,
    StoreUnavailable,
    StoreReadFailed,
    StoreWriteFailed,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::InvalidConfigOverride => "E1002",
            Self::RequestNotFound => "E2001",
            Self::RoomNotFound => "E2002",
            Self::ServiceNotFound => "E2003",
            Self::InvalidRoomToken => "E2004",
            Self::TransitionNotOffered => "E2005",
            Self::InvalidServiceSlot => "E2007",
            Self::StoreUnavailable => "E5001",
            Self::StoreReadFailed => "E5002",
            Self::StoreWriteFailed => "E5003",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::InvalidConfigOverride => "Invalid environment override",
            Self::RequestNotFound => "Request not found",
            Self::RoomNotFound => "Room not found",
            Self::ServiceNotFound => "Service not found",
            Self::InvalidRoomToken => "Invalid room link",
            Self::TransitionNotOffered => "Action not available for this request",
            Self::InvalidServiceSlot => "Service slot missing or not offered",
            Self::StoreUnavailable => "Record store unavailable",
            Self::StoreReadFailed => "Record store read failed",
            Self::StoreWriteFailed => "Record store write failed",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .hotellyx/config.toml and retry."),
            Self::InvalidConfigOverride => {
                Some("HOTELLYX_SLA_MINUTES must be a positive whole number of minutes.")
            }
            Self::RequestNotFound | Self::ServiceNotFound => None,
            Self::RoomNotFound => Some("Run `hx room list` to see known rooms and tokens."),
            Self::InvalidRoomToken => {
                Some("Room links may only contain letters, digits, and dashes.")
            }
            Self::TransitionNotOffered => {
                Some("Follow the forward path: new -> accepted -> in_progress -> done.")
            }
            Self::InvalidServiceSlot => {
                Some("Run `hx service show <id>` and pass one of the listed slots.")
            }
            Self::StoreUnavailable => Some("Check the store path and its directory permissions."),
            Self::StoreReadFailed => Some("Retry once. If persistent, inspect the store file."),
            Self::StoreWriteFailed => Some("Check disk space and write permissions."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Failures of the backing key-value store.
///
/// Only backend I/O produces these. A payload that cannot be parsed is not an
/// error: it loads as an empty collection.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("create store directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("open record store {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    #[error("read record '{key}': {source}")]
    Read {
        key: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("write record '{key}': {source}")]
    Write {
        key: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("serialize record '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// Machine-readable code associated with this store error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::CreateDir { .. } | Self::Open { .. } => ErrorCode::StoreUnavailable,
            Self::Read { .. } => ErrorCode::StoreReadFailed,
            Self::Write { .. } | Self::Serialize { .. } => ErrorCode::StoreWriteFailed,
        }
    }

    /// Optional remediation hint for operators.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorCode, StoreError};
    use std::collections::HashSet;

    const ALL: [ErrorCode; 11] = [
        ErrorCode::ConfigParseError,
        ErrorCode::InvalidConfigOverride,
        ErrorCode::RequestNotFound,
        ErrorCode::RoomNotFound,
        ErrorCode::ServiceNotFound,
        ErrorCode::InvalidRoomToken,
        ErrorCode::TransitionNotOffered,
        ErrorCode::InvalidServiceSlot,
        ErrorCode::StoreUnavailable,
        ErrorCode::StoreReadFailed,
        ErrorCode::StoreWriteFailed,
    ];

    #[test]
    fn all_codes_are_unique() {
        let mut seen = HashSet::new();
        for code in ALL {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn codes_cover_config_domain_and_store_only() {
        for code in ALL {
            let family = &code.code()[..2];
            assert!(
                matches!(family, "E1" | "E2" | "E5"),
                "unexpected code family {}",
                code.code()
            );
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        for code in ALL {
            let rendered = code.code();
            assert_eq!(rendered.len(), 5);
            assert!(rendered.starts_with('E'));
            assert!(rendered.chars().skip(1).all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn store_errors_map_to_store_codes() {
        let err = StoreError::CreateDir {
            path: "/nope".into(),
            source: std::io::Error::other("denied"),
        };
        assert_eq!(err.code(), ErrorCode::StoreUnavailable);
        assert!(err.hint().is_some());
        assert!(err.to_string().contains("/nope"));
    }
}
