//! Which status changes a user is offered.
//!
//! [`crate::lifecycle::RequestEngine`] accepts any transition. This layer
//! decides what the staff board and the guest page put in front of a user,
//! and the CLI checks it before calling the engine.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::model::{ParseEnumError, RequestStatus};

/// Who is acting on a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Actor {
    Guest,
    Staff,
}

impl Actor {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::Staff => "staff",
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Actor {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "guest" => Ok(Self::Guest),
            "staff" => Ok(Self::Staff),
            _ => Err(ParseEnumError {
                expected: "actor",
                got: s.to_string(),
            }),
        }
    }
}

/// Error returned when a transition is not offered to an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    pub actor: Actor,
    pub from: RequestStatus,
    pub to: RequestStatus,
    pub reason: &'static str,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cannot move a request from {} to {}: {}",
            self.actor, self.from, self.to, self.reason
        )
    }
}

impl std::error::Error for InvalidTransition {}

/// The transitions offered on the staff board and the guest page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionPolicy;

impl TransitionPolicy {
    /// The single action offered to `actor` for a request in `status`.
    ///
    /// Staff get the next forward step until the request is terminal. Guests
    /// can cancel a request nobody has accepted yet.
    #[must_use]
    pub const fn offered(self, actor: Actor, status: RequestStatus) -> Option<RequestStatus> {
        match (actor, status) {
            (Actor::Staff, RequestStatus::New | RequestStatus::Accepted | RequestStatus::InProgress) => {
                Some(status.next())
            }
            (Actor::Guest, RequestStatus::New) => Some(RequestStatus::Cancelled),
            _ => None,
        }
    }

    /// Button label for the action offered to `actor`, if any.
    #[must_use]
    pub const fn action_label(self, actor: Actor, status: RequestStatus) -> Option<&'static str> {
        match self.offered(actor, status) {
            Some(RequestStatus::Accepted) => Some("Accept"),
            Some(RequestStatus::InProgress) => Some("Start"),
            Some(RequestStatus::Done) => Some("Mark done"),
            Some(RequestStatus::Cancelled) => Some("Cancel request"),
            Some(RequestStatus::New) | None => None,
        }
    }

    /// Check that moving `from -> to` is the action offered to `actor`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] when the move is a no-op, starts from a
    /// terminal status, or is not the offered action.
    pub fn check(
        self,
        actor: Actor,
        from: RequestStatus,
        to: RequestStatus,
    ) -> Result<(), InvalidTransition> {
        let reject = |reason| InvalidTransition {
            actor,
            from,
            to,
            reason,
        };

        if from == to {
            return Err(reject("no-op transition is not offered"));
        }
        if from.is_terminal() {
            return Err(reject("request is already closed"));
        }
        if self.offered(actor, from) == Some(to) {
            Ok(())
        } else {
            Err(reject(match actor {
                Actor::Staff => "staff may only advance one step along the forward path",
                Actor::Guest => "guests may only cancel a request that is still new",
            }))
        }
    }
}
