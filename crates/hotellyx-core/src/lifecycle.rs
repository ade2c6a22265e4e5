//! Request lifecycle engine.
//!
//! Statuses move along `new -> accepted -> in_progress -> done`, with
//! `cancelled` as a second terminal state. The engine itself is permissive:
//! [`RequestEngine::set_status`] accepts any target, including backwards
//! moves. Which moves a user is offered is decided by
//! [`crate::policy::TransitionPolicy`], layered above this module.
//!
//! Every mutator re-reads the whole collection, transforms it, and writes it
//! back. Unknown ids are a silent no-op; callers detect "not found" by
//! checking the returned collection.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::StoreError;
use crate::model::{Priority, Request, RequestStatus, Room, StatusStamps};
use crate::rooms;
use crate::store::{self, RecordStore};
use crate::token;

/// Optional inputs to [`RequestEngine::create`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewRequest {
    pub note: Option<String>,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub priority: Option<Priority>,
    pub room_number: Option<String>,
}

/// Staff-managed fields for [`RequestEngine::set_details`].
///
/// `None` leaves a field unchanged. An empty string, or an ETA that is not a
/// positive finite number, clears the field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailsUpdate {
    pub priority: Option<Priority>,
    pub staff_note: Option<String>,
    pub assigned_team: Option<String>,
    pub assigned_person: Option<String>,
    pub eta_minutes: Option<f64>,
}

/// Next status on the canonical forward path; see [`RequestStatus::next`].
#[must_use]
pub const fn advance(status: RequestStatus) -> RequestStatus {
    status.next()
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn eta_from(value: f64) -> Option<u32> {
    if !value.is_finite() || value <= 0.0 {
        return None;
    }
    let rounded = value.round();
    (rounded <= f64::from(u32::MAX)).then_some(rounded as u32)
}

fn apply_text(field: &mut Option<String>, update: Option<String>) {
    if update.is_some() {
        *field = trimmed(update);
    }
}

/// Apply `next` to one request, stamping its first arrival.
fn transition(request: &mut Request, next: RequestStatus, now: DateTime<Utc>) {
    request.status = next;
    if request.stamps.stamp_if_unset(next, now) {
        debug!(id = %request.id, status = %next, "stamped first arrival");
    }
}

/// Compare strings the way a person sorts room tokens: digit runs by value,
/// everything else case-insensitively.
#[must_use]
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let mut l_digits = String::new();
                while let Some(c) = left.next_if(char::is_ascii_digit) {
                    l_digits.push(c);
                }
                let mut r_digits = String::new();
                while let Some(c) = right.next_if(char::is_ascii_digit) {
                    r_digits.push(c);
                }
                let l_trim = l_digits.trim_start_matches('0');
                let r_trim = r_digits.trim_start_matches('0');
                let ordering = l_trim
                    .len()
                    .cmp(&r_trim.len())
                    .then_with(|| l_trim.cmp(r_trim));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(l), Some(r)) => {
                let ordering = l.to_lowercase().cmp(r.to_lowercase());
                if ordering != Ordering::Equal {
                    return ordering;
                }
                left.next();
                right.next();
            }
        }
    }
}

/// Read-modify-write access to the requests collection.
pub struct RequestEngine<'a, S: RecordStore + ?Sized> {
    store: &'a S,
    clock: &'a dyn Clock,
}

impl<'a, S: RecordStore + ?Sized> RequestEngine<'a, S> {
    pub fn new(store: &'a S, clock: &'a dyn Clock) -> Self {
        Self { store, clock }
    }

    /// Every stored request, most recent first by default.
    pub fn all(&self) -> Vec<Request> {
        store::load(self.store, self.clock.now())
    }

    fn rooms(&self) -> Vec<Room> {
        store::load(self.store, self.clock.now())
    }

    fn save(&self, requests: &[Request]) -> Result<(), StoreError> {
        store::save(self.store, requests)
    }

    /// Canonical token for a room link: the registered room's token when the
    /// link resolves to one, otherwise the normalized link itself.
    fn effective_token(&self, raw_token: &str) -> (String, Option<Room>) {
        let rooms = self.rooms();
        match rooms::resolve(&rooms, raw_token) {
            Some(room) => (room.token.clone(), Some(room.clone())),
            None => (token::normalize(raw_token), None),
        }
    }

    /// Create a `new` request for a room and prepend it to the collection.
    ///
    /// Optional text fields are trimmed and omitted when empty. When no room
    /// number is supplied, the registered room's number is recorded.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    pub fn create(
        &self,
        room_token: &str,
        kind: &str,
        input: NewRequest,
    ) -> Result<Request, StoreError> {
        let (room_token, room) = self.effective_token(room_token);
        let room_number = trimmed(input.room_number)
            .or_else(|| room.map(|room| room.room_number));

        let request = Request {
            id: Uuid::new_v4().to_string(),
            room_token,
            room_number,
            kind: kind.to_string(),
            status: RequestStatus::New,
            created_at: self.clock.now(),
            note: trimmed(input.note),
            scheduled_for: input.scheduled_for,
            priority: input.priority.unwrap_or_default(),
            staff_note: None,
            assigned_team: None,
            assigned_person: None,
            eta_minutes: None,
            stamps: StatusStamps::default(),
        };

        let mut updated = Vec::new();
        updated.push(request.clone());
        updated.extend(self.all());
        self.save(&updated)?;

        info!(id = %request.id, room = %request.room_token, kind = %request.kind, "request created");
        Ok(request)
    }

    /// The request with `id`, if present.
    pub fn by_id(&self, id: &str) -> Option<Request> {
        self.all().into_iter().find(|request| request.id == id)
    }

    /// Requests belonging to a room link.
    ///
    /// A request matches on the normalized link itself or on the token of
    /// the room the link resolves to. Legacy records whose stored token was
    /// never normalized still match.
    pub fn room_requests(&self, room_token: &str) -> Vec<Request> {
        let literal = token::normalize(room_token);
        if literal.is_empty() {
            return Vec::new();
        }
        let (resolved, _) = self.effective_token(room_token);

        self.all()
            .into_iter()
            .filter(|request| {
                let stored = token::normalize(&request.room_token);
                [literal.as_str(), resolved.as_str()]
                    .iter()
                    .any(|wanted| request.room_token == *wanted || stored == *wanted)
            })
            .collect()
    }

    /// Number of requests still `new` for a room.
    pub fn count_new_for_room(&self, room_token: &str) -> usize {
        self.room_requests(room_token)
            .iter()
            .filter(|request| request.status == RequestStatus::New)
            .count()
    }

    /// Every room token seen on a request or a registered room, deduplicated
    /// and naturally sorted.
    pub fn all_room_tokens(&self) -> Vec<String> {
        let mut tokens: Vec<String> = self
            .all()
            .into_iter()
            .map(|request| request.room_token)
            .chain(self.rooms().into_iter().map(|room| room.token))
            .collect();
        tokens.sort_by(|a, b| natural_cmp(a, b));
        tokens.dedup();
        tokens
    }

    /// Apply `mutate` to the request with `id` and persist.
    ///
    /// Leaves the store untouched when no request matches.
    fn update_one(
        &self,
        id: &str,
        mutate: impl FnOnce(&mut Request),
    ) -> Result<Vec<Request>, StoreError> {
        let mut requests = self.all();
        let Some(request) = requests.iter_mut().find(|request| request.id == id) else {
            debug!(id, "no request with this id, leaving collection unchanged");
            return Ok(requests);
        };

        mutate(request);
        self.save(&requests)?;
        Ok(requests)
    }

    /// Move a request to `next`.
    ///
    /// Any target is accepted. Reaching `accepted`, `in_progress`, `done`, or
    /// `cancelled` stamps that status's timestamp the first time only.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    pub fn set_status(&self, id: &str, next: RequestStatus) -> Result<Vec<Request>, StoreError> {
        let now = self.clock.now();
        let updated = self.update_one(id, |request| transition(request, next, now))?;
        info!(id, status = %next, "request status set");
        Ok(updated)
    }

    /// Move a request one step along the forward path.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    pub fn advance(&self, id: &str) -> Result<Vec<Request>, StoreError> {
        let now = self.clock.now();
        self.update_one(id, |request| {
            let next = advance(request.status);
            transition(request, next, now);
            info!(id = %request.id, status = %next, "request advanced");
        })
    }

    /// Update staff-managed fields; see [`DetailsUpdate`].
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    pub fn set_details(&self, id: &str, update: DetailsUpdate) -> Result<Vec<Request>, StoreError> {
        self.update_one(id, |request| {
            if let Some(priority) = update.priority {
                request.priority = priority;
            }
            apply_text(&mut request.staff_note, update.staff_note);
            apply_text(&mut request.assigned_team, update.assigned_team);
            apply_text(&mut request.assigned_person, update.assigned_person);
            if let Some(eta) = update.eta_minutes {
                request.eta_minutes = eta_from(eta);
            }
            info!(id = %request.id, "request details updated");
        })
    }

    /// Set or clear (empty string) the staff note.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    pub fn set_staff_note(&self, id: &str, note: &str) -> Result<Vec<Request>, StoreError> {
        self.set_details(
            id,
            DetailsUpdate {
                staff_note: Some(note.to_string()),
                ..DetailsUpdate::default()
            },
        )
    }
}
