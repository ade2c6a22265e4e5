//! Room registry and guest-set room status.
//!
//! Guest deep links sometimes carry a room number where a token was
//! expected, so every lookup goes through [`resolve_index`], which tries the
//! token first and the room number second. The request lifecycle uses the
//! same function to pin requests to a room's canonical token.

use tracing::{info, warn};

use crate::clock::Clock;
use crate::error::StoreError;
use crate::model::{Room, RoomStatus};
use crate::store::{self, RecordStore};
use crate::token::{self, DEFAULT_TOKEN_LENGTH};

/// Position of the room addressed by `token_or_number`, if any.
///
/// Match order: normalized token, then a legacy un-normalized stored token,
/// then room number.
#[must_use]
pub fn resolve_index(rooms: &[Room], token_or_number: &str) -> Option<usize> {
    let wanted = token::normalize(token_or_number);
    if wanted.is_empty() {
        return None;
    }

    rooms
        .iter()
        .position(|room| room.token == wanted)
        .or_else(|| {
            rooms
                .iter()
                .position(|room| token::normalize(&room.token) == wanted)
        })
        .or_else(|| rooms.iter().position(|room| room.room_number == wanted))
}

/// The room addressed by `token_or_number`, if any.
#[must_use]
pub fn resolve<'r>(rooms: &'r [Room], token_or_number: &str) -> Option<&'r Room> {
    resolve_index(rooms, token_or_number).map(|index| &rooms[index])
}

/// Read-modify-write access to the rooms collection.
pub struct RoomEngine<'a, S: RecordStore + ?Sized> {
    store: &'a S,
    clock: &'a dyn Clock,
    token_length: usize,
}

impl<'a, S: RecordStore + ?Sized> RoomEngine<'a, S> {
    pub fn new(store: &'a S, clock: &'a dyn Clock) -> Self {
        Self {
            store,
            clock,
            token_length: DEFAULT_TOKEN_LENGTH,
        }
    }

    /// Use `length` (clamped to 12..=16) for generated tokens.
    #[must_use]
    pub const fn with_token_length(mut self, length: usize) -> Self {
        self.token_length = length;
        self
    }

    /// All rooms in store order (most recently added first).
    pub fn list(&self) -> Vec<Room> {
        store::load(self.store, self.clock.now())
    }

    /// Look up a room by token or room number.
    pub fn find(&self, token_or_number: &str) -> Option<Room> {
        let rooms = self.list();
        resolve(&rooms, token_or_number).cloned()
    }

    /// Register a room with a fresh token.
    ///
    /// A room already registered under the same number is replaced, which
    /// retires its previous token. Returns `None` for a blank room number.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    pub fn add(&self, room_number: &str) -> Result<Option<Room>, StoreError> {
        let room_number = room_number.trim();
        if room_number.is_empty() {
            warn!("refusing to add a room with a blank number");
            return Ok(None);
        }

        let existing = self.list();
        let room = Room {
            room_number: room_number.to_string(),
            token: token::generate_unique(
                self.token_length,
                existing.iter().map(|room| room.token.as_str()),
            ),
            created_at: self.clock.now(),
            room_status: RoomStatus::Normal,
        };

        let replaced = existing
            .iter()
            .filter(|item| item.room_number == room.room_number)
            .count();
        let mut updated = Vec::with_capacity(existing.len() + 1);
        updated.push(room.clone());
        updated.extend(
            existing
                .into_iter()
                .filter(|item| item.room_number != room.room_number),
        );
        store::save(self.store, &updated)?;

        info!(room = %room.room_number, replaced, "room added");
        Ok(Some(room))
    }

    /// Issue a new token for a room, never reusing an existing token.
    ///
    /// Returns `None` when no room matches `current`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    pub fn regenerate_token(&self, current: &str) -> Result<Option<Room>, StoreError> {
        let mut rooms = self.list();
        let Some(index) = resolve_index(&rooms, current) else {
            return Ok(None);
        };

        let next = token::generate_unique(
            self.token_length,
            rooms.iter().map(|room| room.token.as_str()),
        );
        rooms[index].token = next;
        store::save(self.store, &rooms)?;

        let room = rooms.swap_remove(index);
        info!(room = %room.room_number, "room token regenerated");
        Ok(Some(room))
    }

    /// Current status of a room; `Normal` when the room is unknown.
    pub fn status(&self, token_or_number: &str) -> RoomStatus {
        self.find(token_or_number)
            .map(|room| room.room_status)
            .unwrap_or_default()
    }

    /// Set a room's status. Unknown rooms leave the collection untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    pub fn set_status(
        &self,
        token_or_number: &str,
        status: RoomStatus,
    ) -> Result<Vec<Room>, StoreError> {
        let mut rooms = self.list();
        let Some(index) = resolve_index(&rooms, token_or_number) else {
            return Ok(rooms);
        };

        rooms[index].room_status = status;
        store::save(self.store, &rooms)?;
        info!(room = %rooms[index].room_number, status = %status, "room status set");
        Ok(rooms)
    }
}
