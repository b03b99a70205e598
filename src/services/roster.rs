//! Roster service — display names of connected clients.
//!
//! DESIGN
//! ======
//! The roster maps connection ids to display names. Names are set on
//! `user:join` (overwriting freely, no uniqueness constraint) and dropped on
//! disconnect. All operations are total and idempotent: looking up or
//! removing an unknown client yields absence, never an error.

use tracing::info;
use uuid::Uuid;

use crate::state::RoomState;

/// Set or overwrite the display name for a client and return the updated
/// roster for broadcast. Order is not contractual.
pub fn join(room: &mut RoomState, client_id: Uuid, username: String) -> Vec<String> {
    info!(%client_id, username = %username, "user joined");
    room.names.insert(client_id, username);
    roster(room)
}

/// Drop a client's name on disconnect and return the updated roster.
pub fn remove(room: &mut RoomState, client_id: Uuid) -> Vec<String> {
    room.names.remove(&client_id);
    roster(room)
}

/// Current list of display names.
#[must_use]
pub fn roster(room: &RoomState) -> Vec<String> {
    room.names.values().cloned().collect()
}

/// Display name for a client, absent if it never joined.
#[must_use]
pub fn name_of(room: &RoomState, client_id: Uuid) -> Option<String> {
    room.names.get(&client_id).cloned()
}

#[cfg(test)]
#[path = "roster_test.rs"]
mod tests;
