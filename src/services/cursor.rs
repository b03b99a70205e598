//! Cursor service — ephemeral cursor position relay.
//!
//! DESIGN
//! ======
//! Cursor positions are purely ephemeral: relayed to peers and immediately
//! forgotten. Never stored, never part of `canvas:sync`, no ordering
//! guarantee relative to stroke events.

use uuid::Uuid;

use crate::protocol::{CursorPosition, Point};
use crate::services::roster;
use crate::state::RoomState;

/// Build the relay payload for a cursor move, tagged with the sender id and
/// its display name (absent when the sender never joined).
#[must_use]
pub fn position(room: &RoomState, client_id: Uuid, point: Point) -> CursorPosition {
    CursorPosition {
        socket_id: client_id,
        username: roster::name_of(room, client_id),
        x: point.x,
        y: point.y,
    }
}

#[cfg(test)]
#[path = "cursor_test.rs"]
mod tests;
