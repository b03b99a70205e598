//! Canvas service — whole-canvas operations over the committed history.
//!
//! DESIGN
//! ======
//! Undo and redo operate on whole-stroke granularity and answer with the
//! full remaining history, the canonical "replace entire canvas" snapshot.
//! Every client that applies the snapshot holds identical canvas state,
//! unlike the best-effort incremental move relays.

use tracing::info;

use crate::protocol::Stroke;
use crate::state::RoomState;

/// The full committed history, in commit order.
#[must_use]
pub fn snapshot(room: &RoomState) -> Vec<Stroke> {
    room.history.strokes().to_vec()
}

/// Atomically empty the history and the redo stack. Destructive and
/// unrecoverable; returns the empty snapshot for broadcast.
pub fn clear(room: &mut RoomState) -> Vec<Stroke> {
    room.history.clear();
    info!("canvas cleared");
    Vec::new()
}

/// Pop the newest committed stroke onto the redo stack. `None` when the
/// history is empty — the caller emits nothing.
pub fn undo(room: &mut RoomState) -> Option<Vec<Stroke>> {
    if !room.history.undo() {
        return None;
    }
    info!(remaining = room.history.strokes().len(), redo = room.history.redo_depth(), "stroke undone");
    Some(snapshot(room))
}

/// Restore the most recently undone stroke at the end of the history.
/// `None` when the redo stack is empty — the caller emits nothing.
pub fn redo(room: &mut RoomState) -> Option<Vec<Stroke>> {
    if !room.history.redo() {
        return None;
    }
    info!(total = room.history.strokes().len(), "stroke redone");
    Some(snapshot(room))
}

#[cfg(test)]
#[path = "canvas_test.rs"]
mod tests;
