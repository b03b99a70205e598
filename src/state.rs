//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the single shared room: committed stroke history plus redo stack,
//! per-client in-progress drafts, the roster of display names, and the
//! connected client senders used for broadcast fan-out.
//!
//! The history and redo stack are private to [`CanvasHistory`]; every
//! mutation goes through methods that uphold the protocol invariants (a
//! commit always empties the redo stack, a redone stroke re-enters at the
//! end of the history).

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::protocol::{ServerEvent, Stroke};

// =============================================================================
// CANVAS HISTORY
// =============================================================================

/// The authoritative canvas state: ordered committed strokes plus the stack
/// of undone strokes. Insertion order = commit order = render order.
#[derive(Debug, Default)]
pub struct CanvasHistory {
    strokes: Vec<Stroke>,
    redo: Vec<Stroke>,
}

impl CanvasHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finalized stroke. Any redo history is invalidated: redo
    /// entries are only valid immediately after undos with no new commit.
    pub fn commit(&mut self, stroke: Stroke) {
        self.strokes.push(stroke);
        self.redo.clear();
    }

    /// Move the newest committed stroke onto the redo stack.
    /// Returns false (and changes nothing) when the history is empty.
    pub fn undo(&mut self) -> bool {
        let Some(stroke) = self.strokes.pop() else {
            return false;
        };
        self.redo.push(stroke);
        true
    }

    /// Restore the most recently undone stroke. It is appended at the end of
    /// the history — it becomes the newest stroke again, not reinserted at
    /// its original position. Returns false when the redo stack is empty.
    pub fn redo(&mut self) -> bool {
        let Some(stroke) = self.redo.pop() else {
            return false;
        };
        self.strokes.push(stroke);
        true
    }

    /// Empty both the history and the redo stack. The clear itself is not
    /// recorded anywhere and cannot be undone.
    pub fn clear(&mut self) {
        self.strokes.clear();
        self.redo.clear();
    }

    #[must_use]
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }
}

// =============================================================================
// ROOM STATE
// =============================================================================

/// Live state of the one shared canvas room.
pub struct RoomState {
    /// Roster: display name per connected client, set on `user:join`.
    pub names: HashMap<Uuid, String>,
    /// At most one in-progress stroke per client, held between
    /// `stroke:start` and `stroke:end`. Never part of committed history.
    pub drafts: HashMap<Uuid, Stroke>,
    pub history: CanvasHistory,
    /// Connected clients: `client_id` -> sender for outgoing events.
    clients: HashMap<Uuid, mpsc::Sender<ServerEvent>>,
}

impl RoomState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            names: HashMap::new(),
            drafts: HashMap::new(),
            history: CanvasHistory::new(),
            clients: HashMap::new(),
        }
    }

    pub fn register_client(&mut self, client_id: Uuid, tx: mpsc::Sender<ServerEvent>) {
        self.clients.insert(client_id, tx);
    }

    pub fn unregister_client(&mut self, client_id: Uuid) {
        self.clients.remove(&client_id);
    }

    #[must_use]
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Fan an event out to every connected client, optionally excluding one.
    pub fn broadcast(&self, event: &ServerEvent, exclude: Option<Uuid>) {
        for (client_id, tx) in &self.clients {
            if exclude == Some(*client_id) {
                continue;
            }
            // Best-effort: if a client's channel is full, skip it.
            let _ = tx.try_send(event.clone());
        }
    }

    /// Send an event to a single client.
    pub fn send_to(&self, client_id: Uuid, event: &ServerEvent) {
        if let Some(tx) = self.clients.get(&client_id) {
            let _ = tx.try_send(event.clone());
        }
    }
}

impl Default for RoomState {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
#[derive(Clone)]
pub struct AppState {
    pub room: Arc<RwLock<RoomState>>,
}

impl AppState {
    #[must_use]
    pub fn new() -> Self {
        Self { room: Arc::new(RwLock::new(RoomState::new())) }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use super::*;
    use crate::protocol::StrokeId;

    #[must_use]
    pub fn test_app_state() -> AppState {
        AppState::new()
    }

    /// Register a fake client and return its id plus the receiving end of
    /// its channel, standing in for a live websocket.
    pub async fn connect_client(state: &AppState) -> (Uuid, mpsc::Receiver<ServerEvent>) {
        let client_id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(64);
        state.room.write().await.register_client(client_id, tx);
        (client_id, rx)
    }

    /// A minimal stroke with the given id and no author stamp.
    #[must_use]
    pub fn sample_stroke(id: &str) -> Stroke {
        Stroke {
            id: StrokeId::Text(id.into()),
            user: None,
            user_id: None,
            tool: Some(serde_json::json!("brush")),
            color: Some(serde_json::json!("#1a1a1a")),
            stroke_width: Some(serde_json::json!(3)),
            points: Vec::new(),
            shape_type: None,
            start_x: None,
            start_y: None,
            end_x: None,
            end_y: None,
            extra: serde_json::Map::new(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
