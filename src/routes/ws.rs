//! WebSocket handler — bidirectional event relay.
//!
//! DESIGN
//! ======
//! On upgrade, generates a client ID and enters a `select!` loop:
//! - Incoming client frames → parse + dispatch by event name
//! - Events fanned out by peers → forward to client
//!
//! Handler functions are pure business logic — they validate, mutate room
//! state, and return `Outcome`s. The dispatch layer owns all outbound
//! concerns and applies each outcome to its audience.
//!
//! Every inbound event acquires the room write lock once and runs to
//! completion under it, mutation and fan-out together. Arrival order at the
//! lock is the protocol's only ordering guarantee: a `stroke:end` racing a
//! `clear:canvas` is resolved purely by whichever is handled first.
//!
//! Invalid input never answers the sender. Unparseable frames, unknown
//! events, and out-of-precondition operations are logged and dropped.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → register the connection's event channel (nothing is sent)
//! 2. Client sends `user:join` → roster broadcast + `canvas:sync`
//! 3. Drawing/presence events → dispatch → handlers return Outcomes
//! 4. Close → discard draft, drop roster entry, retract cursor, rebroadcast

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::protocol::{ClientEvent, Point, ServerEvent, ShapeGeometry, Stroke};
use crate::services;
use crate::state::{AppState, RoomState};

// =============================================================================
// OUTCOME
// =============================================================================

/// One outbound emission decided by a handler. The dispatch layer applies
/// outcomes in order — handlers never send events directly.
enum Outcome {
    /// Broadcast to ALL connected clients including the sender.
    All(ServerEvent),
    /// Broadcast to all clients EXCLUDING the sender.
    Peers(ServerEvent),
    /// Send to the sender only.
    Sender(ServerEvent),
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let client_id = Uuid::new_v4();

    // Per-connection channel for receiving events fanned out by peers.
    let (client_tx, mut client_rx) = mpsc::channel::<ServerEvent>(256);
    {
        let mut room = state.room.write().await;
        room.register_client(client_id, client_tx);
        info!(%client_id, clients = room.client_count(), "ws: client connected");
    }

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(msg) = msg else { break };
                let Ok(msg) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        handle_text(&state, client_id, &text).await;
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(event) = client_rx.recv() => {
                if send_event(&mut socket, client_id, &event).await.is_err() {
                    break;
                }
            }
        }
    }

    disconnect(&state, client_id).await;
}

/// Disconnect lifecycle. The in-progress draft is silently discarded — it
/// never enters history, and peers that rendered the live start/move events
/// keep a local artifact the server will not retract.
async fn disconnect(state: &AppState, client_id: Uuid) {
    let mut room = state.room.write().await;
    services::stroke::discard(&mut room, client_id);
    room.unregister_client(client_id);
    let roster = services::roster::remove(&mut room, client_id);
    room.broadcast(&ServerEvent::UsersUpdate(roster), None);
    room.broadcast(&ServerEvent::CursorRemove(client_id), None);
    info!(%client_id, remaining = room.client_count(), "ws: client disconnected");
}

// =============================================================================
// EVENT DISPATCH
// =============================================================================

/// Parse one inbound text frame and run it to completion.
///
/// Split from the socket loop so tests can drive the full dispatch path
/// against fake clients registered in state.
async fn handle_text(state: &AppState, client_id: Uuid, text: &str) {
    let event = match ClientEvent::parse(text) {
        Ok(event) => event,
        Err(e) => {
            warn!(%client_id, error = %e, "ws: dropping invalid frame");
            return;
        }
    };

    if !event.is_cursor() {
        info!(%client_id, event = event.name(), "ws: recv");
    }

    let mut room = state.room.write().await;
    let outcomes = dispatch(&mut room, client_id, event);
    apply(&room, client_id, outcomes);
}

/// Route a parsed event to its handler.
fn dispatch(room: &mut RoomState, client_id: Uuid, event: ClientEvent) -> Vec<Outcome> {
    match event {
        ClientEvent::UserJoin(name) => handle_user_join(room, client_id, name),
        ClientEvent::StrokeStart(stroke) => handle_stroke_start(room, client_id, stroke),
        ClientEvent::StrokeMove(point) => handle_stroke_move(room, client_id, point),
        ClientEvent::StrokeEnd(shape) => handle_stroke_end(room, client_id, shape),
        ClientEvent::ClearCanvas => handle_clear_canvas(room),
        ClientEvent::Undo => handle_undo(room),
        ClientEvent::Redo => handle_redo(room),
        ClientEvent::CursorMove(point) => handle_cursor_move(room, client_id, point),
        ClientEvent::CursorLeave => vec![Outcome::Peers(ServerEvent::CursorRemove(client_id))],
    }
}

/// Apply outcomes in order — the single place outbound events are emitted.
fn apply(room: &RoomState, client_id: Uuid, outcomes: Vec<Outcome>) {
    for outcome in outcomes {
        match outcome {
            Outcome::All(event) => room.broadcast(&event, None),
            Outcome::Peers(event) => room.broadcast(&event, Some(client_id)),
            Outcome::Sender(event) => room.send_to(client_id, &event),
        }
    }
}

// =============================================================================
// SESSION HANDLERS
// =============================================================================

/// `user:join` — set the display name, broadcast the roster to everyone,
/// then sync the full canvas to the joiner only. Late joiners receive
/// exactly the committed history, never in-progress strokes.
fn handle_user_join(room: &mut RoomState, client_id: Uuid, name: String) -> Vec<Outcome> {
    let roster = services::roster::join(room, client_id, name);
    vec![
        Outcome::All(ServerEvent::UsersUpdate(roster)),
        Outcome::Sender(ServerEvent::CanvasSync(services::canvas::snapshot(room))),
    ]
}

// =============================================================================
// STROKE HANDLERS
// =============================================================================

/// `stroke:start` — stamp authorship, store the draft, relay to peers. The
/// initiating client does not receive its own start back.
fn handle_stroke_start(room: &mut RoomState, client_id: Uuid, stroke: Stroke) -> Vec<Outcome> {
    let stamped = services::stroke::start(room, client_id, stroke);
    vec![Outcome::Peers(ServerEvent::StrokeStart(stamped))]
}

/// `stroke:move` — append to the draft and relay the segment. No draft
/// means the event is dropped without a reply.
fn handle_stroke_move(room: &mut RoomState, client_id: Uuid, point: Point) -> Vec<Outcome> {
    match services::stroke::append_point(room, client_id, point) {
        Some(segment) => vec![Outcome::Peers(ServerEvent::StrokeMove(segment))],
        None => Vec::new(),
    }
}

/// `stroke:end` — commit the draft. The finalized stroke goes to ALL
/// clients including the sender, which needs the server-authoritative
/// stamped/merged version rather than its local one.
fn handle_stroke_end(room: &mut RoomState, client_id: Uuid, shape: Option<ShapeGeometry>) -> Vec<Outcome> {
    match services::stroke::finish(room, client_id, shape) {
        Some(stroke) => vec![Outcome::All(ServerEvent::StrokeEnd(stroke))],
        None => Vec::new(),
    }
}

// =============================================================================
// CANVAS HANDLERS
// =============================================================================

fn handle_clear_canvas(room: &mut RoomState) -> Vec<Outcome> {
    let emptied = services::canvas::clear(room);
    vec![Outcome::All(ServerEvent::CanvasReset(emptied))]
}

fn handle_undo(room: &mut RoomState) -> Vec<Outcome> {
    match services::canvas::undo(room) {
        Some(remaining) => vec![Outcome::All(ServerEvent::CanvasReset(remaining))],
        None => Vec::new(),
    }
}

fn handle_redo(room: &mut RoomState) -> Vec<Outcome> {
    match services::canvas::redo(room) {
        Some(restored) => vec![Outcome::All(ServerEvent::CanvasReset(restored))],
        None => Vec::new(),
    }
}

// =============================================================================
// CURSOR HANDLER
// =============================================================================

fn handle_cursor_move(room: &mut RoomState, client_id: Uuid, point: Point) -> Vec<Outcome> {
    let update = services::cursor::position(room, client_id, point);
    vec![Outcome::Peers(ServerEvent::CursorUpdate(update))]
}

// =============================================================================
// HELPERS
// =============================================================================

async fn send_event(socket: &mut WebSocket, client_id: Uuid, event: &ServerEvent) -> Result<(), ()> {
    let json = match serde_json::to_string(event) {
        Ok(j) => j,
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize event");
            return Err(());
        }
    };
    if !event.is_cursor() {
        info!(%client_id, event = event.name(), "ws: send");
    }
    socket.send(Message::Text(json.into())).await.map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
