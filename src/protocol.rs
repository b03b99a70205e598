//! Protocol — named events over JSON envelopes.
//!
//! ARCHITECTURE
//! ============
//! Every message on the wire is an envelope `{"event": <name>, "data": <payload>}`.
//! Clients send drawing and presence events, the server dispatches by event
//! name, and outbound events flow back in the same envelope shape.
//!
//! DESIGN
//! ======
//! - Inbound text is resolved exactly once, here, into a typed `ClientEvent`.
//!   Anything that fails to parse becomes a `ProtocolError`; the websocket
//!   layer logs it and drops the frame. No error ever reaches the sender.
//! - `stroke:move` accepts two payload shapes (`{point:{x,y}}` and `{x,y}`);
//!   both normalize to one canonical [`Point`] at this boundary.
//! - Stroke rendering metadata (`tool`, `color`, `strokeWidth`) is free-form
//!   and passed through unvalidated; unrecognized stroke fields survive a
//!   round trip via the flattened `extra` map.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// =============================================================================
// ERRORS
// =============================================================================

/// Why an inbound frame was rejected at the parse boundary.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("invalid envelope: {0}")]
    Envelope(#[source] serde_json::Error),
    #[error("unknown event: {0}")]
    UnknownEvent(String),
    #[error("malformed {event} payload: {source}")]
    Payload {
        event: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

// =============================================================================
// GEOMETRY
// =============================================================================

/// A single canvas coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Optional shape geometry, merged onto a stroke at commit time.
/// Present only for geometric shapes (line/rect/ellipse), never at start.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeGeometry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_y: Option<f64>,
}

// =============================================================================
// STROKE
// =============================================================================

/// Client-supplied stroke identifier. Opaque string or number, preserved
/// verbatim — never regenerated server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StrokeId {
    Text(String),
    Number(serde_json::Number),
}

impl std::fmt::Display for StrokeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

/// One drawing action: a freehand path or a geometric shape.
///
/// `user` and `userId` are stamped server-side when the stroke starts; any
/// client-supplied values are overwritten. `points` accumulates during the
/// move phase and may stay empty for pure-shape strokes. The shape fields
/// are merged in at commit, never at start.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    pub id: StrokeId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<Value>,
    #[serde(default)]
    pub points: Vec<Point>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_y: Option<f64>,
    /// Unrecognized client fields, preserved round-trip.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Incremental relay for one appended point. Carries enough metadata for a
/// renderer to draw the segment without the full stroke object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrokeSegment {
    pub stroke_id: StrokeId,
    pub x: f64,
    pub y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<Value>,
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

// =============================================================================
// PRESENCE
// =============================================================================

/// Live cursor position relay. Ephemeral — never stored, never synced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorPosition {
    pub socket_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub x: f64,
    pub y: f64,
}

// =============================================================================
// INBOUND EVENTS
// =============================================================================

/// The two accepted `stroke:move` payload shapes.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum MovePayload {
    Nested { point: Point },
    Flat(Point),
}

impl MovePayload {
    fn into_point(self) -> Point {
        match self {
            Self::Nested { point } | Self::Flat(point) => point,
        }
    }
}

/// Raw wire envelope. `data` defaults to null for payload-less events.
#[derive(Debug, Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Value,
}

/// A fully parsed inbound event.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    UserJoin(String),
    StrokeStart(Stroke),
    StrokeMove(Point),
    StrokeEnd(Option<ShapeGeometry>),
    ClearCanvas,
    Undo,
    Redo,
    CursorMove(Point),
    CursorLeave,
}

impl ClientEvent {
    /// Parse one inbound text frame into a typed event.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the envelope is not valid JSON, the event
    /// name is unknown, or the payload does not match the event's shape.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let envelope: Envelope = serde_json::from_str(text).map_err(ProtocolError::Envelope)?;
        Self::from_envelope(envelope)
    }

    fn from_envelope(envelope: Envelope) -> Result<Self, ProtocolError> {
        fn payload<T: serde::de::DeserializeOwned>(
            event: &'static str,
            data: Value,
        ) -> Result<T, ProtocolError> {
            serde_json::from_value(data).map_err(|source| ProtocolError::Payload { event, source })
        }

        match envelope.event.as_str() {
            "user:join" => Ok(Self::UserJoin(payload("user:join", envelope.data)?)),
            "stroke:start" => Ok(Self::StrokeStart(payload("stroke:start", envelope.data)?)),
            "stroke:move" => {
                let movement: MovePayload = payload("stroke:move", envelope.data)?;
                Ok(Self::StrokeMove(movement.into_point()))
            }
            "stroke:end" => Ok(Self::StrokeEnd(payload("stroke:end", envelope.data)?)),
            "clear:canvas" => Ok(Self::ClearCanvas),
            "undo" => Ok(Self::Undo),
            "redo" => Ok(Self::Redo),
            "cursor:move" => Ok(Self::CursorMove(payload("cursor:move", envelope.data)?)),
            "cursor:leave" => Ok(Self::CursorLeave),
            other => Err(ProtocolError::UnknownEvent(other.to_string())),
        }
    }

    /// Wire name of the event, for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::UserJoin(_) => "user:join",
            Self::StrokeStart(_) => "stroke:start",
            Self::StrokeMove(_) => "stroke:move",
            Self::StrokeEnd(_) => "stroke:end",
            Self::ClearCanvas => "clear:canvas",
            Self::Undo => "undo",
            Self::Redo => "redo",
            Self::CursorMove(_) => "cursor:move",
            Self::CursorLeave => "cursor:leave",
        }
    }

    /// Cursor traffic is high-frequency noise and excluded from frame logs.
    #[must_use]
    pub fn is_cursor(&self) -> bool {
        matches!(self, Self::CursorMove(_) | Self::CursorLeave)
    }
}

// =============================================================================
// OUTBOUND EVENTS
// =============================================================================

/// An outbound event, serialized into the `{"event", "data"}` envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// Full committed history, sent to a joining client only.
    #[serde(rename = "canvas:sync")]
    CanvasSync(Vec<Stroke>),
    /// Current roster of display names, sent to all clients.
    #[serde(rename = "users:update")]
    UsersUpdate(Vec<String>),
    /// Stamped stroke a peer just started. Sender excluded.
    #[serde(rename = "stroke:start")]
    StrokeStart(Stroke),
    /// Incremental point relay. Sender excluded.
    #[serde(rename = "stroke:move")]
    StrokeMove(StrokeSegment),
    /// Finalized committed stroke, sent to all clients including the sender.
    #[serde(rename = "stroke:end")]
    StrokeEnd(Stroke),
    /// Canonical "replace entire canvas" snapshot after undo/redo/clear.
    #[serde(rename = "canvas:reset")]
    CanvasReset(Vec<Stroke>),
    /// Peer cursor position. Sender excluded.
    #[serde(rename = "cursor:update")]
    CursorUpdate(CursorPosition),
    /// Cursor retraction, payload is the departing client id. Sender excluded.
    #[serde(rename = "cursor:remove")]
    CursorRemove(Uuid),
}

impl ServerEvent {
    /// Wire name of the event, for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::CanvasSync(_) => "canvas:sync",
            Self::UsersUpdate(_) => "users:update",
            Self::StrokeStart(_) => "stroke:start",
            Self::StrokeMove(_) => "stroke:move",
            Self::StrokeEnd(_) => "stroke:end",
            Self::CanvasReset(_) => "canvas:reset",
            Self::CursorUpdate(_) => "cursor:update",
            Self::CursorRemove(_) => "cursor:remove",
        }
    }

    /// Cursor traffic is excluded from frame logs.
    #[must_use]
    pub fn is_cursor(&self) -> bool {
        matches!(self, Self::CursorUpdate(_) | Self::CursorRemove(_))
    }
}

// =============================================================================
// TESTS
// =============================================================================
