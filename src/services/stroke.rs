//! Stroke service — the in-progress draft tracker and commit path.
//!
//! DESIGN
//! ======
//! Each client is either Idle or Drawing. `start` stores a draft (stamping
//! authorship server-side), `append_point` grows it and returns the relay
//! segment for peers, `finish` merges optional shape geometry, commits the
//! stroke to history, and returns the finalized stroke for broadcast.
//!
//! The machine is non-reentrant: a second `start` while Drawing replaces the
//! draft and the previous one is lost. `append_point` and `finish` with no
//! draft return `None` and the caller emits nothing.

use tracing::info;
use uuid::Uuid;

use crate::protocol::{Point, ShapeGeometry, Stroke, StrokeSegment};
use crate::services::roster;
use crate::state::RoomState;

/// Begin a stroke. Authorship is stamped from the roster and connection id,
/// overriding any client-supplied `user`/`userId`. Returns the stamped
/// stroke for relay to peers.
pub fn start(room: &mut RoomState, client_id: Uuid, mut stroke: Stroke) -> Stroke {
    stroke.user = roster::name_of(room, client_id);
    stroke.user_id = Some(client_id);

    let stamped = stroke.clone();
    room.drafts.insert(client_id, stroke);
    stamped
}

/// Append one point to the client's draft. Returns the incremental segment
/// for relay, or `None` when the client has no stroke in progress.
pub fn append_point(room: &mut RoomState, client_id: Uuid, point: Point) -> Option<StrokeSegment> {
    let draft = room.drafts.get_mut(&client_id)?;
    draft.points.push(point);

    Some(StrokeSegment {
        stroke_id: draft.id.clone(),
        x: point.x,
        y: point.y,
        color: draft.color.clone(),
        stroke_width: draft.stroke_width.clone(),
        tool: draft.tool.clone(),
        user_id: client_id,
        user: draft.user.clone(),
    })
}

/// Finalize the client's draft: merge shape geometry if supplied (additive —
/// accumulated points are kept), commit to history, and return the finalized
/// stroke for broadcast. `None` when the client has no stroke in progress.
pub fn finish(room: &mut RoomState, client_id: Uuid, shape: Option<ShapeGeometry>) -> Option<Stroke> {
    let mut stroke = room.drafts.remove(&client_id)?;
    if let Some(geometry) = shape {
        merge_shape(&mut stroke, geometry);
    }

    info!(%client_id, stroke_id = %stroke.id, committed = room.history.strokes().len() + 1, "stroke committed");
    room.history.commit(stroke.clone());
    Some(stroke)
}

/// Drop the client's draft without committing. Used on disconnect: the
/// abandoned stroke never enters history, and peers that rendered the live
/// start/move events are not sent a retraction.
pub fn discard(room: &mut RoomState, client_id: Uuid) {
    room.drafts.remove(&client_id);
}

fn merge_shape(stroke: &mut Stroke, geometry: ShapeGeometry) {
    if geometry.shape_type.is_some() {
        stroke.shape_type = geometry.shape_type;
    }
    if geometry.start_x.is_some() {
        stroke.start_x = geometry.start_x;
    }
    if geometry.start_y.is_some() {
        stroke.start_y = geometry.start_y;
    }
    if geometry.end_x.is_some() {
        stroke.end_x = geometry.end_x;
    }
    if geometry.end_y.is_some() {
        stroke.end_y = geometry.end_y;
    }
}

#[cfg(test)]
#[path = "stroke_test.rs"]
mod tests;
