use super::*;
use crate::protocol::StrokeId;
use crate::state::test_helpers::sample_stroke;

fn drawing_client(room: &mut RoomState, name: &str, stroke_id: &str) -> Uuid {
    let client_id = Uuid::new_v4();
    roster::join(room, client_id, name.into());
    start(room, client_id, sample_stroke(stroke_id));
    client_id
}

#[test]
fn start_stamps_authorship_over_client_values() {
    let mut room = RoomState::new();
    let client_id = Uuid::new_v4();
    roster::join(&mut room, client_id, "Alice".into());

    let mut forged = sample_stroke("s1");
    forged.user = Some("Mallory".into());
    forged.user_id = Some(Uuid::new_v4());

    let stamped = start(&mut room, client_id, forged);
    assert_eq!(stamped.user.as_deref(), Some("Alice"));
    assert_eq!(stamped.user_id, Some(client_id));
}

#[test]
fn start_before_join_leaves_user_absent() {
    let mut room = RoomState::new();
    let client_id = Uuid::new_v4();
    let stamped = start(&mut room, client_id, sample_stroke("s1"));
    assert!(stamped.user.is_none());
    assert_eq!(stamped.user_id, Some(client_id));
}

#[test]
fn restart_replaces_draft_losing_previous() {
    let mut room = RoomState::new();
    let client_id = drawing_client(&mut room, "Alice", "first");
    append_point(&mut room, client_id, Point { x: 1.0, y: 1.0 });

    start(&mut room, client_id, sample_stroke("second"));
    append_point(&mut room, client_id, Point { x: 9.0, y: 9.0 });

    let committed = finish(&mut room, client_id, None).unwrap();
    assert_eq!(committed.id, StrokeId::Text("second".into()));
    assert_eq!(committed.points, [Point { x: 9.0, y: 9.0 }]);
    assert_eq!(room.history.strokes().len(), 1);
}

#[test]
fn append_point_builds_relay_segment() {
    let mut room = RoomState::new();
    let client_id = drawing_client(&mut room, "Alice", "s1");

    let segment = append_point(&mut room, client_id, Point { x: 2.0, y: 3.0 }).unwrap();
    assert_eq!(segment.stroke_id, StrokeId::Text("s1".into()));
    assert_eq!(segment.x, 2.0);
    assert_eq!(segment.y, 3.0);
    assert_eq!(segment.tool, Some(serde_json::json!("brush")));
    assert_eq!(segment.user_id, client_id);
    assert_eq!(segment.user.as_deref(), Some("Alice"));
}

#[test]
fn append_point_without_draft_is_dropped() {
    let mut room = RoomState::new();
    assert!(append_point(&mut room, Uuid::new_v4(), Point { x: 0.0, y: 0.0 }).is_none());
}

#[test]
fn points_accumulate_in_order() {
    let mut room = RoomState::new();
    let client_id = drawing_client(&mut room, "Alice", "s1");
    append_point(&mut room, client_id, Point { x: 1.0, y: 1.0 });
    append_point(&mut room, client_id, Point { x: 2.0, y: 2.0 });

    let committed = finish(&mut room, client_id, None).unwrap();
    assert_eq!(committed.points, [Point { x: 1.0, y: 1.0 }, Point { x: 2.0, y: 2.0 }]);
}

#[test]
fn finish_without_draft_is_noop() {
    let mut room = RoomState::new();
    assert!(finish(&mut room, Uuid::new_v4(), None).is_none());
    assert!(room.history.strokes().is_empty());
}

#[test]
fn finish_merges_shape_geometry_additively() {
    let mut room = RoomState::new();
    let client_id = drawing_client(&mut room, "Alice", "s1");
    append_point(&mut room, client_id, Point { x: 1.0, y: 1.0 });

    let geometry = ShapeGeometry {
        shape_type: Some("rect".into()),
        start_x: Some(0.0),
        start_y: Some(0.0),
        end_x: Some(10.0),
        end_y: Some(5.0),
    };
    let committed = finish(&mut room, client_id, Some(geometry)).unwrap();

    assert_eq!(committed.shape_type.as_deref(), Some("rect"));
    assert_eq!(committed.end_x, Some(10.0));
    // Merging geometry does not clear previously accumulated points.
    assert_eq!(committed.points, [Point { x: 1.0, y: 1.0 }]);
}

#[test]
fn finish_commits_and_clears_redo() {
    let mut room = RoomState::new();
    let first = drawing_client(&mut room, "Alice", "s1");
    finish(&mut room, first, None).unwrap();
    assert!(room.history.undo());
    assert_eq!(room.history.redo_depth(), 1);

    let second = drawing_client(&mut room, "Alice", "s2");
    finish(&mut room, second, None).unwrap();
    assert_eq!(room.history.redo_depth(), 0);
}

#[test]
fn finish_returns_to_idle() {
    let mut room = RoomState::new();
    let client_id = drawing_client(&mut room, "Alice", "s1");
    finish(&mut room, client_id, None).unwrap();
    assert!(finish(&mut room, client_id, None).is_none());
}

#[test]
fn discard_drops_draft_without_commit() {
    let mut room = RoomState::new();
    let client_id = drawing_client(&mut room, "Alice", "s1");
    append_point(&mut room, client_id, Point { x: 1.0, y: 1.0 });

    discard(&mut room, client_id);
    assert!(room.drafts.is_empty());
    assert!(room.history.strokes().is_empty());
    assert!(finish(&mut room, client_id, None).is_none());
}
