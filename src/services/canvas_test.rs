use super::*;
use crate::state::test_helpers::sample_stroke;

fn ids(strokes: &[Stroke]) -> Vec<String> {
    strokes.iter().map(|s| s.id.to_string()).collect()
}

#[test]
fn snapshot_reflects_commit_order() {
    let mut room = RoomState::new();
    room.history.commit(sample_stroke("a"));
    room.history.commit(sample_stroke("b"));
    assert_eq!(ids(&snapshot(&room)), ["a", "b"]);
}

#[test]
fn undo_pops_newest_and_returns_remaining() {
    let mut room = RoomState::new();
    room.history.commit(sample_stroke("a"));
    room.history.commit(sample_stroke("b"));

    let remaining = undo(&mut room).unwrap();
    assert_eq!(ids(&remaining), ["a"]);
    assert_eq!(room.history.redo_depth(), 1);
}

#[test]
fn undo_on_empty_returns_none() {
    let mut room = RoomState::new();
    assert!(undo(&mut room).is_none());
}

#[test]
fn redo_restores_at_end_of_order() {
    let mut room = RoomState::new();
    room.history.commit(sample_stroke("a"));
    room.history.commit(sample_stroke("b"));
    undo(&mut room).unwrap();

    let restored = redo(&mut room).unwrap();
    assert_eq!(ids(&restored), ["a", "b"]);
    assert_eq!(room.history.redo_depth(), 0);
}

#[test]
fn redo_on_empty_stack_returns_none() {
    let mut room = RoomState::new();
    room.history.commit(sample_stroke("a"));
    assert!(redo(&mut room).is_none());
}

#[test]
fn clear_empties_everything() {
    let mut room = RoomState::new();
    room.history.commit(sample_stroke("a"));
    undo(&mut room).unwrap();
    room.history.commit(sample_stroke("b"));

    let emptied = clear(&mut room);
    assert!(emptied.is_empty());
    assert!(room.history.strokes().is_empty());
    assert!(undo(&mut room).is_none());
    assert!(redo(&mut room).is_none());
}
