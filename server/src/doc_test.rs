use super::*;

use sketch::Point;
use uuid::Uuid;

fn stroke_with_points(points: Vec<Point>) -> Stroke {
    Stroke { id: Uuid::new_v4(), points, color: "black".into(), width: 3.0, owner: None }
}

#[test]
fn push_preserves_append_order() {
    let mut log = StrokeLog::new();
    let first = stroke_with_points(vec![Point::new(0.0, 0.0)]);
    let second = stroke_with_points(vec![Point::new(1.0, 1.0)]);

    log.push(first.clone()).unwrap();
    log.push(second.clone()).unwrap();

    let snapshot = log.snapshot();
    assert_eq!(snapshot, vec![first, second]);
}

#[test]
fn empty_stroke_is_rejected_at_the_boundary() {
    let mut log = StrokeLog::new();
    let result = log.push(stroke_with_points(Vec::new()));
    assert_eq!(result, Err(DocError::EmptyStroke));
    assert!(log.is_empty());
}

#[test]
fn clear_empties_the_log() {
    let mut log = StrokeLog::new();
    log.push(stroke_with_points(vec![Point::new(0.0, 0.0)])).unwrap();
    assert_eq!(log.len(), 1);

    log.clear();
    assert!(log.is_empty());
    assert!(log.snapshot().is_empty());
}
