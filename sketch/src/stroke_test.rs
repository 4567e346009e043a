use super::*;

fn style() -> StrokeStyle {
    StrokeStyle { color: "black".into(), width: 3.0 }
}

// =============================================================================
// BUILDER
// =============================================================================

#[test]
fn begin_seeds_one_point() {
    let builder = StrokeBuilder::begin(Point::new(4.0, 5.0), style(), None);
    assert_eq!(builder.len(), 1);
    assert_eq!(builder.last_point(), Point::new(4.0, 5.0));
}

#[test]
fn append_is_unconditional() {
    let mut builder = StrokeBuilder::begin(Point::new(0.0, 0.0), style(), None);
    builder.append(Point::new(0.1, 0.0));
    builder.append(Point::new(0.1, 0.0));
    assert_eq!(builder.len(), 3);
}

#[test]
fn gesture_gate_rejects_sub_deadzone_wobble() {
    let params = GestureParams { drawing_deadzone: 5.0, max_jump: 100.0 };
    let mut builder = StrokeBuilder::begin(Point::new(0.0, 0.0), style(), None);
    assert!(builder.append_gesture(Point::new(1.0, 0.0), &params).is_none());
    assert_eq!(builder.len(), 1);
}

#[test]
fn gesture_gate_rejects_tracking_glitches() {
    let params = GestureParams { drawing_deadzone: 5.0, max_jump: 100.0 };
    let mut builder = StrokeBuilder::begin(Point::new(0.0, 0.0), style(), None);
    assert!(builder.append_gesture(Point::new(500.0, 0.0), &params).is_none());
    assert_eq!(builder.len(), 1);
}

#[test]
fn gesture_step_is_speed_adaptive() {
    let params = GestureParams { drawing_deadzone: 5.0, max_jump: 100.0 };
    let mut builder = StrokeBuilder::begin(Point::new(0.0, 0.0), style(), None);

    // Halfway to max jump: step half the distance toward the candidate.
    let recorded = builder.append_gesture(Point::new(50.0, 0.0), &params).unwrap();
    assert!((recorded.x - 25.0).abs() < 1e-9);
    assert!(recorded.y.abs() < 1e-9);

    // Near-max jump follows almost faithfully.
    let mut fast = StrokeBuilder::begin(Point::new(0.0, 0.0), style(), None);
    let recorded = fast.append_gesture(Point::new(99.0, 0.0), &params).unwrap();
    assert!(recorded.x > 90.0);
    assert!(recorded.x < 99.0);
}

// =============================================================================
// FINALIZE
// =============================================================================

#[test]
fn finalize_preserves_endpoints_exactly() {
    let mut builder = StrokeBuilder::begin(Point::new(1.5, 2.5), style(), None);
    for i in 1..40 {
        let t = f64::from(i);
        builder.append(Point::new(1.5 + t * 3.0, 2.5 + (t * 0.7).sin() * 12.0));
    }
    let last_in = builder.last_point();

    let stroke = builder.finalize(FinalizeMode::Freehand).unwrap();
    assert_eq!(stroke.points[0], Point::new(1.5, 2.5));
    assert_eq!(*stroke.points.last().unwrap(), last_in);
}

#[test]
fn finalize_never_increases_point_count() {
    let mut builder = StrokeBuilder::begin(Point::new(0.0, 0.0), style(), None);
    for i in 1..100 {
        let t = f64::from(i) * 0.3;
        builder.append(Point::new(t.cos() * 50.0, t.sin() * 50.0));
    }
    let raw_len = builder.len();
    let stroke = builder.finalize(FinalizeMode::Freehand).unwrap();
    assert!(stroke.points.len() <= raw_len);
}

#[test]
fn single_point_tap_survives_as_degenerate_stroke() {
    let builder = StrokeBuilder::begin(Point::new(7.0, 7.0), style(), None);
    let stroke = builder.finalize(FinalizeMode::Freehand).unwrap();
    assert_eq!(stroke.points, vec![Point::new(7.0, 7.0)]);
}

#[test]
fn finalize_carries_style_and_owner() {
    let builder = StrokeBuilder::begin(
        Point::new(0.0, 0.0),
        StrokeStyle { color: "#ff0000".into(), width: 8.0 },
        Some("client-42".into()),
    );
    let stroke = builder.finalize(FinalizeMode::Freehand).unwrap();
    assert_eq!(stroke.color, "#ff0000");
    assert!((stroke.width - 8.0).abs() < f64::EPSILON);
    assert_eq!(stroke.owner.as_deref(), Some("client-42"));
}

#[test]
fn finalize_with_recognition_replaces_straight_scribble_with_line() {
    let mut builder = StrokeBuilder::begin(Point::new(0.0, 0.0), style(), None);
    for i in 1..30 {
        builder.append(Point::new(f64::from(i) * 10.0, 0.0));
    }
    let stroke = builder.finalize(FinalizeMode::RecognizeShape).unwrap();
    assert_eq!(stroke.points.len(), 2);
    assert_eq!(stroke.points[0], Point::new(0.0, 0.0));
    assert_eq!(stroke.points[1], Point::new(290.0, 0.0));
}

// =============================================================================
// SIMPLIFICATION
// =============================================================================

#[test]
fn simplify_keeps_sharp_corners() {
    let mut points = Vec::new();
    for i in 0..=5 {
        points.push(Point::new(f64::from(i) * 2.0, 0.0));
    }
    for i in 1..=5 {
        points.push(Point::new(10.0, f64::from(i) * 2.0));
    }

    let simplified = simplify(&points);
    assert_eq!(
        simplified,
        vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)]
    );
}

#[test]
fn simplify_collapses_collinear_runs() {
    let points: Vec<Point> = (0..=20).map(|i| Point::new(f64::from(i), 0.0)).collect();
    let simplified = simplify(&points);
    assert!(simplified.len() < points.len());
    assert_eq!(simplified[0], points[0]);
    assert_eq!(*simplified.last().unwrap(), points[20]);
}

#[test]
fn simplify_passes_short_inputs_through() {
    let two = vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)];
    assert_eq!(simplify(&two), two);

    let one = vec![Point::new(3.0, 3.0)];
    assert_eq!(simplify(&one), one);
}

// =============================================================================
// WIRE
// =============================================================================

#[test]
fn stroke_deserializes_without_id_or_owner() {
    let json = r#"{"points":[{"x":1.0,"y":2.0}],"color":"blue","width":4.0}"#;
    let stroke: Stroke = serde_json::from_str(json).unwrap();
    assert_eq!(stroke.points.len(), 1);
    assert_eq!(stroke.color, "blue");
    assert!(stroke.owner.is_none());
}

#[test]
fn stroke_json_round_trip() {
    let original = Stroke {
        id: uuid::Uuid::new_v4(),
        points: vec![Point::new(0.0, 0.0), Point::new(5.0, 5.0)],
        color: "green".into(),
        width: 2.0,
        owner: Some("abc".into()),
    };
    let json = serde_json::to_string(&original).unwrap();
    let restored: Stroke = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, original);
}
