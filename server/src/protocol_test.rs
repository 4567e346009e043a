use super::*;

use sketch::{Point, Stroke};

fn sample_stroke() -> Stroke {
    Stroke {
        id: Uuid::new_v4(),
        points: vec![Point::new(1.0, 2.0), Point::new(3.0, 4.0)],
        color: "black".into(),
        width: 3.0,
        owner: None,
    }
}

#[test]
fn tags_match_the_wire_contract() {
    let ping = serde_json::to_value(WireMessage::Ping).unwrap();
    assert_eq!(ping, serde_json::json!({ "type": "ping" }));

    let pong = serde_json::to_value(WireMessage::Pong).unwrap();
    assert_eq!(pong, serde_json::json!({ "type": "pong" }));

    let clear = serde_json::to_value(WireMessage::Clear).unwrap();
    assert_eq!(clear, serde_json::json!({ "type": "clear" }));
}

#[test]
fn active_users_uses_camel_case_keys() {
    let client_id = Uuid::new_v4();
    let message = WireMessage::ActiveUsers {
        users: vec![RosterEntry {
            client_id,
            user_name: "ada".into(),
            color: "#ff0000".into(),
            room_code: "AB12".into(),
        }],
    };

    let value = serde_json::to_value(&message).unwrap();
    assert_eq!(value["type"], "active-users");
    let user = &value["users"][0];
    assert_eq!(user["clientID"], serde_json::json!(client_id));
    assert_eq!(user["userName"], "ada");
    assert_eq!(user["roomCode"], "AB12");
}

#[test]
fn stroke_message_round_trip() {
    let original = WireMessage::Stroke { stroke: sample_stroke() };
    let json = serde_json::to_string(&original).unwrap();
    let restored: WireMessage = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, original);
}

#[test]
fn sync_message_round_trip() {
    let original = WireMessage::Sync { strokes: vec![sample_stroke(), sample_stroke()] };
    let json = serde_json::to_string(&original).unwrap();
    let restored: WireMessage = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, original);
}

#[test]
fn unknown_type_fails_to_parse() {
    let result: Result<WireMessage, _> = serde_json::from_str(r#"{"type":"mystery"}"#);
    assert!(result.is_err());
}
