use super::*;

#[test]
fn test_adjacent_position_strings() {
    assert_eq!(AdjacentPosition::BeforeBegin.as_str(), "beforebegin");
    assert_eq!(AdjacentPosition::AfterBegin.as_str(), "afterbegin");
    assert_eq!(AdjacentPosition::BeforeEnd.as_str(), "beforeend");
    assert_eq!(AdjacentPosition::AfterEnd.as_str(), "afterend");
}

#[test]
fn test_command_methods() {
    let cases: Vec<(DomCommand, &str)> = vec![
        (
            DomCommand::InsertAdjacentHtml {
                position: AdjacentPosition::BeforeEnd,
                html: "<b></b>".to_string(),
            },
            "insertAdjacentHTML",
        ),
        (
            DomCommand::Insert {
                index: 2,
                html: "x".to_string(),
            },
            "insert",
        ),
        (
            DomCommand::RemoveChildById {
                id: "9".to_string(),
            },
            "removeChildById",
        ),
        (DomCommand::RemoveChildByIndex { index: 0 }, "removeChildByIndex"),
        (DomCommand::Empty, "empty"),
        (DomCommand::Remove, "remove"),
        (DomCommand::Click, "click"),
        (
            DomCommand::TextContent {
                text: "hi".to_string(),
            },
            "textContent",
        ),
        (
            DomCommand::InnerHtml {
                html: "<i></i>".to_string(),
            },
            "innerHTML",
        ),
        (
            DomCommand::Eval {
                script: "1".to_string(),
            },
            "eval",
        ),
        (DomCommand::Scroll { x: 1, y: 2 }, "scroll"),
    ];
    for (cmd, method) in cases {
        assert_eq!(cmd.method(), method);
    }
}

#[test]
fn test_query_uses_its_method_name() {
    let cmd = DomCommand::Query {
        method: "scrollX".to_string(),
        reqid: 3,
    };
    assert_eq!(cmd.method(), "scrollX");
    assert_eq!(cmd.params(), vec![json!(3)]);
}

#[test]
fn test_outbound_envelope_shape() {
    let cmd = DomCommand::SetAttribute {
        name: "class".to_string(),
        value: "big red".to_string(),
    };
    let envelope = OutboundCommand::node("42", "div", &cmd);
    let value: Value = serde_json::from_str(&envelope.to_json()).unwrap();
    assert_eq!(value["method"], "setAttribute");
    assert_eq!(value["params"], json!(["class", "big red"]));
    assert_eq!(value["target"], "node");
    assert_eq!(value["id"], "42");
    assert_eq!(value["tag"], "div");
}

#[test]
fn test_inbound_event_deserialization() {
    let raw = r#"{
        "type": "event",
        "event": {
            "type": "input",
            "currentTarget": {"id": "5"},
            "target": {"id": "5"},
            "bubbles": true,
            "value": "hello"
        }
    }"#;
    let msg: InboundMessage = serde_json::from_str(raw).unwrap();
    match msg {
        InboundMessage::Event { event } => {
            assert_eq!(event.event_type, "input");
            assert_eq!(event.current_target.id, "5");
            assert!(event.bubbles);
            assert_eq!(event.extra["value"], "hello");
        }
        other => panic!("expected event, got {other:?}"),
    }
}

#[test]
fn test_inbound_response_deserialization() {
    let raw = r#"{"type": "response", "id": "8", "reqid": 2, "data": {"x": 10}}"#;
    let msg: InboundMessage = serde_json::from_str(raw).unwrap();
    match msg {
        InboundMessage::Response { id, reqid, data } => {
            assert_eq!(id, "8");
            assert_eq!(reqid, 2);
            assert_eq!(data["x"], 10);
        }
        other => panic!("expected response, got {other:?}"),
    }
}

#[test]
fn test_inbound_response_data_defaults_to_null() {
    let raw = r#"{"type": "response", "id": "8", "reqid": 0}"#;
    let msg: InboundMessage = serde_json::from_str(raw).unwrap();
    match msg {
        InboundMessage::Response { data, .. } => assert!(data.is_null()),
        other => panic!("expected response, got {other:?}"),
    }
}

#[test]
fn test_unknown_discriminator_is_tolerated() {
    let raw = r#"{"type": "heartbeat", "at": 12345}"#;
    let msg: InboundMessage = serde_json::from_str(raw).unwrap();
    assert!(matches!(msg, InboundMessage::Unknown));
}

#[test]
fn test_missing_discriminator_is_an_error() {
    let raw = r#"{"event": {}}"#;
    assert!(serde_json::from_str::<InboundMessage>(raw).is_err());
}
