use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{Value, json};

use mirrordom_protocols::DomError;

use crate::dom::strip_sync_ids;
use crate::sync::document::Document;
use crate::sync::emitter::WebNode;
use crate::test_support::RecordingTransport;

fn connected() -> (Document, Arc<RecordingTransport>) {
    let doc = Document::new(crate::sync::SyncContext::new(), "test").unwrap();
    let conn = RecordingTransport::new("conn-1");
    doc.add_connection(conn.clone());
    conn.clear();
    (doc, conn)
}

fn attached_div(doc: &Document) -> WebNode {
    let div = doc.context().create_element("div");
    doc.body().append_child(&div).unwrap();
    div
}

fn method(command: &Value) -> &str {
    command["method"].as_str().unwrap()
}

#[test]
fn test_disconnected_mutations_emit_nothing() {
    let ctx = crate::sync::SyncContext::new();
    let div = ctx.create_element("div");
    div.set_attribute("class", "box").unwrap();
    div.append_child(ctx.create_element("span")).unwrap();
    div.set_text_content("hello").unwrap();
    assert!(!div.is_connected());
    // Local state still moved.
    assert_eq!(div.text_content(), "hello");
}

#[test]
fn test_connected_append_emits_insert_adjacent_html() {
    let (doc, conn) = connected();
    let div = attached_div(&doc);
    conn.clear();

    let span = doc.context().create_element("span");
    div.append_child(&span).unwrap();

    let command = conn.last_command().unwrap();
    assert_eq!(method(&command), "insertAdjacentHTML");
    assert_eq!(command["target"], "node");
    assert_eq!(command["id"], json!(div.node().id()));
    assert_eq!(command["tag"], "div");
    assert_eq!(command["params"][0], "beforeend");
    let html = command["params"][1].as_str().unwrap();
    assert!(html.contains(&format!("mdom-id=\"{}\"", span.node().id())));
    // The command body is exactly the child as the local tree renders it.
    assert_eq!(html, span.html());
    assert_eq!(strip_sync_ids(html), span.html_noid());
    // Applied locally as well.
    assert_eq!(div.node().child_count(), 1);
}

#[test]
fn test_sequential_appends_emit_in_call_order() {
    let (doc, conn) = connected();
    let list = attached_div(&doc);
    conn.clear();

    let mut expected = Vec::new();
    for label in ["one", "two", "three"] {
        let item = doc.context().create_element("li");
        item.node()
            .append_child(&doc.context().create_text(label))
            .unwrap();
        list.append_child(&item).unwrap();
        expected.push(item.html());
    }

    let commands = conn.commands();
    assert_eq!(commands.len(), 3);
    let emitted: Vec<&str> = commands
        .iter()
        .map(|c| c["params"][1].as_str().unwrap())
        .collect();
    assert_eq!(emitted, expected);
}

#[test]
fn test_insert_before_element_reference_addresses_the_reference() {
    let (doc, conn) = connected();
    let list = attached_div(&doc);
    let last = doc.context().create_element("li");
    list.append_child(&last).unwrap();
    conn.clear();

    let first = doc.context().create_element("li");
    list.insert_before(&first, last.node()).unwrap();

    let command = conn.last_command().unwrap();
    assert_eq!(method(&command), "insertAdjacentHTML");
    assert_eq!(command["id"], json!(last.node().id()));
    assert_eq!(command["params"][0], "beforebegin");
    assert_eq!(list.node().index_of(first.node()), Some(0));
}

#[test]
fn test_insert_before_text_reference_emits_positional_insert() {
    let (doc, conn) = connected();
    let list = attached_div(&doc);
    let text = doc.context().create_text("tail");
    list.append_child(&text).unwrap();
    conn.clear();

    let first = doc.context().create_element("li");
    list.insert_before(&first, &text).unwrap();

    let command = conn.last_command().unwrap();
    assert_eq!(method(&command), "insert");
    assert_eq!(command["id"], json!(list.node().id()));
    assert_eq!(command["params"][0], 0);
}

#[test]
fn test_remove_element_child_by_identity() {
    let (doc, conn) = connected();
    let div = attached_div(&doc);
    let span = doc.context().create_element("span");
    div.append_child(&span).unwrap();
    conn.clear();

    div.remove_child(&span).unwrap();

    let command = conn.last_command().unwrap();
    assert_eq!(method(&command), "removeChildById");
    assert_eq!(command["params"][0], json!(span.node().id()));
    assert_eq!(div.node().child_count(), 0);
}

#[test]
fn test_remove_text_child_by_index() {
    let (doc, conn) = connected();
    let div = attached_div(&doc);
    let text = doc.context().create_text("hi");
    div.append_child(&text).unwrap();
    conn.clear();

    div.remove_child(&text).unwrap();

    let command = conn.last_command().unwrap();
    assert_eq!(method(&command), "removeChildByIndex");
    assert_eq!(command["params"][0], 0);
}

#[test]
fn test_replace_element_child_by_identity() {
    let (doc, conn) = connected();
    let div = attached_div(&doc);
    let old = doc.context().create_element("b");
    div.append_child(&old).unwrap();
    conn.clear();

    let new = doc.context().create_element("i");
    div.replace_child(&new, old.node()).unwrap();

    let command = conn.last_command().unwrap();
    assert_eq!(method(&command), "replaceChildById");
    assert_eq!(command["params"][1], json!(old.node().id()));
    assert!(old.node().parent().is_none());
    assert_eq!(div.node().index_of(new.node()), Some(0));
}

#[test]
fn test_failed_operation_emits_nothing() {
    let (doc, conn) = connected();
    let div = attached_div(&doc);
    conn.clear();

    let stranger = doc.context().create_element("span");
    assert!(matches!(
        div.remove_child(&stranger),
        Err(DomError::NotAChild { .. })
    ));
    assert!(matches!(
        div.set_attribute("mdom-id", "7"),
        Err(DomError::ImmutableId(_))
    ));
    assert!(conn.sent().is_empty());
}

#[test]
fn test_empty_and_remove_commands() {
    let (doc, conn) = connected();
    let div = attached_div(&doc);
    div.append_child(doc.context().create_element("span"))
        .unwrap();
    conn.clear();

    div.empty();
    assert_eq!(method(&conn.last_command().unwrap()), "empty");
    assert_eq!(div.node().child_count(), 0);

    div.remove();
    // `remove` emits before detaching, while the node is still connected.
    assert_eq!(method(&conn.last_command().unwrap()), "remove");
    assert!(div.node().parent().is_none());
}

#[test]
fn test_attribute_commands() {
    let (doc, conn) = connected();
    let div = attached_div(&doc);
    conn.clear();

    div.set_attribute("title", "greeting").unwrap();
    let command = conn.last_command().unwrap();
    assert_eq!(method(&command), "setAttribute");
    assert_eq!(command["params"], json!(["title", "greeting"]));

    div.remove_attribute("title");
    let command = conn.last_command().unwrap();
    assert_eq!(method(&command), "removeAttribute");
    assert_eq!(command["params"], json!(["title"]));
}

#[test]
fn test_removing_absent_attribute_emits_nothing() {
    let (doc, conn) = connected();
    let div = attached_div(&doc);
    conn.clear();

    assert!(div.remove_attribute("title").is_none());
    assert!(conn.sent().is_empty());

    let text = doc.context().create_text("plain");
    doc.body().append_child(&text).unwrap();
    conn.clear();
    assert!(doc.context().web(&text).remove_attribute("title").is_none());
    assert!(conn.sent().is_empty());
}

#[test]
fn test_class_helpers_emit_class_attribute() {
    let (doc, conn) = connected();
    let div = attached_div(&doc);
    conn.clear();

    div.add_class("alpha").unwrap();
    div.add_class("beta").unwrap();
    // Re-adding is a no-op.
    div.add_class("alpha").unwrap();
    let command = conn.last_command().unwrap();
    assert_eq!(command["params"], json!(["class", "alpha beta"]));

    assert!(div.remove_class("alpha").unwrap());
    assert!(!div.remove_class("alpha").unwrap());
    // Removing the last class drops the attribute entirely.
    assert!(div.remove_class("beta").unwrap());
    assert_eq!(method(&conn.last_command().unwrap()), "removeAttribute");
    assert!(!div.node().has_attribute("class"));
}

#[test]
fn test_text_content_command_and_local_apply() {
    let (doc, conn) = connected();
    let div = attached_div(&doc);
    div.append_child(doc.context().create_element("span"))
        .unwrap();
    conn.clear();

    div.set_text_content("plain").unwrap();
    let command = conn.last_command().unwrap();
    assert_eq!(method(&command), "textContent");
    assert_eq!(command["params"], json!(["plain"]));
    assert_eq!(div.node().child_count(), 1);
    assert_eq!(div.text_content(), "plain");
}

#[test]
fn test_inner_html_carries_fresh_identities() {
    let (doc, conn) = connected();
    let div = attached_div(&doc);
    conn.clear();

    div.set_inner_html("<p>one</p><p>two</p>").unwrap();

    let command = conn.last_command().unwrap();
    assert_eq!(method(&command), "innerHTML");
    let html = command["params"][0].as_str().unwrap();
    // The command body and the local children agree on identities.
    for child in div.node().children() {
        assert!(html.contains(&format!("mdom-id=\"{}\"", child.id())));
    }
    assert_eq!(strip_sync_ids(html), "<p>one</p><p>two</p>");
    assert_eq!(div.node().child_count(), 2);
}

#[test]
fn test_listener_commands_per_event_type() {
    let (doc, conn) = connected();
    let button = attached_div(&doc);
    conn.clear();

    let first = button.add_event_listener("click", Arc::new(|_| {}));
    assert_eq!(method(&conn.last_command().unwrap()), "addEventListener");
    conn.clear();

    // Second listener of the same type: host-local only.
    let second = button.add_event_listener("click", Arc::new(|_| {}));
    assert!(conn.sent().is_empty());

    assert!(button.remove_event_listener("click", first));
    assert!(conn.sent().is_empty());
    assert!(button.remove_event_listener("click", second));
    let command = conn.last_command().unwrap();
    assert_eq!(method(&command), "removeEventListener");
    assert_eq!(command["params"], json!(["click"]));

    assert!(!button.remove_event_listener("click", second));
}

#[test]
fn test_click_connected_goes_to_browser() {
    let (doc, conn) = connected();
    let button = attached_div(&doc);
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = fired.clone();
    button.add_event_listener(
        "click",
        Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
    );
    conn.clear();

    button.click();
    assert_eq!(method(&conn.last_command().unwrap()), "click");
    // The real event would come back over the wire; nothing fires locally.
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}

#[test]
fn test_click_disconnected_synthesizes_locally() {
    let ctx = crate::sync::SyncContext::new();
    let button = ctx.create_element("button");
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = fired.clone();
    button.add_event_listener(
        "click",
        Arc::new(move |event| {
            assert_eq!(event.event_type, "click");
            counter.fetch_add(1, Ordering::SeqCst);
        }),
    );
    button.click();
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[test]
fn test_js_exec_emits_raw_method_call() {
    let (doc, conn) = connected();
    let div = attached_div(&doc);
    conn.clear();

    div.js_exec("focus", vec![]);
    let command = conn.last_command().unwrap();
    assert_eq!(method(&command), "focus");
    assert_eq!(command["id"], json!(div.node().id()));
    assert_eq!(command["params"], json!([]));
}

#[test]
fn test_scroll_family() {
    let (doc, conn) = connected();
    let div = attached_div(&doc);
    conn.clear();

    div.scroll(1, 2);
    div.scroll_to(3, 4);
    div.scroll_by(5, 6);
    let commands = conn.commands();
    assert_eq!(
        commands
            .iter()
            .map(|c| method(c).to_string())
            .collect::<Vec<_>>(),
        ["scroll", "scrollTo", "scrollBy"]
    );
    assert_eq!(commands[2]["params"], json!([5, 6]));
}

#[tokio::test]
async fn test_query_roundtrip() {
    let (doc, conn) = connected();
    let div = attached_div(&doc);
    conn.clear();

    let handle = div.scroll_x();
    let command = conn.last_command().unwrap();
    assert_eq!(method(&command), "scrollX");
    let reqid = command["params"][0].as_u64().unwrap();

    assert!(div.node().pending().unwrap().resolve(reqid, json!(120)));
    assert_eq!(handle.await, Some(json!(120)));
}

#[tokio::test]
async fn test_query_disconnected_resolves_none() {
    let ctx = crate::sync::SyncContext::new();
    let div = ctx.create_element("div");
    let handle = div.bounding_client_rect();
    assert!(handle.is_resolved());
    assert_eq!(handle.await, None);
}

#[test]
fn test_show_hide_toggle_hidden_attribute() {
    let (doc, conn) = connected();
    let div = attached_div(&doc);
    conn.clear();

    div.hide().unwrap();
    assert!(div.node().has_attribute("hidden"));
    assert_eq!(method(&conn.last_command().unwrap()), "setAttribute");

    div.show();
    assert!(!div.node().has_attribute("hidden"));
    assert_eq!(method(&conn.last_command().unwrap()), "removeAttribute");
}

#[test]
fn test_fan_out_to_all_open_connections() {
    let (doc, first) = connected();
    let second = RecordingTransport::new("conn-2");
    doc.add_connection(second.clone());
    let div = attached_div(&doc);
    first.clear();
    second.clear();

    div.set_attribute("class", "shared").unwrap();
    assert_eq!(first.sent().len(), 1);
    assert_eq!(second.sent(), first.sent());
}

#[test]
fn test_closed_connection_is_pruned() {
    let (doc, conn) = connected();
    let div = attached_div(&doc);
    conn.clear();
    conn.close();

    div.set_attribute("class", "late").unwrap();
    assert!(conn.sent().is_empty());
    assert_eq!(doc.connection_count(), 0);
    assert!(!div.is_connected());
    // Local application is unaffected by the lost connection.
    assert_eq!(div.get_attribute("class").as_deref(), Some("late"));
}

#[test]
fn test_detached_subtree_resumes_on_attach() {
    let (doc, conn) = connected();
    let panel = doc.context().create_element("section");
    let label = doc.context().create_element("span");
    panel.append_child(&label).unwrap();
    label.set_text_content("built offline").unwrap();
    assert!(conn.sent().is_empty());

    doc.body().append_child(&panel).unwrap();
    // The attach carries the whole subtree in one command.
    let command = conn.last_command().unwrap();
    assert_eq!(method(&command), "insertAdjacentHTML");
    assert!(
        command["params"][1]
            .as_str()
            .unwrap()
            .contains("built offline")
    );
    conn.clear();

    // Subsequent mutations on the now-connected subtree emit normally.
    label.set_text_content("online").unwrap();
    assert_eq!(method(&conn.last_command().unwrap()), "textContent");
}
