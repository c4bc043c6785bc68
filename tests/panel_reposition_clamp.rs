use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_daemon() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_dossierd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn dossierd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn create_with_item(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
) -> String {
    let result = request_ok(
        stdin,
        reader,
        "create",
        "dossier.create",
        json!({
            "title": "Oral exam",
            "concept": "numerical",
            "tuning": { "panel": { "panelHeight": 100.0, "edgeGap": 10.0 } }
        }),
    );
    result["dossier"]["sections"][0]["items"][0]["id"]
        .as_str()
        .expect("item id")
        .to_string()
}

fn viewport(scroll_top: f64) -> serde_json::Value {
    json!({ "scrollTop": scroll_top, "height": 600.0, "contentHeight": 2000.0 })
}

#[test]
fn panel_follows_the_focused_item_through_scrolls() {
    let (mut child, mut stdin, mut reader) = spawn_daemon();
    let item_id = create_with_item(&mut stdin, &mut reader);

    let focused = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "editor.focusItem",
        json!({
            "itemId": item_id,
            "bounds": { "top": 400.0, "height": 48.0 },
            "viewport": viewport(0.0),
        }),
    );
    assert_eq!(focused["panel"]["visible"].as_bool(), Some(true));
    assert_eq!(focused["panel"]["offset"].as_f64(), Some(400.0));

    let scrolled = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "panel.scrolled",
        json!({ "scrollTop": 150.0 }),
    );
    assert_eq!(scrolled["offset"].as_f64(), Some(250.0));

    // Scrolled far past the item: clamped at the top gap.
    let clamped = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "panel.scrolled",
        json!({ "scrollTop": 1500.0 }),
    );
    assert_eq!(clamped["offset"].as_f64(), Some(10.0));

    // Item far below the fold: clamped at the bottom.
    let measured = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "panel.measured",
        json!({
            "bounds": { "top": 1900.0, "height": 48.0 },
            "viewport": viewport(0.0),
        }),
    );
    assert_eq!(measured["offset"].as_f64(), Some(490.0));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn leaving_item_focus_hides_the_panel_and_drops_the_scroll_scope() {
    let (mut child, mut stdin, mut reader) = spawn_daemon();
    let item_id = create_with_item(&mut stdin, &mut reader);

    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "editor.focusItem",
        json!({
            "itemId": item_id,
            "bounds": { "top": 400.0, "height": 48.0 },
            "viewport": viewport(0.0),
        }),
    );

    request_ok(&mut stdin, &mut reader, "2", "editor.blur", json!({ "at": 0 }));
    request_ok(&mut stdin, &mut reader, "3", "editor.tick", json!({ "at": 500 }));

    let hidden = request_ok(&mut stdin, &mut reader, "4", "panel.position", json!({}));
    assert_eq!(hidden["visible"].as_bool(), Some(false));
    assert!(hidden.get("offset").is_none(), "hidden carries no offset");

    // The old scope is gone; stale scroll events cannot resurrect the panel.
    let stale = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "panel.scrolled",
        json!({ "scrollTop": 300.0 }),
    );
    assert_eq!(stale["visible"].as_bool(), Some(false));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn each_focus_session_gets_a_fresh_scope() {
    let (mut child, mut stdin, mut reader) = spawn_daemon();
    let item_id = create_with_item(&mut stdin, &mut reader);

    // Focus without geometry: visible position is unknown, so hidden.
    let unmeasured = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "editor.focusItem",
        json!({ "itemId": item_id }),
    );
    assert_eq!(unmeasured["panel"]["visible"].as_bool(), Some(false));

    // Geometry arrives, the panel appears.
    let measured = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "panel.measured",
        json!({
            "bounds": { "top": 120.0, "height": 48.0 },
            "viewport": viewport(0.0),
        }),
    );
    assert_eq!(measured["visible"].as_bool(), Some(true));
    assert_eq!(measured["offset"].as_f64(), Some(120.0));

    drop(stdin);
    let _ = child.wait();
}
