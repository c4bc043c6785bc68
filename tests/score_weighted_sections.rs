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
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error")
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn oral_exam_tree() -> serde_json::Value {
    json!({
        "id": "d-oral",
        "title": "Oral exam",
        "concept": "numerical",
        "evaluationMethod": [
            { "id": "opt-10", "name": "10", "value": 10.0 },
            { "id": "opt-8", "name": "8", "value": 8.0 },
            { "id": "opt-5", "name": "5", "value": 5.0 }
        ],
        "sections": [
            {
                "id": "sec-a",
                "title": "Grammar",
                "weight": 60,
                "items": [
                    { "id": "it-1", "description": "Verb conjugation", "answer": "opt-10" },
                    { "id": "it-2", "description": "Sentence structure", "answer": "opt-8" }
                ]
            },
            {
                "id": "sec-b",
                "title": "Fluency",
                "weight": 40,
                "items": [
                    { "id": "it-3", "description": "Keeps a steady pace", "answer": "opt-5" }
                ]
            }
        ]
    })
}

#[test]
fn fully_answered_dossier_scores_the_weighted_sum() {
    let (mut child, mut stdin, mut reader) = spawn_daemon();
    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "dossier.open",
        json!({ "dossier": oral_exam_tree() }),
    );

    // Section A averages 9 at weight 60, section B averages 5 at weight 40.
    let score = request_ok(&mut stdin, &mut reader, "2", "dossier.score", json!({}));
    let value = score.get("score").and_then(|v| v.as_f64()).expect("score");
    assert!((value - 7.4).abs() < 1e-9, "score {}", value);
    assert_eq!(score.get("isComplete").and_then(|v| v.as_bool()), Some(true));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn scoring_twice_without_edits_is_identical() {
    let (mut child, mut stdin, mut reader) = spawn_daemon();
    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "dossier.open",
        json!({ "dossier": oral_exam_tree() }),
    );

    let first = request_ok(&mut stdin, &mut reader, "2", "dossier.score", json!({}));
    let second = request_ok(&mut stdin, &mut reader, "3", "dossier.score", json!({}));
    assert_eq!(first, second);

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn weight_zero_section_contributes_nothing() {
    let mut tree = oral_exam_tree();
    tree["sections"][1]["weight"] = json!(0);

    let (mut child, mut stdin, mut reader) = spawn_daemon();
    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "dossier.open",
        json!({ "dossier": tree }),
    );

    let score = request_ok(&mut stdin, &mut reader, "2", "dossier.score", json!({}));
    let value = score.get("score").and_then(|v| v.as_f64()).expect("score");
    assert!((value - 5.4).abs() < 1e-9, "score {}", value);

    // Re-answering inside the weight-0 section must not move the score.
    request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "editor.updateItem",
        json!({ "itemId": "it-3", "patch": { "answer": "opt-10" } }),
    );
    let after = request_ok(&mut stdin, &mut reader, "4", "dossier.score", json!({}));
    let after_value = after.get("score").and_then(|v| v.as_f64()).expect("score");
    assert!((after_value - 5.4).abs() < 1e-9, "score {}", after_value);

    drop(stdin);
    let _ = child.wait();
}
