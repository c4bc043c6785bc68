use crate::editor::{EditorSession, EditorTuning, IdGen};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::param_str;
use crate::ipc::types::{AppState, Request};
use crate::model::{Dossier, EvaluationConcept, EvaluationOption};
use crate::score::compute_dossier_score;
use crate::validate::validate_for_save;
use serde_json::json;
use std::collections::HashSet;
use uuid::Uuid;

fn parse_tuning(params: &serde_json::Value) -> Result<EditorTuning, String> {
    let Some(raw) = params.get("tuning") else {
        return Ok(EditorTuning::default());
    };
    serde_json::from_value(raw.clone()).map_err(|e| format!("invalid tuning: {e}"))
}

fn parse_concept(raw: &str) -> Option<EvaluationConcept> {
    match raw {
        "numerical" => Some(EvaluationConcept::Numerical),
        "letter" => Some(EvaluationConcept::Letter),
        _ => None,
    }
}

fn parse_evaluation_method(
    params: &serde_json::Value,
) -> Result<Vec<EvaluationOption>, String> {
    let Some(raw) = params.get("evaluationMethod") else {
        return Ok(Vec::new());
    };
    let Some(arr) = raw.as_array() else {
        return Err("evaluationMethod must be an array".to_string());
    };

    let mut options = Vec::with_capacity(arr.len());
    let mut seen: HashSet<String> = HashSet::new();
    for (idx, entry) in arr.iter().enumerate() {
        let Some(name) = entry.get("name").and_then(|v| v.as_str()) else {
            return Err(format!("evaluationMethod[{idx}].name must be a string"));
        };
        let Some(value) = entry.get("value").and_then(|v| v.as_f64()) else {
            return Err(format!("evaluationMethod[{idx}].value must be a number"));
        };
        let id = match entry.get("id") {
            None => Uuid::new_v4().to_string(),
            Some(v) => match v.as_str() {
                Some(s) if !s.trim().is_empty() => s.to_string(),
                _ => return Err(format!("evaluationMethod[{idx}].id must be a string")),
            },
        };
        if !seen.insert(id.clone()) {
            return Err(format!("duplicate evaluation option id {id}"));
        }
        options.push(EvaluationOption {
            id,
            name: name.to_string(),
            value,
        });
    }
    Ok(options)
}

/// Loaded trees come from outside; the structural invariants every mutation
/// relies on are checked once here instead of being trusted.
fn check_structure(dossier: &Dossier) -> Result<(), String> {
    if dossier.sections.is_empty() {
        return Err(format!("dossier {} has no sections", dossier.id));
    }
    let mut seen: HashSet<&str> = HashSet::new();
    for section in &dossier.sections {
        if !seen.insert(section.id.as_str()) {
            return Err(format!("duplicate id {}", section.id));
        }
        if section.items.is_empty() {
            return Err(format!("section {} has no items", section.id));
        }
        for item in &section.items {
            if !seen.insert(item.id.as_str()) {
                return Err(format!("duplicate id {}", item.id));
            }
        }
    }
    Ok(())
}

fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let title = param_str(&req.params, "title").unwrap_or("").to_string();
    let description = param_str(&req.params, "description").unwrap_or("").to_string();

    let concept = match param_str(&req.params, "concept") {
        None => return err(&req.id, "bad_params", "missing concept", None),
        Some(raw) => match parse_concept(raw) {
            Some(c) => c,
            None => {
                return err(
                    &req.id,
                    "bad_params",
                    "concept must be 'numerical' or 'letter'",
                    None,
                )
            }
        },
    };
    let evaluation_method = match parse_evaluation_method(&req.params) {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    let tuning = match parse_tuning(&req.params) {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };

    if let Some(old) = &state.session {
        tracing::info!(replaced = %old.dossier().id, "replacing live authoring session");
    }
    let session = EditorSession::create(
        title,
        description,
        concept,
        evaluation_method,
        tuning,
        IdGen::Uuid,
    );
    tracing::info!(dossier = %session.dossier().id, "authoring session created");

    let snapshot = json!({ "dossier": session.dossier() });
    state.session = Some(session);
    ok(&req.id, snapshot)
}

fn handle_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(raw) = req.params.get("dossier") else {
        return err(&req.id, "bad_params", "missing dossier", None);
    };
    let dossier: Dossier = match serde_json::from_value(raw.clone()) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", format!("invalid dossier: {e}"), None),
    };
    if let Err(msg) = check_structure(&dossier) {
        return err(&req.id, "bad_params", msg, None);
    }
    let tuning = match parse_tuning(&req.params) {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };

    if let Some(old) = &state.session {
        tracing::info!(replaced = %old.dossier().id, "replacing live authoring session");
    }
    let dossier_id = dossier.id.clone();
    tracing::info!(dossier = %dossier_id, "authoring session opened");
    state.session = Some(EditorSession::open(dossier, tuning, IdGen::Uuid));
    ok(&req.id, json!({ "dossierId": dossier_id }))
}

fn handle_snapshot(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return err(&req.id, "no_dossier", "open or create a dossier first", None);
    };
    ok(&req.id, json!({ "dossier": session.dossier() }))
}

fn handle_validate(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return err(&req.id, "no_dossier", "open or create a dossier first", None);
    };
    match validate_for_save(session.dossier()) {
        Ok(()) => ok(&req.id, json!({ "valid": true })),
        Err(v) => {
            tracing::warn!(
                entity = %v.entity_id,
                "dossier failed save validation: {}",
                v.message
            );
            err(
                &req.id,
                "validation_failed",
                v.message.clone(),
                Some(json!({ "entityType": v.entity_type, "entityId": v.entity_id })),
            )
        }
    }
}

fn handle_score(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return err(&req.id, "no_dossier", "open or create a dossier first", None);
    };
    let score = compute_dossier_score(session.dossier());
    ok(&req.id, json!(score))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "dossier.create" => Some(handle_create(state, req)),
        "dossier.open" => Some(handle_open(state, req)),
        "dossier.snapshot" => Some(handle_snapshot(state, req)),
        "dossier.validate" => Some(handle_validate(state, req)),
        "dossier.score" => Some(handle_score(state, req)),
        _ => None,
    }
}
