use crate::editor::{EditorError, EditorSession, FocusState, ItemPatch, SectionPatch};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{param_str, param_u64};
use crate::ipc::types::{AppState, Request};
use crate::panel::{ItemBounds, Viewport};
use serde_json::json;

fn editor_err(id: &str, e: &EditorError) -> serde_json::Value {
    err(id, e.code(), e.to_string(), None)
}

fn focus_json(focus: &FocusState) -> serde_json::Value {
    match focus {
        FocusState::Idle => json!({ "state": "idle" }),
        FocusState::ItemFocused {
            item_id,
            section_id,
        } => json!({
            "state": "itemFocused",
            "itemId": item_id,
            "sectionId": section_id,
        }),
        FocusState::SectionFocused { section_id } => json!({
            "state": "sectionFocused",
            "sectionId": section_id,
        }),
    }
}

fn state_json(session: &EditorSession) -> serde_json::Value {
    json!({
        "focus": focus_json(session.focus_state()),
        "styledSectionId": session.styled_section_id(),
        "targetSectionId": session.target_section_id(),
        "canDeleteItem": session.can_delete_item(),
        "canDeleteSection": session.can_delete_section(),
        "panel": session.panel_position().to_json(),
    })
}

/// Optional `bounds` + `viewport` pair shipped with focus events so the panel
/// can position itself immediately.
fn parse_geometry(
    params: &serde_json::Value,
) -> Result<Option<(ItemBounds, Viewport)>, String> {
    match (params.get("bounds"), params.get("viewport")) {
        (None, None) => Ok(None),
        (Some(b), Some(v)) => {
            let bounds: ItemBounds =
                serde_json::from_value(b.clone()).map_err(|e| format!("invalid bounds: {e}"))?;
            let view: Viewport =
                serde_json::from_value(v.clone()).map_err(|e| format!("invalid viewport: {e}"))?;
            Ok(Some((bounds, view)))
        }
        _ => Err("bounds and viewport must be supplied together".to_string()),
    }
}

fn handle_state(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return err(&req.id, "no_dossier", "open or create a dossier first", None);
    };
    ok(&req.id, state_json(session))
}

fn handle_focus_item(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_mut() else {
        return err(&req.id, "no_dossier", "open or create a dossier first", None);
    };
    let Some(item_id) = param_str(&req.params, "itemId") else {
        return err(&req.id, "bad_params", "missing itemId", None);
    };
    let geometry = match parse_geometry(&req.params) {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    match session.focus_item(item_id, geometry) {
        Ok(()) => ok(&req.id, state_json(session)),
        Err(e) => editor_err(&req.id, &e),
    }
}

fn handle_focus_section(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_mut() else {
        return err(&req.id, "no_dossier", "open or create a dossier first", None);
    };
    let Some(section_id) = param_str(&req.params, "sectionId") else {
        return err(&req.id, "bad_params", "missing sectionId", None);
    };
    match session.focus_section(section_id) {
        Ok(()) => ok(&req.id, state_json(session)),
        Err(e) => editor_err(&req.id, &e),
    }
}

fn handle_select_item(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_mut() else {
        return err(&req.id, "no_dossier", "open or create a dossier first", None);
    };
    let Some(item_id) = param_str(&req.params, "itemId") else {
        return err(&req.id, "bad_params", "missing itemId", None);
    };
    let geometry = match parse_geometry(&req.params) {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    match session.select_item(item_id, geometry) {
        Ok(selected) => {
            let mut out = state_json(session);
            out["selected"] = json!(selected);
            ok(&req.id, out)
        }
        Err(e) => editor_err(&req.id, &e),
    }
}

fn handle_blur(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_mut() else {
        return err(&req.id, "no_dossier", "open or create a dossier first", None);
    };
    let Some(at) = param_u64(&req.params, "at") else {
        return err(&req.id, "bad_params", "missing at (ms)", None);
    };
    session.blur(at);
    ok(&req.id, state_json(session))
}

fn handle_tick(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_mut() else {
        return err(&req.id, "no_dossier", "open or create a dossier first", None);
    };
    let Some(at) = param_u64(&req.params, "at") else {
        return err(&req.id, "bad_params", "missing at (ms)", None);
    };
    let blurred = session.tick(at);
    let mut out = state_json(session);
    out["blurred"] = json!(blurred);
    ok(&req.id, out)
}

fn handle_add_section(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_mut() else {
        return err(&req.id, "no_dossier", "open or create a dossier first", None);
    };
    let after = param_str(&req.params, "afterSectionId");
    match session.add_section(after) {
        Ok((section_id, item_id)) => ok(
            &req.id,
            json!({ "sectionId": section_id, "itemId": item_id }),
        ),
        Err(e) => editor_err(&req.id, &e),
    }
}

fn handle_add_item(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_mut() else {
        return err(&req.id, "no_dossier", "open or create a dossier first", None);
    };
    let section = param_str(&req.params, "sectionId");
    match session.add_item(section) {
        Ok(Some(item_id)) => ok(&req.id, json!({ "added": true, "itemId": item_id })),
        Ok(None) => {
            tracing::warn!("addItem ignored: no section selected and none given");
            ok(&req.id, json!({ "added": false }))
        }
        Err(e) => editor_err(&req.id, &e),
    }
}

fn handle_delete_item(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_mut() else {
        return err(&req.id, "no_dossier", "open or create a dossier first", None);
    };
    let Some(item_id) = param_str(&req.params, "itemId") else {
        return err(&req.id, "bad_params", "missing itemId", None);
    };
    match session.delete_item(item_id) {
        Ok(removal) => ok(
            &req.id,
            json!({ "removedSectionId": removal.removed_section_id }),
        ),
        Err(e) => editor_err(&req.id, &e),
    }
}

fn handle_delete_section(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_mut() else {
        return err(&req.id, "no_dossier", "open or create a dossier first", None);
    };
    let Some(section_id) = param_str(&req.params, "sectionId") else {
        return err(&req.id, "bad_params", "missing sectionId", None);
    };
    match session.delete_section(section_id) {
        Ok(()) => ok(&req.id, json!({ "ok": true })),
        Err(e) => editor_err(&req.id, &e),
    }
}

fn handle_can_delete_item(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return err(&req.id, "no_dossier", "open or create a dossier first", None);
    };
    ok(&req.id, json!({ "canDelete": session.can_delete_item() }))
}

fn handle_can_delete_section(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return err(&req.id, "no_dossier", "open or create a dossier first", None);
    };
    ok(&req.id, json!({ "canDelete": session.can_delete_section() }))
}

fn handle_update_section(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_mut() else {
        return err(&req.id, "no_dossier", "open or create a dossier first", None);
    };
    let Some(section_id) = param_str(&req.params, "sectionId") else {
        return err(&req.id, "bad_params", "missing sectionId", None);
    };
    let Some(raw) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "missing/invalid patch", None);
    };

    let mut patch = SectionPatch::default();
    if let Some(v) = raw.get("title") {
        let Some(s) = v.as_str() else {
            return err(&req.id, "bad_params", "patch.title must be a string", None);
        };
        patch.title = Some(s.to_string());
    }
    if let Some(v) = raw.get("description") {
        let Some(s) = v.as_str() else {
            return err(
                &req.id,
                "bad_params",
                "patch.description must be a string",
                None,
            );
        };
        patch.description = Some(s.to_string());
    }
    if let Some(v) = raw.get("weight") {
        let Some(n) = v.as_i64() else {
            return err(&req.id, "bad_params", "patch.weight must be an integer", None);
        };
        patch.weight = Some(n);
    }
    if patch.title.is_none() && patch.description.is_none() && patch.weight.is_none() {
        return err(
            &req.id,
            "bad_params",
            "patch must include at least one field",
            None,
        );
    }

    match session.update_section(section_id, patch) {
        Ok(()) => ok(&req.id, json!({ "ok": true })),
        Err(e) => editor_err(&req.id, &e),
    }
}

fn handle_update_item(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_mut() else {
        return err(&req.id, "no_dossier", "open or create a dossier first", None);
    };
    let Some(item_id) = param_str(&req.params, "itemId") else {
        return err(&req.id, "bad_params", "missing itemId", None);
    };
    let Some(raw) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "missing/invalid patch", None);
    };

    let mut patch = ItemPatch::default();
    if let Some(v) = raw.get("description") {
        let Some(s) = v.as_str() else {
            return err(
                &req.id,
                "bad_params",
                "patch.description must be a string",
                None,
            );
        };
        patch.description = Some(s.to_string());
    }
    if let Some(v) = raw.get("answer") {
        if v.is_null() {
            patch.answer = Some(None);
        } else if let Some(s) = v.as_str() {
            patch.answer = Some(Some(s.to_string()));
        } else {
            return err(
                &req.id,
                "bad_params",
                "patch.answer must be an option id or null",
                None,
            );
        }
    }
    if patch.description.is_none() && patch.answer.is_none() {
        return err(
            &req.id,
            "bad_params",
            "patch must include at least one field",
            None,
        );
    }

    match session.update_item(item_id, patch) {
        Ok(()) => ok(&req.id, json!({ "ok": true })),
        Err(e) => editor_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "editor.state" => Some(handle_state(state, req)),
        "editor.focusItem" => Some(handle_focus_item(state, req)),
        "editor.focusSection" => Some(handle_focus_section(state, req)),
        "editor.selectItem" => Some(handle_select_item(state, req)),
        "editor.blur" => Some(handle_blur(state, req)),
        "editor.tick" => Some(handle_tick(state, req)),
        "editor.addSection" => Some(handle_add_section(state, req)),
        "editor.addItem" => Some(handle_add_item(state, req)),
        "editor.deleteItem" => Some(handle_delete_item(state, req)),
        "editor.deleteSection" => Some(handle_delete_section(state, req)),
        "editor.canDeleteItem" => Some(handle_can_delete_item(state, req)),
        "editor.canDeleteSection" => Some(handle_can_delete_section(state, req)),
        "editor.updateSection" => Some(handle_update_section(state, req)),
        "editor.updateItem" => Some(handle_update_item(state, req)),
        _ => None,
    }
}
