use crate::ipc::error::{err, ok};
use crate::ipc::helpers::param_f64;
use crate::ipc::types::{AppState, Request};
use crate::panel::{ItemBounds, Viewport};

fn handle_position(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return err(&req.id, "no_dossier", "open or create a dossier first", None);
    };
    ok(&req.id, session.panel_position().to_json())
}

fn handle_scrolled(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_mut() else {
        return err(&req.id, "no_dossier", "open or create a dossier first", None);
    };
    let Some(scroll_top) = param_f64(&req.params, "scrollTop") else {
        return err(&req.id, "bad_params", "missing scrollTop", None);
    };
    ok(&req.id, session.container_scrolled(scroll_top).to_json())
}

fn handle_measured(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_mut() else {
        return err(&req.id, "no_dossier", "open or create a dossier first", None);
    };
    let bounds: ItemBounds = match req.params.get("bounds") {
        Some(v) => match serde_json::from_value(v.clone()) {
            Ok(b) => b,
            Err(e) => return err(&req.id, "bad_params", format!("invalid bounds: {e}"), None),
        },
        None => return err(&req.id, "bad_params", "missing bounds", None),
    };
    let view: Viewport = match req.params.get("viewport") {
        Some(v) => match serde_json::from_value(v.clone()) {
            Ok(w) => w,
            Err(e) => return err(&req.id, "bad_params", format!("invalid viewport: {e}"), None),
        },
        None => return err(&req.id, "bad_params", "missing viewport", None),
    };
    ok(&req.id, session.item_measured(bounds, view).to_json())
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "panel.position" => Some(handle_position(state, req)),
        "panel.scrolled" => Some(handle_scrolled(state, req)),
        "panel.measured" => Some(handle_measured(state, req)),
        _ => None,
    }
}
