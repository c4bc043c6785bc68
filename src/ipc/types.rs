use serde::Deserialize;

use crate::editor::EditorSession;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// One live authoring session at a time; opening or creating a dossier
/// replaces whatever was being edited before.
pub struct AppState {
    pub session: Option<EditorSession>,
}
