use serde::{Deserialize, Serialize};

/// Scroll state of the container the dossier form lives in, as reported by
/// the UI shell. All lengths are CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub scroll_top: f64,
    pub height: f64,
    pub content_height: f64,
}

/// Focused item's box in content coordinates (relative to the scrollable
/// content, not the visible viewport).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemBounds {
    pub top: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct PanelTuning {
    pub panel_height: f64,
    pub edge_gap: f64,
}

impl Default for PanelTuning {
    fn default() -> Self {
        Self {
            panel_height: 96.0,
            edge_gap: 8.0,
        }
    }
}

/// Where the action panel should sit. `Hidden` is the sentinel used whenever
/// no item holds focus; the UI parks the panel off-screen for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelPosition {
    Hidden,
    At(f64),
}

impl PanelPosition {
    pub fn to_json(self) -> serde_json::Value {
        match self {
            PanelPosition::Hidden => serde_json::json!({ "visible": false }),
            PanelPosition::At(offset) => {
                serde_json::json!({ "visible": true, "offset": offset })
            }
        }
    }
}

/// Target offset of the panel within the visible viewport: the focused item's
/// top translated by the current scroll, clamped so the panel stays fully
/// inside the container.
pub fn panel_offset(bounds: &ItemBounds, view: &Viewport, tuning: &PanelTuning) -> f64 {
    let raw = bounds.top - view.scroll_top;
    let lo = tuning.edge_gap;
    let hi = (view.height - tuning.panel_height - tuning.edge_gap).max(lo);
    raw.clamp(lo, hi)
}
