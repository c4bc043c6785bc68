use serde::Deserialize;
use uuid::Uuid;

use crate::model::{Dossier, EvaluationConcept, EvaluationOption, Item, Section};
use crate::panel::{panel_offset, ItemBounds, PanelPosition, PanelTuning, Viewport};

/// Id minting for sections and items. Production sessions mint UUIDs like the
/// rest of the console; tests inject the sequential variant so ids are stable
/// across runs.
#[derive(Debug, Clone)]
pub enum IdGen {
    Uuid,
    Sequential(u64),
}

impl IdGen {
    pub fn mint(&mut self, kind: &str) -> String {
        match self {
            IdGen::Uuid => Uuid::new_v4().to_string(),
            IdGen::Sequential(next) => {
                *next += 1;
                format!("{kind}-{next}")
            }
        }
    }
}

/// UI-tuning constants. The debounce width and panel geometry are not
/// load-bearing; sessions may override them wholesale.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorTuning {
    pub blur_debounce_ms: u64,
    pub panel: PanelTuning,
}

impl Default for EditorTuning {
    fn default() -> Self {
        Self {
            blur_debounce_ms: 100,
            panel: PanelTuning::default(),
        }
    }
}

/// At most one entity is active at a time; focusing an item implicitly
/// styles its owning section, which is why the item variant carries both ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusState {
    Idle,
    ItemFocused { item_id: String, section_id: String },
    SectionFocused { section_id: String },
}

/// Precedence for "which section do structural edits target": an explicitly
/// focused section wins, else the section owning the focused item, else none.
pub fn resolve_target_section(focus: &FocusState) -> Option<&str> {
    match focus {
        FocusState::SectionFocused { section_id } => Some(section_id),
        FocusState::ItemFocused { section_id, .. } => Some(section_id),
        FocusState::Idle => None,
    }
}

/// Geometry feed for the floating panel, alive exactly while an item holds
/// focus. Scroll events arriving without a live scope are dropped, which is
/// what keeps stale listeners from moving a hidden panel.
#[derive(Debug, Clone)]
struct ScrollScope {
    bounds: Option<ItemBounds>,
    view: Option<Viewport>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    UnknownSection(String),
    UnknownItem(String),
    LastItem,
    LastSection,
}

impl EditorError {
    pub fn code(&self) -> &'static str {
        match self {
            EditorError::UnknownSection(_) | EditorError::UnknownItem(_) => "not_found",
            EditorError::LastItem | EditorError::LastSection => "invariant_violation",
        }
    }
}

impl std::fmt::Display for EditorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditorError::UnknownSection(id) => write!(f, "section {id} not found"),
            EditorError::UnknownItem(id) => write!(f, "item {id} not found"),
            EditorError::LastItem => {
                write!(f, "cannot delete the only item of the only section")
            }
            EditorError::LastSection => write!(f, "cannot delete the only section"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SectionPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub weight: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    pub description: Option<String>,
    /// `Some(None)` clears the answer back to unanswered.
    pub answer: Option<Option<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemRemoval {
    /// Section that was collapsed because the deleted item was its last one.
    pub removed_section_id: Option<String>,
}

/// One dossier-authoring session: the tree under edit plus the ephemeral
/// focus/selection state and the panel's scroll scope. All timestamps are
/// caller-supplied milliseconds; the session never reads a clock.
pub struct EditorSession {
    dossier: Dossier,
    tuning: EditorTuning,
    ids: IdGen,
    focus: FocusState,
    pending_blur_at: Option<u64>,
    scroll_scope: Option<ScrollScope>,
}

impl EditorSession {
    pub fn open(dossier: Dossier, tuning: EditorTuning, ids: IdGen) -> Self {
        Self {
            dossier,
            tuning,
            ids,
            focus: FocusState::Idle,
            pending_blur_at: None,
            scroll_scope: None,
        }
    }

    /// Fresh dossier with the structural minimum of one section holding one
    /// empty item.
    pub fn create(
        title: String,
        description: String,
        concept: EvaluationConcept,
        evaluation_method: Vec<EvaluationOption>,
        tuning: EditorTuning,
        mut ids: IdGen,
    ) -> Self {
        let dossier = Dossier {
            id: ids.mint("dossier"),
            title,
            description,
            concept,
            evaluation_method,
            sections: vec![Section {
                id: ids.mint("section"),
                title: String::new(),
                description: String::new(),
                weight: 100,
                items: vec![Item {
                    id: ids.mint("item"),
                    description: String::new(),
                    answer: None,
                }],
            }],
        };
        Self::open(dossier, tuning, ids)
    }

    pub fn dossier(&self) -> &Dossier {
        &self.dossier
    }

    pub fn focus_state(&self) -> &FocusState {
        &self.focus
    }

    /// Section highlighted for styling: the focused section, or the owner of
    /// the focused item.
    pub fn styled_section_id(&self) -> Option<&str> {
        resolve_target_section(&self.focus)
    }

    pub fn target_section_id(&self) -> Option<&str> {
        resolve_target_section(&self.focus)
    }

    // -- focus / selection ---------------------------------------------------

    pub fn focus_item(
        &mut self,
        item_id: &str,
        geometry: Option<(ItemBounds, Viewport)>,
    ) -> Result<(), EditorError> {
        let section_id = self
            .dossier
            .owning_section(item_id)
            .map(|s| s.id.clone())
            .ok_or_else(|| EditorError::UnknownItem(item_id.to_string()))?;

        self.pending_blur_at = None;
        self.focus = FocusState::ItemFocused {
            item_id: item_id.to_string(),
            section_id,
        };
        // A fresh scope per focus session; whatever the previous item had
        // subscribed is gone with the old scope.
        self.scroll_scope = Some(match geometry {
            Some((bounds, view)) => ScrollScope {
                bounds: Some(bounds),
                view: Some(view),
            },
            None => ScrollScope {
                bounds: None,
                view: None,
            },
        });
        Ok(())
    }

    pub fn focus_section(&mut self, section_id: &str) -> Result<(), EditorError> {
        if self.dossier.section(section_id).is_none() {
            return Err(EditorError::UnknownSection(section_id.to_string()));
        }
        self.pending_blur_at = None;

        // An item keeps priority over section-area clicks.
        if matches!(self.focus, FocusState::ItemFocused { .. }) {
            return Ok(());
        }
        let reclick = matches!(
            &self.focus,
            FocusState::SectionFocused { section_id: cur } if cur == section_id
        );
        if reclick {
            self.clear_focus();
        } else {
            self.focus = FocusState::SectionFocused {
                section_id: section_id.to_string(),
            };
            self.scroll_scope = None;
        }
        Ok(())
    }

    /// Explicit click-select. Returns whether the item is selected afterwards.
    pub fn select_item(
        &mut self,
        item_id: &str,
        geometry: Option<(ItemBounds, Viewport)>,
    ) -> Result<bool, EditorError> {
        let reselect = matches!(
            &self.focus,
            FocusState::ItemFocused { item_id: cur, .. } if cur == item_id
        );
        if reselect {
            self.clear_focus();
            return Ok(false);
        }
        self.focus_item(item_id, geometry)?;
        Ok(true)
    }

    /// Defers the drop to idle so focus can hop between sibling fields of the
    /// same control without the panel flickering away.
    pub fn blur(&mut self, at: u64) {
        if self.focus != FocusState::Idle {
            self.pending_blur_at = Some(at + self.tuning.blur_debounce_ms);
        }
    }

    /// Applies a pending blur whose deadline has passed. Returns true when
    /// the session dropped to idle.
    pub fn tick(&mut self, at: u64) -> bool {
        match self.pending_blur_at {
            Some(deadline) if at >= deadline => {
                self.clear_focus();
                true
            }
            _ => false,
        }
    }

    fn clear_focus(&mut self) {
        self.focus = FocusState::Idle;
        self.pending_blur_at = None;
        self.scroll_scope = None;
    }

    // -- floating panel ------------------------------------------------------

    pub fn panel_position(&self) -> PanelPosition {
        let Some(scope) = &self.scroll_scope else {
            return PanelPosition::Hidden;
        };
        match (&scope.bounds, &scope.view) {
            (Some(bounds), Some(view)) => {
                PanelPosition::At(panel_offset(bounds, view, &self.tuning.panel))
            }
            // Focused but not yet measured by the UI.
            _ => PanelPosition::Hidden,
        }
    }

    /// Scroll event from the container. Ignored unless an item-focus scope is
    /// live, so scrolling after blur cannot resurrect the panel.
    pub fn container_scrolled(&mut self, scroll_top: f64) -> PanelPosition {
        if let Some(scope) = self.scroll_scope.as_mut() {
            if let Some(view) = scope.view.as_mut() {
                view.scroll_top = scroll_top;
            }
        }
        self.panel_position()
    }

    /// Fresh geometry after the UI re-measures the focused item (edits move
    /// it around even without scrolling).
    pub fn item_measured(&mut self, bounds: ItemBounds, view: Viewport) -> PanelPosition {
        if let Some(scope) = self.scroll_scope.as_mut() {
            scope.bounds = Some(bounds);
            scope.view = Some(view);
        }
        self.panel_position()
    }

    // -- structural mutations ------------------------------------------------

    /// New section with one empty item, inserted after the explicit anchor or
    /// the currently targeted section, else appended. The new section takes
    /// the focus.
    pub fn add_section(
        &mut self,
        after_section_id: Option<&str>,
    ) -> Result<(String, String), EditorError> {
        let anchor = match after_section_id {
            Some(id) => {
                if self.dossier.section(id).is_none() {
                    return Err(EditorError::UnknownSection(id.to_string()));
                }
                Some(id.to_string())
            }
            None => self.target_section_id().map(str::to_string),
        };

        let at = match anchor {
            Some(id) => {
                self.dossier
                    .sections
                    .iter()
                    .position(|s| s.id == id)
                    .unwrap_or(self.dossier.sections.len().saturating_sub(1))
                    + 1
            }
            None => self.dossier.sections.len(),
        };

        let section_id = self.ids.mint("section");
        let item_id = self.ids.mint("item");
        self.dossier.sections.insert(
            at,
            Section {
                id: section_id.clone(),
                title: String::new(),
                description: String::new(),
                weight: 0,
                items: vec![Item {
                    id: item_id.clone(),
                    description: String::new(),
                    answer: None,
                }],
            },
        );

        self.pending_blur_at = None;
        self.scroll_scope = None;
        self.focus = FocusState::SectionFocused {
            section_id: section_id.clone(),
        };
        Ok((section_id, item_id))
    }

    /// Appends an empty item to the explicit or resolved target section.
    /// `Ok(None)` means no target could be resolved; the caller decides how
    /// loudly to report that.
    pub fn add_item(&mut self, section_id: Option<&str>) -> Result<Option<String>, EditorError> {
        let target = match section_id {
            Some(id) => {
                if self.dossier.section(id).is_none() {
                    return Err(EditorError::UnknownSection(id.to_string()));
                }
                id.to_string()
            }
            None => match self.target_section_id() {
                Some(id) => id.to_string(),
                None => return Ok(None),
            },
        };

        let item_id = self.ids.mint("item");
        if let Some(section) = self.dossier.section_mut(&target) {
            section.items.push(Item {
                id: item_id.clone(),
                description: String::new(),
                answer: None,
            });
        }
        Ok(Some(item_id))
    }

    /// False exactly when the dossier is down to one section holding one
    /// item — deleting that item would leave an empty dossier.
    pub fn can_delete_item(&self) -> bool {
        !(self.dossier.sections.len() == 1 && self.dossier.sections[0].items.len() == 1)
    }

    pub fn can_delete_section(&self) -> bool {
        self.dossier.sections.len() > 1
    }

    pub fn delete_item(&mut self, item_id: &str) -> Result<ItemRemoval, EditorError> {
        let (section_idx, item_idx) = self
            .dossier
            .sections
            .iter()
            .enumerate()
            .find_map(|(si, s)| {
                s.items
                    .iter()
                    .position(|i| i.id == item_id)
                    .map(|ii| (si, ii))
            })
            .ok_or_else(|| EditorError::UnknownItem(item_id.to_string()))?;

        if !self.can_delete_item() {
            return Err(EditorError::LastItem);
        }

        self.dossier.sections[section_idx].items.remove(item_idx);

        let mut removed_section_id = None;
        if self.dossier.sections[section_idx].items.is_empty() && self.dossier.sections.len() > 1 {
            removed_section_id = Some(self.dossier.sections.remove(section_idx).id);
        }

        let focus_gone = match &self.focus {
            FocusState::ItemFocused { item_id: cur, .. } => cur == item_id,
            FocusState::SectionFocused { section_id } => {
                removed_section_id.as_deref() == Some(section_id.as_str())
            }
            FocusState::Idle => false,
        };
        if focus_gone {
            self.clear_focus();
        }

        Ok(ItemRemoval { removed_section_id })
    }

    pub fn delete_section(&mut self, section_id: &str) -> Result<(), EditorError> {
        let idx = self
            .dossier
            .sections
            .iter()
            .position(|s| s.id == section_id)
            .ok_or_else(|| EditorError::UnknownSection(section_id.to_string()))?;

        if !self.can_delete_section() {
            return Err(EditorError::LastSection);
        }

        self.dossier.sections.remove(idx);

        let focus_gone = resolve_target_section(&self.focus) == Some(section_id);
        if focus_gone {
            self.clear_focus();
        }
        Ok(())
    }

    // -- field edits ---------------------------------------------------------

    /// Direct field replacement; focus and selection are deliberately left
    /// alone.
    pub fn update_section(
        &mut self,
        section_id: &str,
        patch: SectionPatch,
    ) -> Result<(), EditorError> {
        let section = self
            .dossier
            .section_mut(section_id)
            .ok_or_else(|| EditorError::UnknownSection(section_id.to_string()))?;
        if let Some(title) = patch.title {
            section.title = title;
        }
        if let Some(description) = patch.description {
            section.description = description;
        }
        if let Some(weight) = patch.weight {
            section.weight = weight;
        }
        Ok(())
    }

    /// Answer edits accept any option id; whether it still resolves is a
    /// scoring-time concern.
    pub fn update_item(&mut self, item_id: &str, patch: ItemPatch) -> Result<(), EditorError> {
        let item = self
            .dossier
            .item_mut(item_id)
            .ok_or_else(|| EditorError::UnknownItem(item_id.to_string()))?;
        if let Some(description) = patch.description {
            item.description = description;
        }
        if let Some(answer) = patch.answer {
            item.answer = answer;
        }
        Ok(())
    }
}
