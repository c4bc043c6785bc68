use serde::Serialize;

use crate::model::Dossier;

/// First save-time failure found in the tree, pointing at the entity the
/// user has to fix. The authoring state is never touched; the caller surfaces
/// the message, the user retries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub entity_type: &'static str,
    pub entity_id: String,
    pub message: String,
}

impl ValidationError {
    fn new(entity_type: &'static str, entity_id: &str, message: String) -> Self {
        Self {
            entity_type,
            entity_id: entity_id.to_string(),
            message,
        }
    }
}

fn section_label(title: &str, id: &str) -> String {
    if title.trim().is_empty() {
        format!("section {id}")
    } else {
        format!("section \"{}\"", title.trim())
    }
}

/// Gate for the external save path. Scoring deliberately never runs these
/// checks: a live, mid-edit tree must still produce a best-effort score.
pub fn validate_for_save(dossier: &Dossier) -> Result<(), ValidationError> {
    if dossier.title.trim().is_empty() {
        return Err(ValidationError::new(
            "dossier",
            &dossier.id,
            "the dossier needs a title".to_string(),
        ));
    }

    if dossier.sections.is_empty() {
        return Err(ValidationError::new(
            "dossier",
            &dossier.id,
            "the dossier needs at least one section".to_string(),
        ));
    }

    let weight_sum: i64 = dossier.sections.iter().map(|s| s.weight).sum();
    if weight_sum != 100 {
        return Err(ValidationError::new(
            "dossier",
            &dossier.id,
            format!("section weights must sum to 100, currently {weight_sum}"),
        ));
    }

    for section in &dossier.sections {
        if section.title.trim().is_empty() {
            return Err(ValidationError::new(
                "section",
                &section.id,
                format!("section {} has an empty title", section.id),
            ));
        }
        if section.items.is_empty() {
            return Err(ValidationError::new(
                "section",
                &section.id,
                format!(
                    "{} must contain at least one item",
                    section_label(&section.title, &section.id)
                ),
            ));
        }
        for item in &section.items {
            if item.description.trim().is_empty() {
                return Err(ValidationError::new(
                    "item",
                    &item.id,
                    format!(
                        "an item in {} has an empty description",
                        section_label(&section.title, &section.id)
                    ),
                ));
            }
        }
    }

    Ok(())
}
