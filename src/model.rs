use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationConcept {
    Numerical,
    Letter,
}

/// A named grading choice. For letter concepts `value` carries the numeric
/// weight assigned to the letter (A=10, B=8, ...); for numerical concepts it
/// is the mark itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationOption {
    pub id: String,
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    #[serde(default)]
    pub description: String,
    /// Id of an EvaluationOption in the dossier's evaluation method, or null
    /// while unanswered. The reference may dangle after the method is edited;
    /// scoring treats a dangling answer as unanswered.
    #[serde(default)]
    pub answer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Integer percent. Weights must sum to 100 before the dossier can be
    /// saved; live trees are allowed to be mid-edit and inconsistent.
    #[serde(default)]
    pub weight: i64,
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dossier {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub concept: EvaluationConcept,
    #[serde(default)]
    pub evaluation_method: Vec<EvaluationOption>,
    pub sections: Vec<Section>,
}

impl Dossier {
    pub fn section(&self, section_id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == section_id)
    }

    pub fn section_mut(&mut self, section_id: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.id == section_id)
    }

    /// Section owning the given item, if any.
    pub fn owning_section(&self, item_id: &str) -> Option<&Section> {
        self.sections
            .iter()
            .find(|s| s.items.iter().any(|i| i.id == item_id))
    }

    pub fn item_mut(&mut self, item_id: &str) -> Option<&mut Item> {
        self.sections
            .iter_mut()
            .flat_map(|s| s.items.iter_mut())
            .find(|i| i.id == item_id)
    }
}
