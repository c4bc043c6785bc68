use std::collections::HashMap;

use serde::Serialize;

use crate::model::{Dossier, Section};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DossierScore {
    pub score: f64,
    pub is_complete: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionBreakdown {
    pub average: f64,
    pub contribution: f64,
    pub answered_count: usize,
    pub item_count: usize,
}

fn section_breakdown(section: &Section, values: &HashMap<&str, f64>) -> SectionBreakdown {
    let mut sum = 0.0_f64;
    let mut answered_count = 0_usize;

    for item in &section.items {
        let Some(option_id) = item.answer.as_deref() else {
            continue;
        };
        // An answer referencing an option deleted from the evaluation method
        // counts as unanswered rather than failing the whole computation.
        let Some(value) = values.get(option_id) else {
            continue;
        };
        sum += value;
        answered_count += 1;
    }

    let average = if answered_count > 0 {
        sum / (answered_count as f64)
    } else {
        0.0
    };

    SectionBreakdown {
        average,
        contribution: average * (section.weight as f64) / 100.0,
        answered_count,
        item_count: section.items.len(),
    }
}

/// Weighted score over the current tree. Best-effort on live data: weights
/// need not sum to 100 and partially answered sections still contribute their
/// answered share. Pure, no rounding; display formatting is the caller's.
pub fn compute_dossier_score(dossier: &Dossier) -> DossierScore {
    let values: HashMap<&str, f64> = dossier
        .evaluation_method
        .iter()
        .map(|o| (o.id.as_str(), o.value))
        .collect();

    let mut score = 0.0_f64;
    let mut is_complete = true;

    for section in &dossier.sections {
        let breakdown = section_breakdown(section, &values);
        score += breakdown.contribution;
        if section.items.iter().any(|i| i.answer.is_none()) {
            is_complete = false;
        }
    }

    DossierScore { score, is_complete }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EvaluationConcept, EvaluationOption, Item, Section};

    fn option(id: &str, value: f64) -> EvaluationOption {
        EvaluationOption {
            id: id.to_string(),
            name: id.to_ascii_uppercase(),
            value,
        }
    }

    fn item(id: &str, answer: Option<&str>) -> Item {
        Item {
            id: id.to_string(),
            description: format!("criterion {id}"),
            answer: answer.map(str::to_string),
        }
    }

    fn section(id: &str, weight: i64, items: Vec<Item>) -> Section {
        Section {
            id: id.to_string(),
            title: format!("section {id}"),
            description: String::new(),
            weight,
            items,
        }
    }

    fn dossier(sections: Vec<Section>, method: Vec<EvaluationOption>) -> Dossier {
        Dossier {
            id: "d1".to_string(),
            title: "Oral exam".to_string(),
            description: String::new(),
            concept: EvaluationConcept::Numerical,
            evaluation_method: method,
            sections,
        }
    }

    #[test]
    fn weighted_sum_of_section_averages() {
        let d = dossier(
            vec![
                section(
                    "a",
                    60,
                    vec![item("i1", Some("ten")), item("i2", Some("eight"))],
                ),
                section("b", 40, vec![item("i3", Some("five"))]),
            ],
            vec![option("ten", 10.0), option("eight", 8.0), option("five", 5.0)],
        );

        let out = compute_dossier_score(&d);
        assert!((out.score - 7.4).abs() < 1e-9, "score {}", out.score);
        assert!(out.is_complete);
    }

    #[test]
    fn unanswered_section_contributes_zero_and_flags_incomplete() {
        let d = dossier(
            vec![
                section(
                    "a",
                    60,
                    vec![item("i1", Some("ten")), item("i2", Some("eight"))],
                ),
                section("b", 40, vec![item("i3", None)]),
            ],
            vec![option("ten", 10.0), option("eight", 8.0)],
        );

        let out = compute_dossier_score(&d);
        assert!((out.score - 5.4).abs() < 1e-9, "score {}", out.score);
        assert!(!out.is_complete);
        assert!(out.score.is_finite());
    }

    #[test]
    fn dangling_answer_scores_as_unanswered() {
        let d = dossier(
            vec![section(
                "a",
                100,
                vec![item("i1", Some("gone")), item("i2", Some("ten"))],
            )],
            vec![option("ten", 10.0)],
        );

        let out = compute_dossier_score(&d);
        // Only the resolvable answer participates in the average.
        assert!((out.score - 10.0).abs() < 1e-9, "score {}", out.score);
        assert!(out.is_complete, "non-null answers still count as filled in");
    }

    #[test]
    fn weight_zero_section_never_moves_the_score() {
        let d = dossier(
            vec![
                section("a", 100, vec![item("i1", Some("five"))]),
                section("z", 0, vec![item("i2", Some("ten"))]),
            ],
            vec![option("ten", 10.0), option("five", 5.0)],
        );

        let out = compute_dossier_score(&d);
        assert!((out.score - 5.0).abs() < 1e-9, "score {}", out.score);
    }

    #[test]
    fn idempotent_over_unchanged_tree() {
        let d = dossier(
            vec![section("a", 70, vec![item("i1", Some("ten")), item("i2", None)])],
            vec![option("ten", 10.0)],
        );

        let first = compute_dossier_score(&d);
        let second = compute_dossier_score(&d);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_tree_yields_finite_zero() {
        let d = dossier(vec![section("a", 100, vec![item("i1", None)])], vec![]);
        let out = compute_dossier_score(&d);
        assert_eq!(out.score, 0.0);
        assert!(!out.is_complete);
    }
}
