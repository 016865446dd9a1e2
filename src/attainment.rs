use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{AttainmentResult, CourseOutcome, ProgramOutcome};

pub const MAX_WEIGHT: u8 = 3;

const LABELS: [&str; 4] = ["None", "Low", "Medium", "High"];

/// CO id -> PO code -> weight. Absent pairs read as 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightageMap {
    entries: BTreeMap<String, BTreeMap<String, u8>>,
}

impl WeightageMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, co_id: &str, po_code: &str) -> u8 {
        self.entries
            .get(co_id)
            .and_then(|row| row.get(po_code))
            .copied()
            .unwrap_or(0)
    }

    pub fn set(&mut self, co_id: &str, po_code: &str, value: i64) {
        self.entries
            .entry(co_id.to_string())
            .or_default()
            .insert(po_code.to_string(), clamp_weight(value));
    }

    /// Inserts a row for `co_id` even when it carries no weights yet.
    pub(crate) fn ensure_row(&mut self, co_id: &str) {
        self.entries.entry(co_id.to_string()).or_default();
    }

    pub fn reset_course(&mut self, co_ids: &[&str]) -> usize {
        let before = self.entries.len();
        self.entries.retain(|co_id, _| !co_ids.contains(&co_id.as_str()));
        before - self.entries.len()
    }

    pub fn po_total(&self, course_outcomes: &[CourseOutcome], po_code: &str) -> u32 {
        course_outcomes
            .iter()
            .map(|co| u32::from(self.get(&co.id, po_code)))
            .sum()
    }

    pub fn co_strength(&self, co_id: &str, program_outcomes: &[ProgramOutcome]) -> u32 {
        program_outcomes
            .iter()
            .map(|po| u32::from(self.get(co_id, &po.code)))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn clamp_weight(value: i64) -> u8 {
    value.clamp(0, i64::from(MAX_WEIGHT)) as u8
}

pub fn weight_label(weight: u8) -> &'static str {
    LABELS
        .get(usize::from(weight))
        .copied()
        .unwrap_or(LABELS[LABELS.len() - 1])
}

/// Per-PO attainment for one course's COs, in `program_outcomes` order.
///
/// The caller filters `course_outcomes` to a single course and supplies
/// weights already clamped into `0..=max_weight`.
pub fn compute_attainment(
    course_outcomes: &[CourseOutcome],
    mappings: &WeightageMap,
    program_outcomes: &[ProgramOutcome],
    max_weight: u8,
) -> Vec<AttainmentResult> {
    let sum_max = course_outcomes.len() as u64 * u64::from(max_weight);

    program_outcomes
        .iter()
        .map(|po| {
            let sum_weight = u64::from(mappings.po_total(course_outcomes, &po.code));
            AttainmentResult {
                po_code: po.code.clone(),
                percentage: percentage(sum_weight, sum_max),
            }
        })
        .collect()
}

fn percentage(sum_weight: u64, sum_max: u64) -> u8 {
    if sum_max == 0 {
        return 0;
    }
    // half-up rounding of 100 * w / m
    let rounded = (200 * sum_weight + sum_max) / (2 * sum_max);
    rounded.min(u64::from(u8::MAX)) as u8
}
