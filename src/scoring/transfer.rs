use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::CurriculumCatalog;
use crate::config::TransferParams;
use crate::types::{AttemptEvent, Correctness};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextPerformance {
    pub attempts: u32,
    pub correct: u32,
}

impl ContextPerformance {
    pub fn record(&mut self, correct: bool) {
        self.attempts += 1;
        if correct {
            self.correct += 1;
        }
    }

    /// Accuracy as a percentage; 0 with no attempts.
    pub fn accuracy(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            100.0 * f64::from(self.correct) / f64::from(self.attempts)
        }
    }
}

/// Cross-context performance for one concept of one user: application
/// context name -> accuracy accumulator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptTransferRecord {
    pub concept: String,
    pub contexts: BTreeMap<String, ContextPerformance>,
}

impl ConceptTransferRecord {
    pub fn new(concept: impl Into<String>) -> Self {
        Self {
            concept: concept.into(),
            contexts: BTreeMap::new(),
        }
    }

    pub fn record(&mut self, context: &str, correct: bool) {
        self.contexts
            .entry(context.to_string())
            .or_default()
            .record(correct);
    }

    pub fn merge(&mut self, other: &ConceptTransferRecord) {
        for (context, perf) in &other.contexts {
            let entry = self.contexts.entry(context.clone()).or_default();
            entry.attempts += perf.attempts;
            entry.correct += perf.correct;
        }
    }

    pub fn total_attempts(&self) -> u32 {
        self.contexts.values().map(|c| c.attempts).sum()
    }

    /// Geometric mean of per-context accuracy, so excelling in one context
    /// cannot mask failing in another. One context alone is insufficient
    /// evidence and yields `None` rather than its own score.
    pub fn transfer_score(&self, min_contexts: usize) -> Option<i32> {
        let accuracies: Vec<f64> = self
            .contexts
            .values()
            .filter(|c| c.attempts > 0)
            .map(ContextPerformance::accuracy)
            .collect();
        if accuracies.len() < min_contexts.max(1) {
            return None;
        }
        Some((geometric_mean(&accuracies).round() as i32).clamp(0, 100))
    }
}

pub(crate) fn geometric_mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    // a single failed context zeroes the whole mean
    if values.iter().any(|v| *v <= 0.0) {
        return 0.0;
    }
    let log_sum: f64 = values.iter().map(|v| v.ln()).sum();
    (log_sum / values.len() as f64).exp()
}

/// Heatmap color band. Lower bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferBand {
    High,
    Medium,
    Low,
}

impl TransferBand {
    pub fn classify(score: i32) -> Self {
        if score >= 80 {
            Self::High
        } else if score >= 60 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapCell {
    pub context: String,
    pub score: i32,
    pub band: TransferBand,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapRow {
    pub concept: String,
    pub cells: Vec<HeatmapCell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lti: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub band: Option<TransferBand>,
}

/// Builds the LTI heatmap: one row per concept with recorded application
/// attempts (never a zero-filled row), cells and rows in stable order.
pub fn build_heatmap(
    records: &[ConceptTransferRecord],
    params: &TransferParams,
) -> Vec<HeatmapRow> {
    let mut rows: Vec<HeatmapRow> = records
        .iter()
        .filter(|record| record.total_attempts() > 0)
        .map(|record| {
            let cells = record
                .contexts
                .iter()
                .filter(|(_, perf)| perf.attempts > 0)
                .map(|(context, perf)| {
                    let score = (perf.accuracy().round() as i32).clamp(0, 100);
                    HeatmapCell {
                        context: context.clone(),
                        score,
                        band: TransferBand::classify(score),
                    }
                })
                .collect();
            let lti = record.transfer_score(params.min_contexts);
            HeatmapRow {
                concept: record.concept.clone(),
                cells,
                lti,
                band: lti.map(TransferBand::classify),
            }
        })
        .collect();
    rows.sort_by(|a, b| a.concept.cmp(&b.concept));
    rows
}

/// Buckets a session's attempted events into per-concept transfer records
/// using the catalog's question -> concept/context mapping. Unmapped
/// questions contribute nothing.
pub fn session_transfer_records(
    events: &[AttemptEvent],
    catalog: &CurriculumCatalog,
) -> Vec<ConceptTransferRecord> {
    let mut by_concept: BTreeMap<String, ConceptTransferRecord> = BTreeMap::new();
    for event in events.iter().filter(|e| e.correctness.is_attempted()) {
        if let Some(mapping) = catalog.concept_context(&event.question_id) {
            by_concept
                .entry(mapping.concept.clone())
                .or_insert_with(|| ConceptTransferRecord::new(mapping.concept.clone()))
                .record(&mapping.context, event.correctness == Correctness::Correct);
        }
    }
    by_concept.into_values().collect()
}

/// Session-level LTI: geometric mean over the concepts that have
/// cross-context evidence this session; `None` when no concept does.
pub fn session_lti(records: &[ConceptTransferRecord], params: &TransferParams) -> Option<i32> {
    let scores: Vec<f64> = records
        .iter()
        .filter_map(|record| record.transfer_score(params.min_contexts))
        .map(f64::from)
        .collect();
    if scores.is_empty() {
        return None;
    }
    Some((geometric_mean(&scores).round() as i32).clamp(0, 100))
}
