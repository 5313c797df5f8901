use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Where a question exercises a concept: the concept itself plus the
/// application context it appears in (e.g. Kinematics / Projectiles).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptContext {
    pub concept: String,
    pub context: String,
}

#[derive(Debug, Default)]
struct CatalogData {
    reference_times: HashMap<(String, String), i64>,
    question_map: HashMap<String, ConceptContext>,
}

/// In-memory view of the content catalog the engine consumes: per-chapter
/// reference time baselines and the question -> concept/context mapping.
/// Populated by whatever curriculum layer owns the content; read-mostly.
#[derive(Debug, Default)]
pub struct CurriculumCatalog {
    inner: RwLock<CatalogData>,
}

impl CurriculumCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_reference_time(&self, subject: &str, chapter: &str, millis: i64) {
        let mut data = self.inner.write();
        data.reference_times
            .insert((subject.to_string(), chapter.to_string()), millis);
    }

    pub fn reference_time_ms(&self, subject: &str, chapter: &str) -> Option<i64> {
        let data = self.inner.read();
        data.reference_times
            .get(&(subject.to_string(), chapter.to_string()))
            .copied()
    }

    pub fn map_question(&self, question_id: &str, concept: &str, context: &str) {
        let mut data = self.inner.write();
        data.question_map.insert(
            question_id.to_string(),
            ConceptContext {
                concept: concept.to_string(),
                context: context.to_string(),
            },
        );
    }

    pub fn concept_context(&self, question_id: &str) -> Option<ConceptContext> {
        let data = self.inner.read();
        data.question_map.get(question_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_time_roundtrip() {
        let catalog = CurriculumCatalog::new();
        assert_eq!(catalog.reference_time_ms("Math", "Algebra"), None);
        catalog.set_reference_time("Math", "Algebra", 45_000);
        assert_eq!(catalog.reference_time_ms("Math", "Algebra"), Some(45_000));
    }

    #[test]
    fn question_mapping_roundtrip() {
        let catalog = CurriculumCatalog::new();
        catalog.map_question("q7", "Kinematics", "Projectiles");
        let mapped = catalog.concept_context("q7").unwrap();
        assert_eq!(mapped.concept, "Kinematics");
        assert_eq!(mapped.context, "Projectiles");
        assert!(catalog.concept_context("q8").is_none());
    }
}
