//! Exam records from the grading service
//!
//! Only the fields needed to derive a [`TrackedEntity`] are modelled: the
//! document reference and the students still awaiting grading. Everything
//! else in the payload is ignored.

use crate::poll::TrackedEntity;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentForGrading {
    pub student_id: String,
    #[serde(default)]
    pub student_name: String,
    #[serde(default)]
    pub team_id: Option<u64>,
    #[serde(default)]
    pub is_leader: bool,
    #[serde(default)]
    pub team_status: Option<String>,
}

/// Study material an exam is based on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamContent {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub authors_short: Option<String>,
    #[serde(default)]
    pub sef_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamItem {
    pub exam_id: u64,
    pub title: String,
    #[serde(default)]
    pub subject_area: Option<String>,
    /// Document reference at the top level (older payloads)
    #[serde(default)]
    pub sef_url: Option<String>,
    #[serde(default)]
    pub content: Option<ExamContent>,
    #[serde(default)]
    pub students_for_grading: Vec<StudentForGrading>,
}

impl ExamItem {
    /// The document reference, preferring the one under `content`.
    pub fn document_key(&self) -> Option<&str> {
        self.content
            .as_ref()
            .and_then(|c| c.sef_url.as_deref())
            .filter(|k| !k.is_empty())
            .or_else(|| self.sef_url.as_deref().filter(|k| !k.is_empty()))
    }

    pub fn pending_consumers(&self) -> usize {
        self.students_for_grading.len()
    }

    /// `None` when the exam has no document to follow.
    pub fn tracked_entity(&self) -> Option<TrackedEntity> {
        self.document_key()
            .map(|key| TrackedEntity::new(key).with_pending_consumers(self.pending_consumers()))
    }
}

/// Envelope of the grading service's exam listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ListExamsResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub total_exams: u64,
    #[serde(default)]
    pub exams: Vec<ExamItem>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Parse either a full listing response or a bare array of exams.
pub fn parse_exam_list(json: &str) -> Result<Vec<ExamItem>, serde_json::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Listing {
        Envelope(ListExamsResponse),
        Bare(Vec<ExamItem>),
    }

    Ok(match serde_json::from_str(json)? {
        Listing::Envelope(response) => response.exams,
        Listing::Bare(exams) => exams,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn exam(value: serde_json::Value) -> ExamItem {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn content_reference_wins() {
        let item = exam(json!({
            "exam_id": 101,
            "title": "Data analysis",
            "sef_url": "old-ref",
            "content": { "sef_url": "intro-data-analysis" }
        }));
        assert_eq!(item.document_key(), Some("intro-data-analysis"));
    }

    #[test]
    fn falls_back_to_top_level_reference() {
        let item = exam(json!({
            "exam_id": 102,
            "title": "ML",
            "sef_url": "intro-ml",
            "content": { "sef_url": "" }
        }));
        assert_eq!(item.document_key(), Some("intro-ml"));
    }

    #[test]
    fn entity_carries_consumer_count() {
        let item = exam(json!({
            "exam_id": 103,
            "title": "Stats",
            "sef_url": "stats",
            "students_for_grading": [
                { "student_id": "s-1", "student_name": "A" },
                { "student_id": "s-2", "student_name": "B", "team_id": 4, "is_leader": true }
            ]
        }));
        let entity = item.tracked_entity().unwrap();
        assert_eq!(entity.key, "stats");
        assert_eq!(entity.pending_consumers, 2);
    }

    #[test]
    fn exam_without_reference_is_untrackable() {
        let item = exam(json!({ "exam_id": 104, "title": "Oral" }));
        assert!(item.tracked_entity().is_none());
    }

    #[test]
    fn parses_envelope_and_bare_lists() {
        let envelope = r#"{"success": true, "total_exams": 1, "exams": [{"exam_id": 1, "title": "T", "sef_url": "k"}], "error": null}"#;
        let bare = r#"[{"exam_id": 2, "title": "U"}]"#;

        assert_eq!(parse_exam_list(envelope).unwrap()[0].exam_id, 1);
        assert_eq!(parse_exam_list(bare).unwrap()[0].exam_id, 2);
        assert!(parse_exam_list("{\"exams\": 5}").is_err());
    }
}
