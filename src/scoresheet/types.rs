use serde::{de, Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::marks::Mark;
use crate::tally::ScoreTally;

/// Identifies who produced a scoresheet and for which judge type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgeMeta {
    pub judge_id: String,
    pub judge_type_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competition_event: Option<String>,
}

impl JudgeMeta {
    pub fn new(judge_id: impl Into<String>, judge_type_id: impl Into<String>) -> Self {
        Self {
            judge_id: judge_id.into(),
            judge_type_id: judge_type_id.into(),
            entry_id: None,
            participant_id: None,
            competition_event: None,
        }
    }
}

/// A scoresheet recorded as a stream of marks.
///
/// `tally`, when present, seeds the fold before the marks are applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkScoresheet {
    pub meta: JudgeMeta,
    pub marks: Vec<Mark>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tally: Option<ScoreTally>,
}

impl MarkScoresheet {
    pub fn new(meta: JudgeMeta) -> Self {
        Self {
            meta,
            marks: Vec::new(),
            tally: None,
        }
    }

    /// Sequence the next appended mark must carry
    pub fn next_sequence(&self) -> u64 {
        self.marks.last().map_or(0, |m| m.sequence() + 1)
    }
}

/// A scoresheet holding only counter values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TallyScoresheet {
    pub meta: JudgeMeta,
    pub tally: ScoreTally,
}

/// Either scoresheet kind, as stored on disk.
///
/// A sheet with a `marks` key is a mark scoresheet, anything else is a tally
/// scoresheet. Decode errors of the chosen kind are reported as is.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scoresheet {
    Marks(MarkScoresheet),
    Tally(TallyScoresheet),
}

impl<'de> Deserialize<'de> for Scoresheet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        if value.get("marks").is_some() {
            MarkScoresheet::deserialize(value)
                .map(Scoresheet::Marks)
                .map_err(de::Error::custom)
        } else {
            TallyScoresheet::deserialize(value)
                .map(Scoresheet::Tally)
                .map_err(de::Error::custom)
        }
    }
}

impl Scoresheet {
    pub fn meta(&self) -> &JudgeMeta {
        match self {
            Scoresheet::Marks(sheet) => &sheet.meta,
            Scoresheet::Tally(sheet) => &sheet.meta,
        }
    }
}

/// Numeric outcome of one judge's scoresheet, keyed by result component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeResult {
    pub meta: JudgeMeta,
    pub result: BTreeMap<String, f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mark_scoresheet() {
        let json = r#"{
            "meta": { "judgeId": "1", "judgeTypeId": "P", "entryId": "e1" },
            "marks": [
                { "sequence": 0, "schema": "formPlus", "timestamp": 1 },
                { "sequence": 1, "schema": "undo", "timestamp": 15, "target": 0 }
            ]
        }"#;
        let sheet: Scoresheet = serde_json::from_str(json).unwrap();
        match sheet {
            Scoresheet::Marks(sheet) => {
                assert_eq!(sheet.meta.judge_type_id, "P");
                assert_eq!(sheet.meta.entry_id.as_deref(), Some("e1"));
                assert_eq!(sheet.marks.len(), 2);
                assert!(sheet.marks[1].is_undo());
                assert_eq!(sheet.next_sequence(), 2);
            }
            Scoresheet::Tally(_) => panic!("expected a mark scoresheet"),
        }
    }

    #[test]
    fn test_bad_mark_error_is_reported() {
        let json = r#"{
            "meta": { "judgeId": "1", "judgeTypeId": "P" },
            "marks": [
                { "sequence": 0, "schema": "formPlus", "timestamp": 1 },
                { "sequence": 1, "schema": "undo", "timestamp": 15 }
            ]
        }"#;
        let err = serde_json::from_str::<Scoresheet>(json).unwrap_err();
        assert!(err.to_string().contains("undo mark 1 has no target"), "{}", err);
    }

    #[test]
    fn test_sheet_without_marks_or_tally_is_rejected() {
        let json = r#"{ "meta": { "judgeId": "1", "judgeTypeId": "P" } }"#;
        let err = serde_json::from_str::<Scoresheet>(json).unwrap_err();
        assert!(err.to_string().contains("tally"), "{}", err);
    }

    #[test]
    fn test_parse_tally_scoresheet() {
        let json = r#"{
            "meta": { "judgeId": "1", "judgeTypeId": "P" },
            "tally": { "entPlus": 2, "entMinus": 1 }
        }"#;
        let sheet: Scoresheet = serde_json::from_str(json).unwrap();
        match sheet {
            Scoresheet::Tally(sheet) => {
                assert_eq!(sheet.tally.get("entPlus"), Some(&2.0));
            }
            Scoresheet::Marks(_) => panic!("expected a tally scoresheet"),
        }
    }

    #[test]
    fn test_meta_omits_missing_optional_fields() {
        let json = serde_json::to_string(&JudgeMeta::new("1", "S")).unwrap();
        assert_eq!(json, r#"{"judgeId":"1","judgeTypeId":"S"}"#);
    }

    #[test]
    fn test_empty_sheet_starts_at_zero() {
        assert_eq!(MarkScoresheet::new(JudgeMeta::new("1", "S")).next_sequence(), 0);
    }
}
