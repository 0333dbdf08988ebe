use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::TallyError;
use crate::marks::{filter_mark_stream, GenericMark};
use crate::scoresheet::{JudgeMeta, JudgeResult, MarkScoresheet, Scoresheet, TallyScoresheet};
use crate::tally::{fold_marks, normalize_tally, JudgeFieldDefinition, MarkReducer, ScoreTally, StepFn};

type SharedStep = Arc<dyn Fn(ScoreTally, &GenericMark, &[GenericMark]) -> ScoreTally + Send + Sync>;
type SharedSummarize = Arc<dyn Fn(&ScoreTally) -> BTreeMap<String, f64> + Send + Sync>;

/// A mark schema a judge can record, e.g. "diffL3" named "Level 3".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarkDefinition {
    pub schema: String,
    pub name: String,
}

/// A kind of judge: which marks it records, which counters it tallies,
/// how a mark changes the tally and how a tally becomes a result.
#[derive(Clone)]
pub struct JudgeType {
    pub id: String,
    pub name: String,
    pub mark_definitions: Vec<MarkDefinition>,
    pub tally_definitions: Vec<JudgeFieldDefinition>,
    step: SharedStep,
    summarize: SharedSummarize,
}

impl fmt::Debug for JudgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JudgeType")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("mark_definitions", &self.mark_definitions)
            .field("tally_definitions", &self.tally_definitions)
            .finish_non_exhaustive()
    }
}

impl JudgeType {
    /// Build a judge type whose marks share the tally field schemas.
    pub fn new<S, R>(
        id: impl Into<String>,
        name: impl Into<String>,
        tally_definitions: Vec<JudgeFieldDefinition>,
        step: S,
        summarize: R,
    ) -> Self
    where
        S: Fn(ScoreTally, &GenericMark, &[GenericMark]) -> ScoreTally + Send + Sync + 'static,
        R: Fn(&ScoreTally) -> BTreeMap<String, f64> + Send + Sync + 'static,
    {
        let mark_definitions = tally_definitions
            .iter()
            .map(|f| MarkDefinition {
                schema: f.schema.clone(),
                name: f.name.clone(),
            })
            .collect();

        Self {
            id: id.into(),
            name: name.into(),
            mark_definitions,
            tally_definitions,
            step: Arc::new(step),
            summarize: Arc::new(summarize),
        }
    }

    /// Use marks that differ from the tally fields, e.g. timer start/pause
    pub fn with_mark_definitions(mut self, mark_definitions: Vec<MarkDefinition>) -> Self {
        self.mark_definitions = mark_definitions;
        self
    }

    pub fn accepts_schema(&self, schema: &str) -> bool {
        self.mark_definitions.iter().any(|m| m.schema == schema)
    }

    /// Fail unless the scoresheet was recorded for this judge type.
    pub fn check_meta(&self, meta: &JudgeMeta) -> Result<(), TallyError> {
        if meta.judge_type_id == self.id {
            Ok(())
        } else {
            Err(TallyError::WrongJudgeType {
                actual: meta.judge_type_id.clone(),
                expected: self.id.clone(),
            })
        }
    }

    /// A fresh incremental reducer using this judge type's fold step
    pub fn create_mark_reducer(&self) -> MarkReducer {
        self.create_seeded_reducer(ScoreTally::new())
    }

    /// An incremental reducer starting from a tally stored on the scoresheet
    pub fn create_seeded_reducer(&self, baseline: ScoreTally) -> MarkReducer {
        let step = Arc::clone(&self.step);
        let boxed: StepFn = Box::new(move |tally: ScoreTally, mark: &GenericMark, live: &[GenericMark]| {
            step(tally, mark, live)
        });
        MarkReducer::seeded(boxed, self.tally_definitions.clone(), baseline)
    }

    /// Tally a complete mark scoresheet in one pass.
    pub fn calculate_tally(&self, sheet: &MarkScoresheet) -> Result<TallyScoresheet, TallyError> {
        self.check_meta(&sheet.meta)?;

        let effective = filter_mark_stream(&sheet.marks);
        let seed = sheet.tally.clone().unwrap_or_default();
        let raw = fold_marks(&*self.step, seed, &effective);

        Ok(TallyScoresheet {
            meta: sheet.meta.clone(),
            tally: normalize_tally(&self.tally_definitions, &raw),
        })
    }

    /// Tally any scoresheet: marks are folded, stored tallies are normalized.
    pub fn tally_scoresheet(&self, sheet: &Scoresheet) -> Result<TallyScoresheet, TallyError> {
        match sheet {
            Scoresheet::Marks(sheet) => self.calculate_tally(sheet),
            Scoresheet::Tally(sheet) => {
                self.check_meta(&sheet.meta)?;
                Ok(TallyScoresheet {
                    meta: sheet.meta.clone(),
                    tally: normalize_tally(&self.tally_definitions, &sheet.tally),
                })
            }
        }
    }

    /// Summarize a tally into this judge's numeric result.
    pub fn calculate_judge_result(&self, sheet: &TallyScoresheet) -> Result<JudgeResult, TallyError> {
        self.check_meta(&sheet.meta)?;

        let tally = normalize_tally(&self.tally_definitions, &sheet.tally);
        Ok(JudgeResult {
            meta: sheet.meta.clone(),
            result: (self.summarize)(&tally),
        })
    }
}
