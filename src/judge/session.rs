use tracing::debug;

use super::judge_type::JudgeType;
use crate::error::TallyError;
use crate::marks::Mark;
use crate::scoresheet::{JudgeMeta, JudgeResult, MarkScoresheet, TallyScoresheet};
use crate::tally::{MarkReducer, ScoreTally};

/// A judge's scoresheet while judging is in progress.
///
/// Keeps the accepted marks alongside an incremental reducer so the tally is
/// always current and the session can be saved as a mark scoresheet.
pub struct JudgeSession {
    judge_type: JudgeType,
    meta: JudgeMeta,
    reducer: MarkReducer,
    marks: Vec<Mark>,
    seed: Option<ScoreTally>,
}

impl JudgeSession {
    pub fn new(judge_type: &JudgeType, meta: JudgeMeta) -> Result<Self, TallyError> {
        judge_type.check_meta(&meta)?;
        Ok(Self {
            judge_type: judge_type.clone(),
            meta,
            reducer: judge_type.create_mark_reducer(),
            marks: Vec::new(),
            seed: None,
        })
    }

    /// Continue a saved scoresheet by replaying its marks.
    pub fn resume(judge_type: &JudgeType, sheet: MarkScoresheet) -> Result<Self, TallyError> {
        let mut session = Self::new(judge_type, sheet.meta)?;
        if let Some(seed) = sheet.tally {
            session.reducer = judge_type.create_seeded_reducer(seed.clone());
            session.seed = Some(seed);
        }
        for mark in sheet.marks {
            session.record(mark)?;
        }
        debug!(
            judge_id = %session.meta.judge_id,
            marks = session.marks.len(),
            "resumed judging session"
        );
        Ok(session)
    }

    /// Record the next mark.
    ///
    /// # Errors
    ///
    /// Fails with [`TallyError::SequenceViolation`] when the mark does not carry
    /// [`JudgeSession::next_sequence`]; the session is unchanged.
    pub fn record(&mut self, mark: Mark) -> Result<(), TallyError> {
        self.reducer.add_mark(&mark)?;
        self.marks.push(mark);
        Ok(())
    }

    pub fn next_sequence(&self) -> u64 {
        self.reducer.next_sequence()
    }

    pub fn meta(&self) -> &JudgeMeta {
        &self.meta
    }

    pub fn judge_type(&self) -> &JudgeType {
        &self.judge_type
    }

    /// Every accepted mark, including clears and undos
    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }

    pub fn current_tally(&self) -> ScoreTally {
        self.reducer.current_tally()
    }

    pub fn tally_scoresheet(&self) -> TallyScoresheet {
        TallyScoresheet {
            meta: self.meta.clone(),
            tally: self.current_tally(),
        }
    }

    pub fn judge_result(&self) -> Result<JudgeResult, TallyError> {
        self.judge_type.calculate_judge_result(&self.tally_scoresheet())
    }

    pub fn into_mark_scoresheet(self) -> MarkScoresheet {
        MarkScoresheet {
            meta: self.meta,
            marks: self.marks,
            tally: self.seed,
        }
    }
}
