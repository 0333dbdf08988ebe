//! Incremental mark reducer.
//!
//! Accepts marks one at a time in strict sequence order and keeps the tally
//! current after every mark. A tally snapshot is cached per sequence so that
//! an undo only replays the live marks that came after the retracted one.
//!
//! Snapshots hold the raw fold state. Normalization happens when the tally
//! is read, so the incremental result always equals folding the filtered
//! stream from scratch and normalizing once.

use tracing::{debug, trace};

use super::normalize::{normalize_tally, JudgeFieldDefinition, ScoreTally};
use crate::error::TallyError;
use crate::marks::{filter_mark_stream, GenericMark, Mark};

/// Boxed fold step, as handed out by judge types.
pub type StepFn = Box<dyn Fn(ScoreTally, &GenericMark, &[GenericMark]) -> ScoreTally + Send + Sync>;

/// Stateful tally for one scoresheet in progress.
///
/// `F` applies one generic mark to a tally. It receives the live marks up to
/// and including the mark being applied, and must be free of side effects
/// since marks are replayed after an undo.
pub struct MarkReducer<F = StepFn> {
    fields: Vec<JudgeFieldDefinition>,
    step: F,
    next_sequence: u64,
    live_marks: Vec<GenericMark>,
    // Tally before the first live mark; clears return here
    baseline: ScoreTally,
    // Indexed by sequence, always `next_sequence` entries long
    snapshots: Vec<ScoreTally>,
}

impl<F> MarkReducer<F>
where
    F: Fn(ScoreTally, &GenericMark, &[GenericMark]) -> ScoreTally,
{
    pub fn new(step: F, fields: Vec<JudgeFieldDefinition>) -> Self {
        Self::seeded(step, fields, ScoreTally::new())
    }

    /// Start from `baseline` instead of the empty tally, e.g. a tally
    /// already stored on the scoresheet. Clear marks return to it.
    pub fn seeded(step: F, fields: Vec<JudgeFieldDefinition>, baseline: ScoreTally) -> Self {
        Self {
            fields,
            step,
            next_sequence: 0,
            live_marks: Vec::new(),
            baseline,
            snapshots: Vec::new(),
        }
    }

    /// Accept the next mark of the stream.
    ///
    /// # Errors
    ///
    /// Returns [`TallyError::SequenceViolation`] if the mark's sequence is not
    /// the next expected one. The reducer is left untouched in that case.
    pub fn add_mark(&mut self, mark: &Mark) -> Result<(), TallyError> {
        if mark.sequence() != self.next_sequence {
            return Err(TallyError::SequenceViolation {
                expected: self.next_sequence,
                actual: mark.sequence(),
            });
        }

        let snapshot = match mark {
            Mark::Clear(_) => {
                debug!(sequence = mark.sequence(), dropped = self.live_marks.len(), "clear mark");
                self.live_marks.clear();
                self.baseline.clone()
            }
            Mark::Undo(undo) => self.apply_undo(undo.sequence, undo.target),
            Mark::Generic(generic) => {
                let previous = self.latest_snapshot().clone();
                self.live_marks.push(generic.clone());
                (self.step)(previous, generic, &self.live_marks)
            }
        };

        trace!(sequence = mark.sequence(), ?snapshot, "snapshot");
        self.snapshots.push(snapshot);
        self.next_sequence += 1;
        Ok(())
    }

    /// Accept several marks in order, stopping at the first rejected one.
    pub fn add_marks<'a>(&mut self, marks: impl IntoIterator<Item = &'a Mark>) -> Result<(), TallyError> {
        for mark in marks {
            self.add_mark(mark)?;
        }
        Ok(())
    }

    fn apply_undo(&mut self, sequence: u64, target: u64) -> ScoreTally {
        let Some(position) = self.live_marks.iter().rposition(|m| m.sequence == target) else {
            debug!(sequence, target, "undo target is not a live mark, ignoring");
            return self.latest_snapshot().clone();
        };

        self.live_marks.remove(position);

        let mut tally = match position.checked_sub(1) {
            Some(prev) => self.snapshots[self.live_marks[prev].sequence as usize].clone(),
            None => self.baseline.clone(),
        };

        for idx in position..self.live_marks.len() {
            let live = &self.live_marks[..=idx];
            let mark = &self.live_marks[idx];
            tally = (self.step)(tally, mark, live);
            self.snapshots[mark.sequence as usize] = tally.clone();
        }

        debug!(
            sequence,
            target,
            replayed = self.live_marks.len() - position,
            "undo applied"
        );
        tally
    }
}

impl<F> MarkReducer<F> {
    /// The normalized tally after the latest mark.
    pub fn current_tally(&self) -> ScoreTally {
        normalize_tally(&self.fields, self.latest_snapshot())
    }

    fn latest_snapshot(&self) -> &ScoreTally {
        self.snapshots.last().unwrap_or(&self.baseline)
    }

    /// Sequence number the next mark must carry
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Generic marks that currently count towards the tally
    pub fn live_marks(&self) -> &[GenericMark] {
        &self.live_marks
    }

    pub fn field_definitions(&self) -> &[JudgeFieldDefinition] {
        &self.fields
    }
}

/// Fold effective generic marks into a raw tally, starting from `initial`.
pub fn fold_marks<F>(step: F, initial: ScoreTally, marks: &[GenericMark]) -> ScoreTally
where
    F: Fn(ScoreTally, &GenericMark, &[GenericMark]) -> ScoreTally,
{
    marks
        .iter()
        .enumerate()
        .fold(initial, |tally, (idx, mark)| step(tally, mark, &marks[..=idx]))
}

/// Tally a complete mark stream in one pass: filter, fold, normalize.
pub fn calculate_tally<F>(step: F, fields: &[JudgeFieldDefinition], marks: &[Mark]) -> ScoreTally
where
    F: Fn(ScoreTally, &GenericMark, &[GenericMark]) -> ScoreTally,
{
    let effective = filter_mark_stream(marks);
    normalize_tally(fields, &fold_marks(step, ScoreTally::new(), &effective))
}
