//! Mark-stream tally engine for judged rope skipping.
//!
//! Judges record marks (a counted skill, a miss, a scale value). This crate
//! folds a judge's mark stream into a tally, incrementally while judging or
//! in one pass over a saved scoresheet, honouring clear and undo marks.

pub mod config;
pub mod error;
pub mod judge;
pub mod marks;
pub mod output;
pub mod scoresheet;
pub mod tally;

pub use error::TallyError;
pub use judge::{JudgeSession, JudgeType};
pub use marks::{filter_mark_stream, GenericMark, Mark, MarkGenerator};
pub use scoresheet::{JudgeMeta, JudgeResult, MarkScoresheet, Scoresheet, TallyScoresheet};
pub use tally::{calculate_tally, normalize_tally, JudgeFieldDefinition, MarkReducer, ScoreTally};
