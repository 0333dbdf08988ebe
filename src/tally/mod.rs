pub mod normalize;
pub mod reducer;

pub use normalize::{clamp_number, normalize_tally, round_to_multiple, JudgeFieldDefinition, ScoreTally};
pub use reducer::{calculate_tally, fold_marks, MarkReducer, StepFn};
