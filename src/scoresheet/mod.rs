pub mod storage;
pub mod types;

pub use storage::{load_mark_scoresheet, load_scoresheet, save_scoresheet};
pub use types::{JudgeMeta, JudgeResult, MarkScoresheet, Scoresheet, TallyScoresheet};
