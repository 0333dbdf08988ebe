pub mod judge_type;
pub mod session;
pub mod steps;
pub mod summary;

pub use judge_type::{JudgeType, MarkDefinition};
pub use session::JudgeSession;
pub use steps::{count_step, mixed_step, set_step, timer_step, FieldMode, ReducerKind};
pub use summary::{passthrough, weighted_sum, ResultWeights};
