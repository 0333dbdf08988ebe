pub mod formatter;

pub use formatter::{
    describe_mark, format_judge_list, format_judge_result, format_replay_line, format_tally,
    format_value, should_use_colors,
};
