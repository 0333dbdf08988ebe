use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::marks::GenericMark;
use crate::tally::ScoreTally;

/// Mark schema that starts a timer judge's clock
pub const TIMER_START: &str = "start";
/// Mark schema that stops a timer judge's clock
pub const TIMER_PAUSE: &str = "pause";
/// Tally field a timer judge accumulates into
pub const TIMER_FIELD: &str = "seconds";

/// How a judge type folds marks into its tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReducerKind {
    /// Every mark adds its value (or 1) to its counter
    #[default]
    Count,
    /// Every mark overwrites its counter with its value (or 1)
    Set,
    /// `start`/`pause` marks accumulate elapsed whole seconds
    Timer,
}

/// Per-field override of the judge's reducer kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldMode {
    Count,
    Set,
}

pub fn count_step(mut tally: ScoreTally, mark: &GenericMark, _live: &[GenericMark]) -> ScoreTally {
    *tally.entry(mark.schema.clone()).or_insert(0.0) += mark.magnitude();
    tally
}

pub fn set_step(mut tally: ScoreTally, mark: &GenericMark, _live: &[GenericMark]) -> ScoreTally {
    tally.insert(mark.schema.clone(), mark.magnitude());
    tally
}

/// On a pause mark, add the whole seconds since the first start mark that
/// followed the previous pause. Other marks leave the tally unchanged.
pub fn timer_step(mut tally: ScoreTally, mark: &GenericMark, live: &[GenericMark]) -> ScoreTally {
    if mark.schema != TIMER_PAUSE {
        return tally;
    }

    // `live` ends with the pause mark itself
    let earlier = &live[..live.len().saturating_sub(1)];
    let mut started: Option<&GenericMark> = None;
    for candidate in earlier.iter().rev() {
        match candidate.schema.as_str() {
            TIMER_PAUSE => break,
            TIMER_START => started = Some(candidate),
            _ => {}
        }
    }

    if let Some(start) = started {
        let elapsed = (mark.timestamp - start.timestamp) as f64 / 1000.0;
        *tally.entry(TIMER_FIELD.to_string()).or_insert(0.0) += (elapsed + 0.5).floor();
    }
    tally
}

/// Count or set depending on the mark's schema, falling back to `default`.
pub fn mixed_step(
    modes: BTreeMap<String, FieldMode>,
    default: FieldMode,
) -> impl Fn(ScoreTally, &GenericMark, &[GenericMark]) -> ScoreTally + Send + Sync + 'static {
    move |tally: ScoreTally, mark: &GenericMark, live: &[GenericMark]| {
        match modes.get(&mark.schema).copied().unwrap_or(default) {
            FieldMode::Count => count_step(tally, mark, live),
            FieldMode::Set => set_step(tally, mark, live),
        }
    }
}
