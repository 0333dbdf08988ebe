//! Clamping and rounding of raw tallies against field definitions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counter name -> value. Missing keys count as absent.
pub type ScoreTally = BTreeMap<String, f64>;

/// Describes one tally counter: its bounds, step size and default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeFieldDefinition {
    /// Identifies the counter and the marks that feed it
    pub schema: String,

    /// Human readable name, e.g. "Level 8"
    pub name: String,

    /// Lower bound, applied after step rounding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    /// Upper bound, applied after step rounding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    /// Values are rounded to the closest multiple of this
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,

    /// Value used when the raw tally has no entry for this field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<f64>,

    /// Optional fields without a value or default are left out of the
    /// normalized tally instead of being set to 0
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
}

impl JudgeFieldDefinition {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            min: None,
            max: None,
            step: None,
            default: None,
            optional: false,
        }
    }

    pub fn with_min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn with_max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn with_step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }

    pub fn with_default(mut self, default: f64) -> Self {
        self.default = Some(default);
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Round to this field's step then clamp to its bounds
    pub fn clamp(&self, value: f64) -> f64 {
        clamp_number(value, self.min, self.max, self.step)
    }
}

/// Round `num` to the closest multiple of `multiple`.
///
/// Half-way values round up: with a multiple of 1, 5.5 becomes 6.
pub fn round_to_multiple(num: f64, multiple: f64) -> f64 {
    let rest = num % multiple;
    if rest < multiple / 2.0 {
        num - rest
    } else {
        num + multiple - rest
    }
}

/// Round to `step` if set, then clamp into `[min, max]`.
pub fn clamp_number(n: f64, min: Option<f64>, max: Option<f64>, step: Option<f64>) -> f64 {
    let mut num = n;
    if let Some(step) = step {
        num = round_to_multiple(num, step);
    }
    if let Some(min) = min {
        if num < min {
            num = min;
        }
    }
    if let Some(max) = max {
        if num > max {
            num = max;
        }
    }
    num
}

/// Normalize a raw tally against field definitions.
///
/// Every defined field is read from `raw`, falling back to its default and
/// then to 0 (optional fields are omitted instead), then rounded and
/// clamped. Keys without a field definition are dropped.
pub fn normalize_tally(fields: &[JudgeFieldDefinition], raw: &ScoreTally) -> ScoreTally {
    let mut tally = ScoreTally::new();

    for field in fields {
        let value = match raw.get(&field.schema).copied().filter(|v| !v.is_nan()) {
            Some(v) => v,
            None => match (field.default, field.optional) {
                (Some(default), _) => default,
                (None, false) => 0.0,
                (None, true) => continue,
            },
        };
        tally.insert(field.schema.clone(), field.clamp(value));
    }

    tally
}
