use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::judge::steps::{TIMER_FIELD, TIMER_PAUSE, TIMER_START};
use crate::judge::{
    count_step, mixed_step, passthrough, set_step, timer_step, weighted_sum, FieldMode, JudgeType,
    MarkDefinition, ReducerKind, ResultWeights,
};
use crate::tally::{JudgeFieldDefinition, ScoreTally, StepFn};

type SummarizeFn = Box<dyn Fn(&ScoreTally) -> BTreeMap<String, f64> + Send + Sync>;

/// Judge type definitions.
///
/// Example YAML:
/// ```yaml
/// judges:
///   - id: P
///     name: Presentation
///     reducer: count
///     fields:
///       - { schema: formPlus, name: "Form +", min: 0, step: 1 }
///       - { schema: formMinus, name: "Form -", min: 0, step: 1 }
///     results:
///       score: { formPlus: 1, formMinus: -1 }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub judges: Vec<JudgeTypeConfig>,
}

impl Config {
    pub fn find_judge(&self, id: &str) -> Option<&JudgeTypeConfig> {
        self.judges.iter().find(|j| j.id == id)
    }

    pub fn judge_types(&self) -> Vec<JudgeType> {
        self.judges.iter().map(JudgeTypeConfig::build).collect()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct JudgeTypeConfig {
    /// Short identifier recorded on scoresheets, e.g. "P" or "Dm"
    pub id: String,

    pub name: String,

    /// How marks change the tally (default: count)
    #[serde(default)]
    pub reducer: ReducerKind,

    /// Tally counters with their bounds
    pub fields: Vec<FieldConfig>,

    /// Recordable marks, when they differ from the tally fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marks: Option<Vec<MarkDefinition>>,

    /// Result component -> weight per field. Without it every normalized
    /// field is reported as the result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<ResultWeights>,
}

/// One tally counter.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FieldConfig {
    pub schema: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<f64>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,

    /// Overrides the judge's count/set reducer for this field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<FieldMode>,
}

impl FieldConfig {
    fn new(schema: &str, name: &str) -> Self {
        Self {
            schema: schema.to_string(),
            name: name.to_string(),
            min: Some(0.0),
            max: None,
            step: Some(1.0),
            default: None,
            optional: false,
            mode: None,
        }
    }

    pub fn definition(&self) -> JudgeFieldDefinition {
        JudgeFieldDefinition {
            schema: self.schema.clone(),
            name: self.name.clone(),
            min: self.min,
            max: self.max,
            step: self.step,
            default: self.default,
            optional: self.optional,
        }
    }
}

impl JudgeTypeConfig {
    pub fn field_definitions(&self) -> Vec<JudgeFieldDefinition> {
        self.fields.iter().map(FieldConfig::definition).collect()
    }

    /// Mark definitions, defaulting to start/pause for timers and to the
    /// tally fields otherwise
    pub fn mark_definitions(&self) -> Vec<MarkDefinition> {
        if let Some(ref marks) = self.marks {
            return marks.clone();
        }
        match self.reducer {
            ReducerKind::Timer => vec![
                MarkDefinition {
                    schema: TIMER_START.to_string(),
                    name: "Start Timer".to_string(),
                },
                MarkDefinition {
                    schema: TIMER_PAUSE.to_string(),
                    name: "Pause Timer".to_string(),
                },
            ],
            ReducerKind::Count | ReducerKind::Set => self
                .fields
                .iter()
                .map(|f| MarkDefinition {
                    schema: f.schema.clone(),
                    name: f.name.clone(),
                })
                .collect(),
        }
    }

    /// Build the runtime judge type
    pub fn build(&self) -> JudgeType {
        let modes: BTreeMap<String, FieldMode> = self
            .fields
            .iter()
            .filter_map(|f| f.mode.map(|mode| (f.schema.clone(), mode)))
            .collect();

        let step: StepFn = match self.reducer {
            ReducerKind::Timer => Box::new(timer_step),
            ReducerKind::Count if modes.is_empty() => Box::new(count_step),
            ReducerKind::Set if modes.is_empty() => Box::new(set_step),
            ReducerKind::Count => Box::new(mixed_step(modes, FieldMode::Count)),
            ReducerKind::Set => Box::new(mixed_step(modes, FieldMode::Set)),
        };

        let summarize: SummarizeFn = match self.results.clone() {
            Some(weights) => Box::new(move |t: &ScoreTally| weighted_sum(&weights, t)),
            None => Box::new(passthrough),
        };

        JudgeType::new(&self.id, &self.name, self.field_definitions(), step, summarize)
            .with_mark_definitions(self.mark_definitions())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            judges: vec![
                JudgeTypeConfig {
                    id: "P".to_string(),
                    name: "Presentation".to_string(),
                    reducer: ReducerKind::Count,
                    fields: vec![
                        FieldConfig::new("formPlus", "Form +"),
                        FieldConfig::new("formCheck", "Form ✓"),
                        FieldConfig::new("formMinus", "Form -"),
                    ],
                    marks: None,
                    results: Some(BTreeMap::from([(
                        "score".to_string(),
                        BTreeMap::from([
                            ("formPlus".to_string(), 1.0),
                            ("formMinus".to_string(), -1.0),
                        ]),
                    )])),
                },
                JudgeTypeConfig {
                    id: "S".to_string(),
                    name: "Speed".to_string(),
                    reducer: ReducerKind::Count,
                    fields: vec![FieldConfig::new("step", "Steps")],
                    marks: None,
                    results: None,
                },
                JudgeTypeConfig {
                    id: "T".to_string(),
                    name: "Timing".to_string(),
                    reducer: ReducerKind::Timer,
                    fields: vec![FieldConfig::new(TIMER_FIELD, "Seconds")],
                    marks: None,
                    results: None,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marks::MarkGenerator;
    use crate::scoresheet::{JudgeMeta, MarkScoresheet};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.judges.len(), 3);
        assert!(config.find_judge("P").is_some());
        assert!(config.find_judge("X").is_none());
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = Config::default();
        let yaml = serde_saphyr::to_string(&config).unwrap();
        let parsed: Config = serde_saphyr::from_str(&yaml).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_full_config_parse() {
        let yaml = r#"
judges:
  - id: P
    name: Presentation
    reducer: set
    fields:
      - { schema: ent, name: Entertainment, min: 0, max: 10, step: 0.5 }
      - { schema: miss, name: Missar, min: 0, step: 1, mode: count }
    results:
      score: { ent: 1, miss: -0.5 }
"#;
        let config: Config = serde_saphyr::from_str(yaml).unwrap();
        let judge = &config.judges[0];
        assert_eq!(judge.reducer, ReducerKind::Set);
        assert_eq!(judge.fields[1].mode, Some(FieldMode::Count));
        assert_eq!(judge.fields[0].max, Some(10.0));
        assert!(judge.marks.is_none());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = r#"
judges:
  - id: P
    name: Presentation
    fields: []
    colour: red
"#;
        let result: Result<Config, _> = serde_saphyr::from_str(yaml);
        assert!(result.is_err());
    }

    #[test]
    fn test_build_mixed_judge() {
        let yaml = r#"
judges:
  - id: P
    name: Presentation
    reducer: set
    fields:
      - { schema: ent, name: Entertainment, min: 0, max: 10, step: 0.5 }
      - { schema: miss, name: Missar, min: 0, step: 1, mode: count }
    results:
      score: { ent: 1, miss: -0.5 }
"#;
        let config: Config = serde_saphyr::from_str(yaml).unwrap();
        let judge = config.judges[0].build();

        let mut m = MarkGenerator::new();
        let mut sheet = MarkScoresheet::new(JudgeMeta::new("1", "P"));
        sheet.marks = vec![
            m.mark_value("ent", 7.0),
            m.mark("miss"),
            m.mark_value("ent", 8.3),
            m.mark("miss"),
        ];
        let tally = judge.calculate_tally(&sheet).unwrap();
        assert_eq!(tally.tally.get("ent"), Some(&8.5));
        assert_eq!(tally.tally.get("miss"), Some(&2.0));

        let result = judge.calculate_judge_result(&tally).unwrap();
        assert_eq!(result.result.get("score"), Some(&7.5));
    }

    #[test]
    fn test_timer_defaults_to_start_pause_marks() {
        let config = Config::default();
        let timing = config.find_judge("T").unwrap().build();
        assert!(timing.accepts_schema(TIMER_START));
        assert!(timing.accepts_schema(TIMER_PAUSE));
        assert!(!timing.accepts_schema(TIMER_FIELD));
    }
}
