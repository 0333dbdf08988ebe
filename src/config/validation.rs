use std::collections::HashSet;

use super::schema::{Config, JudgeTypeConfig};
use crate::judge::steps::TIMER_FIELD;
use crate::judge::ReducerKind;
use crate::marks::{CLEAR_SCHEMA, UNDO_SCHEMA};

/// Validate judge definitions at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if config.judges.is_empty() {
        errors.push("judges: at least one judge type is required".to_string());
    }

    let mut seen_ids = HashSet::new();
    for (i, judge) in config.judges.iter().enumerate() {
        if judge.id.trim().is_empty() {
            errors.push(format!("judges[{}].id: must not be empty", i));
        } else if !seen_ids.insert(judge.id.as_str()) {
            errors.push(format!("judges[{}].id: duplicate judge type '{}'", i, judge.id));
        }
        validate_judge(i, judge, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_judge(i: usize, judge: &JudgeTypeConfig, errors: &mut Vec<String>) {
    if judge.fields.is_empty() {
        errors.push(format!("judges[{}].fields: at least one field is required", i));
    }

    let mut seen_schemas = HashSet::new();
    for (j, field) in judge.fields.iter().enumerate() {
        let prefix = format!("judges[{}].fields[{}]", i, j);

        if field.schema.trim().is_empty() {
            errors.push(format!("{}.schema: must not be empty", prefix));
        } else if !seen_schemas.insert(field.schema.as_str()) {
            errors.push(format!("{}.schema: duplicate field '{}'", prefix, field.schema));
        }
        if is_reserved(&field.schema) {
            errors.push(format!("{}.schema: '{}' is reserved", prefix, field.schema));
        }

        if let Some(step) = field.step {
            if step.is_nan() || step <= 0.0 {
                errors.push(format!("{}.step: must be positive, got {}", prefix, step));
            }
        }
        if let (Some(min), Some(max)) = (field.min, field.max) {
            if min > max {
                errors.push(format!("{}: min {} is greater than max {}", prefix, min, max));
            }
        }
        if let Some(default) = field.default {
            let below = field.min.is_some_and(|min| default < min);
            let above = field.max.is_some_and(|max| default > max);
            if below || above {
                errors.push(format!("{}.default: {} is outside min/max", prefix, default));
            }
        }
        if field.mode.is_some() && judge.reducer == ReducerKind::Timer {
            errors.push(format!("{}.mode: not supported by timer judges", prefix));
        }
    }

    if let Some(ref marks) = judge.marks {
        for (j, mark) in marks.iter().enumerate() {
            if is_reserved(&mark.schema) {
                errors.push(format!(
                    "judges[{}].marks[{}].schema: '{}' is reserved",
                    i, j, mark.schema
                ));
            }
        }
    }

    if let Some(ref results) = judge.results {
        for (key, weights) in results {
            for schema in weights.keys() {
                if !seen_schemas.contains(schema.as_str()) {
                    errors.push(format!(
                        "judges[{}].results.{}: unknown field '{}'",
                        i, key, schema
                    ));
                }
            }
        }
    }

    if judge.reducer == ReducerKind::Timer && !seen_schemas.contains(TIMER_FIELD) {
        errors.push(format!(
            "judges[{}].fields: timer judges need a '{}' field",
            i, TIMER_FIELD
        ));
    }
}

fn is_reserved(schema: &str) -> bool {
    schema == CLEAR_SCHEMA || schema == UNDO_SCHEMA
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Config {
        serde_saphyr::from_str(yaml).unwrap()
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_empty_judges() {
        let errors = validate_config(&Config { judges: vec![] }).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("at least one judge"));
    }

    #[test]
    fn test_collects_all_errors() {
        let config = parse(
            r#"
judges:
  - id: P
    name: Presentation
    fields:
      - { schema: a, name: A, min: 5, max: 1 }
      - { schema: a, name: A again, step: 0 }
      - { schema: undo, name: Undo }
  - id: P
    name: Duplicate
    fields:
      - { schema: b, name: B, min: 0, max: 10, default: 11 }
    results:
      score: { nope: 1 }
"#,
        );
        let errors = validate_config(&config).unwrap_err();

        assert!(errors.iter().any(|e| e.contains("min 5 is greater than max 1")));
        assert!(errors.iter().any(|e| e.contains("duplicate field 'a'")));
        assert!(errors.iter().any(|e| e.contains("step: must be positive")));
        assert!(errors.iter().any(|e| e.contains("'undo' is reserved")));
        assert!(errors.iter().any(|e| e.contains("duplicate judge type 'P'")));
        assert!(errors.iter().any(|e| e.contains("default: 11 is outside")));
        assert!(errors.iter().any(|e| e.contains("unknown field 'nope'")));
    }

    #[test]
    fn test_timer_needs_seconds_field() {
        let config = parse(
            r#"
judges:
  - id: T
    name: Timing
    reducer: timer
    fields:
      - { schema: time, name: Time }
"#,
        );
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("'seconds'"));
    }

    #[test]
    fn test_reserved_mark_schema() {
        let config = parse(
            r#"
judges:
  - id: S
    name: Speed
    fields:
      - { schema: step, name: Steps }
    marks:
      - { schema: clear, name: Reset }
"#,
        );
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].contains("marks[0].schema: 'clear' is reserved"));
    }
}
