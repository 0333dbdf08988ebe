use std::io::IsTerminal;
use std::time::Duration;

use owo_colors::OwoColorize;
use terminal_size::{terminal_size, Width};

use crate::judge::JudgeType;
use crate::marks::Mark;
use crate::scoresheet::{JudgeMeta, JudgeResult};
use crate::tally::{JudgeFieldDefinition, ScoreTally};

/// Value column width, right-aligned (fits "-99999.99")
const VALUE_WIDTH: usize = 9;

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a tally or result value with at most two decimals.
/// Trailing zeros are trimmed ("3.0" -> "3", "8.50" -> "8.5").
pub fn format_value(value: f64) -> String {
    let formatted = format!("{:.2}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate a label to fit available width, accounting for Unicode
fn truncate_label(label: &str, max_width: usize) -> String {
    let chars: Vec<char> = label.chars().collect();
    if chars.len() <= max_width {
        label.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Display label for a tally key: the field name when the judge defines it
fn field_label(fields: &[JudgeFieldDefinition], schema: &str) -> String {
    fields
        .iter()
        .find(|f| f.schema == schema)
        .map(|f| format!("{} ({})", f.name, schema))
        .unwrap_or_else(|| schema.to_string())
}

/// Format "label  value" rows with labels padded to a common width
fn format_rows(rows: &[(String, f64)], use_colors: bool) -> String {
    let longest = rows.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
    let label_width = match get_terminal_width() {
        Some(width) if width > VALUE_WIDTH + 6 => longest.min(width - VALUE_WIDTH - 4),
        Some(_) => longest.min(20),
        None => longest,
    };

    rows.iter()
        .map(|(label, value)| {
            let label = truncate_label(label, label_width);
            let value = format!("{:>width$}", format_value(*value), width = VALUE_WIDTH);
            if use_colors {
                format!("  {:<lw$}  {}", label, value.bold(), lw = label_width)
            } else {
                format!("  {:<lw$}  {}", label, value, lw = label_width)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_meta(meta: &JudgeMeta, use_colors: bool) -> String {
    let mut header = format!("Judge {} ({})", meta.judge_id, meta.judge_type_id);
    if let Some(ref entry) = meta.entry_id {
        header.push_str(&format!(" entry {}", entry));
    }
    if use_colors {
        header.bold().to_string()
    } else {
        header
    }
}

/// Format a normalized tally, one field per line in definition order.
/// Keys the judge does not define are listed after, by schema.
pub fn format_tally(judge: &JudgeType, meta: &JudgeMeta, tally: &ScoreTally, use_colors: bool) -> String {
    let mut rows: Vec<(String, f64)> = judge
        .tally_definitions
        .iter()
        .filter_map(|f| tally.get(&f.schema).map(|v| (field_label(&judge.tally_definitions, &f.schema), *v)))
        .collect();
    rows.extend(
        tally
            .iter()
            .filter(|(k, _)| !judge.tally_definitions.iter().any(|f| &f.schema == *k))
            .map(|(k, v)| (k.clone(), *v)),
    );

    if rows.is_empty() {
        return format!("{}\n  (empty tally)", format_meta(meta, use_colors));
    }
    format!("{}\n{}", format_meta(meta, use_colors), format_rows(&rows, use_colors))
}

/// Format a judge result, one component per line
pub fn format_judge_result(result: &JudgeResult, use_colors: bool) -> String {
    let rows: Vec<(String, f64)> = result.result.iter().map(|(k, v)| (k.clone(), *v)).collect();
    if rows.is_empty() {
        return format!("{}\n  (no result)", format_meta(&result.meta, use_colors));
    }
    format!("{}\n{}", format_meta(&result.meta, use_colors), format_rows(&rows, use_colors))
}

fn format_bounds(field: &JudgeFieldDefinition) -> String {
    let min = field.min.map(format_value).unwrap_or_default();
    let max = field.max.map(format_value).unwrap_or_default();
    let mut out = format!("[{}..{}]", min, max);
    if let Some(step) = field.step {
        out.push_str(&format!(" step {}", format_value(step)));
    }
    if let Some(default) = field.default {
        out.push_str(&format!(" default {}", format_value(default)));
    }
    if field.optional {
        out.push_str(" optional");
    }
    out
}

/// Format configured judge types with their fields and recordable marks
pub fn format_judge_list(judges: &[JudgeType], use_colors: bool) -> String {
    if judges.is_empty() {
        return "No judge types configured.".to_string();
    }

    judges
        .iter()
        .map(|judge| {
            let header = if use_colors {
                format!("{}  {}", judge.id.cyan().bold(), judge.name.bold())
            } else {
                format!("{}  {}", judge.id, judge.name)
            };
            let fields = judge
                .tally_definitions
                .iter()
                .map(|f| format!("    {:<16} {:<20} {}", f.schema, f.name, format_bounds(f)))
                .collect::<Vec<_>>()
                .join("\n");
            let marks = judge
                .mark_definitions
                .iter()
                .map(|m| m.schema.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            let marks_line = if use_colors {
                format!("    marks: {}", marks.dimmed())
            } else {
                format!("    marks: {}", marks)
            };
            format!("{}\n{}\n{}", header, fields, marks_line)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Describe a mark for display: "formPlus", "formPlus=3", "clear", "undo #4"
pub fn describe_mark(mark: &Mark) -> String {
    match mark {
        Mark::Generic(m) => match m.value {
            Some(value) => format!("{}={}", m.schema, format_value(value)),
            None => m.schema.clone(),
        },
        Mark::Clear(_) => "clear".to_string(),
        Mark::Undo(u) => format!("undo #{}", u.target),
    }
}

/// One replay line: sequence, elapsed time since the first mark, the mark,
/// then the tally after it
pub fn format_replay_line(mark: &Mark, elapsed: Duration, tally: &ScoreTally, use_colors: bool) -> String {
    let elapsed = Duration::from_millis(elapsed.as_millis() as u64);
    let elapsed = if elapsed.is_zero() {
        "0s".to_string()
    } else {
        humantime::format_duration(elapsed).to_string()
    };
    let tally = tally
        .iter()
        .map(|(k, v)| format!("{}={}", k, format_value(*v)))
        .collect::<Vec<_>>()
        .join(" ");
    let index = format!("{:>4}.", mark.sequence());
    let what = describe_mark(mark);

    if use_colors {
        let what = match mark {
            Mark::Generic(_) => what.green().to_string(),
            Mark::Clear(_) | Mark::Undo(_) => what.yellow().to_string(),
        };
        format!("{} {:>10}  {:<20}  {}", index.dimmed(), elapsed, what, tally)
    } else {
        format!("{} {:>10}  {:<20}  {}", index, elapsed, what, tally)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judge::{count_step, passthrough};
    use std::collections::BTreeMap;

    fn sample_judge() -> JudgeType {
        JudgeType::new(
            "P",
            "Presentation",
            vec![
                JudgeFieldDefinition::new("formPlus", "Form +").with_min(0.0).with_step(1.0),
                JudgeFieldDefinition::new("formMinus", "Form -").with_min(0.0).with_max(20.0),
            ],
            count_step,
            passthrough,
        )
    }

    #[test]
    fn test_format_value_integers() {
        assert_eq!(format_value(3.0), "3");
        assert_eq!(format_value(0.0), "0");
        assert_eq!(format_value(-0.0), "0");
        assert_eq!(format_value(120.0), "120");
    }

    #[test]
    fn test_format_value_decimals() {
        assert_eq!(format_value(8.5), "8.5");
        assert_eq!(format_value(0.1 + 0.2), "0.3");
        assert_eq!(format_value(-1.25), "-1.25");
    }

    #[test]
    fn test_truncate_label() {
        assert_eq!(truncate_label("Short", 20), "Short");
        assert_eq!(truncate_label("A very long label", 10), "A very ...");
        assert_eq!(truncate_label("Hello", 3), "Hel");
    }

    #[test]
    fn test_format_tally() {
        let judge = sample_judge();
        let tally = ScoreTally::from([
            ("formPlus".to_string(), 2.0),
            ("formMinus".to_string(), 0.0),
            ("extra".to_string(), 1.5),
        ]);
        let result = format_tally(&judge, &JudgeMeta::new("7", "P"), &tally, false);
        let lines: Vec<&str> = result.lines().collect();

        assert_eq!(lines[0], "Judge 7 (P)");
        assert!(lines[1].contains("Form + (formPlus)"));
        assert!(lines[1].trim_end().ends_with('2'));
        assert!(lines[2].contains("Form - (formMinus)"));
        assert!(lines[3].contains("extra"));
        assert!(lines[3].ends_with("1.5"));
    }

    #[test]
    fn test_format_empty_tally() {
        let judge = sample_judge();
        let result = format_tally(&judge, &JudgeMeta::new("7", "P"), &ScoreTally::new(), false);
        assert!(result.contains("(empty tally)"));
    }

    #[test]
    fn test_format_judge_result() {
        let result = JudgeResult {
            meta: JudgeMeta::new("1", "P"),
            result: BTreeMap::from([("score".to_string(), 7.5)]),
        };
        let out = format_judge_result(&result, false);
        assert!(out.starts_with("Judge 1 (P)"));
        assert!(out.contains("score"));
        assert!(out.ends_with("7.5"));
    }

    #[test]
    fn test_format_judge_list() {
        let out = format_judge_list(&[sample_judge()], false);
        assert!(out.starts_with("P  Presentation"));
        assert!(out.contains("formPlus"));
        assert!(out.contains("[0..] step 1"));
        assert!(out.contains("[0..20]"));
        assert!(out.contains("marks: formPlus, formMinus"));
    }

    #[test]
    fn test_format_judge_list_empty() {
        assert_eq!(format_judge_list(&[], false), "No judge types configured.");
    }

    #[test]
    fn test_describe_mark() {
        assert_eq!(describe_mark(&Mark::generic(0, 0, "step", None)), "step");
        assert_eq!(describe_mark(&Mark::generic(0, 0, "ent", Some(7.5))), "ent=7.5");
        assert_eq!(describe_mark(&Mark::clear(1, 0)), "clear");
        assert_eq!(describe_mark(&Mark::undo(2, 0, 0)), "undo #0");
    }

    #[test]
    fn test_format_replay_line() {
        let tally = ScoreTally::from([("step".to_string(), 3.0)]);
        let line = format_replay_line(
            &Mark::generic(2, 1_500, "step", None),
            Duration::from_millis(1_500),
            &tally,
            false,
        );
        assert!(line.starts_with("   2."));
        assert!(line.contains("1s 500ms"));
        assert!(line.ends_with("step=3"));
    }

    #[test]
    fn test_format_replay_line_first_mark() {
        let line = format_replay_line(&Mark::clear(0, 0), Duration::ZERO, &ScoreTally::new(), false);
        assert!(line.contains("0s"));
        assert!(line.contains("clear"));
    }
}
