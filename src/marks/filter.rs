//! Stateless resolution of clear and undo marks over a complete stream.

use super::types::{GenericMark, Mark};

/// Resolve clear and undo marks in a complete mark stream.
///
/// Returns the generic marks that still count, in their original order.
/// Everything up to and including the last clear mark is discarded. An undo
/// removes the nearest earlier standing generic mark with the targeted
/// sequence; an undo whose target is missing, cleared, or itself an undo
/// is dropped without effect.
pub fn filter_mark_stream(marks: &[Mark]) -> Vec<GenericMark> {
    let start = marks
        .iter()
        .rposition(Mark::is_clear)
        .map_or(0, |idx| idx + 1);

    // Undo marks are removed as soon as they are resolved, so only generic
    // marks ever stand before the current position.
    let mut effective: Vec<GenericMark> = Vec::with_capacity(marks.len() - start);
    for mark in &marks[start..] {
        match mark {
            Mark::Generic(generic) => effective.push(generic.clone()),
            Mark::Undo(undo) => {
                if let Some(idx) = effective.iter().rposition(|m| m.sequence == undo.target) {
                    effective.remove(idx);
                }
            }
            Mark::Clear(_) => unreachable!("marks before the last clear were skipped"),
        }
    }
    effective
}
