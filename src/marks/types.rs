//! Mark variants, their flat JSON form and a sequence-assigning generator.

use serde::{Deserialize, Serialize};

/// Reserved schema of a mark that discards every mark before it.
pub const CLEAR_SCHEMA: &str = "clear";

/// Reserved schema of a mark that retracts one earlier mark.
pub const UNDO_SCHEMA: &str = "undo";

/// A scored event such as a skill or a deduction. Its meaning is
/// defined by the judge type that consumes it.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericMark {
    pub timestamp: i64,
    pub sequence: u64,
    pub schema: String,
    pub value: Option<f64>,
}

impl GenericMark {
    /// Magnitude of the mark, 1 when no value was recorded
    pub fn magnitude(&self) -> f64 {
        self.value.unwrap_or(1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearMark {
    pub timestamp: i64,
    pub sequence: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UndoMark {
    pub timestamp: i64,
    pub sequence: u64,
    /// Sequence of the mark being retracted
    pub target: u64,
}

/// One judge action in a mark stream.
///
/// Serialized as a flat object `{timestamp, sequence, schema, value?, target?}`
/// where `schema` selects the variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMark", into = "RawMark")]
pub enum Mark {
    Generic(GenericMark),
    Clear(ClearMark),
    Undo(UndoMark),
}

impl Mark {
    pub fn generic(sequence: u64, timestamp: i64, schema: impl Into<String>, value: Option<f64>) -> Self {
        Mark::Generic(GenericMark {
            timestamp,
            sequence,
            schema: schema.into(),
            value,
        })
    }

    pub fn clear(sequence: u64, timestamp: i64) -> Self {
        Mark::Clear(ClearMark {
            timestamp,
            sequence,
        })
    }

    pub fn undo(sequence: u64, timestamp: i64, target: u64) -> Self {
        Mark::Undo(UndoMark {
            timestamp,
            sequence,
            target,
        })
    }

    pub fn sequence(&self) -> u64 {
        match self {
            Mark::Generic(m) => m.sequence,
            Mark::Clear(m) => m.sequence,
            Mark::Undo(m) => m.sequence,
        }
    }

    pub fn timestamp(&self) -> i64 {
        match self {
            Mark::Generic(m) => m.timestamp,
            Mark::Clear(m) => m.timestamp,
            Mark::Undo(m) => m.timestamp,
        }
    }

    pub fn schema(&self) -> &str {
        match self {
            Mark::Generic(m) => &m.schema,
            Mark::Clear(_) => CLEAR_SCHEMA,
            Mark::Undo(_) => UNDO_SCHEMA,
        }
    }

    pub fn is_generic(&self) -> bool {
        matches!(self, Mark::Generic(_))
    }

    pub fn is_clear(&self) -> bool {
        matches!(self, Mark::Clear(_))
    }

    pub fn is_undo(&self) -> bool {
        matches!(self, Mark::Undo(_))
    }

    pub fn as_generic(&self) -> Option<&GenericMark> {
        match self {
            Mark::Generic(m) => Some(m),
            _ => None,
        }
    }
}

/// Wire shape shared by all mark kinds
#[derive(Debug, Serialize, Deserialize)]
struct RawMark {
    timestamp: i64,
    sequence: u64,
    schema: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target: Option<u64>,
}

impl TryFrom<RawMark> for Mark {
    type Error = String;

    fn try_from(raw: RawMark) -> Result<Self, Self::Error> {
        match raw.schema.as_str() {
            CLEAR_SCHEMA => Ok(Mark::clear(raw.sequence, raw.timestamp)),
            UNDO_SCHEMA => {
                let target = raw
                    .target
                    .ok_or_else(|| format!("undo mark {} has no target", raw.sequence))?;
                Ok(Mark::undo(raw.sequence, raw.timestamp, target))
            }
            _ => Ok(Mark::generic(raw.sequence, raw.timestamp, raw.schema, raw.value)),
        }
    }
}

impl From<Mark> for RawMark {
    fn from(mark: Mark) -> Self {
        match mark {
            Mark::Generic(m) => RawMark {
                timestamp: m.timestamp,
                sequence: m.sequence,
                schema: m.schema,
                value: m.value,
                target: None,
            },
            Mark::Clear(m) => RawMark {
                timestamp: m.timestamp,
                sequence: m.sequence,
                schema: CLEAR_SCHEMA.to_string(),
                value: None,
                target: None,
            },
            Mark::Undo(m) => RawMark {
                timestamp: m.timestamp,
                sequence: m.sequence,
                schema: UNDO_SCHEMA.to_string(),
                value: None,
                target: Some(m.target),
            },
        }
    }
}

/// Produces marks with contiguous sequence numbers starting at 0.
///
/// Timestamps are taken from the wall clock unless set explicitly with
/// [`MarkGenerator::at`].
#[derive(Debug, Default, Clone)]
pub struct MarkGenerator {
    next_sequence: u64,
    fixed_timestamp: Option<i64>,
}

impl MarkGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue an existing stream from `next_sequence`
    pub fn starting_at(next_sequence: u64) -> Self {
        Self {
            next_sequence,
            fixed_timestamp: None,
        }
    }

    /// Use `timestamp` for every following mark
    pub fn at(&mut self, timestamp: i64) -> &mut Self {
        self.fixed_timestamp = Some(timestamp);
        self
    }

    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    pub fn mark(&mut self, schema: impl Into<String>) -> Mark {
        let (sequence, timestamp) = self.advance();
        Mark::generic(sequence, timestamp, schema, None)
    }

    pub fn mark_value(&mut self, schema: impl Into<String>, value: f64) -> Mark {
        let (sequence, timestamp) = self.advance();
        Mark::generic(sequence, timestamp, schema, Some(value))
    }

    pub fn clear(&mut self) -> Mark {
        let (sequence, timestamp) = self.advance();
        Mark::clear(sequence, timestamp)
    }

    pub fn undo(&mut self, target: u64) -> Mark {
        let (sequence, timestamp) = self.advance();
        Mark::undo(sequence, timestamp, target)
    }

    fn advance(&mut self) -> (u64, i64) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        let timestamp = self
            .fixed_timestamp
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());
        (sequence, timestamp)
    }
}
