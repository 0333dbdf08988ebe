use thiserror::Error;

/// Errors raised by the tally engine and the judge-type layer.
///
/// Undo marks with an invalid target are not errors; they are ignored by
/// both the reducer and the stream filter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TallyError {
    /// A mark arrived with a sequence other than the next expected one.
    /// The caller must resynchronize before retrying.
    #[error("mark sequence {actual} out of order, expected {expected}")]
    SequenceViolation { expected: u64, actual: u64 },

    /// A scoresheet for one judge type was handed to another.
    #[error("Scoresheet for JudgeType {actual} provided to calculation function for JudgeType {expected}")]
    WrongJudgeType { actual: String, expected: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrong_judge_type_message() {
        let err = TallyError::WrongJudgeType {
            actual: "S".to_string(),
            expected: "Dm".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Scoresheet for JudgeType S provided to calculation function for JudgeType Dm"
        );
    }

    #[test]
    fn test_sequence_violation_message() {
        let err = TallyError::SequenceViolation {
            expected: 3,
            actual: 5,
        };
        assert!(err.to_string().contains("expected 3"));
    }
}
