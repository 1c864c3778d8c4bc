use thiserror::Error;

/// Contract violations at the API boundary of a pipeline stage.
///
/// Malformed backend text, stale offsets found while applying a plan and
/// unparsable imports are not errors; those degrade to a no-op result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssistError {
    #[error("offset {offset} is past the end of the buffer (length {len})")]
    OffsetOutOfBounds { offset: usize, len: usize },
    #[error("offset {offset} is not on a character boundary")]
    NotCharBoundary { offset: usize },
    #[error("span {start}..{end} is invalid for a buffer of length {len}")]
    InvalidSpan { start: usize, end: usize, len: usize },
}

pub type Result<T, E = AssistError> = std::result::Result<T, E>;

/// Validates a caret offset against a source string.
pub(crate) fn check_offset(source: &str, offset: usize) -> Result<()> {
    if offset > source.len() {
        return Err(AssistError::OffsetOutOfBounds {
            offset,
            len: source.len(),
        });
    }
    if !source.is_char_boundary(offset) {
        return Err(AssistError::NotCharBoundary { offset });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_offset() {
        assert!(check_offset("abc", 3).is_ok());
        assert_eq!(
            check_offset("abc", 4),
            Err(AssistError::OffsetOutOfBounds { offset: 4, len: 3 })
        );
        assert_eq!(
            check_offset("é", 1),
            Err(AssistError::NotCharBoundary { offset: 1 })
        );
    }

    #[test]
    fn test_display() {
        let err = AssistError::OffsetOutOfBounds { offset: 9, len: 2 };
        insta::assert_snapshot!(err.to_string(), @"offset 9 is past the end of the buffer (length 2)");
    }
}
