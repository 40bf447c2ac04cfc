use std::fmt;

/// Errors surfaced by the basin model and its data feeds.
///
/// A reach or state with zero aggregate consumptive use is deliberately not
/// an error: the assessment code defines that case as a zero fraction and a
/// zero assessment instead of dividing by zero.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// An external series could not be retrieved or parsed.
    DataUnavailable { feed: String, reason: String },
    /// Two series combined by add/subtract do not cover the same years.
    /// Callers resolve this by reshaping onto a common range first.
    RangeMismatch {
        expected: Option<(i32, i32)>,
        found: Option<(i32, i32)>,
    },
    /// Malformed topology or series construction input.
    Configuration(String),
}

fn range_as_str(range: &Option<(i32, i32)>) -> String {
    match range {
        Some((begin, end)) => format!("{begin}-{end}"),
        None => "empty".to_string(),
    }
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::DataUnavailable { feed, reason } => {
                write!(f, "data unavailable for feed '{feed}': {reason}")
            }
            ModelError::RangeMismatch { expected, found } => {
                write!(
                    f,
                    "year range mismatch: expected {}, found {}",
                    range_as_str(expected),
                    range_as_str(found)
                )
            }
            ModelError::Configuration(message) => {
                write!(f, "configuration error: {message}")
            }
        }
    }
}

impl std::error::Error for ModelError {}

#[cfg(test)]
mod tests {
    use super::ModelError;

    #[test]
    fn test_display() {
        let err = ModelError::DataUnavailable {
            feed: "releases/hoover_dam".to_string(),
            reason: "file not found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "data unavailable for feed 'releases/hoover_dam': file not found"
        );

        let err = ModelError::RangeMismatch {
            expected: Some((1991, 2021)),
            found: None,
        };
        assert_eq!(
            err.to_string(),
            "year range mismatch: expected 1991-2021, found empty"
        );
    }
}
