//! Command execution result type

use bytes::Bytes;

/// Command execution result
///
/// Every reply is nil, an integer, a byte string, or a flat array of byte
/// strings. `Error` only appears as the value of a protected script call.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    /// OK response
    Ok,
    /// PONG response
    Pong,
    /// Simple string response
    Status(String),
    /// Integer response
    Integer(i64),
    /// Single value (may be nil)
    Value(Option<Bytes>),
    /// Array of values
    Array(Vec<Bytes>),
    /// Error value
    Error(String),
}

impl CommandResult {
    /// Create OK response
    pub fn ok() -> Self {
        CommandResult::Ok
    }

    /// Create integer response
    pub fn integer(n: i64) -> Self {
        CommandResult::Integer(n)
    }

    /// Create value response
    pub fn value(v: Option<Bytes>) -> Self {
        CommandResult::Value(v)
    }

    /// Create array response
    pub fn array(arr: Vec<Bytes>) -> Self {
        CommandResult::Array(arr)
    }

    /// Create error value
    pub fn error(msg: impl Into<String>) -> Self {
        CommandResult::Error(msg.into())
    }

    /// Boolean replies are integers 0/1
    pub fn from_bool(b: bool) -> Self {
        CommandResult::Integer(b as i64)
    }

    pub fn from_count(n: usize) -> Self {
        CommandResult::Integer(n as i64)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, CommandResult::Error(_))
    }
}

/// Render a score the way replies carry it
///
/// Shortest representation that parses back to the same value; infinities
/// are `inf` / `-inf`.
pub fn format_score(score: f64) -> String {
    if score == f64::INFINITY {
        "inf".to_string()
    } else if score == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        score.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(1.0), "1");
        assert_eq!(format_score(1.5), "1.5");
        assert_eq!(format_score(-0.25), "-0.25");
        assert_eq!(format_score(f64::INFINITY), "inf");
        assert_eq!(format_score(f64::NEG_INFINITY), "-inf");
    }

    #[test]
    fn test_helpers() {
        assert_eq!(CommandResult::from_bool(true), CommandResult::Integer(1));
        assert_eq!(CommandResult::from_count(3), CommandResult::Integer(3));
        assert!(CommandResult::error("boom").is_error());
        assert!(!CommandResult::ok().is_error());
    }
}
