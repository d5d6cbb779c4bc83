//! Error types for recql-core.
//!
//! `QueryError` is fatal to a query. `PathError` is the local, recoverable
//! failure of a single path extraction and never aborts a query by itself.

use thiserror::Error;

/// Errors surfaced to the caller of the query pipeline.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Parse error at offset {offset} in {input:?}: {message}")]
    Parse {
        input: String,
        offset: usize,
        message: String,
    },

    #[error("Plan error: {0}")]
    Plan(String),

    #[error("Source error: {0}")]
    Source(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl QueryError {
    pub fn parse(input: &str, offset: usize, message: impl Into<String>) -> Self {
        QueryError::Parse {
            input: input.to_string(),
            offset,
            message: message.into(),
        }
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, QueryError::Parse { .. })
    }

    /// Owned copy of an error that a row iterator reports by reference.
    pub fn detached(&self) -> Self {
        match self {
            QueryError::Parse {
                input,
                offset,
                message,
            } => QueryError::Parse {
                input: input.clone(),
                offset: *offset,
                message: message.clone(),
            },
            QueryError::Plan(msg) => QueryError::Plan(msg.clone()),
            QueryError::Source(msg) => QueryError::Source(msg.clone()),
            QueryError::Io(err) => QueryError::Io(std::io::Error::new(err.kind(), err.to_string())),
            QueryError::Json(err) => {
                QueryError::Json(<serde_json::Error as serde::de::Error>::custom(err))
            }
        }
    }
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

impl serde::Serialize for QueryError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Why a path could not be resolved against a value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathError {
    #[error("key '{0}' not found")]
    KeyNotFound(String),

    #[error("array index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("invalid array index '{0}'")]
    InvalidIndex(String),

    #[error("cannot access '{segment}' on {kind}")]
    NotTraversable { segment: String, kind: &'static str },

    #[error("no entries matched '{0}'")]
    NoMatch(String),
}

pub type PathResult<T> = Result<T, PathError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = QueryError::parse("SELECT (", 7, "unexpected end of input");
        assert_eq!(
            err.to_string(),
            "Parse error at offset 7 in \"SELECT (\": unexpected end of input"
        );
        assert!(err.is_parse());

        let err = QueryError::Plan("unknown table 'orders'".to_string());
        assert_eq!(err.to_string(), "Plan error: unknown table 'orders'");
        assert!(!err.is_parse());

        let err = PathError::KeyNotFound("city".to_string());
        assert_eq!(err.to_string(), "key 'city' not found");

        let err = PathError::IndexOutOfBounds { index: 4, len: 2 };
        assert_eq!(err.to_string(), "array index 4 out of bounds (len 2)");
    }

    #[test]
    fn test_detached_keeps_variant() {
        let io = QueryError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "stream ended",
        ));
        let copy = io.detached();
        assert!(
            matches!(&copy, QueryError::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof)
        );
        assert_eq!(copy.to_string(), io.to_string());

        let json = QueryError::Json(serde_json::from_str::<serde_json::Value>("{").unwrap_err());
        let copy = json.detached();
        assert!(matches!(copy, QueryError::Json(_)));
        assert_eq!(copy.to_string(), json.to_string());

        let source = QueryError::Source("truncated input".to_string());
        assert!(matches!(source.detached(), QueryError::Source(m) if m == "truncated input"));
    }

    #[test]
    fn test_error_serializes_as_message() {
        let err = QueryError::Source("truncated record".to_string());
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json, serde_json::json!("Source error: truncated record"));
    }
}
