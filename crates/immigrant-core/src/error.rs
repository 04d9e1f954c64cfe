use crate::revision::Direction;

/// Typed error hierarchy shared by every driver backend.
/// Classifies errors as fatal (instance unusable), empty-history (expected),
/// or per-call failures.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DriverError {
    // Lifecycle
    #[error("driver is not initialized")]
    NotInitialized,
    #[error("driver is already initialized")]
    AlreadyInitialized,
    #[error("driver is closed")]
    Closed,
    #[error("driver is unusable after failed init: {0}")]
    Unusable(String),

    // Fatal at init
    #[error("invalid driver config: {0}")]
    Config(String),
    #[error("connection error: {0}")]
    Connection(String),

    // Per-unit failures
    #[error(
        "{direction} of revision {revision} failed at statement {position} ({statement}): {message}",
        position = .index + 1
    )]
    Statement {
        revision: String,
        direction: Direction,
        /// Zero-based position in the revision's statement list.
        index: usize,
        statement: String,
        message: String,
    },
    #[error("transaction error: {0}")]
    Transaction(String),
    #[error("state tracker error: {0}")]
    Tracker(String),
    #[error("cannot roll back {requested}: HEAD is {head}")]
    HeadMismatch { head: String, requested: String },

    // Empty history
    #[error("No revisions applied.")]
    NoRevisionsApplied,
    #[error("Remote revision HEAD does not exist.")]
    HeadDoesNotExist,

    // State reads
    #[error("Unable to fetch remote revision state: {0}")]
    StateUnavailable(String),
    #[error("corrupt tracker entry {sequence}: {detail}")]
    CorruptEntry { sequence: i64, detail: String },

    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
}

impl DriverError {
    /// The instance cannot be used again without constructing a new one.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::Config(_) | Self::Unusable(_) | Self::Closed
        )
    }

    /// Expected "nothing applied" conditions a caller should handle gracefully.
    pub fn is_empty_history(&self) -> bool {
        matches!(self, Self::NoRevisionsApplied | Self::HeadDoesNotExist)
    }

    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::NotInitialized => "not_initialized",
            Self::AlreadyInitialized => "already_initialized",
            Self::Closed => "closed",
            Self::Unusable(_) => "unusable",
            Self::Config(_) => "config",
            Self::Connection(_) => "connection",
            Self::Statement { .. } => "statement",
            Self::Transaction(_) => "transaction",
            Self::Tracker(_) => "tracker",
            Self::HeadMismatch { .. } => "head_mismatch",
            Self::NoRevisionsApplied => "no_revisions_applied",
            Self::HeadDoesNotExist => "head_does_not_exist",
            Self::StateUnavailable(_) => "state_unavailable",
            Self::CorruptEntry { .. } => "corrupt_entry",
            Self::Serialization(_) => "serialization",
            Self::Io(_) => "io",
        }
    }
}

impl From<serde_json::Error> for DriverError {
    fn from(e: serde_json::Error) -> Self {
        DriverError::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for DriverError {
    fn from(e: std::io::Error) -> Self {
        DriverError::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_history_classification() {
        assert!(DriverError::NoRevisionsApplied.is_empty_history());
        assert!(DriverError::HeadDoesNotExist.is_empty_history());
        assert!(!DriverError::StateUnavailable("down".into()).is_empty_history());
    }

    #[test]
    fn head_missing_and_backend_failure_are_distinct() {
        let missing = DriverError::HeadDoesNotExist;
        let down = DriverError::StateUnavailable("no such table".into());
        assert_ne!(missing.error_kind(), down.error_kind());
        assert!(!down.is_fatal());
    }

    #[test]
    fn fatal_classification() {
        assert!(DriverError::Connection("refused".into()).is_fatal());
        assert!(DriverError::Unusable("refused".into()).is_fatal());
        assert!(DriverError::Closed.is_fatal());
        assert!(!DriverError::NoRevisionsApplied.is_fatal());
        assert!(!DriverError::NotInitialized.is_fatal());
    }

    #[test]
    fn messages_match_tracker_wording() {
        assert_eq!(DriverError::NoRevisionsApplied.to_string(), "No revisions applied.");
        assert_eq!(
            DriverError::HeadDoesNotExist.to_string(),
            "Remote revision HEAD does not exist."
        );
    }

    #[test]
    fn statement_error_names_position() {
        let err = DriverError::Statement {
            revision: "r2".into(),
            direction: Direction::Migrate,
            index: 1,
            statement: "create table dup".into(),
            message: "table dup already exists".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("statement 2 "), "got: {msg}");
        assert!(msg.contains("r2"), "got: {msg}");
        assert!(msg.starts_with("migrate"), "got: {msg}");
    }

    #[test]
    fn serde_error_converts() {
        let err: DriverError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.error_kind(), "serialization");
    }
}
