//! Error types for doseplan operations.

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type. Variants follow how the caller is expected to react:
/// fix the input, treat as a no-op, retry later, or give up on this id.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Rejected before any storage write
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Duplicate insert or repeated status transition
    #[error("conflict: {0}")]
    Conflict(String),

    /// Storage (or another collaborator) failed
    #[error("dependency unavailable: {0}")]
    DependencyUnavailable(String),

    /// Referenced schedule or dose event is absent
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    /// Cross-user write without a caregiver link
    #[error("not authorized: {0}")]
    Unauthorized(String),
}

impl Error {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Stable machine-readable code used in the JSON error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::Conflict(_) => "conflict",
            Self::DependencyUnavailable(_) => "dependency_unavailable",
            Self::NotFound { .. } => "not_found",
            Self::Unauthorized(_) => "unauthorized",
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::SqliteFailure(ref err, _)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Self::Conflict(e.to_string())
            }
            other => Self::DependencyUnavailable(other.to_string()),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::DependencyUnavailable(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(Error::invalid("x").code(), "invalid_input");
        assert_eq!(Error::Conflict("x".into()).code(), "conflict");
        assert_eq!(
            Error::DependencyUnavailable("x".into()).code(),
            "dependency_unavailable"
        );
        assert_eq!(Error::not_found("schedule", "abc").code(), "not_found");
        assert_eq!(Error::Unauthorized("x".into()).code(), "unauthorized");
    }

    #[test]
    fn not_found_message_names_kind_and_id() {
        let e = Error::not_found("dose event", "42");
        assert_eq!(e.to_string(), "dose event '42' not found");
    }

    #[test]
    fn sqlite_constraint_maps_to_conflict() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE),
            Some("UNIQUE constraint failed".into()),
        );
        assert!(matches!(Error::from(err), Error::Conflict(_)));
    }

    #[test]
    fn other_sqlite_errors_are_dependency_failures() {
        let err = rusqlite::Error::InvalidQuery;
        assert!(matches!(Error::from(err), Error::DependencyUnavailable(_)));
    }
}
