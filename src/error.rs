//! Error types for rtdbql.
//!
//! All errors are strongly typed using thiserror so callers can match on
//! the specific failure. Store failures are carried through untouched in
//! [`ResolveError::Store`].

use thiserror::Error;

use crate::storage::StoreError;

/// Errors raised while turning a raw directive mapping into a [`crate::DirectiveSet`].
#[derive(Debug, Error)]
pub enum DirectiveError {
    #[error("Directive '@{directive}' is missing required parameter '{parameter}'")]
    MissingParameter {
        directive: String,
        parameter: String,
    },

    #[error("Directive '@{directive}' has invalid parameters: {message}")]
    InvalidParameters {
        directive: String,
        message: String,
    },

    #[error("Field carries more than one mutation directive: '@{first}' and '@{second}'")]
    ConflictingMutations {
        first: String,
        second: String,
    },
}

/// Errors raised while binding a path template against field arguments.
#[derive(Debug, Error)]
pub enum PathError {
    #[error("Path parameter '${name}' is not bound by any argument")]
    UnboundParameter {
        name: String,
    },

    #[error("Path parameter '${name}' must be a single non-empty segment (string or integer), found {found}")]
    InvalidParameterValue {
        name: String,
        found: String,
    },

    #[error("Invalid path template '{template}': {message}")]
    InvalidTemplate {
        template: String,
        message: String,
    },
}

/// Errors raised while loading a [`crate::ResolverConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse resolver config: {message}")]
    Parse {
        message: String,
    },

    #[error("Config field '{field}' cannot be empty")]
    EmptyField {
        field: String,
    },
}

/// Top-level error type for rtdbql.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Directive error: {0}")]
    Directive(#[from] DirectiveError),

    #[error("Path error: {0}")]
    Path(#[from] PathError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid selection: {message}")]
    InvalidSelection {
        message: String,
    },

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl ResolveError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a directive error.
    #[must_use]
    pub const fn is_directive(&self) -> bool {
        matches!(self, Self::Directive(_))
    }

    /// Returns true if this is a path binding error.
    #[must_use]
    pub const fn is_path(&self) -> bool {
        matches!(self, Self::Path(_))
    }

    /// Returns true if the store raised this error.
    #[must_use]
    pub const fn is_store(&self) -> bool {
        matches!(self, Self::Store(_))
    }

    /// Returns the underlying store error, if any.
    #[must_use]
    pub const fn as_store(&self) -> Option<&StoreError> {
        match self {
            Self::Store(e) => Some(e),
            _ => None,
        }
    }

    /// Returns true if retrying the same visit could succeed.
    ///
    /// The resolver itself never retries; this is a hint for the caller.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Store(e) => e.is_retryable(),
            Self::Directive(_)
            | Self::Path(_)
            | Self::Config(_)
            | Self::InvalidSelection { .. }
            | Self::Internal { .. } => false,
        }
    }
}

/// Result type alias for rtdbql operations.
pub type ResolveResult<T> = Result<T, ResolveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_error_missing_parameter() {
        let err = DirectiveError::MissingParameter {
            directive: "rtdbSet".to_string(),
            parameter: "ref".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("@rtdbSet"));
        assert!(msg.contains("'ref'"));
    }

    #[test]
    fn test_directive_error_conflicting_mutations() {
        let err = DirectiveError::ConflictingMutations {
            first: "rtdbSet".to_string(),
            second: "rtdbPush".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("@rtdbSet"));
        assert!(msg.contains("@rtdbPush"));
    }

    #[test]
    fn test_path_error_unbound() {
        let err = PathError::UnboundParameter {
            name: "id".to_string(),
        };
        assert!(err.to_string().contains("$id"));
    }

    #[test]
    fn test_resolve_error_from_store() {
        let err: ResolveError = StoreError::PermissionDenied("/users".to_string()).into();
        assert!(err.is_store());
        assert!(!err.is_directive());
        assert!(!err.is_retryable());
        assert!(matches!(
            err.as_store(),
            Some(StoreError::PermissionDenied(path)) if path == "/users"
        ));
    }

    #[test]
    fn test_resolve_error_retryable() {
        let err: ResolveError = StoreError::ConnectionError("reset".to_string()).into();
        assert!(err.is_retryable());

        let err: ResolveError = PathError::UnboundParameter {
            name: "id".to_string(),
        }
        .into();
        assert!(err.is_path());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_resolve_error_internal() {
        let err = ResolveError::internal("unexpected state");
        assert!(!err.is_store());
        assert!(err.to_string().contains("unexpected state"));
    }
}
