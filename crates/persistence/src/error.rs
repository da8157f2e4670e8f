//! Error types for the persistence layer.
//!
//! Errors are grouped by category: resource state, caller input (filters and
//! page tokens), entity validation, transactions, and the storage backend.
//! Every category converts into [`StorageError`], which is what all public
//! operations return. The repository never retries; errors reach the caller
//! exactly as they were raised.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type for all storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Resource state errors
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Invalid filter expressions and page tokens
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Validation errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Transaction errors
    #[error(transparent)]
    Transaction(#[from] TransactionError),

    /// Backend-specific errors
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl StorageError {
    /// Returns true if this error means the requested entity does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::Resource(ResourceError::NotFound { .. }))
    }

    /// Returns true if this error is a uniqueness violation.
    pub fn is_already_exists(&self) -> bool {
        matches!(
            self,
            StorageError::Resource(ResourceError::AlreadyExists { .. })
        )
    }

    /// Returns true if the caller supplied a filter that could not be compiled.
    pub fn is_invalid_filter(&self) -> bool {
        matches!(self, StorageError::Query(QueryError::InvalidFilter { .. }))
    }

    /// Returns true if the caller supplied an unusable continuation token.
    pub fn is_invalid_page_token(&self) -> bool {
        matches!(
            self,
            StorageError::Query(QueryError::InvalidPageToken { .. })
        )
    }

    /// Returns true if the backing store could not serve the request.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            StorageError::Backend(
                BackendError::Unavailable { .. }
                    | BackendError::ConnectionFailed { .. }
                    | BackendError::PoolExhausted { .. }
                    | BackendError::Internal { .. }
            )
        )
    }

    /// Returns true if the request was cancelled or ran past its deadline.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            StorageError::Transaction(
                TransactionError::Cancelled | TransactionError::DeadlineExceeded { .. }
            )
        )
    }

    /// Replaces the generic entity label of a resource error with a kind name.
    pub(crate) fn for_entity(self, entity_name: &str) -> Self {
        match self {
            StorageError::Resource(ResourceError::NotFound { key, .. }) => {
                ResourceError::NotFound {
                    entity: entity_name.to_string(),
                    key,
                }
                .into()
            }
            StorageError::Resource(ResourceError::AlreadyExists { key, .. }) => {
                ResourceError::AlreadyExists {
                    entity: entity_name.to_string(),
                    key,
                }
                .into()
            }
            other => other,
        }
    }
}

/// Errors related to entity state in the store.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// The requested entity was not found.
    #[error("{entity} not found: {key}")]
    NotFound { entity: String, key: String },

    /// An entity with the same unique key already exists within its kind.
    #[error("{entity} already exists: {key}")]
    AlreadyExists { entity: String, key: String },
}

/// Errors caused by caller-supplied list options.
#[derive(Error, Debug)]
pub enum QueryError {
    /// The filter text could not be parsed or referenced an unknown field.
    #[error("invalid filter query at position {position}: {message}")]
    InvalidFilter { message: String, position: usize },

    /// The continuation token is malformed or belongs to another ordering.
    #[error("invalid page token: {reason}")]
    InvalidPageToken { token: String, reason: String },
}

impl QueryError {
    /// Builds an [`QueryError::InvalidFilter`] for a field-level problem.
    pub fn invalid_filter(message: impl Into<String>, position: usize) -> Self {
        QueryError::InvalidFilter {
            message: message.into(),
            position,
        }
    }

    /// Builds an [`QueryError::InvalidPageToken`].
    pub fn invalid_token(token: impl Into<String>, reason: impl Into<String>) -> Self {
        QueryError::InvalidPageToken {
            token: token.into(),
            reason: reason.into(),
        }
    }
}

/// Errors related to entity validation before anything is written.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Missing required field.
    #[error("missing required field on {entity}: {field}")]
    MissingRequiredField { entity: String, field: String },

    /// The entity carries a type id that belongs to another kind.
    #[error("{entity} has type id {actual}, expected {expected}")]
    TypeMismatch {
        entity: String,
        expected: i64,
        actual: i64,
    },

    /// A field value is not acceptable for this kind.
    #[error("invalid value for {entity}.{field}: {message}")]
    InvalidValue {
        entity: String,
        field: String,
        message: String,
    },

    /// The configuration is not usable.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Errors related to transactions and request lifetimes.
#[derive(Error, Debug)]
pub enum TransactionError {
    /// The request was cancelled by the caller.
    #[error("request cancelled")]
    Cancelled,

    /// The request ran past its deadline.
    #[error("deadline exceeded after {elapsed_ms}ms")]
    DeadlineExceeded { elapsed_ms: u64 },
}

/// Errors originating from the database backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend is currently unavailable.
    #[error("backend unavailable: {backend_name}")]
    Unavailable {
        backend_name: String,
        message: String,
    },

    /// Connection to the backend failed.
    #[error("connection failed to {backend_name}: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
    },

    /// No pooled connection became free within the wait limit.
    #[error("connection pool exhausted for {backend_name}: {message}")]
    PoolExhausted {
        backend_name: String,
        message: String,
    },

    /// Schema initialisation error.
    #[error("schema initialisation failed: {message}")]
    SchemaError { message: String },

    /// Internal backend error.
    #[error("internal error in {backend_name}: {message}")]
    Internal {
        backend_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A stored property row does not decode to a known value kind.
    #[error("corrupt property '{name}' on node {node_id}: {message}")]
    CorruptProperty {
        node_id: i64,
        name: String,
        message: String,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {message}")]
    SerializationError { message: String },
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

// Implement conversions from common error types

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Backend(BackendError::SerializationError {
            message: err.to_string(),
        })
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::Backend(BackendError::Internal {
            backend_name: "sqlite".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        })
    }
}

#[cfg(feature = "sqlite")]
impl From<r2d2::Error> for StorageError {
    fn from(err: r2d2::Error) -> Self {
        StorageError::Backend(BackendError::PoolExhausted {
            backend_name: "sqlite".to_string(),
            message: err.to_string(),
        })
    }
}
