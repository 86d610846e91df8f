use std::path::PathBuf;

use rusqlite::ErrorCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} '{key}' not found")]
    NotFound { entity: &'static str, key: String },

    #[error("conflict: {0}")]
    Conflict(String),

    /// A persisted value could not be decoded. The store only reads what it
    /// wrote, so this means the file was damaged or edited by hand.
    #[error("corrupt value {value:?} in {column}: {reason}")]
    Corruption {
        column: String,
        value: String,
        reason: String,
    },

    #[error("store at {} is locked by another process", .0.display())]
    Locked(PathBuf),

    #[error("sqlite error: {0}")]
    Backend(rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{op}{}", quoted_key(.key))]
    Context {
        op: &'static str,
        key: String,
        #[source]
        source: Box<StoreError>,
    },
}

fn quoted_key(key: &str) -> String {
    if key.is_empty() {
        String::new()
    } else {
        format!(" '{key}'")
    }
}

impl StoreError {
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }

    pub fn corruption(
        column: impl Into<String>,
        value: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        Self::Corruption {
            column: column.into(),
            value: value.into(),
            reason: reason.to_string(),
        }
    }

    /// Wrap with the name of the failing operation and the key it worked on.
    pub fn context(self, op: &'static str, key: impl Into<String>) -> Self {
        Self::Context {
            op,
            key: key.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping any `Context` layers.
    pub fn root(&self) -> &StoreError {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), Self::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self.root(), Self::Conflict(_))
    }

    pub fn is_corruption(&self) -> bool {
        matches!(self.root(), Self::Corruption { .. })
    }

    pub fn is_locked(&self) -> bool {
        matches!(self.root(), Self::Locked(_))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(e, msg) if e.code == ErrorCode::ConstraintViolation => {
                Self::Conflict(msg.unwrap_or_else(|| e.to_string()))
            }
            rusqlite::Error::FromSqlConversionFailure(idx, ty, source) => {
                Self::corruption(format!("column #{idx}"), ty.to_string(), source)
            }
            rusqlite::Error::IntegralValueOutOfRange(idx, value) => Self::corruption(
                format!("column #{idx}"),
                value.to_string(),
                "integer out of range",
            ),
            other => Self::Backend(other),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::corruption("json", String::new(), err)
    }
}

/// Failure to parse a user-supplied name for one of the enumerated types.
#[derive(Debug, Error)]
#[error("invalid {kind} '{value}': must be one of {expected}")]
pub struct ParseError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

impl ParseError {
    pub fn new(kind: &'static str, value: &str, expected: &'static str) -> Self {
        Self {
            kind,
            value: value.to_string(),
            expected,
        }
    }
}
