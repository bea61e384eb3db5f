use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::fmt;
use thiserror::Error;

/// Which relational constraint rejected a row during load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    DuplicateKey,
    MissingReference,
    InvalidValue,
    MissingValue,
}

impl ConstraintKind {
    fn from_database(kind: &DatabaseErrorKind) -> Option<Self> {
        match kind {
            DatabaseErrorKind::UniqueViolation => Some(Self::DuplicateKey),
            DatabaseErrorKind::ForeignKeyViolation => Some(Self::MissingReference),
            DatabaseErrorKind::CheckViolation => Some(Self::InvalidValue),
            DatabaseErrorKind::NotNullViolation => Some(Self::MissingValue),
            _ => None,
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::DuplicateKey => "duplicate key",
            Self::MissingReference => "foreign key",
            Self::InvalidValue => "check constraint",
            Self::MissingValue => "not-null constraint",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    /// A staged row broke a constraint of the target table. `message` is the
    /// database's own wording.
    #[error("{kind} violation while loading {table}: {message}")]
    Constraint {
        table: &'static str,
        kind: ConstraintKind,
        message: String,
    },

    #[error("staging table {0} is missing; stage all four tables before loading")]
    IncompleteStaging(&'static str),

    #[error(transparent)]
    Database(#[from] DieselError),
}

impl LoadError {
    pub(crate) fn from_copy(table: &'static str, err: DieselError) -> Self {
        let kind = match &err {
            DieselError::DatabaseError(kind, _) => ConstraintKind::from_database(kind),
            _ => None,
        };
        match (kind, err) {
            (Some(kind), DieselError::DatabaseError(_, info)) => LoadError::Constraint {
                table,
                kind,
                message: info.message().to_string(),
            },
            (_, err) => LoadError::Database(err),
        }
    }
}

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("failed to read {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error(transparent)]
    Database(#[from] DieselError),
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report query failed: {0}")]
    Database(#[from] DieselError),

    #[error("failed to encode report as JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to encode report as CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
