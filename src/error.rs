// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("a {kind} category named '{name}' already exists")]
    DuplicateCategory { name: String, kind: String },

    #[error("category {0} is still referenced by transactions or recurring definitions")]
    CategoryInUse(i64),

    #[error("username '{0}' is already taken")]
    DuplicateUser(String),

    #[error("amount must be greater than zero, got {0}")]
    NonPositiveAmount(rust_decimal::Decimal),

    #[error("end date {end} is before start date {start}")]
    EndBeforeStart {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("invalid {field} '{value}'")]
    InvalidValue { field: &'static str, value: String },

    /// A recurring definition moved under us between select and update.
    #[error("recurring definition {0} was advanced concurrently")]
    ConcurrentAdvance(i64),

    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T, E = LedgerError> = std::result::Result<T, E>;

impl LedgerError {
    pub(crate) fn invalid(field: &'static str, value: impl Into<String>) -> Self {
        LedgerError::InvalidValue {
            field,
            value: value.into(),
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            LedgerError::Sqlite(rusqlite::Error::SqliteFailure(e, _))
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        )
    }
}
