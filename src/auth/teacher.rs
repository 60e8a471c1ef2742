use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Teacher {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: NaiveDateTime,
}

/// Full `teachers` row, including the credential columns that never leave the store.
#[derive(sqlx::FromRow, Clone)]
pub struct DbTeacher {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub token: Option<String>,
    pub created_at: NaiveDateTime,
}

impl From<DbTeacher> for Teacher {
    fn from(teacher: DbTeacher) -> Self {
        Self {
            id: teacher.id,
            name: teacher.name,
            email: teacher.email,
            created_at: teacher.created_at,
        }
    }
}

/// Identity resolved from the bearer token. `None` is an anonymous caller.
#[derive(Debug, Clone)]
pub struct CurrentTeacher(pub Option<Teacher>);

impl CurrentTeacher {
    /// The authenticated teacher, or `Unauthorized` for anonymous callers.
    pub fn require(self) -> Result<Teacher, AppError> {
        self.0.ok_or_else(AppError::unauthorized)
    }
}
