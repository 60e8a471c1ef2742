use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct TeacherRequest {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub approved: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Subject {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Room {
    pub id: i64,
    pub title: String,
    pub room_code: String,
    pub subject_id: Option<i64>,
    pub owner_id: i64,
    pub is_open: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Question {
    pub id: i64,
    pub room_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub student_name: Option<String>,
    pub created_at: NaiveDateTime,
    pub is_solved: bool,
    /// Up-vote count, computed per query and never stored.
    #[sqlx(default)]
    #[serde(default)]
    pub votes: i64,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Answer {
    pub id: i64,
    pub question_id: i64,
    pub teacher_id: i64,
    pub content: String,
    pub created_at: NaiveDateTime,
    pub is_accepted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    Up,
    Down,
}

impl VoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteType::Up => "up",
            VoteType::Down => "down",
        }
    }
}

impl FromStr for VoteType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(VoteType::Up),
            "down" => Ok(VoteType::Down),
            _ => Err(AppError::Validation(
                "vote_type must be 'up' or 'down'".to_string(),
            )),
        }
    }
}

impl fmt::Display for VoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VoteTally {
    pub up: i64,
    pub down: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuestionSort {
    #[default]
    Recent,
    Votes,
}

impl QuestionSort {
    /// Anything other than `"votes"` sorts by recency.
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("votes") => QuestionSort::Votes,
            _ => QuestionSort::Recent,
        }
    }
}
