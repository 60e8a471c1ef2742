use chrono::Utc;
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::db::question_exists;
use crate::error::AppError;
use crate::models::{VoteTally, VoteType};

/// Every call stores a new row; `voter_token` is kept for clients only and never deduplicated.
#[instrument(skip(pool, voter_token))]
pub async fn cast_vote(
    pool: &Pool<Sqlite>,
    question_id: i64,
    vote_type: &str,
    voter_token: Option<&str>,
) -> Result<i64, AppError> {
    info!("Casting vote");

    if !question_exists(pool, question_id).await? {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    let vote_type: VoteType = vote_type.parse()?;

    let res = sqlx::query(
        "INSERT INTO question_votes (question_id, voter_token, vote_type, created_at)
         VALUES (?, ?, ?, ?)",
    )
    .bind(question_id)
    .bind(voter_token)
    .bind(vote_type.as_str())
    .bind(Utc::now().naive_utc())
    .execute(pool)
    .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip(pool))]
pub async fn get_vote_tally(pool: &Pool<Sqlite>, question_id: i64) -> Result<VoteTally, AppError> {
    let (up, down): (i64, i64) = sqlx::query_as(
        "SELECT
            COALESCE(SUM(CASE WHEN vote_type = 'up' THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN vote_type = 'down' THEN 1 ELSE 0 END), 0)
         FROM question_votes
         WHERE question_id = ?",
    )
    .bind(question_id)
    .fetch_one(pool)
    .await?;

    Ok(VoteTally { up, down })
}
