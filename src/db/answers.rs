use chrono::Utc;
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::db::question_exists;
use crate::error::{AppError, conflict_on_unique};
use crate::models::Answer;

const ANSWER_COLUMNS: &str = "id, question_id, teacher_id, content, created_at, is_accepted";

fn not_author() -> AppError {
    AppError::NotFound("Answer not found or you're not author".to_string())
}

#[instrument(skip(pool, content))]
pub async fn create_answer(
    pool: &Pool<Sqlite>,
    question_id: i64,
    teacher_id: i64,
    content: &str,
) -> Result<Answer, AppError> {
    info!("Posting answer");

    if !question_exists(pool, question_id).await? {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    let answer = sqlx::query_as::<_, Answer>(&format!(
        "INSERT INTO answers (question_id, teacher_id, content, created_at, is_accepted)
         VALUES (?, ?, ?, ?, FALSE)
         RETURNING {ANSWER_COLUMNS}"
    ))
    .bind(question_id)
    .bind(teacher_id)
    .bind(content)
    .bind(Utc::now().naive_utc())
    .fetch_one(pool)
    .await?;

    Ok(answer)
}

#[instrument(skip(pool))]
pub async fn get_question_answers(
    pool: &Pool<Sqlite>,
    question_id: i64,
) -> Result<Vec<Answer>, AppError> {
    let answers = sqlx::query_as::<_, Answer>(&format!(
        "SELECT {ANSWER_COLUMNS} FROM answers
         WHERE question_id = ?
         ORDER BY created_at ASC, id ASC"
    ))
    .bind(question_id)
    .fetch_all(pool)
    .await?;

    Ok(answers)
}

#[instrument(skip(pool, content))]
pub async fn update_answer(
    pool: &Pool<Sqlite>,
    answer_id: i64,
    author_id: i64,
    content: &str,
) -> Result<Answer, AppError> {
    info!("Editing answer");
    let answer = sqlx::query_as::<_, Answer>(&format!(
        "UPDATE answers SET content = ?
         WHERE id = ? AND teacher_id = ?
         RETURNING {ANSWER_COLUMNS}"
    ))
    .bind(content)
    .bind(answer_id)
    .bind(author_id)
    .fetch_optional(pool)
    .await?;

    answer.ok_or_else(not_author)
}

#[instrument(skip(pool))]
pub async fn delete_answer(
    pool: &Pool<Sqlite>,
    answer_id: i64,
    author_id: i64,
) -> Result<(), AppError> {
    info!("Deleting answer");
    let res = sqlx::query("DELETE FROM answers WHERE id = ? AND teacher_id = ?")
        .bind(answer_id)
        .bind(author_id)
        .execute(pool)
        .await?;

    if res.rows_affected() == 0 {
        return Err(not_author());
    }

    Ok(())
}

/// Accepts `answer_id` on behalf of the owner of the room the answer belongs to.
///
/// Clearing the siblings, accepting the target and solving the question commit
/// together; any failure rolls all three back.
#[instrument(skip(pool))]
pub async fn accept_answer(
    pool: &Pool<Sqlite>,
    answer_id: i64,
    owner_id: i64,
) -> Result<Answer, AppError> {
    info!("Accepting answer");
    let mut tx = pool.begin().await?;

    let question_id: i64 = sqlx::query_scalar(
        "SELECT a.question_id FROM answers a
         JOIN questions q ON q.id = a.question_id
         JOIN rooms r ON r.id = q.room_id
         WHERE a.id = ? AND r.owner_id = ?",
    )
    .bind(answer_id)
    .bind(owner_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| {
        AppError::NotFound("Answer not found or you're not question owner".to_string())
    })?;

    sqlx::query("UPDATE answers SET is_accepted = FALSE WHERE question_id = ? AND is_accepted = TRUE")
        .bind(question_id)
        .execute(&mut *tx)
        .await?;

    let answer = sqlx::query_as::<_, Answer>(&format!(
        "UPDATE answers SET is_accepted = TRUE WHERE id = ? RETURNING {ANSWER_COLUMNS}"
    ))
    .bind(answer_id)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| conflict_on_unique(e, "Another answer was accepted concurrently"))?;

    sqlx::query("UPDATE questions SET is_solved = TRUE WHERE id = ?")
        .bind(question_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    info!(question_id = %question_id, "Answer accepted");

    Ok(answer)
}
