use chrono::Utc;
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::{Question, QuestionSort};

const QUESTION_SELECT: &str = "SELECT q.id, q.room_id, q.title, q.description, q.student_name,
        q.created_at, q.is_solved,
        (SELECT COUNT(*) FROM question_votes v
         WHERE v.question_id = q.id AND v.vote_type = 'up') AS votes
    FROM questions q";

const OWNED_QUESTION_FILTER: &str =
    "id = ? AND room_id IN (SELECT id FROM rooms WHERE owner_id = ?)";

fn not_owner() -> AppError {
    AppError::NotFound("Question not found or you're not owner".to_string())
}

/// Inserts only while the room exists and is open, checked in the same statement.
#[instrument(skip(pool))]
pub async fn create_question(
    pool: &Pool<Sqlite>,
    room_id: i64,
    title: &str,
    description: Option<&str>,
    student_name: Option<&str>,
) -> Result<Question, AppError> {
    info!("Posting question");
    let question = sqlx::query_as::<_, Question>(
        "INSERT INTO questions (room_id, title, description, student_name, created_at, is_solved)
         SELECT id, ?, ?, ?, ?, FALSE FROM rooms WHERE id = ? AND is_open = TRUE
         RETURNING id, room_id, title, description, student_name, created_at, is_solved",
    )
    .bind(title)
    .bind(description)
    .bind(student_name)
    .bind(Utc::now().naive_utc())
    .bind(room_id)
    .fetch_optional(pool)
    .await?;

    question.ok_or_else(|| AppError::RoomNotOpen("Room not found or closed".to_string()))
}

#[instrument(skip(pool))]
pub async fn get_room_questions(
    pool: &Pool<Sqlite>,
    room_id: i64,
    sort: QuestionSort,
) -> Result<Vec<Question>, AppError> {
    info!("Listing room questions");

    let room: Option<i64> = sqlx::query_scalar("SELECT id FROM rooms WHERE id = ?")
        .bind(room_id)
        .fetch_optional(pool)
        .await?;

    if room.is_none() {
        return Err(AppError::NotFound("Room not found".to_string()));
    }

    let order = match sort {
        QuestionSort::Recent => "q.created_at DESC, q.id DESC",
        QuestionSort::Votes => "votes DESC, q.created_at DESC, q.id DESC",
    };

    let questions = sqlx::query_as::<_, Question>(&format!(
        "{QUESTION_SELECT} WHERE q.room_id = ? ORDER BY {order}"
    ))
    .bind(room_id)
    .fetch_all(pool)
    .await?;

    Ok(questions)
}

#[instrument(skip(pool))]
pub async fn get_question(pool: &Pool<Sqlite>, question_id: i64) -> Result<Question, AppError> {
    let question = sqlx::query_as::<_, Question>(&format!("{QUESTION_SELECT} WHERE q.id = ?"))
        .bind(question_id)
        .fetch_optional(pool)
        .await?;

    question.ok_or_else(|| AppError::NotFound("Question not found".to_string()))
}

#[instrument(skip(pool))]
pub async fn question_exists(pool: &Pool<Sqlite>, question_id: i64) -> Result<bool, AppError> {
    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM questions WHERE id = ?")
        .bind(question_id)
        .fetch_optional(pool)
        .await?;

    Ok(existing.is_some())
}

#[instrument(skip(pool))]
pub async fn update_question(
    pool: &Pool<Sqlite>,
    question_id: i64,
    owner_id: i64,
    title: &str,
    description: Option<&str>,
) -> Result<Question, AppError> {
    info!("Editing question");
    let res = sqlx::query(&format!(
        "UPDATE questions SET title = ?, description = ? WHERE {OWNED_QUESTION_FILTER}"
    ))
    .bind(title)
    .bind(description)
    .bind(question_id)
    .bind(owner_id)
    .execute(pool)
    .await?;

    if res.rows_affected() == 0 {
        return Err(not_owner());
    }

    get_question(pool, question_id).await
}

#[instrument(skip(pool))]
pub async fn delete_question(
    pool: &Pool<Sqlite>,
    question_id: i64,
    owner_id: i64,
) -> Result<(), AppError> {
    info!("Deleting question");
    let res = sqlx::query(&format!("DELETE FROM questions WHERE {OWNED_QUESTION_FILTER}"))
        .bind(question_id)
        .bind(owner_id)
        .execute(pool)
        .await?;

    if res.rows_affected() == 0 {
        return Err(not_owner());
    }

    Ok(())
}

#[instrument(skip(pool))]
pub async fn mark_question_solved(
    pool: &Pool<Sqlite>,
    question_id: i64,
    owner_id: i64,
) -> Result<Question, AppError> {
    info!("Marking question solved");
    let res = sqlx::query(&format!(
        "UPDATE questions SET is_solved = TRUE WHERE {OWNED_QUESTION_FILTER}"
    ))
    .bind(question_id)
    .bind(owner_id)
    .execute(pool)
    .await?;

    if res.rows_affected() == 0 {
        return Err(not_owner());
    }

    get_question(pool, question_id).await
}
