use chrono::Utc;
use rand::Rng;
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument, warn};

use crate::error::{AppError, conflict_on_unique};
use crate::models::{Room, Subject};

const ROOM_COLUMNS: &str = "id, title, room_code, subject_id, owner_id, is_open, created_at";
const ROOM_CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
pub const ROOM_CODE_LEN: usize = 6;
const MAX_ROOM_CODE_ATTEMPTS: usize = 64;

pub fn generate_room_code() -> String {
    let mut rng = rand::rng();
    (0..ROOM_CODE_LEN)
        .map(|_| ROOM_CODE_CHARSET[rng.random_range(0..ROOM_CODE_CHARSET.len())] as char)
        .collect()
}

#[instrument(skip(pool))]
pub async fn room_code_in_use(pool: &Pool<Sqlite>, code: &str) -> Result<bool, AppError> {
    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM rooms WHERE room_code = ?")
        .bind(code)
        .fetch_optional(pool)
        .await?;

    Ok(existing.is_some())
}

#[instrument(skip(pool))]
pub async fn create_room(
    pool: &Pool<Sqlite>,
    owner_id: i64,
    title: &str,
    subject_id: Option<i64>,
) -> Result<Room, AppError> {
    info!("Creating room");

    if let Some(subject_id) = subject_id {
        if get_subject(pool, subject_id).await?.is_none() {
            return Err(AppError::NotFound("Subject not found".to_string()));
        }
    }

    for _ in 0..MAX_ROOM_CODE_ATTEMPTS {
        let code = generate_room_code();
        if room_code_in_use(pool, &code).await? {
            continue;
        }

        let inserted = sqlx::query_as::<_, Room>(&format!(
            "INSERT INTO rooms (title, subject_id, room_code, owner_id, is_open, created_at)
             VALUES (?, ?, ?, ?, TRUE, ?)
             RETURNING {ROOM_COLUMNS}"
        ))
        .bind(title)
        .bind(subject_id)
        .bind(&code)
        .bind(owner_id)
        .bind(Utc::now().naive_utc())
        .fetch_one(pool)
        .await;

        match inserted {
            Ok(room) => {
                info!(room_id = %room.id, room_code = %room.room_code, "Room created");
                return Ok(room);
            }
            // Another insert claimed the code between the check and the write
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                warn!(room_code = %code, "Room code collision on insert, retrying");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AppError::Internal(
        "Could not allocate a unique room code".to_string(),
    ))
}

/// Missing rooms and rooms owned by someone else are indistinguishable.
#[instrument(skip(pool))]
pub async fn get_owned_room(
    pool: &Pool<Sqlite>,
    room_id: i64,
    owner_id: i64,
) -> Result<Room, AppError> {
    let room = sqlx::query_as::<_, Room>(&format!(
        "SELECT {ROOM_COLUMNS} FROM rooms WHERE id = ? AND owner_id = ?"
    ))
    .bind(room_id)
    .bind(owner_id)
    .fetch_optional(pool)
    .await?;

    room.ok_or_else(|| AppError::NotFound("Room not found".to_string()))
}

#[instrument(skip(pool))]
pub async fn get_owned_rooms(pool: &Pool<Sqlite>, owner_id: i64) -> Result<Vec<Room>, AppError> {
    info!("Listing owned rooms");
    let rooms = sqlx::query_as::<_, Room>(&format!(
        "SELECT {ROOM_COLUMNS} FROM rooms WHERE owner_id = ? ORDER BY created_at DESC, id DESC"
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await?;

    Ok(rooms)
}

#[instrument(skip(pool))]
pub async fn update_room(
    pool: &Pool<Sqlite>,
    room_id: i64,
    owner_id: i64,
    title: &str,
    subject_id: Option<i64>,
) -> Result<Room, AppError> {
    info!("Updating room");

    if let Some(subject_id) = subject_id {
        if get_subject(pool, subject_id).await?.is_none() {
            return Err(AppError::NotFound("Subject not found".to_string()));
        }
    }

    let room = sqlx::query_as::<_, Room>(&format!(
        "UPDATE rooms SET title = ?, subject_id = ?
         WHERE id = ? AND owner_id = ?
         RETURNING {ROOM_COLUMNS}"
    ))
    .bind(title)
    .bind(subject_id)
    .bind(room_id)
    .bind(owner_id)
    .fetch_optional(pool)
    .await?;

    room.ok_or_else(|| AppError::NotFound("Room not found".to_string()))
}

/// Questions, answers and votes go with the room through `ON DELETE CASCADE`.
#[instrument(skip(pool))]
pub async fn delete_room(pool: &Pool<Sqlite>, room_id: i64, owner_id: i64) -> Result<(), AppError> {
    info!("Deleting room");
    let res = sqlx::query("DELETE FROM rooms WHERE id = ? AND owner_id = ?")
        .bind(room_id)
        .bind(owner_id)
        .execute(pool)
        .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound("Room not found".to_string()));
    }

    Ok(())
}

#[instrument(skip(pool))]
pub async fn close_room(pool: &Pool<Sqlite>, room_id: i64, owner_id: i64) -> Result<Room, AppError> {
    info!("Closing room");
    let room = sqlx::query_as::<_, Room>(&format!(
        "UPDATE rooms SET is_open = FALSE
         WHERE id = ? AND owner_id = ?
         RETURNING {ROOM_COLUMNS}"
    ))
    .bind(room_id)
    .bind(owner_id)
    .fetch_optional(pool)
    .await?;

    room.ok_or_else(|| AppError::NotFound("Room not found".to_string()))
}

#[instrument(skip(pool))]
pub async fn join_room_by_code(pool: &Pool<Sqlite>, code: &str) -> Result<Room, AppError> {
    info!("Joining room by code");
    let room = sqlx::query_as::<_, Room>(&format!(
        "SELECT {ROOM_COLUMNS} FROM rooms WHERE room_code = ?"
    ))
    .bind(code)
    .fetch_optional(pool)
    .await?;

    match room {
        Some(room) if room.is_open => Ok(room),
        Some(_) => Err(AppError::RoomNotOpen("Room not found or closed".to_string())),
        None => Err(AppError::NotFound("Room not found or closed".to_string())),
    }
}

#[instrument(skip(pool))]
pub async fn create_subject(pool: &Pool<Sqlite>, name: &str) -> Result<Subject, AppError> {
    info!("Creating subject");
    let subject = sqlx::query_as::<_, Subject>(
        "INSERT INTO subjects (name) VALUES (?) RETURNING id, name",
    )
    .bind(name)
    .fetch_one(pool)
    .await
    .map_err(|e| conflict_on_unique(e, "Subject already exists"))?;

    Ok(subject)
}

#[instrument(skip(pool))]
pub async fn get_subject(pool: &Pool<Sqlite>, subject_id: i64) -> Result<Option<Subject>, AppError> {
    let subject = sqlx::query_as::<_, Subject>("SELECT id, name FROM subjects WHERE id = ?")
        .bind(subject_id)
        .fetch_optional(pool)
        .await?;

    Ok(subject)
}

#[instrument(skip(pool))]
pub async fn get_all_subjects(pool: &Pool<Sqlite>) -> Result<Vec<Subject>, AppError> {
    let subjects = sqlx::query_as::<_, Subject>("SELECT id, name FROM subjects ORDER BY name")
        .fetch_all(pool)
        .await?;

    Ok(subjects)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_codes_are_six_uppercase_alphanumerics() {
        for _ in 0..200 {
            let code = generate_room_code();
            assert_eq!(code.len(), ROOM_CODE_LEN);
            assert!(
                code.chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()),
                "Unexpected character in {}",
                code
            );
        }
    }
}
