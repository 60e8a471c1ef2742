use chrono::Utc;
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument, warn};

use crate::auth::{DbTeacher, PasswordHasher, Teacher, generate_session_token, verify_password};
use crate::error::{AppError, conflict_on_unique};
use crate::models::TeacherRequest;

const TEACHER_COLUMNS: &str = "id, name, email, password_hash, token, created_at";
const REQUEST_COLUMNS: &str = "id, name, email, password_hash, approved, created_at";

#[instrument(skip(pool, hasher, password))]
pub async fn create_teacher_request(
    pool: &Pool<Sqlite>,
    hasher: &PasswordHasher,
    name: &str,
    email: &str,
    password: &str,
) -> Result<TeacherRequest, AppError> {
    info!("Creating teacher access request");
    let password_hash = hasher.hash(password)?;

    let request = sqlx::query_as::<_, TeacherRequest>(&format!(
        "INSERT INTO teacher_requests (name, email, password_hash, approved, created_at)
         VALUES (?, ?, ?, FALSE, ?)
         RETURNING {REQUEST_COLUMNS}"
    ))
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(Utc::now().naive_utc())
    .fetch_one(pool)
    .await?;

    Ok(request)
}

#[instrument(skip(pool))]
pub async fn get_teacher_requests(
    pool: &Pool<Sqlite>,
    approved: bool,
) -> Result<Vec<TeacherRequest>, AppError> {
    info!("Listing teacher requests");
    let rows = sqlx::query_as::<_, TeacherRequest>(&format!(
        "SELECT {REQUEST_COLUMNS} FROM teacher_requests
         WHERE approved = ?
         ORDER BY created_at DESC, id DESC"
    ))
    .bind(approved)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Creates the teacher account and marks the request approved in one transaction.
#[instrument(skip(pool))]
pub async fn approve_teacher_request(
    pool: &Pool<Sqlite>,
    request_id: i64,
) -> Result<Teacher, AppError> {
    info!("Approving teacher request");
    let mut tx = pool.begin().await?;

    let request = sqlx::query_as::<_, TeacherRequest>(&format!(
        "SELECT {REQUEST_COLUMNS} FROM teacher_requests WHERE id = ?"
    ))
    .bind(request_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Request not found".to_string()))?;

    if request.approved {
        return Err(AppError::AlreadyApproved);
    }

    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM teachers WHERE email = ?")
        .bind(&request.email)
        .fetch_optional(&mut *tx)
        .await?;

    if existing.is_some() {
        return Err(AppError::Conflict(
            "Teacher with this email already exists".to_string(),
        ));
    }

    let teacher = sqlx::query_as::<_, DbTeacher>(&format!(
        "INSERT INTO teachers (name, email, password_hash, created_at)
         VALUES (?, ?, ?, ?)
         RETURNING {TEACHER_COLUMNS}"
    ))
    .bind(&request.name)
    .bind(&request.email)
    .bind(&request.password_hash)
    .bind(Utc::now().naive_utc())
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| conflict_on_unique(e, "Teacher with this email already exists"))?;

    let updated = sqlx::query(
        "UPDATE teacher_requests SET approved = TRUE WHERE id = ? AND approved = FALSE",
    )
    .bind(request_id)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() != 1 {
        warn!("Request was approved concurrently, rolling back");
        return Err(AppError::AlreadyApproved);
    }

    tx.commit().await?;
    info!(teacher_id = %teacher.id, "Teacher request approved");

    Ok(Teacher::from(teacher))
}

#[instrument(skip(pool, hasher, password))]
pub async fn create_teacher(
    pool: &Pool<Sqlite>,
    hasher: &PasswordHasher,
    name: &str,
    email: &str,
    password: &str,
) -> Result<Teacher, AppError> {
    info!("Registering teacher directly");

    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM teachers WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    if existing.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let password_hash = hasher.hash(password)?;

    let teacher = sqlx::query_as::<_, DbTeacher>(&format!(
        "INSERT INTO teachers (name, email, password_hash, created_at)
         VALUES (?, ?, ?, ?)
         RETURNING {TEACHER_COLUMNS}"
    ))
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(Utc::now().naive_utc())
    .fetch_one(pool)
    .await
    .map_err(|e| conflict_on_unique(e, "Email already registered"))?;

    Ok(Teacher::from(teacher))
}

/// Verifies the password and issues a fresh token, replacing any previous one.
#[instrument(skip(pool, password))]
pub async fn login_teacher(
    pool: &Pool<Sqlite>,
    email: &str,
    password: &str,
) -> Result<(String, Teacher), AppError> {
    info!("Authenticating teacher");
    let teacher = sqlx::query_as::<_, DbTeacher>(&format!(
        "SELECT {TEACHER_COLUMNS} FROM teachers WHERE email = ?"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;

    let teacher = match teacher {
        Some(teacher) if verify_password(password, &teacher.password_hash) => teacher,
        _ => return Err(AppError::InvalidCredentials),
    };

    let token = generate_session_token();

    sqlx::query("UPDATE teachers SET token = ? WHERE id = ?")
        .bind(&token)
        .bind(teacher.id)
        .execute(pool)
        .await?;

    Ok((token, Teacher::from(teacher)))
}

#[instrument(skip(pool))]
pub async fn logout_teacher(pool: &Pool<Sqlite>, teacher_id: i64) -> Result<(), AppError> {
    info!("Clearing teacher session token");
    sqlx::query("UPDATE teachers SET token = NULL WHERE id = ?")
        .bind(teacher_id)
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument(skip(pool, token))]
pub async fn resolve_token(pool: &Pool<Sqlite>, token: &str) -> Result<Option<Teacher>, AppError> {
    let teacher = sqlx::query_as::<_, DbTeacher>(&format!(
        "SELECT {TEACHER_COLUMNS} FROM teachers WHERE token = ?"
    ))
    .bind(token)
    .fetch_optional(pool)
    .await?;

    Ok(teacher.map(Teacher::from))
}
