use rocket::State;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::api::MessageResponse;
use crate::auth::CurrentTeacher;
use crate::db::{
    create_question, delete_question, get_question, get_question_answers, get_room_questions,
    mark_question_solved, question_exists, update_question,
};
use crate::error::AppError;
use crate::models::{Answer, Question, QuestionSort};
use crate::validation::JsonValidateExt;

#[derive(Deserialize, Serialize, Validate)]
pub struct QuestionRequest {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    pub description: Option<String>,
    pub student_name: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct QuestionResponse {
    pub success: bool,
    pub question: Question,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct QuestionsResponse {
    pub success: bool,
    pub questions: Vec<Question>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct QuestionDetailResponse {
    pub success: bool,
    pub question: Question,
    pub answers: Vec<Answer>,
}

#[post("/rooms/<room_id>/questions", data = "<question>")]
pub async fn api_post_question(
    room_id: i64,
    question: Json<QuestionRequest>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<QuestionResponse>, AppError> {
    let question = question.validate_custom()?;

    let question = create_question(
        db,
        room_id,
        &question.title,
        question.description.as_deref(),
        question.student_name.as_deref(),
    )
    .await?;

    Ok(Json(QuestionResponse {
        success: true,
        question,
    }))
}

#[get("/rooms/<room_id>/questions?<sort>")]
pub async fn api_get_room_questions(
    room_id: i64,
    sort: Option<&str>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<QuestionsResponse>, AppError> {
    let questions = get_room_questions(db, room_id, QuestionSort::from_param(sort)).await?;

    Ok(Json(QuestionsResponse {
        success: true,
        questions,
    }))
}

#[get("/questions/<id>")]
pub async fn api_get_question(
    id: i64,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<QuestionDetailResponse>, AppError> {
    let question = get_question(db, id).await?;
    let answers = get_question_answers(db, id).await?;

    Ok(Json(QuestionDetailResponse {
        success: true,
        question,
        answers,
    }))
}

#[patch("/questions/<id>", data = "<question>")]
pub async fn api_edit_question(
    id: i64,
    question: Json<QuestionRequest>,
    session: CurrentTeacher,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<QuestionResponse>, AppError> {
    let teacher = session.require()?;
    let question = question.validate_custom()?;

    let question = update_question(
        db,
        id,
        teacher.id,
        &question.title,
        question.description.as_deref(),
    )
    .await?;

    Ok(Json(QuestionResponse {
        success: true,
        question,
    }))
}

#[delete("/questions/<id>")]
pub async fn api_delete_question(
    id: i64,
    session: CurrentTeacher,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<MessageResponse>, AppError> {
    let teacher = session.require()?;
    delete_question(db, id, teacher.id).await?;

    Ok(MessageResponse::ok("Question deleted"))
}

/// Acknowledges a report; nothing is stored.
#[post("/questions/<id>/report")]
pub async fn api_report_question(
    id: i64,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<MessageResponse>, AppError> {
    if !question_exists(db, id).await? {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    tracing::info!(question_id = %id, "Question reported");
    Ok(MessageResponse::ok("Reported (admin will review)"))
}

#[post("/questions/<id>/solve")]
pub async fn api_mark_solved(
    id: i64,
    session: CurrentTeacher,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<QuestionResponse>, AppError> {
    let teacher = session.require()?;
    let question = mark_question_solved(db, id, teacher.id).await?;

    Ok(Json(QuestionResponse {
        success: true,
        question,
    }))
}
