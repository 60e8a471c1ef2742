use rocket::State;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::api::MessageResponse;
use crate::auth::CurrentTeacher;
use crate::db::{accept_answer, create_answer, delete_answer, get_question_answers, update_answer};
use crate::error::AppError;
use crate::models::Answer;
use crate::validation::JsonValidateExt;

#[derive(Deserialize, Serialize, Validate)]
pub struct AnswerRequest {
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct AnswerResponse {
    pub success: bool,
    pub answer: Answer,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct AnswersResponse {
    pub success: bool,
    pub answers: Vec<Answer>,
}

/// Any signed-in teacher may answer, not only the room owner.
#[post("/questions/<question_id>/answers", data = "<answer>")]
pub async fn api_post_answer(
    question_id: i64,
    answer: Json<AnswerRequest>,
    session: CurrentTeacher,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<AnswerResponse>, AppError> {
    let teacher = session.require()?;
    let answer = answer.validate_custom()?;

    let answer = create_answer(db, question_id, teacher.id, &answer.content).await?;

    Ok(Json(AnswerResponse {
        success: true,
        answer,
    }))
}

#[get("/questions/<question_id>/answers")]
pub async fn api_get_answers(
    question_id: i64,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<AnswersResponse>, AppError> {
    let answers = get_question_answers(db, question_id).await?;

    Ok(Json(AnswersResponse {
        success: true,
        answers,
    }))
}

#[patch("/answers/<id>", data = "<answer>")]
pub async fn api_edit_answer(
    id: i64,
    answer: Json<AnswerRequest>,
    session: CurrentTeacher,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<AnswerResponse>, AppError> {
    let teacher = session.require()?;
    let answer = answer.validate_custom()?;

    let answer = update_answer(db, id, teacher.id, &answer.content).await?;

    Ok(Json(AnswerResponse {
        success: true,
        answer,
    }))
}

#[delete("/answers/<id>")]
pub async fn api_delete_answer(
    id: i64,
    session: CurrentTeacher,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<MessageResponse>, AppError> {
    let teacher = session.require()?;
    delete_answer(db, id, teacher.id).await?;

    Ok(MessageResponse::ok("Answer deleted"))
}

/// Only the owner of the question's room may accept, whoever wrote the answer.
#[post("/answers/<id>/accept")]
pub async fn api_accept_answer(
    id: i64,
    session: CurrentTeacher,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<AnswerResponse>, AppError> {
    let teacher = session.require()?;
    let answer = accept_answer(db, id, teacher.id).await?;

    Ok(Json(AnswerResponse {
        success: true,
        answer,
    }))
}
