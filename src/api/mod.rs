use rocket::Request;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::{Catcher, Route};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::FailureResponse;

pub mod answers;
pub mod auth;
pub mod questions;
pub mod rooms;
pub mod votes;

#[derive(Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: &str) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.to_string(),
        })
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SuccessResponse {
    pub success: bool,
}

#[get("/")]
pub fn index() -> Json<Value> {
    Json(json!({ "Questup": "Api is running successfully!!!" }))
}

#[get("/health")]
pub fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn routes() -> Vec<Route> {
    routes![
        index,
        health,
        auth::api_request_access,
        auth::api_register_teacher,
        auth::api_login,
        auth::api_me,
        auth::api_logout,
        auth::api_admin_login,
        auth::api_admin_check,
        auth::api_list_requests,
        auth::api_approve_request,
        rooms::api_get_subjects,
        rooms::api_create_subject,
        rooms::api_create_room,
        rooms::api_get_rooms,
        rooms::api_get_room,
        rooms::api_update_room,
        rooms::api_delete_room,
        rooms::api_close_room,
        rooms::api_join_room,
        questions::api_post_question,
        questions::api_get_room_questions,
        questions::api_get_question,
        questions::api_edit_question,
        questions::api_delete_question,
        questions::api_report_question,
        questions::api_mark_solved,
        answers::api_post_answer,
        answers::api_get_answers,
        answers::api_edit_answer,
        answers::api_delete_answer,
        answers::api_accept_answer,
        votes::api_cast_vote,
        votes::api_get_votes,
    ]
}

pub fn catchers() -> Vec<Catcher> {
    catchers![
        bad_request,
        unauthorized_api,
        not_found,
        unprocessable,
        internal_error
    ]
}

#[catch(400)]
pub fn bad_request(_req: &Request) -> Custom<Json<FailureResponse>> {
    Custom(Status::BadRequest, Json(FailureResponse::new("Malformed request")))
}

/// Only the admin gate fails with 401.
#[catch(401)]
pub fn unauthorized_api(_req: &Request) -> Custom<Json<FailureResponse>> {
    tracing::warn!("Unauthorized admin access attempt");
    Custom(
        Status::Unauthorized,
        Json(FailureResponse::new("Invalid admin secret")),
    )
}

#[catch(404)]
pub fn not_found(req: &Request) -> Custom<Json<FailureResponse>> {
    Custom(
        Status::NotFound,
        Json(FailureResponse::new(format!("No route for {} {}", req.method(), req.uri()))),
    )
}

#[catch(422)]
pub fn unprocessable(_req: &Request) -> Custom<Json<FailureResponse>> {
    Custom(
        Status::UnprocessableEntity,
        Json(FailureResponse::new("Request body could not be parsed")),
    )
}

#[catch(500)]
pub fn internal_error(_req: &Request) -> Custom<Json<FailureResponse>> {
    Custom(
        Status::InternalServerError,
        Json(FailureResponse::new("Internal server error")),
    )
}
