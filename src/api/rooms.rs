use rocket::State;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::api::MessageResponse;
use crate::auth::{AdminGate, CurrentTeacher};
use crate::db::{
    close_room, create_room, create_subject, delete_room, get_all_subjects, get_owned_room,
    get_owned_rooms, join_room_by_code, update_room,
};
use crate::error::AppError;
use crate::models::{Room, Subject};
use crate::validation::JsonValidateExt;

#[derive(Deserialize, Serialize, Validate)]
pub struct RoomRequest {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    pub subject_id: Option<i64>,
}

#[derive(Deserialize, Serialize)]
pub struct JoinRoomRequest {
    pub room_code: Option<String>,
}

#[derive(Deserialize, Serialize, Validate)]
pub struct SubjectRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct RoomResponse {
    pub success: bool,
    pub room: Room,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct RoomsResponse {
    pub success: bool,
    pub rooms: Vec<Room>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SubjectResponse {
    pub success: bool,
    pub subject: Subject,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SubjectsResponse {
    pub success: bool,
    pub subjects: Vec<Subject>,
}

#[get("/subjects")]
pub async fn api_get_subjects(db: &State<Pool<Sqlite>>) -> Result<Json<SubjectsResponse>, AppError> {
    let subjects = get_all_subjects(db).await?;

    Ok(Json(SubjectsResponse {
        success: true,
        subjects,
    }))
}

#[post("/subjects", data = "<subject>")]
pub async fn api_create_subject(
    _admin: AdminGate,
    subject: Json<SubjectRequest>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<SubjectResponse>, AppError> {
    let subject = subject.validate_custom()?;
    let subject = create_subject(db, subject.name.trim()).await?;

    Ok(Json(SubjectResponse {
        success: true,
        subject,
    }))
}

/// Answers with the bare room object rather than an envelope.
#[post("/rooms", data = "<room>")]
pub async fn api_create_room(
    room: Json<RoomRequest>,
    session: CurrentTeacher,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Room>, AppError> {
    let teacher = session.require()?;
    let room = room.validate_custom()?;

    let room = create_room(db, teacher.id, &room.title, room.subject_id).await?;

    Ok(Json(room))
}

#[get("/rooms")]
pub async fn api_get_rooms(
    session: CurrentTeacher,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<RoomsResponse>, AppError> {
    let teacher = session.require()?;
    let rooms = get_owned_rooms(db, teacher.id).await?;

    Ok(Json(RoomsResponse {
        success: true,
        rooms,
    }))
}

#[get("/rooms/<id>")]
pub async fn api_get_room(
    id: i64,
    session: CurrentTeacher,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Room>, AppError> {
    let teacher = session.require()?;
    let room = get_owned_room(db, id, teacher.id).await?;

    Ok(Json(room))
}

#[patch("/rooms/<id>", data = "<room>")]
pub async fn api_update_room(
    id: i64,
    room: Json<RoomRequest>,
    session: CurrentTeacher,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<RoomResponse>, AppError> {
    let teacher = session.require()?;
    let room = room.validate_custom()?;

    let room = update_room(db, id, teacher.id, &room.title, room.subject_id).await?;

    Ok(Json(RoomResponse {
        success: true,
        room,
    }))
}

#[delete("/rooms/<id>")]
pub async fn api_delete_room(
    id: i64,
    session: CurrentTeacher,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<MessageResponse>, AppError> {
    let teacher = session.require()?;
    delete_room(db, id, teacher.id).await?;

    Ok(MessageResponse::ok("Room deleted"))
}

#[post("/rooms/<id>/close")]
pub async fn api_close_room(
    id: i64,
    session: CurrentTeacher,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<RoomResponse>, AppError> {
    let teacher = session.require()?;
    let room = close_room(db, id, teacher.id).await?;

    Ok(Json(RoomResponse {
        success: true,
        room,
    }))
}

#[post("/rooms/join", data = "<join>")]
pub async fn api_join_room(
    join: Json<JoinRoomRequest>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<RoomResponse>, AppError> {
    let code = join
        .room_code
        .as_deref()
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .ok_or_else(|| AppError::Validation("room_code required".to_string()))?;

    let room = join_room_by_code(db, code).await?;

    Ok(Json(RoomResponse {
        success: true,
        room,
    }))
}
