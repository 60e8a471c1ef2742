use rocket::State;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::api::{MessageResponse, SuccessResponse};
use crate::auth::{AdminGate, AdminPolicy, CurrentTeacher, PasswordHasher, Teacher};
use crate::db::{
    approve_teacher_request, create_teacher, create_teacher_request, get_teacher_requests,
    login_teacher, logout_teacher,
};
use crate::error::AppError;
use crate::models::TeacherRequest;
use crate::validation::JsonValidateExt;

#[derive(Deserialize, Serialize, Validate)]
pub struct TeacherSignupRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password cannot be empty"))]
    pub password: String,
}

#[derive(Deserialize, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SignupResponse {
    pub success: bool,
    pub message: String,
    pub request_id: i64,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct TeacherResponse {
    pub success: bool,
    pub teacher: Teacher,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ApproveResponse {
    pub success: bool,
    pub message: String,
    pub teacher: Teacher,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub teacher: Teacher,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct AdminLoginResponse {
    pub success: bool,
    pub token: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct RequestStats {
    pub pending: usize,
    pub approved: usize,
    pub total: usize,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct RequestsResponse {
    pub success: bool,
    pub requests: Vec<TeacherRequest>,
    pub history: Vec<TeacherRequest>,
    pub stats: RequestStats,
}

#[post("/auth/teachers/request-access", data = "<signup>")]
pub async fn api_request_access(
    signup: Json<TeacherSignupRequest>,
    hasher: &State<PasswordHasher>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<SignupResponse>, AppError> {
    let signup = signup.validate_custom()?;

    let request =
        create_teacher_request(db, hasher, &signup.name, &signup.email, &signup.password).await?;

    Ok(Json(SignupResponse {
        success: true,
        message: "Request submitted".to_string(),
        request_id: request.id,
    }))
}

#[post("/auth/teachers/register", data = "<registration>")]
pub async fn api_register_teacher(
    _admin: AdminGate,
    registration: Json<TeacherSignupRequest>,
    hasher: &State<PasswordHasher>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<TeacherResponse>, AppError> {
    let registration = registration.validate_custom()?;

    let teacher = create_teacher(
        db,
        hasher,
        &registration.name,
        &registration.email,
        &registration.password,
    )
    .await?;

    Ok(Json(TeacherResponse {
        success: true,
        teacher,
    }))
}

#[post("/auth/teachers/login", data = "<login>")]
pub async fn api_login(
    login: Json<LoginRequest>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<LoginResponse>, AppError> {
    let (token, teacher) = login_teacher(db, &login.email, &login.password).await?;

    Ok(Json(LoginResponse {
        success: true,
        token,
        teacher,
    }))
}

#[get("/auth/teachers/me")]
pub async fn api_me(session: CurrentTeacher) -> Result<Json<TeacherResponse>, AppError> {
    let teacher = session
        .0
        .ok_or_else(|| AppError::Authentication("Invalid token or not logged in".to_string()))?;

    Ok(Json(TeacherResponse {
        success: true,
        teacher,
    }))
}

#[post("/auth/teachers/logout")]
pub async fn api_logout(
    session: CurrentTeacher,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<MessageResponse>, AppError> {
    let teacher = session
        .0
        .ok_or_else(|| AppError::Authentication("Invalid token or not logged in".to_string()))?;

    logout_teacher(db, teacher.id).await?;

    Ok(MessageResponse::ok("Logged out"))
}

#[post("/auth/teachers/admin/login", data = "<login>")]
pub async fn api_admin_login(
    login: Json<LoginRequest>,
    policy: &State<Box<dyn AdminPolicy>>,
) -> Result<Json<AdminLoginResponse>, AppError> {
    match policy.login(&login.email, &login.password) {
        Some(token) => Ok(Json(AdminLoginResponse {
            success: true,
            token,
        })),
        None => Err(AppError::AdminAuthorization(
            "Invalid admin credentials".to_string(),
        )),
    }
}

#[post("/auth/teachers/admin-check")]
pub fn api_admin_check(_admin: AdminGate) -> Json<SuccessResponse> {
    Json(SuccessResponse { success: true })
}

#[get("/auth/teachers/requests")]
pub async fn api_list_requests(
    _admin: AdminGate,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<RequestsResponse>, AppError> {
    let requests = get_teacher_requests(db, false).await?;
    let history = get_teacher_requests(db, true).await?;

    let stats = RequestStats {
        pending: requests.len(),
        approved: history.len(),
        total: requests.len() + history.len(),
    };

    Ok(Json(RequestsResponse {
        success: true,
        requests,
        history,
        stats,
    }))
}

#[post("/auth/teachers/approve/<id>")]
pub async fn api_approve_request(
    id: i64,
    _admin: AdminGate,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<ApproveResponse>, AppError> {
    let teacher = approve_teacher_request(db, id).await?;

    Ok(Json(ApproveResponse {
        success: true,
        message: "Teacher approved and account created".to_string(),
        teacher,
    }))
}
