use rocket::State;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};

use crate::db::{cast_vote, get_vote_tally};
use crate::error::AppError;

/// `vote_type` stays a string so bad values get the envelope instead of a 422.
#[derive(Deserialize, Serialize)]
pub struct VoteRequest {
    pub vote_type: String,
    pub voter_token: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct VoteResponse {
    pub success: bool,
    pub vote_id: i64,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct TallyResponse {
    pub success: bool,
    pub question_id: i64,
    pub up: i64,
    pub down: i64,
}

#[post("/questions/<question_id>/vote", data = "<vote>")]
pub async fn api_cast_vote(
    question_id: i64,
    vote: Json<VoteRequest>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<VoteResponse>, AppError> {
    let vote_id = cast_vote(
        db,
        question_id,
        &vote.vote_type,
        vote.voter_token.as_deref(),
    )
    .await?;

    Ok(Json(VoteResponse {
        success: true,
        vote_id,
    }))
}

#[get("/questions/<question_id>/votes")]
pub async fn api_get_votes(
    question_id: i64,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<TallyResponse>, AppError> {
    let tally = get_vote_tally(db, question_id).await?;

    Ok(Json(TallyResponse {
        success: true,
        question_id,
        up: tally.up,
        down: tally.down,
    }))
}
