use crate::auth::AuthUser;
use crate::domain::{Lot, MessageResponse};
use crate::error::{ApiError, ApiPath};
use crate::routes::Lots;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use lots::domain::LotId;
use std::sync::Arc;
use tracing::debug;

pub async fn posted_lots(
    AuthUser(user_id): AuthUser,
    State(lots): State<Arc<Lots>>,
) -> Result<Json<Vec<Lot>>, ApiError> {
    let posted = lots.user_posted_lots(user_id).await?;
    Ok(Json(posted.into_iter().map(Lot::from).collect()))
}

pub async fn liked_lots(
    AuthUser(user_id): AuthUser,
    State(lots): State<Arc<Lots>>,
) -> Result<Json<Vec<Lot>>, ApiError> {
    let liked = lots.user_liked_lots(user_id).await?;
    Ok(Json(liked.into_iter().map(Lot::from).collect()))
}

pub async fn like(
    AuthUser(user_id): AuthUser,
    ApiPath(lot_id): ApiPath<LotId>,
    State(lots): State<Arc<Lots>>,
) -> Result<StatusCode, ApiError> {
    lots.like_lot(user_id, lot_id).await?;
    Ok(StatusCode::CREATED)
}

pub async fn unlike(
    AuthUser(user_id): AuthUser,
    ApiPath(lot_id): ApiPath<LotId>,
    State(lots): State<Arc<Lots>>,
) -> Result<StatusCode, ApiError> {
    lots.unlike_lot(user_id, lot_id).await?;
    Ok(StatusCode::CREATED)
}

pub async fn buy(
    AuthUser(user_id): AuthUser,
    ApiPath(lot_id): ApiPath<LotId>,
    State(lots): State<Arc<Lots>>,
) -> Result<Json<MessageResponse>, ApiError> {
    lots.buy_lot(lot_id).await?;
    debug!(user_id, lot_id, "lot bought");
    Ok(Json(MessageResponse::new("lot bought")))
}
