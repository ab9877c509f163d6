pub mod form;

use crate::auth::AuthUser;
use crate::domain::{CreatedLot, MessageResponse};
use crate::error::{ApiError, ApiPath};
use crate::routes::Lots;
use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use form::LotForm;
use lots::domain::LotId;
use std::sync::Arc;
use tracing::{debug, instrument};

#[instrument(skip_all)]
pub async fn create_lot(
    AuthUser(user_id): AuthUser,
    State(lots): State<Arc<Lots>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<CreatedLot>), ApiError> {
    let form = LotForm::from_multipart(multipart).await?;
    debug!(
        user_id,
        brand = %form.draft.brand,
        model = %form.draft.model,
        n_images = form.new_images.len(),
        "creating lot"
    );
    let lot_id = lots
        .create_lot(user_id, form.draft, form.new_images)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedLot {
            message: "lot created".to_string(),
            lot_id,
        }),
    ))
}

#[instrument(skip_all)]
pub async fn update_lot(
    AuthUser(user_id): AuthUser,
    ApiPath(lot_id): ApiPath<LotId>,
    State(lots): State<Arc<Lots>>,
    multipart: Multipart,
) -> Result<Json<MessageResponse>, ApiError> {
    let form = LotForm::from_multipart(multipart).await?;
    debug!(
        user_id,
        lot_id,
        delete_images = ?form.delete_images,
        old_images = ?form.old_images,
        n_new_images = form.new_images.len(),
        "updating lot"
    );
    let (draft, changes) = form.image_changes();
    lots.update_lot(user_id, lot_id, draft, changes).await?;
    Ok(Json(MessageResponse::new("lot updated")))
}

#[instrument(skip_all)]
pub async fn delete_lot(
    AuthUser(user_id): AuthUser,
    ApiPath(lot_id): ApiPath<LotId>,
    State(lots): State<Arc<Lots>>,
) -> Result<Json<MessageResponse>, ApiError> {
    lots.delete_lot(user_id, lot_id).await?;
    Ok(Json(MessageResponse::new("lot deleted")))
}
