use crate::auth::MaybeUser;
use crate::domain::{Brand, Lot, LotsResponse, Model};
use crate::error::{ApiError, ApiPath, ApiQuery, ErrorResponse};
use crate::routes::Lots;
use axum::Json;
use axum::extract::State;
use lots::domain::LotId;
use lots::filter::LotFilters;
use lots::query::Pagination;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// Page and size as sent by the client, anything that is not a positive
/// integer falls back to the defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PageParams {
    page: String,
    limit: String,
}

impl PageParams {
    fn pagination(&self) -> Pagination {
        Pagination::new(
            self.page.trim().parse().unwrap_or(0),
            self.limit.trim().parse().unwrap_or(0),
        )
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct FilteredParams {
    #[serde(flatten)]
    filters: LotFilters,
    #[serde(flatten)]
    page: PageParams,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ModelsParams {
    brand: String,
}

#[utoipa::path(
    get,
    path = "/api/lots/id/{lot_id}",
    tag = "lots",
    params(
        ("lot_id" = i32, Path, description = "Identifier of the lot")
    ),
    responses(
        (status = 200, description = "Returns the lot with its car", body = Lot),
        (status = 400, description = "Lot id is not an integer", body = ErrorResponse),
        (status = 404, description = "Lot does not exist", body = ErrorResponse)
    )
)]
pub async fn by_id(
    MaybeUser(viewer): MaybeUser,
    ApiPath(lot_id): ApiPath<LotId>,
    State(lots): State<Arc<Lots>>,
) -> Result<Json<Lot>, ApiError> {
    let lot = lots.lot_by_id(viewer, lot_id).await?;
    Ok(Json(lot.into()))
}

#[utoipa::path(
    get,
    path = "/api/lots/filtered",
    tag = "lots",
    params(
        ("brand" = Option<String>, Query, description = "Exact brand name"),
        ("model" = Option<String>, Query, description = "Exact model name"),
        ("minPrice" = Option<String>, Query, description = "Lowest sale price"),
        ("maxPrice" = Option<String>, Query, description = "Highest sale price, 0 means unbounded"),
        ("minYear" = Option<String>, Query, description = "Earliest made year, 0 means unbounded"),
        ("maxYear" = Option<String>, Query, description = "Latest made year, 0 means unbounded"),
        ("page" = Option<i64>, Query, description = "1-based page number"),
        ("limit" = Option<i64>, Query, description = "Page size, 10 by default")
    ),
    responses(
        (status = 200, description = "Returns one page of matching lots and the total match count", body = LotsResponse),
        (status = 400, description = "A numeric filter is not an integer", body = ErrorResponse)
    )
)]
pub async fn filtered(
    MaybeUser(viewer): MaybeUser,
    ApiQuery(params): ApiQuery<FilteredParams>,
    State(lots): State<Arc<Lots>>,
) -> Result<Json<LotsResponse>, ApiError> {
    let page = lots
        .lots_by_params(viewer, &params.filters, params.page.pagination())
        .await?;
    if page.total == 0 {
        debug!(filters = ?params.filters, "no lots match filters");
    }
    Ok(Json(page.into()))
}

#[utoipa::path(
    get,
    path = "/api/lots/sell_lots",
    tag = "lots",
    params(
        ("page" = Option<i64>, Query, description = "1-based page number"),
        ("limit" = Option<i64>, Query, description = "Page size, 10 by default")
    ),
    responses(
        (status = 200, description = "Returns one page of lots, most recent first", body = [Lot])
    )
)]
pub async fn page(
    MaybeUser(viewer): MaybeUser,
    ApiQuery(params): ApiQuery<PageParams>,
    State(lots): State<Arc<Lots>>,
) -> Result<Json<Vec<Lot>>, ApiError> {
    let page = lots
        .lots_by_params(viewer, &LotFilters::default(), params.pagination())
        .await?;
    Ok(Json(page.lots.into_iter().map(Lot::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/lots/sell_lots_count",
    tag = "lots",
    responses(
        (status = 200, description = "Returns the number of lots", body = i64)
    )
)]
pub async fn count(State(lots): State<Arc<Lots>>) -> Result<Json<i64>, ApiError> {
    Ok(Json(lots.lots_count().await?))
}

#[utoipa::path(
    get,
    path = "/api/lots/sell_lots_filtered_count",
    tag = "lots",
    params(
        ("brand" = Option<String>, Query, description = "Exact brand name"),
        ("model" = Option<String>, Query, description = "Exact model name"),
        ("minPrice" = Option<String>, Query, description = "Lowest sale price"),
        ("maxPrice" = Option<String>, Query, description = "Highest sale price, 0 means unbounded"),
        ("minYear" = Option<String>, Query, description = "Earliest made year, 0 means unbounded"),
        ("maxYear" = Option<String>, Query, description = "Latest made year, 0 means unbounded")
    ),
    responses(
        (status = 200, description = "Returns the number of matching lots", body = i64),
        (status = 400, description = "A numeric filter is not an integer", body = ErrorResponse)
    )
)]
pub async fn filtered_count(
    ApiQuery(filters): ApiQuery<LotFilters>,
    State(lots): State<Arc<Lots>>,
) -> Result<Json<i64>, ApiError> {
    Ok(Json(lots.lots_by_params_count(&filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/lots/brands",
    tag = "reference",
    responses(
        (status = 200, description = "Returns every brand", body = [Brand])
    )
)]
pub async fn brands(State(lots): State<Arc<Lots>>) -> Result<Json<Vec<Brand>>, ApiError> {
    let brands = lots.brands().await?;
    Ok(Json(brands.into_iter().map(Brand::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/lots/models",
    tag = "reference",
    params(
        ("brand" = Option<String>, Query, description = "Brand name, case insensitive. Every model when absent")
    ),
    responses(
        (status = 200, description = "Returns the models", body = [Model])
    )
)]
pub async fn models(
    ApiQuery(params): ApiQuery<ModelsParams>,
    State(lots): State<Arc<Lots>>,
) -> Result<Json<Vec<Model>>, ApiError> {
    let models = lots.models(&params.brand).await?;
    Ok(Json(models.into_iter().map(Model::from).collect()))
}
