use utoipa::OpenApi;

pub mod auth;
pub mod domain;
pub mod error;
pub mod routes;

#[derive(OpenApi)]
#[openapi(paths(
    crate::routes::catalogue::by_id,
    crate::routes::catalogue::filtered,
    crate::routes::catalogue::page,
    crate::routes::catalogue::count,
    crate::routes::catalogue::filtered_count,
    crate::routes::catalogue::brands,
    crate::routes::catalogue::models
))]
pub struct Docs;
