use axum::extract::multipart::MultipartError;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lots::LotsError;
use lots::error::ErrorKind;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};
use utoipa::ToSchema;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Lots(#[from] LotsError),
    #[error("missing or invalid bearer token")]
    Unauthorized,
    #[error("route not found")]
    RouteNotFound,
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("request timed out")]
    Timeout,
    #[error("invalid form field: {0}")]
    InvalidForm(String),
    #[error("multipart error: `{0}`")]
    Multipart(#[from] MultipartError),
    #[error("json rejection: `{0}`")]
    Json(#[from] JsonRejection),
    #[error("path rejection: `{0}`")]
    Path(#[from] PathRejection),
    #[error("query rejection: `{0}`")]
    Query(#[from] QueryRejection),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Lots(LotsError::InvalidFilter { .. }) => StatusCode::BAD_REQUEST,
            Self::Lots(e) => match e.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
                ErrorKind::Ownership => StatusCode::FORBIDDEN,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::Upstream => StatusCode::BAD_GATEWAY,
                ErrorKind::Store => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::RouteNotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Timeout => StatusCode::REQUEST_TIMEOUT,
            Self::InvalidForm(_) | Self::Multipart(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Json(_) | Self::Path(_) | Self::Query(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!(api_error = ?self, "request failed");
            match status {
                StatusCode::BAD_GATEWAY => "Image storage is unavailable".to_string(),
                _ => "Something went wrong".to_string(),
            }
        } else {
            debug!(api_error = %self, "request rejected");
            self.to_string()
        };

        (status, ApiJson(ErrorResponse { message })).into_response()
    }
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl<T> IntoResponse for ApiJson<T>
where
    axum::Json<T>: IntoResponse,
{
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use lots::storage::StorageError;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_lots_errors_map_to_statuses() {
        let cases = [
            (LotsError::LotNotFound(3), StatusCode::NOT_FOUND),
            (
                LotsError::OwnershipMismatch {
                    lot_id: 3,
                    user_id: 4,
                },
                StatusCode::FORBIDDEN,
            ),
            (LotsError::AlreadySold(3), StatusCode::CONFLICT),
            (
                LotsError::UnknownBrand("Lada".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                LotsError::InvalidFilter {
                    name: "minYear",
                    value: "old".into(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                LotsError::Storage(StorageError::UnexpectedStatus {
                    status: 503,
                    body: String::new(),
                }),
                StatusCode::BAD_GATEWAY,
            ),
            (
                LotsError::Diesel(diesel_not_found()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError::from(error).status(), status);
        }
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::RouteNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::MethodNotAllowed.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(ApiError::Timeout.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(
            ApiError::InvalidForm("MadeYear".into()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    fn diesel_not_found() -> lots::error::DieselError {
        lots::error::DieselError::NotFound
    }

    #[tokio::test]
    async fn test_client_error_body_carries_message() {
        let response = ApiError::from(LotsError::AlreadySold(9)).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = body_json(response).await;
        assert_eq!(body["message"], "lot `9` is already sold");
    }

    #[tokio::test]
    async fn test_server_error_body_is_generic() {
        let response = ApiError::from(LotsError::Diesel(diesel_not_found())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Something went wrong");
    }
}
