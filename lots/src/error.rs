use crate::domain::{LotId, UserId};
use crate::storage::StorageError;
use diesel_async::pooled_connection::deadpool::PoolError;
use thiserror::Error;

pub use diesel::result::Error as DieselError;

#[derive(Error, Debug)]
pub enum LotsError {
    #[error("lot with given id not found: `{0}`")]
    LotNotFound(LotId),
    #[error("lot `{lot_id}` is not owned by user `{user_id}`")]
    OwnershipMismatch { lot_id: LotId, user_id: UserId },
    #[error("lot `{0}` is already sold")]
    AlreadySold(LotId),
    #[error("brand not found: `{0}`")]
    UnknownBrand(String),
    #[error("model `{model}` not found for brand `{brand}`")]
    UnknownModel { brand: String, model: String },
    #[error("invalid `{name}` filter value: `{value}`")]
    InvalidFilter { name: &'static str, value: String },
    #[error("image storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("diesel error: `{0}`")]
    Diesel(#[from] DieselError),
    #[error("postgres pool error: `{0}`")]
    PgPool(#[from] PoolError),
}

/// Coarse classification the layer above maps onto its own responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Ownership,
    Conflict,
    Upstream,
    Store,
}

impl LotsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::LotNotFound(_) => ErrorKind::NotFound,
            Self::UnknownBrand(_) | Self::UnknownModel { .. } | Self::InvalidFilter { .. } => {
                ErrorKind::Validation
            }
            Self::OwnershipMismatch { .. } => ErrorKind::Ownership,
            Self::AlreadySold(_) => ErrorKind::Conflict,
            Self::Storage(_) => ErrorKind::Upstream,
            Self::Diesel(_) | Self::PgPool(_) => ErrorKind::Store,
        }
    }
}
