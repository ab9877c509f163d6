pub mod domain;
pub mod error;
pub mod filter;
pub mod images;
pub mod query;
pub mod repository;
pub mod service;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

pub use error::LotsError;
pub use repository::{LotsRepository, PgLotsRepository};
pub use service::LotsService;
