use crate::config::Postgres;
use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::deadpool::{BuildError, Pool};

pub mod models;
pub mod schema;

pub type PgPool = Pool<AsyncPgConnection>;

pub fn init_pg_pool(postgres: &Postgres) -> Result<PgPool, BuildError> {
    pg_pool_from_url(postgres.url(), postgres.max_connections)
}

pub fn pg_pool_from_url(
    db_url: impl Into<String>,
    max_connections: Option<usize>,
) -> Result<PgPool, BuildError> {
    let config = AsyncDieselConnectionManager::<AsyncPgConnection>::new(db_url);
    let builder = Pool::builder(config);
    match max_connections {
        Some(max) => builder.max_size(max).build(),
        None => builder.build(),
    }
}

#[cfg(feature = "migrations")]
pub mod migrations {
    use diesel_migrations::{EmbeddedMigrations, embed_migrations};

    pub const PG_MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/persistence/migrations");
}
