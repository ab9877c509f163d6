use api::auth::JwtVerifier;
use api::routes::{AppState, router};
use common::config::Config;
use common::logging::setup_logging;
use common::persistence::init_pg_pool;
use lots::images::{ImageCoordinator, UploadPolicy};
use lots::storage::StorageClient;
use lots::{LotsService, PgLotsRepository};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;
use tracing::info;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[tokio::main]
async fn main() {
    let config = Config::load().expect("failed to load config");
    setup_logging("api", config.loki.as_ref());
    info!("starting app");
    let cancellation_token = CancellationToken::new();

    let pool = init_pg_pool(&config.postgres).expect("failed to build postgres pool");
    let storage = StorageClient::new(&config.storage.url, config.storage.timeout())
        .expect("failed to build storage client");
    let policy = if config.uploads.strict {
        UploadPolicy::Strict
    } else {
        UploadPolicy::Lenient
    };
    info!("image upload policy `{policy:?}`");

    let lots = LotsService::new(
        PgLotsRepository::new(pool),
        ImageCoordinator::new(storage, policy),
    );
    let app = router(
        AppState::new(lots, JwtVerifier::new(&config.auth.jwt_secret)),
        config.server.timeout(),
    );

    let listener = tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port))
        .await
        .expect("failed to bind");
    info!("listening on `{}:{}`", config.server.host, config.server.port);
    let app_done = serve(listener, app, cancellation_token.clone());

    tokio::signal::ctrl_c()
        .await
        .expect("failed to listen for ctrl c event");
    info!("exiting");
    cancellation_token.cancel();
    app_done.notified().await;
    info!("exited");
}

fn serve(
    listener: tokio::net::TcpListener,
    app: axum::Router,
    cancellation_token: CancellationToken,
) -> Arc<Notify> {
    let done = Arc::new(Notify::new());

    tokio::spawn({
        let done = done.clone();
        async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    cancellation_token.cancelled().await;
                    info!("gracefully shutting down app");
                    done.notify_waiters();
                })
                .await
                .expect("failed to serve");
        }
    });

    done
}
