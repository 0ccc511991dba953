//! HTTP entry point.

use std::sync::Arc;

use actix_web::{web, App, HttpResponse, HttpServer};
use tracing_actix_web::TracingLogger;

use photofeed::auth::local::LocalIdentityProvider;
use photofeed::auth::IdentityProvider;
use photofeed::config::Config;
use photofeed::error::AppError;
use photofeed::feed::FeedView;
use photofeed::handlers;
use photofeed::logging;
use photofeed::media::memory::MemoryMediaStore;
use photofeed::media::MediaStore;
use photofeed::metrics;
use photofeed::services::PostService;
use photofeed::state::AppState;
use photofeed::store::memory::MemoryStore;
use photofeed::store::DocumentStore;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    logging::init_tracing();

    let config = Arc::new(Config::from_env()?);
    tracing::info!(
        env = %config.app.env,
        "starting photofeed v{}",
        env!("CARGO_PKG_VERSION")
    );

    let auth: Arc<dyn IdentityProvider> =
        Arc::new(LocalIdentityProvider::new(config.demo_identity()));
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let media: Arc<dyn MediaStore> =
        Arc::new(MemoryMediaStore::new(&config.media.public_base_url));

    let posts = PostService::new(
        store.clone(),
        media,
        auth.clone(),
        &config.feed.collection,
    );
    let feed = FeedView::start(store, auth.subscribe(), &config.feed.collection).await?;

    let state = AppState {
        config: config.clone(),
        auth,
        posts,
        feed: feed.watch(),
    };

    let bind_addr = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!(%bind_addr, "HTTP server starting");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(TracingLogger::default())
            .route("/healthz", web::get().to(healthz))
            .route("/metrics", web::get().to(metrics::serve_metrics))
            .service(handlers::index)
            .service(handlers::feed_json)
            .service(handlers::sign_in)
            .service(handlers::sign_out)
            .service(handlers::upload_post)
            .service(handlers::like_post)
            .service(handlers::unlike_post)
            .service(handlers::add_comment)
    })
    .bind(&bind_addr)
    .map_err(|err| AppError::StartServer(format!("bind {bind_addr}: {err}")))?
    .run()
    .await
    .map_err(|err| AppError::StartServer(err.to_string()))?;

    feed.stop();
    tracing::info!("photofeed stopped");
    Ok(())
}

async fn healthz() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "photofeed",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
