use crate::{
    app::App,
    db::PostgresDb,
    db_pool::DbPool,
    handler::{
        handle_add_chat, handle_add_link, handle_delete_chat, handle_delete_link, handle_health,
        handle_list_links,
    },
    migrations::run_migrations,
};
use axum::{
    Router,
    routing::{get, post},
};
use clap::Parser;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod db;
mod db_pool;
mod handler;
mod migrations;
mod models;
mod schema;
mod signals;

#[cfg(not(debug_assertions))]
#[must_use]
pub const fn is_debug() -> bool {
    false
}

#[cfg(debug_assertions)]
#[must_use]
pub const fn is_debug() -> bool {
    true
}

#[derive(Default, Parser, Debug)]
#[command(version, about = "Keeps track of the links each chat watches")]
struct Arguments {
    #[arg(long, default_value_t = true, help = "Relax CORS", env = "RELAX_CORS")]
    cors_relaxed: bool,

    #[arg(long, default_value_t = 8080, help = "Port to listen on", env = "PORT")]
    port: u16,

    #[arg(long, help = "Logging level of the Rust log", env = "RUST_LOG")]
    #[clap(default_value_t = String::from("info,tower_http=debug"))]
    rust_log_level: String,

    #[arg(long, env = "DATABASE_URL")]
    db_url: String,

    #[arg(
        long,
        default_value_t = 10,
        help = "DB pool size",
        env = "DB_POOL_SIZE"
    )]
    db_pool_size: usize,
}

fn setup_cors(relaxed: bool) -> CorsLayer {
    if relaxed {
        tracing::info!("cors setup: very_permissive");
        CorsLayer::very_permissive().allow_credentials(true)
    } else {
        tracing::info!("cors setup: default");
        CorsLayer::new()
    }
}

pub fn router(app: Arc<App>, cors_relaxed: bool) -> Router {
    Router::new()
        .route(
            "/tg-chat/{id}",
            post(handle_add_chat).delete(handle_delete_chat),
        )
        .route(
            "/links",
            get(handle_list_links)
                .post(handle_add_link)
                .delete(handle_delete_link),
        )
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .layer(setup_cors(cors_relaxed))
        .with_state(app)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Arguments::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&args.rust_log_level))
        .with(tracing_subscriber::fmt::layer().with_ansi(is_debug()))
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        sha = option_env!("VERGEN_GIT_SHA").unwrap_or("unknown"),
        "starting scraptor"
    );

    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Could not install rustls default crypto provider."))?;

    let db_url = args.db_url.clone();
    tokio::task::spawn_blocking(move || run_migrations(&db_url)).await??;

    let dbpool = DbPool::build(&args.db_url, args.db_pool_size).await?;

    let app = App::new(Arc::new(PostgresDb::new(dbpool)));

    let router = router(app, args.cors_relaxed);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));

    tracing::info!("listening on http://{}", addr);

    let listener = TcpListener::bind(addr).await?;

    let server = axum::serve(listener, router.into_make_service());

    let graceful = server.with_graceful_shutdown(signals::shutdown_signal());

    if let Err(e) = graceful.await {
        tracing::error!("server error: {}", e);
    }

    tracing::info!("server stopped");

    Ok(())
}
