use std::{env, net::SocketAddr, process::exit};

use axum::{
    Router,
    extract::{MatchedPath, Request},
};
use axum_server::Handle;
use clap::Parser;
use r2d2_sqlite::SqliteConnectionManager;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use ledgerline::{AppState, build_router, create_pool, graceful_shutdown};

/// The JSON API server for ledgerline.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, env = "LEDGERLINE_DB_PATH")]
    db_path: String,

    /// The port to serve the API from.
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// The canonical timezone used to decide which calendar day a transaction
    /// falls on, e.g. "Pacific/Auckland".
    #[arg(long, env = "LEDGERLINE_TIMEZONE", default_value = "Etc/UTC")]
    timezone: String,

    /// The maximum number of open database connections.
    #[arg(long, env = "LEDGERLINE_POOL_SIZE", default_value_t = 8)]
    pool_size: u32,
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    let secret = match env::var("SECRET") {
        Ok(secret) if !secret.is_empty() => secret,
        _ => {
            tracing::error!("The environment variable 'SECRET' must be set");
            exit(1);
        }
    };

    let db_pool = match create_pool(SqliteConnectionManager::file(&args.db_path), args.pool_size)
    {
        Ok(db_pool) => db_pool,
        Err(error) => {
            tracing::error!("Could not open the database at {}: {error}", args.db_path);
            exit(1);
        }
    };

    let state = match AppState::new(db_pool.clone(), &secret, &args.timezone) {
        Ok(state) => state,
        Err(error) => {
            tracing::error!("Could not create the app state: {error}");
            exit(1);
        }
    };

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(build_router(state));

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    tracing::info!("HTTP server listening on {}", addr);

    if let Err(error) = axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
    {
        tracing::error!("The server stopped unexpectedly: {error}");
    }

    drop(db_pool);
    tracing::info!("Server shut down");
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().pretty())
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // Errors are logged where they are turned into responses.
        .on_failure(());

    router.layer(tracing_layer)
}
