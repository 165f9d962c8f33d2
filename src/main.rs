use authors_api::{
    AppState,
    config::{AppConfig, Env},
    create_router, db,
    repository::{PostgresRepository, RepositoryState},
    services,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Entry point: loads configuration, initializes logging, connects and migrates the
/// database, bootstraps the admin account and serves HTTP until shut down.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Configuration (fails fast on missing production secrets)
    dotenv::dotenv().ok();
    let config = AppConfig::load()?;

    // 2. Logging: RUST_LOG wins, otherwise crate-level debug output.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "authors_api=debug,tower_http=info".into());

    match config.env {
        Env::Local => {
            // Human-readable output for local runs.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // JSON lines for log aggregators.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 3. Database pool and schema
    let pool = db::connect(&config.database).await.map_err(|e| {
        tracing::error!(error = %e, "failed to connect to Postgres, check DATABASE_URL");
        e
    })?;
    db::migrate(&pool).await?;
    tracing::info!("database migrations applied");

    let repo = Arc::new(PostgresRepository::new(pool)) as RepositoryState;

    // 4. Bootstrap account
    if services::auth::ensure_admin(repo.as_ref(), &config).await? {
        tracing::info!("bootstrap admin account created");
    }

    // 5. Router and server
    let address = config.bind_address();
    let graceful_shutdown = config.server.graceful_shutdown;
    let app = create_router(AppState { repo, config });

    let listener = TcpListener::bind(&address).await?;
    tracing::info!("Listening on {}", address);
    tracing::info!("API documentation available at http://{}/swagger-ui", address);

    if graceful_shutdown {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
    } else {
        axum::serve(listener, app).await?;
    }

    tracing::info!("server stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received, draining connections");
}
