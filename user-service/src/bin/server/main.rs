use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use auth::PasswordHasher;
use auth::TokenCodec;
use sqlx::postgres::PgPoolOptions;
use tonic::transport::Server;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use user_service::config::Config;
use user_service::domain::session::ports::SessionServicePort;
use user_service::domain::session::service::SessionService;
use user_service::inbound::grpc::AuthGateLayer;
use user_service::inbound::grpc::SessionGrpcService;
use user_service::outbound::repositories::PostgresCredentialStore;
use user_service::proto::user_service_server::UserServiceServer;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "user_service=debug,auth=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "user-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        grpc_port = config.server.grpc_port,
        request_timeout_seconds = config.server.request_timeout_seconds,
        access_token_ttl_minutes = config.jwt.access_token_ttl_minutes,
        refresh_token_ttl_minutes = config.jwt.refresh_token_ttl_minutes,
        revoke_chain_on_reuse = config.session.revoke_chain_on_reuse,
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_millis(config.session.store_timeout_ms))
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = config.database.max_connections,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let password_hasher = PasswordHasher::with_params(
        config.password.memory_kib,
        config.password.iterations,
        config.password.parallelism,
    )?;
    let token_codec =
        TokenCodec::new(config.jwt.secret.as_bytes()).with_leeway(config.jwt.leeway_seconds);
    let authenticator = Arc::new(
        Authenticator::from_parts(password_hasher, token_codec).with_token_ttls(
            chrono::Duration::minutes(config.jwt.access_token_ttl_minutes),
            chrono::Duration::minutes(config.jwt.refresh_token_ttl_minutes),
        ),
    );

    let credential_store = Arc::new(PostgresCredentialStore::new(pg_pool));
    let session_service = Arc::new(SessionService::new(
        credential_store,
        Arc::clone(&authenticator),
        config.session.settings(),
    ));

    let purge_service = Arc::clone(&session_service);
    let purge_interval = Duration::from_secs(config.session.purge_interval_seconds);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(purge_interval);
        loop {
            ticker.tick().await;
            if let Err(e) = purge_service.purge_expired_tokens().await {
                tracing::warn!(error = %e, "Failed to purge expired refresh tokens");
            }
        }
    });

    let grpc_address = format!("0.0.0.0:{}", config.server.grpc_port).parse()?;
    let grpc_service = SessionGrpcService::new(session_service);
    tracing::info!(
        address = %grpc_address,
        port = config.server.grpc_port,
        protocol = "grpc",
        "gRpc server listening"
    );

    Server::builder()
        .timeout(Duration::from_secs(config.server.request_timeout_seconds))
        .layer(AuthGateLayer::new(authenticator))
        .add_service(UserServiceServer::new(grpc_service))
        .serve_with_shutdown(grpc_address, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutdown signal received");
        })
        .await?;

    tracing::info!("Server exited successfully");

    Ok(())
}
