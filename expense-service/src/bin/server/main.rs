use std::sync::Arc;

use auth::Authenticator;
use auth::PasswordHasher;
use auth::TokenService;
use expense_service::config::Config;
use expense_service::config::DatabaseConfig;
use expense_service::config::MailConfig;
use expense_service::domain::identity::ports::AuthServicePort;
use expense_service::domain::identity::ports::IdentityVerifier;
use expense_service::domain::identity::ports::Notifier;
use expense_service::domain::identity::ports::UserRepository;
use expense_service::domain::identity::service::AuthService;
use expense_service::domain::identity::service::PasswordResetSettings;
use expense_service::inbound::http::router::create_router;
use expense_service::outbound::federated::GoogleIdentityVerifier;
use expense_service::outbound::notifications::smtp::SmtpCredentials;
use expense_service::outbound::notifications::LogNotifier;
use expense_service::outbound::notifications::SmtpNotifier;
use expense_service::outbound::repositories::InMemoryUserRepository;
use expense_service::outbound::repositories::PostgresUserRepository;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "expense_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "expense-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        run_mode = %config.run_mode,
        persistent_store = config.database.url.is_some(),
        smtp_enabled = config.mail.smtp.is_some(),
        "Configuration loaded"
    );

    let tokens = TokenService::new(
        config.jwt.session_secret.as_bytes(),
        config.jwt.reset_secret.as_bytes(),
        chrono::Duration::hours(config.jwt.session_expiration_hours),
        chrono::Duration::minutes(config.jwt.reset_expiration_minutes),
    )?;
    let password_hasher = PasswordHasher::with_cost(
        config.password.memory_kib,
        config.password.iterations,
        config.password.parallelism,
    )?;
    let authenticator = Arc::new(Authenticator::new(password_hasher, tokens));

    let user_repository = user_repository(&config.database).await?;
    let verifier: Arc<dyn IdentityVerifier> = Arc::new(GoogleIdentityVerifier::new(
        config.google.client_id.clone(),
        config.google.certs_url.clone(),
    )?);
    let notifier = notifier(&config.mail)?;

    let auth_service: Arc<dyn AuthServicePort> = Arc::new(AuthService::new(
        user_repository,
        verifier,
        notifier,
        authenticator,
        PasswordResetSettings {
            link_base_url: config.mail.reset_password_base_url.clone(),
            conceal_unknown_accounts: config.mail.conceal_unknown_accounts,
        },
    ));

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application =
        create_router(auth_service, config.server.allowed_origin.as_deref())?;
    axum::serve(http_listener, http_application).await?;

    tracing::info!("Server exited successfully");
    Ok(())
}

async fn user_repository(
    config: &DatabaseConfig,
) -> Result<Arc<dyn UserRepository>, anyhow::Error> {
    let Some(url) = config.url.as_deref() else {
        tracing::warn!("No database configured, users are kept in memory");
        return Ok(Arc::new(InMemoryUserRepository::new()));
    };

    let pg_pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(url)
        .await?;
    tracing::info!(
        max_connections = config.max_connections,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    Ok(Arc::new(PostgresUserRepository::new(pg_pool)))
}

fn notifier(config: &MailConfig) -> Result<Arc<dyn Notifier>, anyhow::Error> {
    let Some(smtp) = config.smtp.as_ref() else {
        tracing::warn!("No SMTP relay configured, reset links are only logged");
        return Ok(Arc::new(LogNotifier::new()));
    };

    let credentials = match (&smtp.username, &smtp.password) {
        (Some(username), Some(password)) => Some(SmtpCredentials {
            username: username.clone(),
            password: password.clone(),
        }),
        _ => None,
    };

    Ok(Arc::new(SmtpNotifier::new(
        &smtp.relay,
        credentials,
        &config.from,
    )?))
}
