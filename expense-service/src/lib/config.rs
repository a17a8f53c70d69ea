use std::env;

use config::builder::ConfigBuilder as Builder;
use config::builder::DefaultState;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use config::Map;
use serde::Deserialize;

use crate::outbound::federated::google::GOOGLE_CERTS_URL;

/// Run mode with development conveniences (in-memory store, log-only mail)
pub const DEVELOPMENT: &str = "development";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub run_mode: String,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
    pub google: GoogleConfig,
    pub mail: MailConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
    /// Frontend origin allowed with credentials; any origin when unset
    pub allowed_origin: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// In-memory store when unset
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    pub session_secret: String,
    pub reset_secret: String,
    pub session_expiration_hours: i64,
    pub reset_expiration_minutes: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub certs_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    pub from: String,
    pub reset_password_base_url: String,
    pub conceal_unknown_accounts: bool,
    /// Log-only delivery when unset
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmtpConfig {
    pub relay: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (JWT__SESSION_SECRET, SERVER__HTTP_PORT, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    /// 4. Built-in defaults
    ///
    /// Signing secrets and the Google client id have no default; only
    /// `config/development.toml` provides them.
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| DEVELOPMENT.to_string());
        Self::load_for(&run_mode)
    }

    /// Load configuration for an explicit run mode.
    pub fn load_for(run_mode: &str) -> Result<Self, ConfigError> {
        let config: Config = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: DATABASE__URL=postgres://... overrides database.url
            .add_source(
                Environment::default()
                    .separator("__")
                    .source(Some(section_variables())),
            )
            .set_override("run_mode", run_mode)?
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that are only acceptable during development.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.run_mode == DEVELOPMENT {
            return Ok(());
        }
        if self.database.url.is_none() {
            return Err(ConfigError::Message(format!(
                "database.url must be configured when RUN_MODE is {}",
                self.run_mode
            )));
        }
        if self.mail.smtp.is_none() {
            return Err(ConfigError::Message(format!(
                "mail.smtp must be configured when RUN_MODE is {}",
                self.run_mode
            )));
        }
        Ok(())
    }

    fn defaults() -> Result<Builder<DefaultState>, ConfigError> {
        ConfigBuilder::builder()
            .set_default("run_mode", DEVELOPMENT)?
            .set_default("server.http_port", 5000)?
            .set_default("database.max_connections", 5)?
            .set_default("jwt.session_expiration_hours", 24)?
            .set_default("jwt.reset_expiration_minutes", 15)?
            .set_default("password.memory_kib", 19456)?
            .set_default("password.iterations", 2)?
            .set_default("password.parallelism", 1)?
            .set_default("google.certs_url", GOOGLE_CERTS_URL)?
            .set_default("mail.from", "Expense Tracker <no-reply@localhost>")?
            .set_default(
                "mail.reset_password_base_url",
                "http://localhost:5173/reset-password",
            )?
            .set_default("mail.conceal_unknown_accounts", false)
    }
}

/// Environment variables naming a section key, e.g. `JWT__SESSION_SECRET`.
///
/// Unrelated variables such as `MAIL` or `PATH` would otherwise collide with
/// section names.
fn section_variables() -> Map<String, String> {
    env::vars().filter(|(key, _)| key.contains("__")).collect()
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn load_from(toml: &str) -> Result<Config, ConfigError> {
        Config::defaults()?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    const REQUIRED: &str = r#"
        [jwt]
        session_secret = "session"
        reset_secret = "reset"

        [google]
        client_id = "client.apps.googleusercontent.com"
    "#;

    #[test]
    fn test_defaults_fill_optional_keys() {
        let config = load_from(REQUIRED).unwrap();

        assert_eq!(config.server.http_port, 5000);
        assert!(config.server.allowed_origin.is_none());
        assert!(config.database.url.is_none());
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.jwt.session_expiration_hours, 24);
        assert_eq!(config.jwt.reset_expiration_minutes, 15);
        assert_eq!(config.password.memory_kib, 19456);
        assert_eq!(config.google.certs_url, GOOGLE_CERTS_URL);
        assert_eq!(
            config.mail.reset_password_base_url,
            "http://localhost:5173/reset-password"
        );
        assert!(!config.mail.conceal_unknown_accounts);
        assert!(config.mail.smtp.is_none());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let toml = format!(
            "{}\n{}",
            REQUIRED,
            r#"
            [server]
            http_port = 8080
            allowed_origin = "https://expenses.example.com"

            [mail]
            conceal_unknown_accounts = true

            [mail.smtp]
            relay = "smtp.example.com"
            username = "mailer"
            "#
        );

        let config = load_from(&toml).unwrap();

        assert_eq!(config.server.http_port, 8080);
        assert_eq!(
            config.server.allowed_origin.as_deref(),
            Some("https://expenses.example.com")
        );
        assert!(config.mail.conceal_unknown_accounts);
        let smtp = config.mail.smtp.unwrap();
        assert_eq!(smtp.relay, "smtp.example.com");
        assert_eq!(smtp.username.as_deref(), Some("mailer"));
        assert!(smtp.password.is_none());
    }

    #[test]
    fn test_development_files_load() {
        let config = Config::load_for(DEVELOPMENT).unwrap();

        assert_eq!(config.run_mode, DEVELOPMENT);
        assert!(!config.jwt.session_secret.is_empty());
        assert_ne!(config.jwt.session_secret, config.jwt.reset_secret);
    }

    #[test]
    fn test_production_without_overrides_fails() {
        let result = Config::load_for("production");

        assert!(result.is_err());
    }

    #[test]
    fn test_production_requires_database_and_smtp() {
        let mut config = load_from(&format!("run_mode = \"production\"\n{}", REQUIRED)).unwrap();
        assert_eq!(config.run_mode, "production");
        assert!(config.validate().is_err());

        config.database.url = Some("postgres://localhost/expense_tracker".to_string());
        assert!(config.validate().is_err());

        config.mail.smtp = Some(SmtpConfig {
            relay: "smtp.example.com".to_string(),
            username: None,
            password: None,
        });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_development_allows_log_only_mail() {
        let config = load_from(REQUIRED).unwrap();

        assert_eq!(config.run_mode, DEVELOPMENT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_secret_is_an_error() {
        let result = load_from(
            r#"
            [google]
            client_id = "client"
            "#,
        );

        assert!(result.is_err());
    }
}
