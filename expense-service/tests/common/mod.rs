use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use auth::Authenticator;
use auth::PasswordHasher;
use auth::TokenService;
use expense_service::domain::identity::errors::FederatedAuthError;
use expense_service::domain::identity::errors::NotificationError;
use expense_service::domain::identity::models::DisplayName;
use expense_service::domain::identity::models::EmailAddress;
use expense_service::domain::identity::models::FederatedIdentity;
use expense_service::domain::identity::ports::IdentityVerifier;
use expense_service::domain::identity::ports::Notifier;
use expense_service::domain::identity::service::AuthService;
use expense_service::domain::identity::service::PasswordResetSettings;
use expense_service::inbound::http::router::create_router;
use expense_service::outbound::repositories::InMemoryUserRepository;

const SESSION_SECRET: &[u8] = b"test-session-secret-at-least-32-bytes!!";
const RESET_SECRET: &[u8] = b"test-reset-secret-at-least-32-bytes!!!!";
pub const RESET_BASE_URL: &str = "http://localhost:5173/reset-password";

/// Test application that spawns a real server
pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    pub users: Arc<InMemoryUserRepository>,
    pub notifier: Arc<RecordingNotifier>,
    pub verifier: Arc<StubIdentityVerifier>,
    /// Signs with the same secrets as the server
    pub tokens: TokenService,
}

pub fn token_service() -> TokenService {
    TokenService::new(
        SESSION_SECRET,
        RESET_SECRET,
        chrono::Duration::hours(24),
        chrono::Duration::minutes(15),
    )
    .expect("Failed to create token service")
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        Self::spawn_with(false).await
    }

    pub async fn spawn_with(conceal_unknown_accounts: bool) -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let users = Arc::new(InMemoryUserRepository::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let verifier = Arc::new(StubIdentityVerifier::default());

        let password_hasher =
            PasswordHasher::with_cost(1024, 1, 1).expect("Failed to create password hasher");
        let authenticator = Arc::new(Authenticator::new(password_hasher, token_service()));

        let auth_service = Arc::new(AuthService::new(
            Arc::clone(&users),
            Arc::clone(&verifier),
            Arc::clone(&notifier),
            authenticator,
            PasswordResetSettings {
                link_base_url: RESET_BASE_URL.to_string(),
                conceal_unknown_accounts,
            },
        ));

        let router = create_router(auth_service, None).expect("Failed to build router");

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            api_client: reqwest::Client::new(),
            users,
            notifier,
            verifier,
            tokens: token_service(),
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Register an account and return the response body
    pub async fn register(&self, name: &str, email: &str, password: &str) -> reqwest::Response {
        self.post("/api/auth/register")
            .json(&serde_json::json!({
                "name": name,
                "email": email,
                "password": password
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.post("/api/auth/login")
            .json(&serde_json::json!({
                "email": email,
                "password": password
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Token from the most recent reset link sent to `email`
    pub fn last_reset_token(&self, email: &str) -> Option<String> {
        let sent = self.notifier.sent.lock().unwrap();
        let (_, _, body) = sent.iter().rev().find(|(to, _, _)| to == email)?;

        let link_start = body.find(RESET_BASE_URL)? + RESET_BASE_URL.len() + 1;
        let link_end = body[link_start..].find('"')? + link_start;
        Some(body[link_start..link_end].to_string())
    }
}

/// Notifier that keeps every message in memory.
#[derive(Default)]
pub struct RecordingNotifier {
    /// (recipient, subject, body)
    pub sent: Mutex<Vec<(String, String, String)>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(
        &self,
        to: &EmailAddress,
        subject: &str,
        body: &str,
    ) -> Result<(), NotificationError> {
        self.sent.lock().unwrap().push((
            to.as_str().to_string(),
            subject.to_string(),
            body.to_string(),
        ));
        Ok(())
    }
}

/// Verifier that accepts only registered assertions.
#[derive(Default)]
pub struct StubIdentityVerifier {
    assertions: Mutex<HashMap<String, FederatedIdentity>>,
}

impl StubIdentityVerifier {
    pub fn accept(&self, assertion: &str, email: &str, name: &str) {
        let identity = FederatedIdentity {
            email: EmailAddress::new(email.to_string()).unwrap(),
            name: DisplayName::new(name.to_string()).unwrap(),
            subject: format!("sub-{}", assertion),
        };
        self.assertions
            .lock()
            .unwrap()
            .insert(assertion.to_string(), identity);
    }
}

#[async_trait]
impl IdentityVerifier for StubIdentityVerifier {
    async fn verify(&self, assertion: &str) -> Result<FederatedIdentity, FederatedAuthError> {
        self.assertions
            .lock()
            .unwrap()
            .get(assertion)
            .cloned()
            .ok_or_else(|| FederatedAuthError::Rejected("unknown assertion".to_string()))
    }
}
