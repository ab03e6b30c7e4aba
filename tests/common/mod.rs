#![allow(dead_code)]

use async_trait::async_trait;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};

use credential_lifecycle::account::{Account, Role};
use credential_lifecycle::auth::{AuthService, CredentialSigner};
use credential_lifecycle::configuration::{AuthSettings, JwtSettings};
use credential_lifecycle::cookies::CookiePolicy;
use credential_lifecycle::email_client::EmailSender;
use credential_lifecycle::error::EmailError;
use credential_lifecycle::startup::{run, AppState};
use credential_lifecycle::store::{CredentialStore, InMemoryCredentialStore};

pub const PASSWORD: &str = "SecurePass123";
pub const BASE_URL: &str = "http://app.test";

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub recipient: String,
    pub subject: String,
    pub html: String,
}

/// Keeps every message instead of sending it
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentEmail>>,
    failing: Mutex<bool>,
}

impl RecordingMailer {
    pub fn fail_deliveries(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    /// Token from the newest verification link sent to `recipient`
    pub fn last_token_for(&self, recipient: &str) -> String {
        let sent = self.sent();
        let email = sent
            .iter()
            .rev()
            .find(|e| e.recipient == recipient)
            .expect("No email sent to recipient");
        let start = email.html.find("token=").expect("No token in email") + "token=".len();
        email.html[start..]
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect()
    }
}

#[async_trait]
impl EmailSender for RecordingMailer {
    async fn send_email(
        &self,
        recipient: &str,
        subject: &str,
        html_content: &str,
    ) -> Result<(), EmailError> {
        if *self.failing.lock().unwrap() {
            return Err(EmailError::ServiceUnavailable("mail provider down".to_string()));
        }
        self.sent.lock().unwrap().push(SentEmail {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            html: html_content.to_string(),
        });
        Ok(())
    }
}

pub fn jwt_settings() -> JwtSettings {
    JwtSettings {
        access_secret: "test-access-secret-key-with-32-plus-chars".to_string(),
        refresh_secret: "test-refresh-secret-key-with-32-plus-chars".to_string(),
        access_token_expiry: 900,
        refresh_token_expiry: 604800,
        issuer: "credential-lifecycle-test".to_string(),
    }
}

pub fn auth_settings() -> AuthSettings {
    AuthSettings {
        password_hash_cost: 4,
        verification_token_expiry: 7200,
        secure_cookies: false,
    }
}

pub struct TestContext {
    pub service: AuthService,
    pub store: Arc<InMemoryCredentialStore>,
    pub mailer: Arc<RecordingMailer>,
    pub signer: Arc<CredentialSigner>,
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryCredentialStore::new());
        let mailer = Arc::new(RecordingMailer::default());
        let signer = Arc::new(CredentialSigner::new(&jwt_settings()).expect("Invalid test JWT settings"));

        let service = AuthService::new(
            store.clone(),
            signer.clone(),
            mailer.clone(),
            auth_settings(),
            BASE_URL.to_string(),
        );

        Self {
            service,
            store,
            mailer,
            signer,
        }
    }

    /// Registers an account that has not verified its email yet
    pub async fn unverified_account(&self, username: &str) -> Account {
        self.service
            .register(username, &format!("{}@example.com", username), PASSWORD)
            .await
            .expect("Failed to register account")
            .account
    }

    /// Registers and verifies an account with the given role
    pub async fn verified_account(&self, username: &str, role: Role) -> Account {
        let account = self.unverified_account(username).await;
        self.store.mark_verified(account.id).unwrap();
        self.store.set_role(account.id, role).unwrap();
        self.store.find_by_id(account.id).await.unwrap().unwrap()
    }
}

pub struct TestApp {
    pub address: String,
    pub context: TestContext,
    pub client: reqwest::Client,
}

pub fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let context = TestContext::new();
    let state = AppState::new(context.service.clone(), CookiePolicy::new(false));
    let server = run(listener, state).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        context,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }
}

/// Value of the named cookie in the response's Set-Cookie headers
pub fn set_cookie(response: &reqwest::Response, name: &str) -> Option<String> {
    set_cookie_header(response, name).map(|header| {
        let pair = header.split(';').next().unwrap_or_default();
        pair.splitn(2, '=').nth(1).unwrap_or_default().to_string()
    })
}

/// Full Set-Cookie header (with attributes) for the named cookie
pub fn set_cookie_header(response: &reqwest::Response, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&prefix))
        .map(str::to_string)
}
