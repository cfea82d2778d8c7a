#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};

use ecoswap_api::auth::ManualClock;
use ecoswap_api::config::AppConfig;
use ecoswap_api::database::models::Role;
use ecoswap_api::{router, AppState};

pub const PASSWORD: &str = "correct-horse-battery";

/// One API instance per test, served in-process on its own port with an
/// in-memory store and a clock the test can move.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    pub client: Client,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let clock = Arc::new(ManualClock::starting_now());
        let config = AppConfig::development().validated()?;
        let state = AppState::in_memory(config, clock.clone());

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind {}", port))?;
        let app = router(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let server = Self {
            port,
            base_url,
            state,
            clock,
            client: Client::new(),
        };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }

    pub fn put(&self, path: &str) -> RequestBuilder {
        self.client.put(self.url(path))
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.client.delete(self.url(path))
    }

    /// Register through the API and return the new account's JSON.
    pub async fn register(&self, email: &str) -> Result<Value> {
        let res = self
            .post("/auth/register")
            .json(&json!({
                "email": email,
                "password": PASSWORD,
                "display_name": email.split('@').next().unwrap_or("someone"),
            }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "register {} failed: {}", email, res.status());
        Ok(res.json::<Value>().await?["data"].clone())
    }

    /// Log in and return the `Bearer ...` header value.
    pub async fn login(&self, email: &str) -> Result<String> {
        let res = self
            .post("/auth/login")
            .json(&json!({ "email": email, "password": PASSWORD }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "login {} failed: {}", email, res.status());
        let body = res.json::<Value>().await?;
        body["data"]["token"]
            .as_str()
            .map(str::to_owned)
            .context("login response without token")
    }

    /// Register and log in in one go.
    pub async fn user(&self, email: &str) -> Result<String> {
        self.register(email).await?;
        self.login(email).await
    }

    /// Register, promote to admin directly in the store, then log in.
    pub async fn admin(&self, email: &str) -> Result<String> {
        self.register(email).await?;
        let mut account = self
            .state
            .accounts
            .find_by_email(email)
            .await?
            .context("registered admin missing")?;
        account.role = Role::Admin;
        self.state.accounts.update(&account).await?;
        self.login(email).await
    }
}
