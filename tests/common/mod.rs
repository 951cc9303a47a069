#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use surprise_tokri::app::{app, AppState};
use surprise_tokri::config::AppConfig;
use surprise_tokri::database::{DocumentStore, MemoryStore};

pub const PASSWORD: &str = "correct-horse";

static SERVER: OnceLock<TestServer> = OnceLock::new();

/// The real binary on a free port, backed by the in-memory store.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_surprise-tokri"));
        cmd.env("TOKRI_API_PORT", port.to_string())
            .env("APP_ENV", "development")
            // An empty URL keeps the server on the memory store even if .env sets one
            .env("DATABASE_URL", "")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == reqwest::StatusCode::OK || resp.status() == reqwest::StatusCode::SERVICE_UNAVAILABLE {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// In-process router over a fresh memory store, driven with `oneshot`.
pub struct TestApp {
    pub state: AppState,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let state = AppState::new(store, AppConfig::development());
        let router = app(state.clone());
        Self { state, router }
    }

    pub async fn request(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes)? };
        Ok((status, value))
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// Register a customer through the API and return its token.
    pub async fn customer(&self, email: &str) -> Result<String> {
        let (status, body) = self
            .post(
                "/api/auth/register",
                None,
                json!({ "name": "Asha Rao", "email": email, "password": PASSWORD }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "register failed: {} {}", status, body);
        token_of(&body)
    }

    /// Create an admin directly, then sign in through the API.
    pub async fn admin(&self) -> Result<String> {
        self.state
            .services
            .users
            .ensure_admin("admin@surprisetokri.in", PASSWORD, "Store Admin")
            .await?;
        let (status, body) = self
            .post("/api/auth/login", None, json!({ "email": "admin@surprisetokri.in", "password": PASSWORD }))
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "admin login failed: {} {}", status, body);
        token_of(&body)
    }

    /// Create a box through the admin API and return its data.
    pub async fn create_box(&self, admin: &str, body: Value) -> Result<Value> {
        let (status, body) = self.post("/api/admin/boxes", Some(admin), body).await?;
        anyhow::ensure!(status == StatusCode::CREATED, "create box failed: {} {}", status, body);
        Ok(body["data"].clone())
    }

    pub async fn create_address(&self, token: &str) -> Result<Value> {
        let (status, body) = self
            .post(
                "/api/user/addresses",
                Some(token),
                json!({
                    "name": "Asha Rao",
                    "phone": "9876543210",
                    "line1": "12 MG Road",
                    "city": "Pune",
                    "state": "Maharashtra",
                    "pincode": "411001"
                }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "create address failed: {} {}", status, body);
        Ok(body["data"].clone())
    }
}

pub fn token_of(body: &Value) -> Result<String> {
    body["data"]["token"]
        .as_str()
        .map(str::to_string)
        .context("response carries no token")
}

pub fn box_body(name: &str, price: f64, stock: u32) -> Value {
    json!({
        "name": name,
        "description": format!("{} surprise", name),
        "category": "birthday",
        "occasion": "birthday",
        "gender": "unisex",
        "price": price,
        "stock": stock,
        "images": ["https://cdn.example.com/box.jpg"]
    })
}
