#![allow(
    clippy::unwrap_used,
    clippy::panic,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    missing_debug_implementations,
    unreachable_pub,
    dead_code
)]

use jobboard_server::api::{self, MgmtState};
use jobboard_server::config::{
    AuthConfig, Config, HealthConfig, LogFormat, MessagingConfig, RateLimitConfig, ServerConfig, StorageBackend,
    StorageConfig, TelemetryConfig,
};
use jobboard_server::{App, Stores};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Once;
use tokio::net::TcpListener;
use uuid::Uuid;

static INIT: Once = Once::new();

pub fn setup_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into())
            .add_directive("jobboard_server=debug".parse().unwrap())
            .add_directive("tower=warn".parse().unwrap())
            .add_directive("hyper=warn".parse().unwrap())
            .add_directive("reqwest=warn".parse().unwrap());

        let _ = tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().try_init();
    });
}

pub fn get_test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            mgmt_port: 0,
            shutdown_timeout_secs: 1,
            trusted_proxies: vec!["127.0.0.1/32".parse().unwrap(), "::1/128".parse().unwrap()],
        },
        storage: StorageConfig {
            backend: StorageBackend::Memory,
            database_url: None,
            max_connections: 5,
            min_connections: 1,
            acquire_timeout_secs: 5,
        },
        auth: AuthConfig { jwt_secret: "test_secret".to_string(), access_token_ttl_secs: 3600 },
        rate_limit: RateLimitConfig { per_second: 10_000, burst: 10_000, auth_per_second: 10_000, auth_burst: 10_000 },
        messaging: MessagingConfig { max_content_length: 2000 },
        health: HealthConfig { store_timeout_ms: 1000 },
        telemetry: TelemetryConfig { log_format: LogFormat::Text, otlp_endpoint: None },
    }
}

pub struct TestUser {
    pub user_id: Uuid,
    pub token: String,
    pub email: String,
}

pub struct TestApp {
    pub server_url: String,
    pub mgmt_url: String,
    pub client: Client,
    pub config: Config,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_config(get_test_config()).await
    }

    pub async fn spawn_with_config(config: Config) -> Self {
        Self::spawn_with_stores(config, Stores::memory()).await
    }

    /// Runs against Postgres at `DATABASE_URL`, migrated on startup. `None` when the variable is unset.
    pub async fn spawn_postgres() -> Option<Self> {
        let database_url = std::env::var("DATABASE_URL").ok()?;
        let mut config = get_test_config();
        config.storage.backend = StorageBackend::Postgres;
        config.storage.database_url = Some(database_url);

        let stores = Stores::postgres(&config).await.expect("Failed to connect to DB. Is Postgres running?");
        Some(Self::spawn_with_stores(config, stores).await)
    }

    pub async fn spawn_with_stores(config: Config, stores: Stores) -> Self {
        setup_tracing();

        let app = App::new(&config, stores);
        let router = api::app_router(&config, app.services);
        let mgmt = api::mgmt_router(MgmtState { health_service: app.health_service });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server_url = format!("http://{}", listener.local_addr().unwrap());
        let mgmt_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mgmt_url = format!("http://{}", mgmt_listener.local_addr().unwrap());

        tokio::spawn(async move {
            axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>()).await.unwrap();
        });
        tokio::spawn(async move {
            axum::serve(mgmt_listener, mgmt.into_make_service_with_connect_info::<SocketAddr>()).await.unwrap();
        });

        Self { server_url, mgmt_url, client: Client::new(), config }
    }

    pub async fn register_user(&self, name: &str) -> TestUser {
        self.register_user_with_role(name, "applicant").await
    }

    pub async fn register_user_with_role(&self, name: &str, role: &str) -> TestUser {
        let email = format!("{name}_{}@example.com", &Uuid::new_v4().simple().to_string()[..8]);
        let resp = self
            .client
            .post(format!("{}/auth/register", self.server_url))
            .json(&json!({
                "name": name,
                "email": email,
                "password": "password123",
                "role": role,
            }))
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::CREATED, "registration of {name} failed");
        let body: Value = resp.json().await.unwrap();

        TestUser {
            user_id: body["user"]["id"].as_str().unwrap().parse().unwrap(),
            token: body["token"].as_str().unwrap().to_string(),
            email,
        }
    }

    pub async fn send_message_raw(&self, token: &str, receiver_id: Uuid, content: &str) -> reqwest::Response {
        self.client
            .post(format!("{}/messages/send", self.server_url))
            .bearer_auth(token)
            .json(&json!({ "receiverId": receiver_id, "content": content }))
            .send()
            .await
            .unwrap()
    }

    pub async fn send_message(&self, from: &TestUser, to: &TestUser, content: &str) -> Value {
        let resp = self.send_message_raw(&from.token, to.user_id, content).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        resp.json().await.unwrap()
    }

    pub async fn threads_raw(&self, token: &str) -> reqwest::Response {
        self.client.get(format!("{}/messages/threads", self.server_url)).bearer_auth(token).send().await.unwrap()
    }

    pub async fn threads(&self, user: &TestUser) -> Vec<Value> {
        let resp = self.threads_raw(&user.token).await;
        assert_eq!(resp.status(), StatusCode::OK);
        resp.json().await.unwrap()
    }

    pub async fn between_raw(&self, token: &str, a: Uuid, b: Uuid) -> reqwest::Response {
        self.client
            .get(format!("{}/messages/between/{a}/{b}", self.server_url))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }

    pub async fn between(&self, caller: &TestUser, other: &TestUser) -> Vec<Value> {
        let resp = self.between_raw(&caller.token, caller.user_id, other.user_id).await;
        assert_eq!(resp.status(), StatusCode::OK);
        resp.json().await.unwrap()
    }

    pub async fn mark_read_raw(&self, token: &str, counterpart_id: Uuid) -> reqwest::Response {
        self.client
            .post(format!("{}/messages/read/{counterpart_id}", self.server_url))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }

    pub async fn mark_read(&self, user: &TestUser, counterpart: &TestUser) {
        let resp = self.mark_read_raw(&user.token, counterpart.user_id).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["message"], "Thread marked as read");
    }
}

/// Finds the row for `counterpart` in a thread listing.
pub fn thread_with<'a>(threads: &'a [Value], counterpart: &TestUser) -> Option<&'a Value> {
    let id = counterpart.user_id.to_string();
    threads.iter().find(|t| t["counterpartId"] == id.as_str())
}
