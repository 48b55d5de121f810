#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result, anyhow};
use axum::http::header::SET_COOKIE;
use axum_test::{TestResponse, TestServer};
use clipcast_core::{
    auth::AuthCrypto,
    store::{DocumentStore, MemoryStore},
};
use clipcast_server::{
    create_app,
    infra::{
        app_state::AppState,
        config::{
            AuthConfig, Config, ConfigMetadata, CookieConfig, CorsConfig, DatabaseConfig,
            ServerConfig,
        },
    },
};
use serde_json::{Value, json};

pub const PASSWORD: &str = "correct horse battery";

pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
        },
        database: DatabaseConfig {
            url: None,
            max_connections: 1,
        },
        auth: AuthConfig {
            access_secret: "test-access-secret".into(),
            refresh_secret: "test-refresh-secret".into(),
            password_pepper: "test-pepper".into(),
            token_key: "test-token-key".into(),
            access_ttl: Duration::from_secs(15 * 60),
            refresh_ttl: Duration::from_secs(24 * 60 * 60),
        },
        cookies: CookieConfig { secure: true },
        cors: CorsConfig {
            allowed_origins: vec!["http://localhost:5173".into()],
        },
        dev_mode: false,
        metadata: ConfigMetadata::default(),
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
}

pub fn build_test_state() -> Result<AppState> {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let config = test_config();
    let crypto = AuthCrypto::insecure_fast(&config.auth.password_pepper, &config.auth.token_key)
        .context("failed to build test crypto")?;
    AppState::with_crypto(Arc::new(config), store, Arc::new(crypto))
}

pub fn build_test_app() -> Result<TestApp> {
    let state = build_test_state()?;
    let server = TestServer::new(create_app(state.clone()))
        .map_err(|err| anyhow!(err.to_string()))?;
    Ok(TestApp { server, state })
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Value of a `Set-Cookie` header for `name`, if the response set one.
pub fn set_cookie(response: &TestResponse, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|header| {
            header
                .strip_prefix(&prefix)
                .map(|rest| rest.split(';').next().unwrap_or_default().to_string())
        })
}

/// Raw `Set-Cookie` header for `name`, attributes included.
pub fn set_cookie_header(response: &TestResponse, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|header| header.starts_with(&prefix))
        .map(str::to_string)
}

/// Register `handle` and return the public account.
pub async fn register(server: &TestServer, handle: &str) -> Value {
    let response = server
        .post("/api/v1/users")
        .json(&json!({
            "displayName": format!("{handle} display"),
            "email": format!("{handle}@example.com"),
            "handle": handle,
            "password": PASSWORD,
            "avatar": format!("https://cdn.example.com/{handle}.png"),
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()["data"].clone()
}

#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub access: String,
    pub refresh: String,
}

pub async fn login(server: &TestServer, handle: &str) -> Session {
    let response = server
        .post("/api/v1/session/login")
        .json(&json!({ "handle": handle, "password": PASSWORD }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    Session {
        user_id: body["data"]["user"]["_id"]
            .as_str()
            .expect("user id in login response")
            .to_string(),
        access: body["data"]["accessToken"]
            .as_str()
            .expect("access token in login response")
            .to_string(),
        refresh: body["data"]["refreshToken"]
            .as_str()
            .expect("refresh token in login response")
            .to_string(),
    }
}

/// Register then log in.
pub async fn signed_up(server: &TestServer, handle: &str) -> Session {
    register(server, handle).await;
    login(server, handle).await
}

pub async fn create_video(server: &TestServer, session: &Session, title: &str) -> String {
    let response = server
        .post("/api/v1/videos")
        .add_header("Authorization", bearer(&session.access))
        .json(&json!({
            "title": title,
            "description": format!("{title} description"),
            "videoFile": format!("https://cdn.example.com/{title}.mp4"),
            "thumbnail": format!("https://cdn.example.com/{title}.jpg"),
            "duration": 42.0,
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()["data"]["_id"]
        .as_str()
        .expect("video id")
        .to_string()
}
