#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use ptcao_portal::config::{Config, SecurityConfig, SessionStoreKind};
use ptcao_portal::web::{self, AppState};
use tower::ServiceExt;

pub const ADMIN_EMAIL: &str = "admin@ptcao.gov.ph";
pub const ADMIN_PASSWORD: &str = "Admin@1234";
pub const TOKEN_COOKIE: &str = "access_token_cookie";

pub fn test_config() -> Config {
    let mut config = Config::default();
    let db_path = std::env::temp_dir().join(format!("ptcao-test-{}.db", uuid::Uuid::new_v4()));
    config.general.database_url = format!("sqlite:{}?mode=rwc", db_path.display());
    config.server.secure_cookies = false;
    config.security = SecurityConfig {
        argon2_memory_cost_kib: 1024,
        argon2_time_cost: 1,
        argon2_parallelism: 1,
    };
    config
}

pub async fn spawn_app() -> TestClient {
    spawn_app_with(test_config()).await
}

pub async fn spawn_app_with_sqlite_sessions() -> TestClient {
    let mut config = test_config();
    config.session.store = SessionStoreKind::Sqlite;
    spawn_app_with(config).await
}

pub async fn spawn_app_with(config: Config) -> TestClient {
    let state = web::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    let router = web::router(state.clone());

    TestClient {
        router,
        state,
        cookies: HashMap::new(),
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    pub fn set_cookies(&self) -> Vec<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect()
    }
}

/// Drives the router like a browser: keeps cookies between requests.
pub struct TestClient {
    pub router: Router,
    pub state: Arc<AppState>,
    pub cookies: HashMap<String, String>,
}

impl TestClient {
    pub async fn get(&mut self, uri: &str) -> TestResponse {
        let request = self
            .with_cookies(Request::builder().uri(uri))
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn post_form(&mut self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = fields
            .iter()
            .map(|(k, v)| format!("{k}={}", v.replace('+', "%2B").replace(' ', "+")))
            .collect::<Vec<_>>()
            .join("&");

        let request = self
            .with_cookies(Request::builder().method("POST").uri(uri))
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    pub async fn login(&mut self, email: &str, password: &str) -> TestResponse {
        self.post_form("/login", &[("email", email), ("password", password)])
            .await
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    fn with_cookies(&self, builder: axum::http::request::Builder) -> axum::http::request::Builder {
        if self.cookies.is_empty() {
            return builder;
        }
        let header_value = self
            .cookies
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("; ");
        builder.header(header::COOKIE, header_value)
    }

    async fn send(&mut self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();

        let response = TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        };

        for set_cookie in response.set_cookies() {
            self.store_cookie(&set_cookie);
        }

        response
    }

    fn store_cookie(&mut self, set_cookie: &str) {
        let mut parts = set_cookie.split(';');
        let Some((name, value)) = parts.next().and_then(|pair| pair.trim().split_once('=')) else {
            return;
        };

        let expired = parts.any(|attr| attr.trim().eq_ignore_ascii_case("Max-Age=0"));
        if value.is_empty() || expired {
            self.cookies.remove(name);
        } else {
            self.cookies.insert(name.to_string(), value.to_string());
        }
    }
}

pub fn registration_form<'a>(email: &'a str, username: &'a str) -> Vec<(&'a str, &'a str)> {
    vec![
        ("full_name", "Juan Dela Cruz"),
        ("municipality", "Taal"),
        ("id_number", "MTO-0042"),
        ("designation", "mto"),
        ("email", email),
        ("gender", "Male"),
        ("birthday", "1990-05-17"),
        ("username", username),
        ("password", "Secret123"),
    ]
}
