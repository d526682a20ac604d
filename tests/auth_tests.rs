mod common;

use axum::http::StatusCode;
use ptcao_portal::services::AuthService;
use common::{ADMIN_EMAIL, ADMIN_PASSWORD, TOKEN_COOKIE, registration_form, spawn_app};

#[tokio::test]
async fn test_builtin_admin_login_and_logout() {
    let mut client = spawn_app().await;

    let response = client.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/admin/dashboard"));

    let token_cookie = response
        .set_cookies()
        .into_iter()
        .find(|c| c.starts_with(TOKEN_COOKIE))
        .expect("token cookie set");
    assert!(token_cookie.contains("HttpOnly"));
    assert!(!token_cookie.contains("Max-Age"));
    assert!(client.cookie("id").is_some());

    let response = client.get("/admin/dashboard").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Administrator"));
    assert!(response.body.contains("admin"));

    let response = client.get("/logout").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/"));
    assert!(client.cookie(TOKEN_COOKIE).is_none());

    let response = client.get("/admin/dashboard").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/"));

    let response = client.get("/").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("You have been logged out successfully"));
    assert!(response.body.contains("Please log in to continue"));
}

#[tokio::test]
async fn test_login_is_case_insensitive_on_email() {
    let mut client = spawn_app().await;

    let response = client.login("  ADMIN@ptcao.gov.ph ", ADMIN_PASSWORD).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/admin/dashboard"));
}

#[tokio::test]
async fn test_wrong_password_leaves_session_anonymous() {
    let mut client = spawn_app().await;

    let response = client.login(ADMIN_EMAIL, "not-the-password").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.body.contains("Invalid email or password"));
    assert!(client.cookie(TOKEN_COOKIE).is_none());

    let response = client.login("nobody@example.com", ADMIN_PASSWORD).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.body.contains("Invalid email or password"));

    let response = client.get("/admin/dashboard").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_login_missing_fields() {
    let mut client = spawn_app().await;

    let response = client.login("", "").await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains("Email and password are required"));

    let response = client.post_form("/login", &[("email", ADMIN_EMAIL)]).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_registration_requires_approval() {
    let mut client = spawn_app().await;
    let email = "juan@taal.gov.ph";

    let response = client
        .post_form("/register", &registration_form(email, "juan"))
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/"));

    let response = client.get("/").await;
    assert!(
        response
            .body
            .contains("Registration successful! Please wait for admin approval.")
    );

    let response = client.login(email, "Secret123").await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert!(response.body.contains("Your account is not active"));
    assert!(client.cookie(TOKEN_COOKIE).is_none());

    let activated = client.state.store().set_user_active(email, true).await.unwrap();
    assert!(activated);

    let response = client.login(email, "Secret123").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/mto/dashboard"));

    let response = client.get("/mto/dashboard").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Municipal Tourism Office"));
    assert!(response.body.contains("Taal"));

    let response = client.get("/admin/dashboard").await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_duplicate_registration() {
    let mut client = spawn_app().await;

    let response = client
        .post_form("/register", &registration_form("dup@taal.gov.ph", "first"))
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);

    let response = client
        .post_form("/register", &registration_form("DUP@taal.gov.ph", "second"))
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert!(response.body.contains("Email already registered"));

    let response = client
        .post_form("/register", &registration_form("other@taal.gov.ph", "first"))
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert!(response.body.contains("Username already taken"));

    let response = client
        .post_form("/register", &registration_form(ADMIN_EMAIL, "third"))
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);

    let users = client.state.store().list_users(false).await.unwrap();
    assert_eq!(users.len(), 1);
}

#[tokio::test]
async fn test_invalid_registration_inserts_nothing() {
    let mut client = spawn_app().await;

    let mut form = registration_form("bad@taal.gov.ph", "bad");
    form[6] = ("birthday", "17/05/1990");
    let response = client.post_form("/register", &form).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains("Birthday must be a valid date"));

    let mut form = registration_form("blank@taal.gov.ph", "blank");
    form[2] = ("id_number", "   ");
    let response = client.post_form("/register", &form).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains("All fields are required"));

    let users = client.state.store().list_users(false).await.unwrap();
    assert!(users.is_empty());
}

#[tokio::test]
async fn test_logout_without_session() {
    let mut client = spawn_app().await;

    let response = client.get("/logout").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/"));

    let cleared = response
        .set_cookies()
        .into_iter()
        .find(|c| c.starts_with(TOKEN_COOKIE))
        .expect("token cookie cleared");
    assert!(cleared.starts_with("access_token_cookie=;"));
}

#[tokio::test]
async fn test_tampered_token_ends_session() {
    let mut client = spawn_app().await;

    let response = client.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);

    client
        .cookies
        .insert(TOKEN_COOKIE.to_string(), "not.a.token".to_string());

    let response = client.get("/admin/dashboard").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/"));
    assert!(client.cookie(TOKEN_COOKIE).is_none());

    let response = client.get("/admin/dashboard").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);

    let response = client.get("/").await;
    assert!(response.body.contains("Your session has expired"));
}

#[tokio::test]
async fn test_token_for_other_user_is_rejected() {
    let mut client = spawn_app().await;

    let foreign = client
        .state
        .auth()
        .login("ptcao@ptcao.gov.ph", "Ptcao@1234")
        .await
        .unwrap()
        .token;

    let response = client.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);

    client.cookies.insert(TOKEN_COOKIE.to_string(), foreign);

    let response = client.get("/admin/dashboard").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/"));
}

#[tokio::test]
async fn test_role_mismatch_is_forbidden() {
    let mut client = spawn_app().await;

    client.login("ptcao@ptcao.gov.ph", "Ptcao@1234").await;

    let response = client.get("/ptcao/dashboard").await;
    assert_eq!(response.status, StatusCode::OK);

    for path in ["/admin/dashboard", "/mto/dashboard"] {
        let response = client.get(path).await;
        assert_eq!(response.status, StatusCode::FORBIDDEN, "{path}");
    }
}
