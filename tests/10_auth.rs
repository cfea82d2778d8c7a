mod common;

use anyhow::Result;
use reqwest::{header::AUTHORIZATION, StatusCode};
use serde_json::{json, Value};

use common::{TestServer, PASSWORD};

#[tokio::test]
async fn register_returns_created_account_without_hash() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server
        .post("/auth/register")
        .json(&json!({
            "email": "alice@example.com",
            "password": PASSWORD,
            "display_name": "Alice",
            "phone": "+44 20 7946 0000"
        }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::CREATED);
    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["email"], "alice@example.com");
    assert_eq!(body["data"]["role"], "USER");
    assert!(body["data"].get("password_hash").is_none(), "hash leaked: {}", body);

    Ok(())
}

#[tokio::test]
async fn register_reports_field_errors() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server
        .post("/auth/register")
        .json(&json!({ "email": "not-an-email", "password": "short", "display_name": "" }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"]["email"].is_string());
    assert!(body["field_errors"]["password"].is_string());
    assert!(body["field_errors"]["display_name"].is_string());

    Ok(())
}

#[tokio::test]
async fn duplicate_registration_conflicts() -> Result<()> {
    let server = TestServer::spawn().await?;
    server.register("bob@example.com").await?;

    let res = server
        .post("/auth/register")
        .json(&json!({ "email": "bob@example.com", "password": PASSWORD, "display_name": "Bob" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    Ok(())
}

#[tokio::test]
async fn login_returns_bearer_token_in_body_and_header() -> Result<()> {
    let server = TestServer::spawn().await?;
    server.register("carol@example.com").await?;

    let res = server
        .post("/auth/login")
        .json(&json!({ "email": "carol@example.com", "password": PASSWORD }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::OK);
    let header = res
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let body = res.json::<Value>().await?;

    let token = body["data"]["token"].as_str().unwrap_or_default();
    assert!(token.starts_with("Bearer "), "unexpected token: {}", token);
    assert_eq!(header.as_deref(), Some(token));
    assert_eq!(body["data"]["expires_in"], 3600);
    assert_eq!(body["data"]["account"]["email"], "carol@example.com");

    // the token names the account email as its subject
    let raw = token.trim_start_matches("Bearer ");
    assert_eq!(server.state.tokens.extract_subject(raw)?, "carol@example.com");

    Ok(())
}

#[tokio::test]
async fn login_failures_are_indistinguishable() -> Result<()> {
    let server = TestServer::spawn().await?;
    server.register("dave@example.com").await?;

    let wrong_password = server
        .post("/auth/login")
        .json(&json!({ "email": "dave@example.com", "password": "definitely-wrong" }))
        .send()
        .await?;
    let unknown_email = server
        .post("/auth/login")
        .json(&json!({ "email": "nobody@example.com", "password": PASSWORD }))
        .send()
        .await?;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.json::<Value>().await?, unknown_email.json::<Value>().await?);

    Ok(())
}

#[tokio::test]
async fn invalid_json_is_bad_request() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server
        .post("/auth/login")
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(body["code"], "INVALID_JSON");

    Ok(())
}
