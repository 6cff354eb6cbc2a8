#![allow(
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    reason = "Do not need additional syntax for setting up tests, and https://github.com/rust-lang/rust-clippy/issues/13981"
)]
#![allow(
    unused,
    reason = "Each test crate only uses part of these helpers"
)]

use aerodb_client_sdk::auth::types::SignInRequest;
use aerodb_client_sdk::{Client, Config};
use httpmock::{Method::POST, MockServer};
use reqwest::StatusCode;
use serde_json::{Value, json};

pub const API_KEY: &str = "anon-key";
pub const ACCESS_TOKEN: &str = "access-token-1";
pub const REFRESH_TOKEN: &str = "refresh-token-1";
pub const EMAIL: &str = "ada@example.com";
pub const PASSWORD: &str = "correct horse battery staple";
pub const USER_ID: &str = "8d0fd2b3-9ca7-4cfc-9c26-6f4b5e1c2a10";

pub const BEARER: &str = "Bearer access-token-1";

pub fn client(server: &MockServer) -> Client {
    let config = Config::builder().api_key(API_KEY).build();
    Client::new(&server.base_url(), config).unwrap()
}

pub fn user_json() -> Value {
    json!({
        "id": USER_ID,
        "email": EMAIL,
        "email_verified": true,
        "created_at": "2024-03-01T12:00:00Z"
    })
}

pub fn auth_response_json() -> Value {
    json!({
        "user": user_json(),
        "access_token": ACCESS_TOKEN,
        "refresh_token": REFRESH_TOKEN,
        "expires_in": 3600,
        "token_type": "bearer"
    })
}

/// Signs `client` in against a one-off `/auth/login` mock.
pub async fn sign_in(server: &MockServer, client: &Client) -> anyhow::Result<()> {
    let mock = server.mock(|when, then| {
        when.method(POST).path("/auth/login");
        then.status(StatusCode::OK).json_body(auth_response_json());
    });

    let request = SignInRequest::builder()
        .email(EMAIL)
        .password(PASSWORD)
        .build();
    client.auth().sign_in(&request).await?;

    mock.assert();
    Ok(())
}
