#![allow(clippy::unwrap_used, reason = "tests can panic on unwrap")]

mod common;

use aerodb_client_sdk::error::Kind;
use aerodb_client_sdk::{Client, Config};
use httpmock::Method::GET;
use httpmock::MockServer;
use reqwest::StatusCode;
use serde_json::json;

use crate::common::{API_KEY, BEARER, client, sign_in};

#[test]
fn empty_url_should_fail_validation() {
    let err = Client::new("", Config::default()).unwrap_err();

    assert_eq!(err.kind(), Kind::Validation);
    assert_eq!(err.to_string(), "Validation: invalid: url is required");
}

#[cfg(feature = "database")]
#[tokio::test]
async fn custom_headers_should_reach_every_request() -> anyhow::Result<()> {
    let server = MockServer::start();
    let config = Config::builder()
        .api_key(API_KEY)
        .headers([("x-client-info".to_owned(), "aerodb-rs-tests".to_owned())].into())
        .build();
    let client = Client::new(&server.base_url(), config)?;

    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/rest/v1/posts")
            .header("x-client-info", "aerodb-rs-tests")
            .header("apikey", API_KEY);
        then.status(StatusCode::OK).json_body(json!([]));
    });

    client.table("posts").execute().await?;

    mock.assert();

    Ok(())
}

#[cfg(all(feature = "database", feature = "storage"))]
#[tokio::test]
async fn sign_in_and_sign_out_should_apply_to_every_surface() -> anyhow::Result<()> {
    let server = MockServer::start();
    let client = client(&server);
    sign_in(&server, &client).await?;

    let authorized_rows = server.mock(|when, then| {
        when.method(GET)
            .path("/rest/v1/posts")
            .header("authorization", BEARER);
        then.status(StatusCode::OK).json_body(json!([]));
    });
    let authorized_list = server.mock(|when, then| {
        when.method(GET)
            .path("/storage/v1/object/list/avatars")
            .header("authorization", BEARER);
        then.status(StatusCode::OK).json_body(json!([]));
    });

    client.table("posts").execute().await?;
    client
        .storage()
        .bucket("avatars")
        .list(&aerodb_client_sdk::storage::types::ListOptions::default())
        .await?;

    authorized_rows.assert();
    authorized_list.assert();

    server.mock(|when, then| {
        when.method(httpmock::Method::POST).path("/auth/logout");
        then.status(StatusCode::NO_CONTENT);
    });
    client.auth().sign_out().await?;

    let anonymous_rows = server.mock(|when, then| {
        when.method(GET)
            .path("/rest/v1/comments")
            .header_missing("authorization");
        then.status(StatusCode::OK).json_body(json!([]));
    });

    client.table("comments").execute().await?;

    anonymous_rows.assert();

    Ok(())
}
