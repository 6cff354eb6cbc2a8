#![cfg(feature = "database")]
#![allow(clippy::unwrap_used, reason = "tests can panic on unwrap")]

mod common;

mod select {
    use aerodb_client_sdk::database::{Direction, FilterOperator, Nulls};
    use aerodb_client_sdk::types::Row;
    use httpmock::{Method::GET, MockServer};
    use reqwest::StatusCode;
    use serde::Deserialize;
    use serde_json::json;

    use crate::common::{API_KEY, BEARER, client, sign_in};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Post {
        id: i64,
        title: String,
    }

    #[tokio::test]
    async fn execute_should_send_filters_and_modifiers() -> anyhow::Result<()> {
        let server = MockServer::start();
        let client = client(&server);

        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/rest/v1/posts")
                .header("apikey", API_KEY)
                .query_param("select", "id,title")
                .query_param("published", "eq.true")
                .query_param("title", "ilike.%rust%")
                .query_param("author_id", "in.(1,2,3)")
                .query_param("order", "created_at.desc.nullslast,id.asc")
                .query_param("limit", "10")
                .query_param("offset", "20");
            then.status(StatusCode::OK).json_body(json!([
                { "id": 1, "title": "Rust in production" },
                { "id": 2, "title": "Why rust" }
            ]));
        });

        let rows = client
            .table("posts")
            .select("id,title")
            .eq("published", true)
            .ilike("title", "%rust%")
            .in_values("author_id", [1, 2, 3])
            .order_with_nulls("created_at", Direction::Desc, Nulls::Last)
            .order("id", Direction::Asc)
            .limit(10)
            .offset(20)
            .execute()
            .await?;

        mock.assert();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("title"), Some(&json!("Rust in production")));

        Ok(())
    }

    #[tokio::test]
    async fn returning_should_decode_typed_rows() -> anyhow::Result<()> {
        let server = MockServer::start();
        let client = client(&server);

        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/rest/v1/posts")
                .query_param("select", "*")
                .query_param("id", "gte.5");
            then.status(StatusCode::OK)
                .json_body(json!([{ "id": 5, "title": "Ownership" }]));
        });

        let posts = client
            .table("posts")
            .gte("id", 5)
            .returning::<Post>()
            .execute()
            .await?;

        mock.assert();
        assert_eq!(
            posts,
            vec![Post {
                id: 5,
                title: "Ownership".to_owned()
            }]
        );

        Ok(())
    }

    #[tokio::test]
    async fn signed_in_query_should_carry_bearer_token() -> anyhow::Result<()> {
        let server = MockServer::start();
        let client = client(&server);
        sign_in(&server, &client).await?;

        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/rest/v1/notes")
                .header("authorization", BEARER)
                .query_param("owner", "eq.null")
                .query_param("rank", "neq.3");
            then.status(StatusCode::OK).json_body(json!([]));
        });

        let rows: Vec<Row> = client
            .table("notes")
            .eq("owner", serde_json::Value::Null)
            .filter("rank", FilterOperator::Neq, 3)
            .execute()
            .await?;

        mock.assert();
        assert!(rows.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn non_public_schema_should_send_accept_profile() -> anyhow::Result<()> {
        let server = MockServer::start();
        let config = aerodb_client_sdk::Config::builder()
            .api_key(API_KEY)
            .schema("analytics")
            .build();
        let client = aerodb_client_sdk::Client::new(&server.base_url(), config)?;

        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/rest/v1/events")
                .header("accept-profile", "analytics");
            then.status(StatusCode::OK).json_body(json!([]));
        });

        client.table("events").execute().await?;

        mock.assert();

        Ok(())
    }
}

mod write {
    use aerodb_client_sdk::error::{Kind, Status};
    use httpmock::Method::{DELETE, PATCH, POST};
    use httpmock::MockServer;
    use reqwest::StatusCode;
    use serde_json::json;

    use crate::common::client;

    #[tokio::test]
    async fn insert_should_post_body_and_request_representation() -> anyhow::Result<()> {
        let server = MockServer::start();
        let client = client(&server);

        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/rest/v1/posts")
                .header("prefer", "return=representation")
                .json_body(json!({ "title": "Hello" }));
            then.status(StatusCode::CREATED)
                .json_body(json!([{ "id": 7, "title": "Hello" }]));
        });

        let rows = client
            .table("posts")
            .insert(&json!({ "title": "Hello" }))
            .await?;

        mock.assert();
        assert_eq!(rows[0].get("id"), Some(&json!(7)));

        Ok(())
    }

    #[tokio::test]
    async fn update_should_patch_matching_rows() -> anyhow::Result<()> {
        let server = MockServer::start();
        let client = client(&server);

        let mock = server.mock(|when, then| {
            when.method(PATCH)
                .path("/rest/v1/posts")
                .query_param("id", "eq.7")
                .header("prefer", "return=representation")
                .json_body(json!({ "published": true }));
            then.status(StatusCode::OK)
                .json_body(json!([{ "id": 7, "published": true }]));
        });

        let rows = client
            .table("posts")
            .eq("id", 7)
            .update(&json!({ "published": true }))
            .await?;

        mock.assert();
        assert_eq!(rows.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn delete_should_send_filters() -> anyhow::Result<()> {
        let server = MockServer::start();
        let client = client(&server);

        let mock = server.mock(|when, then| {
            when.method(DELETE)
                .path("/rest/v1/posts")
                .query_param("created_at", "lt.2024-01-01");
            then.status(StatusCode::OK)
                .json_body(json!([{ "id": 1 }, { "id": 2 }]));
        });

        let rows = client
            .table("posts")
            .lt("created_at", "2024-01-01")
            .delete()
            .await?;

        mock.assert();
        assert_eq!(rows.len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn write_with_non_public_schema_should_send_content_profile() -> anyhow::Result<()> {
        let server = MockServer::start();
        let config = aerodb_client_sdk::Config::builder().schema("audit").build();
        let client = aerodb_client_sdk::Client::new(&server.base_url(), config)?;

        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/rest/v1/log")
                .header("accept-profile", "audit")
                .header("content-profile", "audit");
            then.status(StatusCode::CREATED).json_body(json!([]));
        });

        client.table("log").insert(&json!([{ "line": "x" }])).await?;

        mock.assert();

        Ok(())
    }

    #[tokio::test]
    async fn constraint_violation_should_map_to_status_error() -> anyhow::Result<()> {
        let server = MockServer::start();
        let client = client(&server);

        server.mock(|when, then| {
            when.method(POST).path("/rest/v1/posts");
            then.status(StatusCode::CONFLICT).json_body(json!({
                "message": "duplicate key value violates unique constraint",
                "code": "23505"
            }));
        });

        let err = client
            .table("posts")
            .insert(&json!({ "id": 1 }))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), Kind::Status);
        let status = err.downcast_ref::<Status>().unwrap();
        assert_eq!(status.status_code, StatusCode::CONFLICT);
        assert_eq!(
            status.message,
            "duplicate key value violates unique constraint"
        );
        assert_eq!(status.code.as_deref(), Some("23505"));

        Ok(())
    }
}
