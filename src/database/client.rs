use std::fmt;
use std::marker::PhantomData;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Method, Request};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use super::types::{Direction, Filter, FilterOperator, Nulls, Order, render_list, render_value};
use crate::Result;
use crate::auth::RequestAuth;
use crate::types::Row;

pub(crate) const DEFAULT_SCHEMA: &str = "public";
const ACCEPT_PROFILE: &str = "accept-profile";
const CONTENT_PROFILE: &str = "content-profile";
const PREFER: &str = "prefer";

/// Client for the AeroDB REST endpoint (`{url}/rest/v1/`).
///
/// Every query starts from [`Client::table`]. Nothing is sent until one of the
/// [`QueryBuilder`] terminal methods is awaited.
#[derive(Clone, Debug)]
pub struct Client {
    host: Url,
    client: ReqwestClient,
    auth: RequestAuth,
    schema: String,
}

impl Client {
    pub(crate) fn new(host: Url, client: ReqwestClient, auth: RequestAuth, schema: String) -> Self {
        Self {
            host,
            client,
            auth,
            schema,
        }
    }

    /// Returns the host URL for the client.
    #[must_use]
    pub fn host(&self) -> &Url {
        &self.host
    }

    #[must_use]
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Starts a query against `table`, returning rows as loosely typed [`Row`]s.
    ///
    /// Use [`QueryBuilder::returning`] to decode rows into your own type instead.
    pub fn table<N: Into<String>>(&self, table: N) -> QueryBuilder<Row> {
        QueryBuilder {
            client: self.clone(),
            table: table.into(),
            select: "*".to_owned(),
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
            row: PhantomData,
        }
    }

    fn headers(&self, write: bool) -> Result<HeaderMap> {
        let mut headers = self.auth.headers()?;

        if self.schema != DEFAULT_SCHEMA {
            let schema = HeaderValue::from_str(&self.schema)?;
            headers.insert(ACCEPT_PROFILE, schema.clone());
            if write {
                headers.insert(CONTENT_PROFILE, schema);
            }
        }
        if write {
            headers.insert(PREFER, HeaderValue::from_static("return=representation"));
        }

        Ok(headers)
    }
}

/// A lazily built query on a single table.
///
/// Filters, ordering and pagination are rendered into the query string in the order
/// `select`, filters, `order`, `limit`, `offset`.
///
/// # Example
///
/// ```no_run
/// use aerodb_client_sdk::{Client, Config};
/// use aerodb_client_sdk::database::Direction;
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize)]
/// struct Post {
///     id: i64,
///     title: String,
/// }
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Client::new("https://project.aerodb.dev", Config::default())?;
///
/// let posts: Vec<Post> = client
///     .table("posts")
///     .select("id,title")
///     .eq("status", "published")
///     .in_values("author_id", [1, 2, 3])
///     .order("created_at", Direction::Desc)
///     .limit(10)
///     .returning::<Post>()
///     .execute()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[must_use]
pub struct QueryBuilder<T = Row> {
    client: Client,
    table: String,
    select: String,
    filters: Vec<Filter>,
    order: Vec<Order>,
    limit: Option<u64>,
    offset: Option<u64>,
    row: PhantomData<fn() -> T>,
}

impl<T> QueryBuilder<T> {
    /// Columns to return, e.g. `id,title`. Defaults to `*`.
    pub fn select<S: Into<String>>(mut self, columns: S) -> Self {
        self.select = columns.into();
        self
    }

    /// Adds a `column=<operator>.<value>` filter.
    pub fn filter<C, V>(mut self, column: C, operator: FilterOperator, value: V) -> Self
    where
        C: Into<String>,
        V: Into<Value>,
    {
        self.filters.push(Filter {
            column: column.into(),
            operator,
            value: render_value(&value.into()),
        });
        self
    }

    pub fn eq<C: Into<String>, V: Into<Value>>(self, column: C, value: V) -> Self {
        self.filter(column, FilterOperator::Eq, value)
    }

    pub fn neq<C: Into<String>, V: Into<Value>>(self, column: C, value: V) -> Self {
        self.filter(column, FilterOperator::Neq, value)
    }

    pub fn gt<C: Into<String>, V: Into<Value>>(self, column: C, value: V) -> Self {
        self.filter(column, FilterOperator::Gt, value)
    }

    pub fn gte<C: Into<String>, V: Into<Value>>(self, column: C, value: V) -> Self {
        self.filter(column, FilterOperator::Gte, value)
    }

    pub fn lt<C: Into<String>, V: Into<Value>>(self, column: C, value: V) -> Self {
        self.filter(column, FilterOperator::Lt, value)
    }

    pub fn lte<C: Into<String>, V: Into<Value>>(self, column: C, value: V) -> Self {
        self.filter(column, FilterOperator::Lte, value)
    }

    /// Case-sensitive pattern match; `%` is the wildcard.
    pub fn like<C: Into<String>, P: Into<String>>(self, column: C, pattern: P) -> Self {
        self.filter(column, FilterOperator::Like, pattern.into())
    }

    /// Case-insensitive pattern match; `%` is the wildcard.
    pub fn ilike<C: Into<String>, P: Into<String>>(self, column: C, pattern: P) -> Self {
        self.filter(column, FilterOperator::Ilike, pattern.into())
    }

    /// Matches rows whose `column` is one of `values`, rendered as `in.(a,b,c)`.
    pub fn in_values<C, I, V>(mut self, column: C, values: I) -> Self
    where
        C: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.filters.push(Filter {
            column: column.into(),
            operator: FilterOperator::In,
            value: render_list(&values),
        });
        self
    }

    pub fn order<C: Into<String>>(mut self, column: C, direction: Direction) -> Self {
        self.order.push(Order {
            column: column.into(),
            direction,
            nulls: None,
        });
        self
    }

    pub fn order_with_nulls<C: Into<String>>(
        mut self,
        column: C,
        direction: Direction,
        nulls: Nulls,
    ) -> Self {
        self.order.push(Order {
            column: column.into(),
            direction,
            nulls: Some(nulls),
        });
        self
    }

    pub fn limit(mut self, count: u64) -> Self {
        self.limit = Some(count);
        self
    }

    pub fn offset(mut self, count: u64) -> Self {
        self.offset = Some(count);
        self
    }

    /// Decodes result rows as `U` instead of `T`.
    pub fn returning<U>(self) -> QueryBuilder<U> {
        QueryBuilder {
            client: self.client,
            table: self.table,
            select: self.select,
            filters: self.filters,
            order: self.order,
            limit: self.limit,
            offset: self.offset,
            row: PhantomData,
        }
    }

    /// Query parameters in wire order.
    pub(crate) fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.filters.len() + 4);

        if !self.select.is_empty() {
            pairs.push(("select".to_owned(), self.select.clone()));
        }
        for filter in &self.filters {
            pairs.push((
                filter.column.clone(),
                format!("{}.{}", filter.operator, filter.value),
            ));
        }
        if !self.order.is_empty() {
            let order: Vec<String> = self.order.iter().map(Order::render).collect();
            pairs.push(("order".to_owned(), order.join(",")));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_owned(), limit.to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset".to_owned(), offset.to_string()));
        }

        pairs
    }

    fn url(&self, with_query: bool) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{}", self.client.host, self.table))?;
        if with_query {
            url.query_pairs_mut().extend_pairs(self.query_pairs());
        }
        Ok(url)
    }

    fn build<B: Serialize + ?Sized>(
        &self,
        method: Method,
        with_query: bool,
        body: Option<&B>,
    ) -> Result<Request> {
        let write = method != Method::GET;
        let mut request = self
            .client
            .client
            .request(method, self.url(with_query)?)
            .headers(self.client.headers(write)?);
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.build()?)
    }
}

impl<T: DeserializeOwned> QueryBuilder<T> {
    /// Runs the query as a `GET` and returns the matching rows.
    pub async fn execute(&self) -> Result<Vec<T>> {
        let request = self.build::<()>(Method::GET, true, None)?;
        crate::request(&self.client.client, request).await
    }

    /// Inserts `rows` (a single object or an array) and returns the created rows.
    pub async fn insert<B: Serialize + ?Sized>(&self, rows: &B) -> Result<Vec<T>> {
        let request = self.build(Method::POST, false, Some(rows))?;
        crate::request(&self.client.client, request).await
    }

    /// Applies `changes` to every row matching the filters and returns the updated rows.
    pub async fn update<B: Serialize + ?Sized>(&self, changes: &B) -> Result<Vec<T>> {
        let request = self.build(Method::PATCH, true, Some(changes))?;
        crate::request(&self.client.client, request).await
    }

    /// Deletes every row matching the filters and returns the deleted rows.
    pub async fn delete(&self) -> Result<Vec<T>> {
        let request = self.build::<()>(Method::DELETE, true, None)?;
        crate::request(&self.client.client, request).await
    }
}

impl<T> fmt::Debug for QueryBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("table", &self.table)
            .field("query", &self.query_pairs())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;

    fn client(schema: &str) -> Client {
        Client::new(
            Url::parse("http://localhost:8000/rest/v1/").expect("valid url"),
            ReqwestClient::new(),
            RequestAuth::new(None, Arc::new(None::<String>)),
            schema.to_owned(),
        )
    }

    #[test]
    fn query_should_render_in_wire_order() {
        let query = client(DEFAULT_SCHEMA)
            .table("posts")
            .offset(20)
            .limit(10)
            .order_with_nulls("score", Direction::Desc, Nulls::First)
            .order("id", Direction::Asc)
            .eq("status", "published")
            .in_values("author_id", [json!(1), json!("two"), Value::Null])
            .neq("deleted_at", Value::Null)
            .select("id,title");

        let rendered = query.query_pairs();

        assert_eq!(
            rendered,
            vec![
                ("select".to_owned(), "id,title".to_owned()),
                ("status".to_owned(), "eq.published".to_owned()),
                ("author_id".to_owned(), "in.(1,two,null)".to_owned()),
                ("deleted_at".to_owned(), "neq.null".to_owned()),
                ("order".to_owned(), "score.desc.nullsfirst,id.asc".to_owned()),
                ("limit".to_owned(), "10".to_owned()),
                ("offset".to_owned(), "20".to_owned()),
            ]
        );
    }

    #[test]
    fn default_query_selects_everything() {
        let query = client(DEFAULT_SCHEMA).table("posts");

        assert_eq!(
            query.query_pairs(),
            vec![("select".to_owned(), "*".to_owned())]
        );
    }

    #[test]
    fn query_url_should_be_encoded() {
        let query = client(DEFAULT_SCHEMA)
            .table("posts")
            .ilike("title", "%rust lang%");

        let url = query.url(true).expect("url should build");

        assert_eq!(
            url.as_str(),
            "http://localhost:8000/rest/v1/posts?select=*&title=ilike.%25rust+lang%25"
        );
    }

    #[test]
    fn custom_schema_sets_profile_headers() {
        let client = client("analytics");

        let read = client.headers(false).expect("headers should build");
        let write = client.headers(true).expect("headers should build");

        assert_eq!(read[ACCEPT_PROFILE], "analytics");
        assert!(read.get(CONTENT_PROFILE).is_none(), "reads send no Content-Profile");
        assert!(read.get(PREFER).is_none(), "reads send no Prefer");
        assert_eq!(write[CONTENT_PROFILE], "analytics");
        assert_eq!(write[PREFER], "return=representation");
    }

    #[test]
    fn public_schema_sends_no_profile_headers() {
        let headers = client(DEFAULT_SCHEMA)
            .headers(true)
            .expect("headers should build");

        assert!(headers.get(ACCEPT_PROFILE).is_none(), "public needs no profile");
        assert_eq!(headers[PREFER], "return=representation");
    }
}
