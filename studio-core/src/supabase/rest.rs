use std::fmt::Display;

use reqwest::{header, Client, Method, RequestBuilder};
use secrecy::{ExposeSecret, Secret};
use serde::{de::DeserializeOwned, Serialize};

use super::{read_body, send, SupabaseError, SupabaseSettings};

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";
const RETURN_REPRESENTATION: &str = "return=representation";
const RETURN_MINIMAL: &str = "return=minimal";

/// PostgREST query-string builder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.pairs.push(("select".to_string(), columns.to_string()));
        self
    }

    pub fn eq(mut self, column: &str, value: impl Display) -> Self {
        self.pairs.push((column.to_string(), format!("eq.{value}")));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.pairs
            .push(("order".to_string(), format!("{column}.{direction}")));
        self
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }
}

/// Table access through `<url>/rest/v1`. Every call takes an optional user
/// access token; without one the anon key is sent as the bearer.
#[derive(Clone)]
pub struct RestClient {
    client: Client,
    base_url: String,
    anon_key: Secret<String>,
}

impl RestClient {
    pub fn new(settings: &SupabaseSettings) -> Self {
        Self::with_client(Client::new(), settings)
    }

    pub fn with_client(client: Client, settings: &SupabaseSettings) -> Self {
        Self {
            client,
            base_url: format!("{}/rest/v1", settings.base_url()),
            anon_key: settings.anon_key.clone(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.base_url, table)
    }

    fn request(&self, method: Method, url: &str, query: &Query, token: Option<&str>) -> RequestBuilder {
        let anon_key = self.anon_key.expose_secret();
        self.client
            .request(method, url)
            .query(query.pairs())
            .header("apikey", anon_key.as_str())
            .bearer_auth(token.unwrap_or(anon_key.as_str()))
    }

    #[tracing::instrument(skip(self, query, token), fields(table = %table))]
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query,
        token: Option<&str>,
    ) -> Result<Vec<T>, SupabaseError> {
        let url = self.table_url(table);
        let response = send(&url, self.request(Method::GET, &url, query, token)).await?;
        let body = read_body(&url, response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Fetches exactly one row; zero rows surfaces as an error with code `PGRST116`.
    #[tracing::instrument(skip(self, query, token), fields(table = %table))]
    pub async fn select_single<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query,
        token: Option<&str>,
    ) -> Result<T, SupabaseError> {
        let url = self.table_url(table);
        let request = self
            .request(Method::GET, &url, query, token)
            .header(header::ACCEPT, SINGLE_OBJECT);
        let response = send(&url, request).await?;
        let body = read_body(&url, response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    #[tracing::instrument(skip(self, rows, token), fields(table = %table))]
    pub async fn insert<B, T>(&self, table: &str, rows: &B, token: Option<&str>) -> Result<Vec<T>, SupabaseError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.table_url(table);
        let request = self
            .request(Method::POST, &url, &Query::new(), token)
            .header("Prefer", RETURN_REPRESENTATION)
            .json(rows);
        let response = send(&url, request).await?;
        let body = read_body(&url, response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Inserts without reading the rows back, so it succeeds for roles that
    /// may write a table but not select from it.
    #[tracing::instrument(skip(self, rows, token), fields(table = %table))]
    pub async fn insert_minimal<B>(&self, table: &str, rows: &B, token: Option<&str>) -> Result<(), SupabaseError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.table_url(table);
        let request = self
            .request(Method::POST, &url, &Query::new(), token)
            .header("Prefer", RETURN_MINIMAL)
            .json(rows);
        send(&url, request).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, query, patch, token), fields(table = %table))]
    pub async fn update<B, T>(
        &self,
        table: &str,
        query: &Query,
        patch: &B,
        token: Option<&str>,
    ) -> Result<Vec<T>, SupabaseError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.table_url(table);
        let request = self
            .request(Method::PATCH, &url, query, token)
            .header("Prefer", RETURN_REPRESENTATION)
            .json(patch);
        let response = send(&url, request).await?;
        let body = read_body(&url, response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    #[tracing::instrument(skip(self, query, token), fields(table = %table))]
    pub async fn delete(&self, table: &str, query: &Query, token: Option<&str>) -> Result<(), SupabaseError> {
        let url = self.table_url(table);
        send(&url, self.request(Method::DELETE, &url, query, token)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use wiremock::matchers::{body_json, header as header_is, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> RestClient {
        RestClient::new(&SupabaseSettings {
            url: format!("{}/", server.uri()),
            anon_key: Secret::new("anon-key".to_string()),
        })
    }

    #[test]
    fn query_builds_postgrest_filters() {
        let query = Query::new()
            .select("*")
            .eq("id", "default_settings")
            .order("created_at", true);

        assert_eq!(
            query.pairs(),
            &[
                ("select".to_string(), "*".to_string()),
                ("id".to_string(), "eq.default_settings".to_string()),
                ("order".to_string(), "created_at.asc".to_string()),
            ]
        );
        assert_eq!(Query::new().order("created_at", false).pairs()[0].1, "created_at.desc");
    }

    #[tokio::test]
    async fn select_sends_anon_key_as_apikey_and_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/services"))
            .and(query_param("order", "created_at.asc"))
            .and(header_is("apikey", "anon-key"))
            .and(header_is("authorization", "Bearer anon-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "1"}])))
            .expect(1)
            .mount(&server)
            .await;

        let rows: Vec<Value> = client(&server)
            .select("services", &Query::new().select("*").order("created_at", true), None)
            .await
            .unwrap();

        assert_eq!(rows, vec![json!({"id": "1"})]);
    }

    #[tokio::test]
    async fn user_token_replaces_anon_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/receipts"))
            .and(query_param("id", "eq.42"))
            .and(header_is("apikey", "anon-key"))
            .and(header_is("authorization", "Bearer user-token"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .delete("receipts", &Query::new().eq("id", "42"), Some("user-token"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn insert_asks_for_representation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/services"))
            .and(header_is("prefer", "return=representation"))
            .and(body_json(json!({"id": "7", "name": "Drone"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([{"id": "7", "name": "Drone"}])))
            .expect(1)
            .mount(&server)
            .await;

        let rows: Vec<Value> = client(&server)
            .insert("services", &json!({"id": "7", "name": "Drone"}), None)
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn minimal_insert_does_not_read_rows_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/receipts"))
            .and(header_is("prefer", "return=minimal"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .insert_minimal("receipts", &json!([{"id": "1"}]), None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn select_single_reports_missing_row() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/settings"))
            .and(header_is("accept", SINGLE_OBJECT))
            .respond_with(ResponseTemplate::new(406).set_body_json(json!({
                "code": "PGRST116",
                "details": "The result contains 0 rows",
                "hint": null,
                "message": "JSON object requested, multiple (or no) rows returned"
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .select_single::<Value>("settings", &Query::new().eq("id", "default_settings"), None)
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn update_surfaces_backend_message() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/services"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "code": "42501",
                "details": null,
                "hint": null,
                "message": "new row violates row-level security policy for table \"services\""
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .update::<_, Value>("services", &Query::new().eq("id", "1"), &json!({"price": 1}), None)
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(401));
        assert!(err.user_message().contains("row-level security"));
    }
}
