//! ABOUTME: REST client for the profile store's user_profiles table
//! ABOUTME: One instance per pooled handle; speaks the PostgREST dialect

use crate::profiles::{ProfileChanges, UserProfile};
use halo_core::{Error, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

const TABLE: &str = "user_profiles";

/// A single store client handle. Owned by the pool; callers borrow it
/// for the duration of one scoped operation.
#[derive(Debug, Clone)]
pub struct StoreClient {
    client: Client,
    base_url: String,
    service_key: String,
}

impl StoreClient {
    /// Build a client against the store's REST endpoint.
    pub fn new(base_url: &str, service_key: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("halo/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Store(format!("Failed to build store client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, TABLE)
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    /// Single-row lookup by id. A missing row is `None`, not an error.
    pub async fn fetch_profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        debug!(user_id = %user_id, "fetching profile from store");

        let request = self.authed(self.client.get(self.table_url())).query(&[
            ("select", "*"),
            ("id", &format!("eq.{}", user_id)),
        ]);

        let rows: Vec<UserProfile> = self.execute(request, "select").await?;
        Ok(rows.into_iter().next())
    }

    /// Batched lookup: one `id in (...)` query for the whole id set.
    pub async fn fetch_profiles(&self, user_ids: &[String]) -> Result<Vec<UserProfile>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        debug!(count = user_ids.len(), "fetching profile batch from store");

        let id_list = format!("in.({})", user_ids.join(","));
        let request = self
            .authed(self.client.get(self.table_url()))
            .query(&[("select", "*"), ("id", &id_list)]);

        self.execute(request, "select").await
    }

    /// Persist changes for one row, returning the updated representation.
    /// `None` means no row matched the id.
    pub async fn update_profile(
        &self,
        user_id: &str,
        changes: &ProfileChanges,
    ) -> Result<Option<UserProfile>> {
        debug!(user_id = %user_id, "updating profile in store");

        let request = self
            .authed(self.client.patch(self.table_url()))
            .query(&[("id", &format!("eq.{}", user_id))])
            .header("Prefer", "return=representation")
            .json(changes);

        let rows: Vec<UserProfile> = self.execute(request, "update").await?;
        Ok(rows.into_iter().next())
    }

    async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        op: &str,
    ) -> Result<T> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::Store(format!("Store {} request failed: {}", op, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Store(format!(
                "Store {} returned status {}",
                op, status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Store(format!("Store {} response malformed: {}", op, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_support::profile_json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetch_profile_parses_single_row() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/user_profiles"))
            .and(query_param("id", "eq.user-1"))
            .and(header("apikey", "svc-key"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(vec![profile_json("user-1", "Ada")]),
            )
            .mount(&server)
            .await;

        let client = StoreClient::new(&server.uri(), "svc-key").unwrap();
        let profile = client.fetch_profile("user-1").await.unwrap();
        assert_eq!(profile.unwrap().first_name.as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn fetch_profile_missing_row_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/user_profiles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<serde_json::Value>::new()))
            .mount(&server)
            .await;

        let client = StoreClient::new(&server.uri(), "svc-key").unwrap();
        assert!(client.fetch_profile("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn fetch_profiles_issues_one_in_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/user_profiles"))
            .and(query_param("id", "in.(a,b)"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(vec![profile_json("a", "A"), profile_json("b", "B")]),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = StoreClient::new(&server.uri(), "svc-key").unwrap();
        let rows = client
            .fetch_profiles(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn fetch_profiles_empty_input_skips_http() {
        // No mock server at all: an HTTP call would fail the test
        let client = StoreClient::new("http://127.0.0.1:1", "svc-key").unwrap();
        let rows = client.fetch_profiles(&[]).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn update_profile_returns_representation() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/user_profiles"))
            .and(query_param("id", "eq.user-1"))
            .and(header("Prefer", "return=representation"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(vec![profile_json("user-1", "Grace")]),
            )
            .mount(&server)
            .await;

        let client = StoreClient::new(&server.uri(), "svc-key").unwrap();
        let changes = ProfileChanges {
            first_name: Some("Grace".to_string()),
            ..Default::default()
        };
        let updated = client.update_profile("user-1", &changes).await.unwrap();
        assert_eq!(updated.unwrap().first_name.as_deref(), Some("Grace"));
    }

    #[tokio::test]
    async fn server_error_surfaces_as_store_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/user_profiles"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = StoreClient::new(&server.uri(), "svc-key").unwrap();
        let err = client.fetch_profile("user-1").await.unwrap_err();
        assert!(matches!(err, halo_core::Error::Store(_)));
    }
}
