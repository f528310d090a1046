//! Daily attendance endpoints

use chrono::{Datelike, Local};
use serde_json::Value;

use super::client::{ApiClient, Query};
use crate::error::ApiError;

const ATTENDANCES_PATH: &str = "/attendances";

/// Attendance calendar endpoints
#[derive(Debug, Clone, Copy)]
pub struct AttendanceApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AttendanceApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Attendance records for one month (cached)
    pub async fn monthly(&self, year: i32, month: u32) -> Result<Value, ApiError> {
        self.client.get_cached_private(ATTENDANCES_PATH, month_query(year, month)).await
    }

    /// Records today's attendance and drops the cached current month
    pub async fn check_in_today(&self) -> Result<Value, ApiError> {
        let response = self.client.post_empty(ATTENDANCES_PATH).await?;
        let today = Local::now().date_naive();
        self.client
            .invalidate_private(ATTENDANCES_PATH, &month_query(today.year(), today.month()));
        Ok(response)
    }
}

fn month_query(year: i32, month: u32) -> Query {
    vec![("year", year.to_string()), ("month", month.to_string())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{MemoryTokenStore, TokenStore};
    use crate::config::ClientConfig;
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ApiClient {
        let config = ClientConfig::default().with_base_url(server.uri());
        ApiClient::new(config, Arc::new(MemoryTokenStore::with_token("tok"))).unwrap()
    }

    #[tokio::test]
    async fn test_monthly_sends_year_and_month() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/attendances"))
            .and(query_param("year", "2026"))
            .and(query_param("month", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"days": [1, 2]})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let api = AttendanceApi::new(&client);
        assert_eq!(api.monthly(2026, 10).await.unwrap(), json!({"days": [1, 2]}));
        assert_eq!(api.monthly(2026, 10).await.unwrap(), json!({"days": [1, 2]}));
    }

    #[tokio::test]
    async fn test_check_in_invalidates_current_month() {
        let today = Local::now().date_naive();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/attendances"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/attendances"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"checked": true})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let api = AttendanceApi::new(&client);

        api.monthly(today.year(), today.month()).await.unwrap();
        assert_eq!(api.check_in_today().await.unwrap(), json!({"checked": true}));
        api.monthly(today.year(), today.month()).await.unwrap();
        assert_eq!(client.requests_sent(), 3);
    }

    #[tokio::test]
    async fn test_monthly_is_cached_per_credential() {
        let server = MockServer::start().await;
        for user in ["alice", "bob"] {
            Mock::given(method("GET"))
                .and(path("/attendances"))
                .and(header("authorization", format!("Bearer {}", user).as_str()))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({"user": user})))
                .expect(1)
                .mount(&server)
                .await;
        }

        let client = ApiClient::new(
            ClientConfig::default().with_base_url(server.uri()),
            Arc::new(MemoryTokenStore::with_token("alice")),
        )
        .unwrap();
        let api = AttendanceApi::new(&client);

        assert_eq!(api.monthly(2026, 10).await.unwrap(), json!({"user": "alice"}));

        client.tokens().set("bob").unwrap();
        assert_eq!(api.monthly(2026, 10).await.unwrap(), json!({"user": "bob"}));
        assert_eq!(client.requests_sent(), 2);

        // Switching back reuses alice's entry
        client.tokens().set("alice").unwrap();
        assert_eq!(api.monthly(2026, 10).await.unwrap(), json!({"user": "alice"}));
        assert_eq!(client.requests_sent(), 2);
    }
}
