use crate::config::Config;
use crate::models::{CommentsPage, GraphErrorResponse};
use anyhow::{anyhow, Context, Result};
use reqwest::{header, Client};

const BASE_URL: &str = "https://graph.facebook.com";
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Read-only client for the comments edge of the Facebook Graph API.
///
/// The token must belong to a user account with enough privileges to read
/// the target object; app tokens cannot see even public comments.
#[derive(Debug, Clone)]
pub struct GraphClient {
    client: Client,
    token: String,
    base_url: String,
    api_version: String,
    page_size: u32,
}

impl GraphClient {
    pub fn new(token: String, config: &Config) -> Result<Self> {
        Self::with_base_url(BASE_URL.to_string(), token, config)
    }

    pub fn with_base_url(base_url: String, token: String, config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            token,
            base_url,
            api_version: config.api_version.clone(),
            page_size: config.page_size,
        })
    }

    async fn get_comments_page(
        &self,
        object_id: &str,
        after: Option<&str>,
    ) -> Result<CommentsPage> {
        let url = format!(
            "{}/{}/{}/comments",
            self.base_url, self.api_version, object_id
        );

        let mut query: Vec<(&str, String)> = vec![
            ("fields", "created_time".to_string()),
            ("limit", self.page_size.to_string()),
            ("filter", "stream".to_string()),
        ];
        if let Some(after) = after {
            query.push(("after", after.to_string()));
        }

        let response = self
            .client
            .get(&url)
            .query(&query)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response.text().await.unwrap_or_default();
            return Err(match serde_json::from_str::<GraphErrorResponse>(&body_text) {
                Ok(failure) => anyhow!(
                    "Graph API error {} ({}): {}",
                    failure.error.code.unwrap_or_default(),
                    status,
                    failure.error.message
                ),
                Err(_) => anyhow!("Request failed: {} - {}", status, body_text),
            });
        }

        response.json().await.context("Failed to parse response")
    }

    /// Fetch the creation time of every comment on the object, following
    /// the `after` paging cursor until the API stops announcing one.
    ///
    /// A failure on the first page is an error; a failure on a later page
    /// keeps the comments fetched so far and warns on standard error.
    pub async fn fetch_comment_times(&self, object_id: &str) -> Result<Vec<String>> {
        let mut page = self.get_comments_page(object_id, None).await?;
        let mut times = Vec::new();

        loop {
            let after = page.after_cursor().map(str::to_string);
            times.extend(page.data.into_iter().map(|c| c.created_time));

            let Some(after) = after else {
                break;
            };

            page = match self.get_comments_page(object_id, Some(&after)).await {
                Ok(next) => next,
                Err(err) => {
                    eprintln!(
                        "warning: fetch stopped after {} comments: {:#}",
                        times.len(),
                        err
                    );
                    break;
                }
            };
        }

        Ok(times)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn test_client(base_url: String) -> GraphClient {
        GraphClient::with_base_url(base_url, "TESTTOKEN".to_string(), &Config::default()).unwrap()
    }

    #[tokio::test]
    async fn fetches_a_single_page() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v2.5/10153/comments")
            .match_header("authorization", "Bearer TESTTOKEN")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("fields".into(), "created_time".into()),
                Matcher::UrlEncoded("limit".into(), "4000".into()),
                Matcher::UrlEncoded("filter".into(), "stream".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"data": [
                    {"created_time": "2015-06-01T08:00:00+0000"},
                    {"created_time": "2015-06-01T08:05:00+0000"}
                ]}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let client = test_client(server.url());
        let times = client.fetch_comment_times("10153").await.unwrap();

        mock.assert_async().await;
        assert_eq!(
            times,
            vec![
                "2015-06-01T08:00:00+0000".to_string(),
                "2015-06-01T08:05:00+0000".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn follows_the_after_cursor() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", "/v2.5/10153/comments")
            .match_query(Matcher::Exact(
                "fields=created_time&limit=4000&filter=stream".into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "data": [{"created_time": "2015-06-01T08:00:00+0000"}],
                    "paging": {"cursors": {"after": "AAAA"}}
                }"#,
            )
            .expect(1)
            .create_async()
            .await;
        let second = server
            .mock("GET", "/v2.5/10153/comments")
            .match_query(Matcher::UrlEncoded("after".into(), "AAAA".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data": [{"created_time": "2015-06-02T09:30:00+0000"}]}"#)
            .expect(1)
            .create_async()
            .await;

        let client = test_client(server.url());
        let times = client.fetch_comment_times("10153").await.unwrap();

        first.assert_async().await;
        second.assert_async().await;
        assert_eq!(times.len(), 2);
        assert_eq!(times[1], "2015-06-02T09:30:00+0000");
    }

    #[tokio::test]
    async fn first_page_failure_is_fatal() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v2.5/10153/comments")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"error": {
                    "message": "Invalid OAuth access token.",
                    "type": "OAuthException",
                    "code": 190
                }}"#,
            )
            .create_async()
            .await;

        let client = test_client(server.url());
        let err = client.fetch_comment_times("10153").await.unwrap_err();
        assert!(err.to_string().contains("Invalid OAuth access token."));
        assert!(err.to_string().contains("190"));
    }

    #[tokio::test]
    async fn later_page_failure_keeps_partial_data() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v2.5/10153/comments")
            .match_query(Matcher::Exact(
                "fields=created_time&limit=4000&filter=stream".into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "data": [{"created_time": "2015-06-01T08:00:00+0000"}],
                    "paging": {"cursors": {"after": "AAAA"}}
                }"#,
            )
            .create_async()
            .await;
        server
            .mock("GET", "/v2.5/10153/comments")
            .match_query(Matcher::UrlEncoded("after".into(), "AAAA".into()))
            .with_status(500)
            .with_body("gateway exploded")
            .create_async()
            .await;

        let client = test_client(server.url());
        let times = client.fetch_comment_times("10153").await.unwrap();
        assert_eq!(times, vec!["2015-06-01T08:00:00+0000".to_string()]);
    }

    #[tokio::test]
    async fn non_json_error_body_is_reported_raw() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v2.5/10153/comments")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("service unavailable")
            .create_async()
            .await;

        let client = test_client(server.url());
        let err = client.fetch_comment_times("10153").await.unwrap_err();
        assert!(err.to_string().contains("service unavailable"));
    }
}
