//! HTTP bridge to the external scraper service.
//!
//! POST `{base_url}/scrape` with the request JSON; the service owns the
//! book session, search, and HTML parsing and answers with a
//! `SecondaryGame` record, `{"found": false}`, or 404 when the book does
//! not list the game.

use super::{ScrapeRequest, SecondaryGame, SecondaryScraper};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;

#[derive(Serialize)]
struct ScrapePayload<'a> {
    #[serde(flatten)]
    request: &'a ScrapeRequest,
    /// Budget hint for the service's search POST against the book.
    search_timeout_secs: u64,
}

pub struct HttpScraper {
    client: Client,
    base_url: String,
    search_timeout_secs: u64,
}

impl HttpScraper {
    pub fn new(
        base_url: &str,
        request_timeout_secs: u64,
        search_timeout_secs: u64,
        scrape_timeout_secs: u64,
    ) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(request_timeout_secs))
            .timeout(Duration::from_secs(scrape_timeout_secs))
            .build()
            .expect("failed to build reqwest client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            search_timeout_secs,
        }
    }
}

#[async_trait]
impl SecondaryScraper for HttpScraper {
    async fn scrape(&self, request: &ScrapeRequest) -> Result<Option<SecondaryGame>> {
        let url = format!("{}/scrape", self.base_url);
        let payload = ScrapePayload {
            request,
            search_timeout_secs: self.search_timeout_secs,
        };

        let resp = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("scraper request failed for {} vs {}", request.home, request.away))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("scraper HTTP {}: {}", status, body);
        }

        let body: serde_json::Value = resp.json().await.context("scraper response read failed")?;
        if body.get("found").and_then(|v| v.as_bool()) == Some(false) {
            return Ok(None);
        }
        let game: SecondaryGame =
            serde_json::from_value(body).context("failed to parse scraper response")?;
        Ok(Some(game))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let request = ScrapeRequest {
            home: "Boston Celtics".to_string(),
            away: "Miami Heat".to_string(),
            search_term: Some("celtics".to_string()),
            event_id: Some("123".to_string()),
        };
        let payload = ScrapePayload {
            request: &request,
            search_timeout_secs: 15,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["home"], "Boston Celtics");
        assert_eq!(json["search_term"], "celtics");
        assert_eq!(json["search_timeout_secs"], 15);
    }

    #[test]
    fn test_optional_fields_omitted() {
        let request = ScrapeRequest {
            home: "A".to_string(),
            away: "B".to_string(),
            search_term: None,
            event_id: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("search_term").is_none());
        assert!(json.get("event_id").is_none());
    }
}
