//! HTTP reference feed.
//!
//! GET `{base_url}` expecting `{"events": [...]}` with events shaped per
//! `types::ReferenceEvent`. A bare top-level array is accepted too.

use super::types::ReferenceEvent;
use super::ReferenceFeed;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeedResponse {
    Wrapped { events: Vec<ReferenceEvent> },
    Bare(Vec<ReferenceEvent>),
}

pub struct HttpReferenceFeed {
    client: Client,
    base_url: String,
}

impl HttpReferenceFeed {
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("failed to build reqwest client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ReferenceFeed for HttpReferenceFeed {
    async fn fetch_events(&self) -> Result<Vec<ReferenceEvent>> {
        let resp = self
            .client
            .get(&self.base_url)
            .send()
            .await
            .context("reference feed request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("reference feed HTTP {}: {}", status, body);
        }

        let text = resp.text().await.context("reference feed read failed")?;
        let parsed: FeedResponse =
            serde_json::from_str(&text).context("failed to parse reference feed JSON")?;
        let events = match parsed {
            FeedResponse::Wrapped { events } => events,
            FeedResponse::Bare(events) => events,
        };
        tracing::info!(count = events.len(), "reference events fetched");
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_response_parses() {
        let json = r#"{"events": [{"event_id": "1", "home_team": "A", "away_team": "B"}]}"#;
        let parsed: FeedResponse = serde_json::from_str(json).unwrap();
        let FeedResponse::Wrapped { events } = parsed else {
            panic!("expected wrapped form");
        };
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_bare_array_parses() {
        let json = r#"[{"event_id": "1", "home_team": "A", "away_team": "B"}]"#;
        let parsed: FeedResponse = serde_json::from_str(json).unwrap();
        let FeedResponse::Bare(events) = parsed else {
            panic!("expected bare form");
        };
        assert_eq!(events.len(), 1);
    }
}
