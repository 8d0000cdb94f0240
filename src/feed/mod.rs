pub mod enrich;
pub mod http;
pub mod types;

use anyhow::Result;
use async_trait::async_trait;
use types::ReferenceEvent;

/// Source of reference events. Pulling the feed is the collaborator's
/// concern; the core only sees structured events.
#[async_trait]
pub trait ReferenceFeed: Send + Sync {
    async fn fetch_events(&self) -> Result<Vec<ReferenceEvent>>;
}
