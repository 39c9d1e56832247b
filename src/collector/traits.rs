use crate::config::TechnologyConfig;
use crate::model::{CollectorError, RawPost, Source};
use rand::Rng;
use std::time::Duration;

/// Look-back window and cap for one collection run.
#[derive(Debug, Clone, Copy)]
pub struct CollectRequest {
    pub days: i64,
    pub max_items: usize,
}

#[async_trait::async_trait]
pub trait Collector: Send + Sync {
    fn source(&self) -> Source;

    /// Returns recent posts for the technology. A technology without a mapping
    /// for this source yields an empty list. A failure after the first page
    /// yields the posts collected so far.
    async fn collect(
        &self,
        technology: &TechnologyConfig,
        request: &CollectRequest,
    ) -> Result<Vec<RawPost>, CollectorError>;
}

/// Pause between pages with a little jitter so parallel collectors don't line up.
pub(crate) fn polite_delay(base: Duration) -> Duration {
    if base.is_zero() {
        return base;
    }
    let jitter_ms: u64 = rand::rng().random_range(0..=250);
    base + Duration::from_millis(jitter_ms)
}
