//! Classification cache port.
//!
//! Short-lived memo of classifier answers keyed by message text. Callers
//! must bypass it whenever prior analysis or a context hint shapes the input.

use async_trait::async_trait;
use std::time::Duration;

use super::AnalysisRecord;
use crate::domain::foundation::DomainError;

#[async_trait]
pub trait ClassificationCache: Send + Sync {
    /// Returns the cached record, or `None` on a miss or after expiry.
    ///
    /// # Errors
    ///
    /// - `CacheError` if the backend is unreachable
    async fn get(&self, key: &str) -> Result<Option<AnalysisRecord>, DomainError>;

    /// Stores a record for `ttl`.
    ///
    /// # Errors
    ///
    /// - `CacheError` if the backend is unreachable
    async fn put(&self, key: &str, record: &AnalysisRecord, ttl: Duration)
        -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_cache_is_object_safe() {
        fn _accepts_dyn(_cache: &dyn ClassificationCache) {}
    }
}
