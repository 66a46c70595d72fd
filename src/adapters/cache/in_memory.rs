//! In-memory classification cache with per-entry expiry.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::domain::foundation::DomainError;
use crate::ports::{AnalysisRecord, ClassificationCache};

#[derive(Debug, Clone)]
struct Entry {
    record: AnalysisRecord,
    expires_at: Instant,
}

/// Process-local cache. Expired entries are dropped lazily on read.
#[derive(Debug, Clone, Default)]
pub struct InMemoryClassificationCache {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl InMemoryClassificationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl ClassificationCache for InMemoryClassificationCache {
    async fn get(&self, key: &str) -> Result<Option<AnalysisRecord>, DomainError> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > now => return Ok(Some(entry.record.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        self.entries.write().await.remove(key);
        Ok(None)
    }

    async fn put(
        &self,
        key: &str,
        record: &AnalysisRecord,
        ttl: Duration,
    ) -> Result<(), DomainError> {
        self.entries.write().await.insert(
            key.to_string(),
            Entry {
                record: record.clone(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }
}
