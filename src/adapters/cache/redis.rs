//! Redis-backed classification cache.
//!
//! Records are stored as JSON under `triage:classification:<key>` with `SET EX`.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::time::Duration;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{AnalysisRecord, ClassificationCache};

const KEY_PREFIX: &str = "triage:classification:";

/// Classification cache shared between nodes through Redis.
#[derive(Clone)]
pub struct RedisClassificationCache {
    conn: MultiplexedConnection,
}

impl RedisClassificationCache {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }

    fn redis_key(key: &str) -> String {
        format!("{}{}", KEY_PREFIX, key)
    }
}

fn cache_error(context: &str, err: impl std::fmt::Display) -> DomainError {
    DomainError::new(ErrorCode::CacheError, format!("{}: {}", context, err))
}

#[async_trait]
impl ClassificationCache for RedisClassificationCache {
    async fn get(&self, key: &str) -> Result<Option<AnalysisRecord>, DomainError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn
            .get(Self::redis_key(key))
            .await
            .map_err(|e: redis::RedisError| cache_error("Failed to read classification", e))?;

        match raw {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| cache_error("Corrupt cached classification", e)),
            None => Ok(None),
        }
    }

    async fn put(
        &self,
        key: &str,
        record: &AnalysisRecord,
        ttl: Duration,
    ) -> Result<(), DomainError> {
        let json = serde_json::to_string(record)
            .map_err(|e| cache_error("Failed to encode classification", e))?;
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(Self::redis_key(key), json, ttl.as_secs().max(1))
            .await
            .map_err(|e: redis::RedisError| cache_error("Failed to write classification", e))?;
        Ok(())
    }
}

impl std::fmt::Debug for RedisClassificationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisClassificationCache")
            .finish_non_exhaustive()
    }
}
