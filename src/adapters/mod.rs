//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the workflow to external systems:
//! - `ai` - LLM providers and the LLM-backed classifier
//! - `cache` - Classification caches (in-memory, Redis)
//! - `glpi` - External ticket-of-record client
//! - `memory` - In-memory repositories for tests and local runs
//! - `postgres` - PostgreSQL repositories

pub mod ai;
pub mod cache;
pub mod glpi;
pub mod memory;
pub mod postgres;

pub use ai::{LlmClassifier, LlmClassifierConfig, MockAIProvider, OpenAIProvider, RetryPolicy};
pub use cache::{InMemoryClassificationCache, RedisClassificationCache};
pub use glpi::{GlpiClient, GlpiConfig};
pub use memory::{
    InMemoryCategoryCatalog, InMemorySessionRepository, InMemoryTicketRepository,
    InMemoryUserDirectory,
};
pub use postgres::{
    PostgresCategoryCatalog, PostgresSessionRepository, PostgresTicketRepository,
    PostgresUserDirectory,
};
