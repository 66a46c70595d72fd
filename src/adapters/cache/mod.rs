//! Classification cache adapters.
//!
//! - `InMemoryClassificationCache` - Process-local, for tests and single-node runs
//! - `RedisClassificationCache` - Shared cache for multi-node deployments

mod in_memory;
mod redis;

pub use in_memory::InMemoryClassificationCache;
pub use redis::RedisClassificationCache;
