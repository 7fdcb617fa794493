mod actor;
mod memory;

pub use actor::{RedisStoreActor, RedisStoreHandle};
pub use memory::InMemoryStore;

use crate::config::Config;
use crate::error::PlannerResult;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Keys the planner keeps in the local store
pub mod keys {
    /// Bearer token for the remote API
    pub const TOKEN: &str = "token";
    /// JSON-serialized user preferences
    pub const USER_PREFERENCES: &str = "userPreferences";
}

/// Opaque persistent string store
#[async_trait]
pub trait LocalStore: Send + Sync + 'static {
    /// Read a value, `None` when the key is not set
    async fn get(&self, key: &str) -> PlannerResult<Option<String>>;

    /// Write a value, replacing any previous one
    async fn set(&self, key: &str, value: &str) -> PlannerResult<()>;

    /// Delete a key; deleting a missing key is not an error
    async fn remove(&self, key: &str) -> PlannerResult<()>;
}

/// Spawn the Redis store actor and return its handle
pub fn spawn_redis_store(redis_url: &str, key_prefix: &str) -> PlannerResult<RedisStoreHandle> {
    let (mut actor, handle) = RedisStoreActor::new(redis_url, key_prefix)?;

    tokio::spawn(async move {
        actor.run().await;
    });

    Ok(handle)
}

/// Open the store selected by the configuration.
///
/// Returns the Redis handle separately so the caller can shut it down.
pub fn open_store(
    config: &Config,
) -> PlannerResult<(Arc<dyn LocalStore>, Option<RedisStoreHandle>)> {
    match &config.redis_url {
        Some(url) => {
            info!("Using Redis store with key prefix '{}'", config.store_key_prefix);
            let handle = spawn_redis_store(url, &config.store_key_prefix)?;
            Ok((Arc::new(handle.clone()), Some(handle)))
        }
        None => {
            warn!("REDIS_URL not set, falling back to an in-memory store; nothing will persist");
            Ok((Arc::new(InMemoryStore::new()), None))
        }
    }
}
