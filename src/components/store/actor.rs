use super::LocalStore;
use crate::error::{storage_error, PlannerResult};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client as RedisClient};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// The Redis store actor that processes messages
pub struct RedisStoreActor {
    client: RedisClient,
    key_prefix: String,
    connection: Option<MultiplexedConnection>,
    command_rx: mpsc::Receiver<StoreCommand>,
}

/// Commands that can be sent to the store actor
pub enum StoreCommand {
    Get(String, mpsc::Sender<PlannerResult<Option<String>>>),
    Set(String, String, mpsc::Sender<PlannerResult<()>>),
    Remove(String, mpsc::Sender<PlannerResult<()>>),
    Shutdown,
}

/// Handle for communicating with the store actor
#[derive(Clone)]
pub struct RedisStoreHandle {
    command_tx: mpsc::Sender<StoreCommand>,
}

impl RedisStoreHandle {
    /// Create a handle with no actor behind it; every request fails
    pub fn empty() -> Self {
        let (command_tx, _) = mpsc::channel(32);
        Self { command_tx }
    }

    async fn request<T>(
        &self,
        command: StoreCommand,
        mut response_rx: mpsc::Receiver<PlannerResult<T>>,
    ) -> PlannerResult<T> {
        self.command_tx
            .send(command)
            .await
            .map_err(|e| storage_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| storage_error("Response channel closed"))?
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> PlannerResult<()> {
        let _ = self.command_tx.send(StoreCommand::Shutdown).await;
        Ok(())
    }
}

#[async_trait]
impl LocalStore for RedisStoreHandle {
    async fn get(&self, key: &str) -> PlannerResult<Option<String>> {
        let (response_tx, response_rx) = mpsc::channel(1);
        self.request(StoreCommand::Get(key.to_string(), response_tx), response_rx)
            .await
    }

    async fn set(&self, key: &str, value: &str) -> PlannerResult<()> {
        let (response_tx, response_rx) = mpsc::channel(1);
        self.request(
            StoreCommand::Set(key.to_string(), value.to_string(), response_tx),
            response_rx,
        )
        .await
    }

    async fn remove(&self, key: &str) -> PlannerResult<()> {
        let (response_tx, response_rx) = mpsc::channel(1);
        self.request(StoreCommand::Remove(key.to_string(), response_tx), response_rx)
            .await
    }
}

impl RedisStoreActor {
    /// Create a new actor and return its handle
    pub fn new(redis_url: &str, key_prefix: &str) -> PlannerResult<(Self, RedisStoreHandle)> {
        let (command_tx, command_rx) = mpsc::channel(32);

        // Only validates the URL; the connection is made on first use
        let client = RedisClient::open(redis_url)
            .map_err(|e| storage_error(&format!("Failed to create Redis client: {}", e)))?;

        let actor = Self {
            client,
            key_prefix: key_prefix.to_string(),
            connection: None,
            command_rx,
        };

        let handle = RedisStoreHandle { command_tx };

        Ok((actor, handle))
    }

    /// Start the actor's processing loop
    pub async fn run(&mut self) {
        info!("Redis store actor started");

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                StoreCommand::Get(key, response_tx) => {
                    let result = self.get_value(&key).await;
                    let _ = response_tx.send(result).await;
                }
                StoreCommand::Set(key, value, response_tx) => {
                    let result = self.set_value(&key, value).await;
                    let _ = response_tx.send(result).await;
                }
                StoreCommand::Remove(key, response_tx) => {
                    let result = self.remove_value(&key).await;
                    let _ = response_tx.send(result).await;
                }
                StoreCommand::Shutdown => {
                    info!("Redis store actor shutting down");
                    break;
                }
            }
        }

        info!("Redis store actor shut down");
    }

    fn prefixed(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    /// Get the cached connection, connecting if there is none
    async fn connection(&mut self) -> PlannerResult<MultiplexedConnection> {
        if let Some(conn) = &self.connection {
            return Ok(conn.clone());
        }

        let conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| storage_error(&format!("Failed to connect to Redis: {}", e)))?;
        self.connection = Some(conn.clone());
        Ok(conn)
    }

    /// Drop the cached connection after a failure so the next command reconnects
    fn reset_on_error<T>(&mut self, result: PlannerResult<T>) -> PlannerResult<T> {
        if let Err(e) = &result {
            warn!("Redis command failed, resetting connection: {}", e);
            self.connection = None;
        }
        result
    }

    async fn get_value(&mut self, key: &str) -> PlannerResult<Option<String>> {
        let key = self.prefixed(key);
        let mut conn = self.connection().await?;

        let result: PlannerResult<Option<String>> = conn
            .get(&key)
            .await
            .map_err(|e| storage_error(&format!("Failed to read {}: {}", key, e)));
        self.reset_on_error(result)
    }

    async fn set_value(&mut self, key: &str, value: String) -> PlannerResult<()> {
        let key = self.prefixed(key);
        let mut conn = self.connection().await?;

        let result: PlannerResult<()> = conn
            .set(&key, value)
            .await
            .map_err(|e| storage_error(&format!("Failed to write {}: {}", key, e)));
        self.reset_on_error(result)
    }

    async fn remove_value(&mut self, key: &str) -> PlannerResult<()> {
        let key = self.prefixed(key);
        let mut conn = self.connection().await?;

        let result: PlannerResult<()> = conn
            .del(&key)
            .await
            .map_err(|e| storage_error(&format!("Failed to delete {}: {}", key, e)));
        self.reset_on_error(result)
    }
}
