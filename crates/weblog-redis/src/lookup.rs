//! `RedisLookup` — reads one hash field per message.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::cluster::ClusterClient;
use redis::cluster_async::ClusterConnection;
use redis::AsyncCommands;
use tracing::info;

use weblog_core::{EnrichmentLookup, PipelineError};

use crate::config::{RedisLookupConfig, RedisMode};

/// Both connection kinds are multiplexed and cheap to clone; a clone per
/// call shares the single underlying connection opened at startup.
#[derive(Clone)]
enum Connection {
    Standalone(MultiplexedConnection),
    Cluster(ClusterConnection),
}

#[derive(Clone)]
pub struct RedisLookup {
    conn: Connection,
}

impl RedisLookup {
    /// Open the connection. Unreachable nodes fail with
    /// `PipelineError::Connection`.
    pub async fn connect(config: &RedisLookupConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let urls = config.node_urls();

        let conn = match config.mode {
            RedisMode::Standalone => {
                let client = redis::Client::open(urls[0].as_str())
                    .map_err(|e| PipelineError::connection("redis", e))?;
                let conn = client
                    .get_multiplexed_tokio_connection()
                    .await
                    .map_err(|e| PipelineError::connection("redis", e))?;
                Connection::Standalone(conn)
            }
            RedisMode::Cluster => {
                let client = ClusterClient::new(urls.clone())
                    .map_err(|e| PipelineError::connection("redis", e))?;
                let conn = client
                    .get_async_connection()
                    .await
                    .map_err(|e| PipelineError::connection("redis", e))?;
                Connection::Cluster(conn)
            }
        };

        info!(mode = ?config.mode, nodes = urls.len(), "Redis lookup connected");
        Ok(Self { conn })
    }
}

#[async_trait]
impl EnrichmentLookup for RedisLookup {
    async fn get_attribute(
        &self,
        key: &str,
        attribute: &str,
    ) -> Result<Option<String>, PipelineError> {
        let result: redis::RedisResult<Option<String>> = match self.conn.clone() {
            Connection::Standalone(mut conn) => conn.hget(key, attribute).await,
            Connection::Cluster(mut conn) => conn.hget(key, attribute).await,
        };
        result.map_err(|e| PipelineError::Lookup(format!("HGET {key} {attribute}: {e}")))
    }
}
