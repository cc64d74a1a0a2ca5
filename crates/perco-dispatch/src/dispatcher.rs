//! Local broadcast dispatcher.
//!
//! Fans one percolate request out to every shard on tokio tasks and
//! aggregates the per-shard results. Deliberately thin: no topology, no
//! retries — a remote node receives the wire form of the same request and
//! runs the same fan-out locally.
//!
//! The ordering contract lives here: the request's pre-fork hook runs
//! exactly once, before any task is spawned. After that the request is
//! shared read-only behind an `Arc`.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{bail, Result};
use perco_core::config::PercoConfig;
use perco_core::{BroadcastRequest, PercolateRequest};
use tokio::sync::Semaphore;

use crate::executor::{ShardExecutor, ShardId};

/// Aggregated outcome of one percolate operation.
#[derive(Debug, Clone, Default)]
pub struct PercolateResponse {
    /// Ids of matching queries across all successful shards.
    pub matches: Vec<String>,
    /// Elapsed time since the request was stamped, in milliseconds.
    pub took_ms: u64,
    pub successful_shards: u32,
    pub failed_shards: u32,
}

/// Dispatches percolate requests across the shards of this node.
pub struct LocalDispatcher {
    executor: Arc<dyn ShardExecutor>,
    shards: u32,
    config: PercoConfig,
}

impl LocalDispatcher {
    pub fn new(executor: Arc<dyn ShardExecutor>, shards: u32, config: PercoConfig) -> Self {
        Self {
            executor,
            shards,
            config,
        }
    }

    /// Validate, stamp, guard, fan out, aggregate.
    ///
    /// A validation failure aborts before anything is dispatched. The
    /// payload size limit is enforced here rather than at construction —
    /// the request stays a plain value until it meets a dispatcher.
    pub async fn dispatch(&self, mut request: PercolateRequest) -> Result<PercolateResponse> {
        request.validate()?;

        if request.start_time_ms() == 0 {
            request.set_start_time_ms(now_ms());
        }

        let payload_len = request.payload().map(|p| p.len() as u64).unwrap_or(0);
        let max = self.config.limits.max_payload_bytes;
        if max > 0 && payload_len > max {
            bail!("payload of {payload_len} bytes exceeds limit of {max}");
        }

        // Execute-before edge: the payload must be independently owned
        // before the request is readable from any spawned task.
        request.before_local_fork();

        tracing::info!(
            indices = ?request.indices(),
            doc_type = request.doc_type().unwrap_or_default(),
            payload_bytes = payload_len,
            shards = self.shards,
            "dispatching percolate request"
        );

        let start_time_ms = request.start_time_ms();
        let request = Arc::new(request);
        let limit = match self.config.dispatch.max_concurrent_shards {
            0 => self.shards.max(1) as usize,
            n => n as usize,
        };
        let semaphore = Arc::new(Semaphore::new(limit));

        let mut handles = Vec::with_capacity(self.shards as usize);
        for shard in (0..self.shards).map(ShardId) {
            let semaphore = semaphore.clone();
            let executor = self.executor.clone();
            let request = request.clone();
            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await?;
                let result = executor.execute(shard, &request);
                tracing::trace!(%shard, ok = result.is_ok(), "shard execution finished");
                result
            }));
        }

        let mut response = PercolateResponse::default();
        for (shard, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(Ok(result)) => {
                    response.successful_shards += 1;
                    response.matches.extend(result.matches);
                }
                Ok(Err(e)) => {
                    response.failed_shards += 1;
                    tracing::warn!(shard, error = %e, "shard execution failed");
                }
                Err(e) => {
                    response.failed_shards += 1;
                    tracing::warn!(shard, error = %e, "shard task panicked or was cancelled");
                }
            }
        }

        response.took_ms = now_ms().saturating_sub(start_time_ms);
        Ok(response)
    }
}

/// Unix time in milliseconds.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
