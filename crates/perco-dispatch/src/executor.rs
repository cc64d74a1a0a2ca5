//! Executor trait for per-shard percolation.
//!
//! The dispatcher fans a request out; something else does the matching.
//! This trait is the contract between the two.

use anyhow::Result;
use perco_core::PercolateRequest;

/// Identifies one shard of the target indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShardId(pub u32);

impl std::fmt::Display for ShardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "shard-{}", self.0)
    }
}

/// What one shard reports back: the ids of the registered queries that
/// matched the document.
#[derive(Debug, Clone, Default)]
pub struct ShardResult {
    pub matches: Vec<String>,
}

/// Trait for the engine that matches a document against one shard's
/// registered queries.
///
/// Intentionally minimal. Matching semantics are not this layer's concern;
/// the dispatcher only guarantees that by the time `execute` runs — possibly
/// on a different task — the request's payload is independently owned.
pub trait ShardExecutor: Send + Sync {
    fn execute(&self, shard: ShardId, request: &PercolateRequest) -> Result<ShardResult>;
}
