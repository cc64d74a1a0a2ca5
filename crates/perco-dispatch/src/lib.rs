//! perco-dispatch — fans percolate requests out across shards and
//! aggregates the per-shard results.

pub mod dispatcher;
pub mod executor;

pub use dispatcher::{LocalDispatcher, PercolateResponse};
pub use executor::{ShardExecutor, ShardId, ShardResult};
