//! perco-core — percolate request model, payload ownership, and wire codec.
//! All other Perco crates depend on this one.

pub mod broadcast;
pub mod config;
pub mod content;
pub mod payload;
pub mod percolate;
pub mod wire;

pub use broadcast::{BroadcastHeader, BroadcastRequest, ValidationErrors};
pub use content::{ContentType, EncodedDoc, SourceBuilder};
pub use payload::DocPayload;
pub use percolate::{FetchedPercolateRequest, PercolateRequest};
