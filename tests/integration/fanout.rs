//! Wire hop plus local fan-out: what a remote node does with a request.

use std::sync::Arc;

use anyhow::Result;
use bytes::BytesMut;
use perco_core::config::PercoConfig;
use perco_core::content::decode_map;
use perco_core::{ContentType, PercolateRequest};
use perco_dispatch::{LocalDispatcher, ShardExecutor, ShardId, ShardResult};
use serde_json::{json, Map};

/// Matches the query "has-name" whenever the document carries a `name`
/// field. Just enough engine to prove the pipeline end to end.
struct NameFieldExecutor;

impl ShardExecutor for NameFieldExecutor {
    fn execute(&self, _shard: ShardId, request: &PercolateRequest) -> Result<ShardResult> {
        let payload = request
            .payload()
            .expect("dispatcher only hands over validated requests");
        assert!(!payload.is_shared(), "payload must be owned by execute time");

        let doc = decode_map(payload.as_slice(), ContentType::Json)?;
        let matches = if doc.contains_key("name") {
            vec!["has-name".to_string()]
        } else {
            Vec::new()
        };
        Ok(ShardResult { matches })
    }
}

fn wire_hop(request: &PercolateRequest) -> PercolateRequest {
    let mut buf = BytesMut::new();
    request.encode(&mut buf).unwrap();
    PercolateRequest::decode(&mut buf.freeze()).unwrap()
}

#[tokio::test]
async fn remote_node_percolates_a_decoded_request() {
    let mut doc = Map::new();
    doc.insert("name".to_string(), json!("pen"));

    let request = PercolateRequest::new("products", "item")
        .source_map(&doc)
        .unwrap();

    // Serialize on the coordinating node, reconstruct on the remote one.
    let received = wire_hop(&request);

    let dispatcher = LocalDispatcher::new(Arc::new(NameFieldExecutor), 3, PercoConfig::default());
    let response = dispatcher.dispatch(received).await.unwrap();

    assert_eq!(response.successful_shards, 3);
    assert_eq!(response.failed_shards, 0);
    assert_eq!(response.matches, ["has-name", "has-name", "has-name"]);
}

#[tokio::test]
async fn start_time_survives_the_hop_for_latency_attribution() {
    let mut doc = Map::new();
    doc.insert("name".to_string(), json!("pen"));

    let stamped = perco_dispatch::dispatcher::now_ms().saturating_sub(25);
    let request = PercolateRequest::new("products", "item")
        .with_start_time_ms(stamped)
        .source_map(&doc)
        .unwrap();

    let received = wire_hop(&request);
    assert_eq!(received.start_time_ms(), stamped);

    let dispatcher = LocalDispatcher::new(Arc::new(NameFieldExecutor), 1, PercoConfig::default());
    let response = dispatcher.dispatch(received).await.unwrap();
    assert!(response.took_ms >= 25, "took must count from the original stamp");
}

#[tokio::test]
async fn concurrency_limit_still_reaches_every_shard() {
    let mut config = PercoConfig::default();
    config.dispatch.max_concurrent_shards = 1;

    let mut doc = Map::new();
    doc.insert("name".to_string(), json!("pen"));
    let request = PercolateRequest::new("products", "item")
        .source_map(&doc)
        .unwrap();

    let dispatcher = LocalDispatcher::new(Arc::new(NameFieldExecutor), 5, config);
    let response = dispatcher.dispatch(request).await.unwrap();
    assert_eq!(response.successful_shards, 5);
}

#[tokio::test]
async fn document_without_the_field_matches_nothing() {
    let mut doc = Map::new();
    doc.insert("color".to_string(), json!("blue"));
    let request = PercolateRequest::new("products", "item")
        .source_map(&doc)
        .unwrap();

    let dispatcher = LocalDispatcher::new(Arc::new(NameFieldExecutor), 2, PercoConfig::default());
    let response = dispatcher.dispatch(wire_hop(&request)).await.unwrap();
    assert_eq!(response.successful_shards, 2);
    assert!(response.matches.is_empty());
}
