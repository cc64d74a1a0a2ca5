//! Request-lifecycle scenarios: build, validate, encode, decode.

use bytes::BytesMut;
use perco_core::content::decode_map;
use perco_core::{BroadcastRequest, ContentType, PercolateRequest, SourceBuilder};
use serde_json::{json, Map, Value};

fn pen_doc() -> Map<String, Value> {
    let mut doc = Map::new();
    doc.insert("name".to_string(), json!("pen"));
    doc
}

/// The canonical scenario: index "products", type "item", document
/// {"name":"pen"} in the default encoding, across a full wire hop.
#[test]
fn percolate_pen_document_round_trip() {
    let doc = pen_doc();
    let request = PercolateRequest::new("products", "item")
        .source_map(&doc)
        .expect("json can encode any document");
    request.validate().expect("complete request must validate");

    let mut buf = BytesMut::new();
    request.encode(&mut buf).unwrap();
    let decoded = PercolateRequest::decode(&mut buf.freeze()).unwrap();

    assert_eq!(decoded.indices(), ["products"]);
    assert_eq!(decoded.doc_type(), Some("item"));
    assert_eq!(decoded.routing(), None, "unset must stay unset");
    assert_eq!(decoded.preference(), None, "unset must stay unset");

    let body = decode_map(decoded.payload().unwrap().as_slice(), ContentType::Json).unwrap();
    assert_eq!(body, doc);
}

#[test]
fn builder_source_survives_the_wire() {
    let source = SourceBuilder::new()
        .field("track_scores", true)
        .doc(pen_doc());
    let request = PercolateRequest::new("products", "item")
        .with_routing("user-7")
        .source_builder(&source)
        .unwrap();

    let mut buf = BytesMut::new();
    request.encode(&mut buf).unwrap();
    let decoded = PercolateRequest::decode(&mut buf.freeze()).unwrap();

    assert_eq!(decoded.routing(), Some("user-7"));
    let body = decode_map(decoded.payload().unwrap().as_slice(), ContentType::Json).unwrap();
    assert_eq!(body["doc"]["name"], json!("pen"));
    assert_eq!(body["track_scores"], json!(true));
}

#[test]
fn toml_encoded_payload_round_trips() {
    let mut doc = Map::new();
    doc.insert("name".to_string(), json!("pen"));
    doc.insert("stock".to_string(), json!(3));

    let request = PercolateRequest::new("products", "item")
        .with_content_type(ContentType::Toml)
        .source_map(&doc)
        .unwrap();

    let mut buf = BytesMut::new();
    request.encode(&mut buf).unwrap();
    let decoded = PercolateRequest::decode(&mut buf.freeze()).unwrap();

    let body = decode_map(decoded.payload().unwrap().as_slice(), ContentType::Toml).unwrap();
    assert_eq!(body, doc);
}

#[test]
fn invalid_request_names_all_violations() {
    let report = PercolateRequest::default().validate().unwrap_err();
    let failures = report.failures();
    assert!(failures.contains(&"type is missing".to_string()));
    assert!(failures.contains(&"source is missing".to_string()));
    assert_eq!(
        failures
            .iter()
            .filter(|f| *f == "index is missing")
            .count(),
        2,
        "base and percolate rules overlap without deduplication"
    );
}
