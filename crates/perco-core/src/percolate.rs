//! The percolate request — match one document against the queries
//! registered on every shard of the target indices.
//!
//! The request is a plain value: no interior locking, not safe for
//! concurrent mutation. The one concurrency hazard it models is payload
//! buffer aliasing, handled by [`BroadcastRequest::before_local_fork`].

use bytes::{Buf, BufMut, Bytes};
use serde_json::{Map, Value};

use crate::broadcast::{BroadcastHeader, BroadcastRequest, ValidationErrors};
use crate::content::{self, ContentError, ContentType, EncodedDoc, SourceBuilder};
use crate::payload::DocPayload;
use crate::wire::{self, WireError};

/// One attempt to percolate a document against the registered queries of
/// one or more indices.
///
/// Wire order is fixed: broadcast header, document type, optional routing,
/// optional preference, payload bytes, start time. No version tag — any
/// change to field order or presence encoding breaks compatibility.
#[derive(Debug, Clone, Default)]
pub struct PercolateRequest {
    header: BroadcastHeader,
    doc_type: Option<String>,
    routing: Option<String>,
    preference: Option<String>,
    content_type: ContentType,
    payload: Option<DocPayload>,
    /// Stamped by the dispatcher for latency accounting. Not validated, not
    /// part of the request's identity, but round-trips on the wire so timing
    /// attribution survives a remote hop.
    start_time_ms: u64,
}

impl PercolateRequest {
    pub fn new(index: impl Into<String>, doc_type: impl Into<String>) -> Self {
        Self {
            header: BroadcastHeader::new(vec![index.into()]),
            doc_type: Some(doc_type.into()),
            ..Self::default()
        }
    }

    // ── Builder-style setters ────────────────────────────────────────────

    pub fn with_indices(mut self, indices: Vec<String>) -> Self {
        self.header.indices = indices;
        self
    }

    pub fn with_doc_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = Some(doc_type.into());
        self
    }

    /// Restrict which shards see the request.
    pub fn with_routing(mut self, routing: impl Into<String>) -> Self {
        self.routing = Some(routing.into());
        self
    }

    /// Shard/replica selection hint.
    pub fn with_preference(mut self, preference: impl Into<String>) -> Self {
        self.preference = Some(preference.into());
        self
    }

    /// Content encoding used by [`source_map`] and [`source_builder`].
    ///
    /// [`source_map`]: PercolateRequest::source_map
    /// [`source_builder`]: PercolateRequest::source_builder
    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn with_start_time_ms(mut self, start_time_ms: u64) -> Self {
        self.start_time_ms = start_time_ms;
        self
    }

    pub fn set_start_time_ms(&mut self, start_time_ms: u64) {
        self.start_time_ms = start_time_ms;
    }

    // ── Payload constructors ─────────────────────────────────────────────
    //
    // Each fully replaces any previous payload; the ownership mark comes
    // from the new source alone. All funnel through `source_payload`.

    /// Encode a key-value document in the request's content type.
    pub fn source_map(self, doc: &Map<String, Value>) -> Result<Self, ContentError> {
        let content_type = self.content_type;
        self.source_map_as(doc, content_type)
    }

    /// Encode a key-value document in an explicit content type.
    pub fn source_map_as(
        self,
        doc: &Map<String, Value>,
        content_type: ContentType,
    ) -> Result<Self, ContentError> {
        let bytes = content::encode_map(doc, content_type)?;
        Ok(self.source_payload(DocPayload::owned(bytes)))
    }

    /// Raw text document. A string is already an independent copy.
    pub fn source_string(self, doc: impl Into<String>) -> Self {
        self.source_payload(DocPayload::from(doc.into()))
    }

    /// Render a [`SourceBuilder`] in the request's content type.
    pub fn source_builder(self, builder: &SourceBuilder) -> Result<Self, ContentError> {
        let bytes = builder.build(self.content_type)?;
        Ok(self.source_payload(DocPayload::owned(bytes)))
    }

    /// Take the byte form of an already rendered document. The request's
    /// content type follows the document's.
    pub fn source_encoded(mut self, doc: &EncodedDoc) -> Self {
        self.content_type = doc.content_type();
        self.source_payload(DocPayload::owned(doc.bytes().clone()))
    }

    /// Take ownership of a byte vector.
    pub fn source_bytes(self, doc: Vec<u8>) -> Self {
        self.source_payload(DocPayload::from(doc))
    }

    /// Copy a slice into owned storage.
    pub fn source_slice(self, doc: &[u8]) -> Self {
        self.source_payload(DocPayload::copy_from_slice(doc))
    }

    /// Bytes aliasing a reusable buffer — the one constructor producing a
    /// payload that must be copied before the request escapes this call's
    /// scope. The pre-fork hook performs that copy.
    pub fn source_shared(self, doc: Bytes) -> Self {
        self.source_payload(DocPayload::shared(doc))
    }

    /// Lowest-level entry point: install a payload as-is.
    pub fn source_payload(mut self, payload: DocPayload) -> Self {
        self.payload = Some(payload);
        self
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn doc_type(&self) -> Option<&str> {
        self.doc_type.as_deref()
    }

    pub fn routing(&self) -> Option<&str> {
        self.routing.as_deref()
    }

    pub fn preference(&self) -> Option<&str> {
        self.preference.as_deref()
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn payload(&self) -> Option<&DocPayload> {
        self.payload.as_ref()
    }

    pub fn start_time_ms(&self) -> u64 {
        self.start_time_ms
    }

    // ── Derived variant ──────────────────────────────────────────────────

    /// Attach a separately fetched document, producing the in-process
    /// variant handed to the percolation engine. Never serialized.
    pub fn with_fetched_doc(self, fetched_doc: Bytes) -> FetchedPercolateRequest {
        FetchedPercolateRequest {
            base: self,
            fetched_doc,
        }
    }

    // ── Wire form ────────────────────────────────────────────────────────

    /// Encode for transport. Fails when a required field was never set —
    /// callers are expected to validate before encoding.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<(), WireError> {
        self.header.encode(buf);
        let doc_type = self
            .doc_type
            .as_deref()
            .ok_or(WireError::MissingField("type"))?;
        wire::put_string(buf, doc_type);
        wire::put_opt_string(buf, self.routing.as_deref());
        wire::put_opt_string(buf, self.preference.as_deref());
        let payload = self
            .payload
            .as_ref()
            .ok_or(WireError::MissingField("source"))?;
        wire::put_bytes(buf, payload.as_slice());
        wire::put_vlong(buf, self.start_time_ms);
        Ok(())
    }

    /// Reconstruct a request from its wire form. The decoded payload is
    /// always owned — the receive buffer is not shared with anything the
    /// sender can mutate.
    pub fn decode(buf: &mut impl Buf) -> Result<Self, WireError> {
        let header = BroadcastHeader::decode(buf)?;
        let doc_type = Some(wire::get_string(buf)?);
        let routing = wire::get_opt_string(buf)?;
        let preference = wire::get_opt_string(buf)?;
        let payload = Some(DocPayload::owned(wire::get_bytes(buf)?));
        let start_time_ms = wire::get_vlong(buf)?;
        Ok(Self {
            header,
            doc_type,
            routing,
            preference,
            content_type: ContentType::default(),
            payload,
            start_time_ms,
        })
    }
}

impl BroadcastRequest for PercolateRequest {
    fn indices(&self) -> &[String] {
        &self.header.indices
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut report = ValidationErrors::default();
        self.header.validate(&mut report);
        // The percolate-level rule overlaps the base rule on purpose; both
        // entries appear in the report.
        if self.header.indices.is_empty() {
            report.add("index is missing");
        }
        // Unset fails; an empty string is accepted as-is.
        if self.doc_type.is_none() {
            report.add("type is missing");
        }
        // Unset fails; an empty payload is accepted.
        if self.payload.is_none() {
            report.add("source is missing");
        }
        report.into_result()
    }

    /// Make the payload safe to read from another execution context.
    /// Idempotent; the second call always no-ops.
    fn before_local_fork(&mut self) {
        if let Some(payload) = &mut self.payload {
            payload.ensure_owned();
        }
    }
}

/// A percolate request plus a document fetched separately (e.g. from
/// storage). In-process only: it has no wire form. Composition over field
/// duplication — the base request is carried whole.
#[derive(Debug, Clone)]
pub struct FetchedPercolateRequest {
    base: PercolateRequest,
    fetched_doc: Bytes,
}

impl FetchedPercolateRequest {
    pub fn base(&self) -> &PercolateRequest {
        &self.base
    }

    /// The resolved document, as the narrow byte view the percolation
    /// engine needs. Fetched bytes are always independently owned.
    pub fn fetched_doc(&self) -> &[u8] {
        &self.fetched_doc
    }
}

impl BroadcastRequest for FetchedPercolateRequest {
    fn indices(&self) -> &[String] {
        self.base.indices()
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        self.base.validate()
    }

    fn before_local_fork(&mut self) {
        self.base.before_local_fork();
    }
}
