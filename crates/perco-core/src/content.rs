//! Content encodings for document bodies.
//!
//! A percolate payload is an encoded key-value document. The encoder is
//! pluggable per request; JSON is the default and always available. TOML is
//! the second supported encoding and doubles as the awkward case: it cannot
//! represent every document (nulls, for one), which is exactly when
//! [`ContentError::Encode`] surfaces the offending input.

use bytes::Bytes;
use serde_json::{Map, Value};

/// The structured serialization format used for document bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentType {
    #[default]
    Json,
    Toml,
}

impl ContentType {
    pub fn name(self) -> &'static str {
        match self {
            ContentType::Json => "json",
            ContentType::Toml => "toml",
        }
    }
}

/// Encode a key-value document in the given content type.
///
/// Fails with [`ContentError::Encode`] when the document cannot be
/// represented in that encoding; the error carries the rendered document.
pub fn encode_map(doc: &Map<String, Value>, content_type: ContentType) -> Result<Bytes, ContentError> {
    match content_type {
        ContentType::Json => serde_json::to_vec(doc)
            .map(Bytes::from)
            .map_err(|e| ContentError::encode(doc, content_type, e)),
        ContentType::Toml => toml::to_string(doc)
            .map(|s| Bytes::from(s.into_bytes()))
            .map_err(|e| ContentError::encode(doc, content_type, e)),
    }
}

/// Decode a document produced by [`encode_map`].
pub fn decode_map(bytes: &[u8], content_type: ContentType) -> Result<Map<String, Value>, ContentError> {
    match content_type {
        ContentType::Json => serde_json::from_slice(bytes)
            .map_err(|e| ContentError::decode(content_type, e)),
        ContentType::Toml => {
            let text = std::str::from_utf8(bytes)
                .map_err(|e| ContentError::decode(content_type, e))?;
            toml::from_str(text).map_err(|e| ContentError::decode(content_type, e))
        }
    }
}

// ── Source builder ───────────────────────────────────────────────────────────

/// Fluent builder for percolate source documents.
///
/// Builds the standard percolate source shape: the document to match lives
/// under the `doc` key, with any extra top-level fields alongside it. Renders
/// to bytes in whichever content type the request is configured for.
#[derive(Debug, Clone, Default)]
pub struct SourceBuilder {
    root: Map<String, Value>,
}

impl SourceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a top-level field. Last write wins.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.root.insert(key.into(), value.into());
        self
    }

    /// Set the document to percolate, nested under the `doc` key.
    pub fn doc(mut self, doc: Map<String, Value>) -> Self {
        self.root.insert("doc".to_string(), Value::Object(doc));
        self
    }

    /// Render the source to bytes in the given content type.
    pub fn build(&self, content_type: ContentType) -> Result<Bytes, ContentError> {
        encode_map(&self.root, content_type)
    }

    /// Render to an [`EncodedDoc`] that remembers its content type.
    pub fn render(&self, content_type: ContentType) -> Result<EncodedDoc, ContentError> {
        Ok(EncodedDoc {
            content_type,
            bytes: self.build(content_type)?,
        })
    }
}

/// A document already rendered to bytes, carrying the content type it was
/// rendered in. The byte form is independently owned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedDoc {
    content_type: ContentType,
    bytes: Bytes,
}

impl EncodedDoc {
    pub fn new(content_type: ContentType, bytes: Bytes) -> Self {
        Self {
            content_type,
            bytes,
        }
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }
}

// ── Errors ───────────────────────────────────────────────────────────────────

/// Errors from turning documents into bytes and back.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("failed to encode document [{doc}] as {content_type}: {reason}")]
    Encode {
        /// The offending document, rendered for diagnostics.
        doc: String,
        content_type: &'static str,
        reason: String,
    },

    #[error("failed to decode {content_type} document: {reason}")]
    Decode {
        content_type: &'static str,
        reason: String,
    },
}

impl ContentError {
    fn encode(doc: &Map<String, Value>, content_type: ContentType, reason: impl ToString) -> Self {
        ContentError::Encode {
            doc: Value::Object(doc.clone()).to_string(),
            content_type: content_type.name(),
            reason: reason.to_string(),
        }
    }

    fn decode(content_type: ContentType, reason: impl ToString) -> Self {
        ContentError::Decode {
            content_type: content_type.name(),
            reason: reason.to_string(),
        }
    }
}
