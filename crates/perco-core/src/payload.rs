//! Document payload with explicit ownership semantics.
//!
//! A percolate request's payload may be a view into a reusable buffer —
//! typically a pooled network receive buffer that its pool reclaims as soon
//! as every handle is dropped. Such bytes are only safe to read inside the
//! call that produced them. [`DocPayload`] makes that distinction a type:
//! only `Owned` payloads may cross an execution-context boundary, and
//! [`DocPayload::ensure_owned`] is the single conversion point.

use bytes::Bytes;

/// The binary document body carried by a percolate request.
///
/// `Owned` storage belongs exclusively to the request for its lifetime and
/// may be shared read-only across tasks. `Shared` storage aliases a buffer
/// the request does not control; the owner may reclaim it once the request's
/// handle is dropped, so it must be copied before any deferred use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocPayload {
    /// Storage the request exclusively owns.
    Owned(Bytes),
    /// Storage aliasing a reusable buffer. Must not outlive the call that
    /// produced it without going through [`DocPayload::ensure_owned`].
    Shared(Bytes),
}

impl DocPayload {
    /// Wrap bytes the request exclusively owns.
    pub fn owned(bytes: Bytes) -> Self {
        DocPayload::Owned(bytes)
    }

    /// Wrap bytes that alias a reusable buffer.
    pub fn shared(bytes: Bytes) -> Self {
        DocPayload::Shared(bytes)
    }

    /// Copy a slice into fresh owned storage.
    pub fn copy_from_slice(slice: &[u8]) -> Self {
        DocPayload::Owned(Bytes::copy_from_slice(slice))
    }

    /// Wrap static bytes. Static storage outlives every request, so the
    /// payload is owned without any allocation.
    pub fn from_static(bytes: &'static [u8]) -> Self {
        DocPayload::Owned(Bytes::from_static(bytes))
    }

    /// Convert `Shared` to `Owned` by defensively copying the bytes into
    /// storage the request exclusively owns. Idempotent: the first call on a
    /// shared payload copies and returns `true`, every later call is a no-op
    /// returning `false`. Tests use the return value as a copy counter.
    pub fn ensure_owned(&mut self) -> bool {
        match self {
            DocPayload::Owned(_) => false,
            DocPayload::Shared(bytes) => {
                *self = DocPayload::Owned(Bytes::copy_from_slice(bytes));
                true
            }
        }
    }

    /// True while the payload still aliases a buffer the request does not own.
    pub fn is_shared(&self) -> bool {
        matches!(self, DocPayload::Shared(_))
    }

    pub fn as_slice(&self) -> &[u8] {
        self.bytes()
    }

    pub fn bytes(&self) -> &Bytes {
        match self {
            DocPayload::Owned(bytes) | DocPayload::Shared(bytes) => bytes,
        }
    }

    pub fn into_bytes(self) -> Bytes {
        match self {
            DocPayload::Owned(bytes) | DocPayload::Shared(bytes) => bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes().is_empty()
    }
}

impl From<String> for DocPayload {
    /// A string is already an independent copy.
    fn from(value: String) -> Self {
        DocPayload::Owned(Bytes::from(value))
    }
}

impl From<Vec<u8>> for DocPayload {
    fn from(value: Vec<u8>) -> Self {
        DocPayload::Owned(Bytes::from(value))
    }
}

impl AsRef<[u8]> for DocPayload {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}
