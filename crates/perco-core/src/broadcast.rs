//! Generic broadcast-operation contract.
//!
//! A broadcast operation is a request fanned out to every relevant shard of
//! one or more indices, with responses aggregated by the caller. This module
//! owns the fields and rules common to all such requests: the target index
//! list, its validation, its wire form, and the pre-fork hook the dispatcher
//! invokes before handing a request to another execution context.

use std::fmt;

use bytes::{Buf, BufMut};

use crate::wire::{self, WireError};

// ── Base fields ──────────────────────────────────────────────────────────────

/// Fields owned by the generic broadcast contract. Always the first thing on
/// the wire for any concrete broadcast request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastHeader {
    pub indices: Vec<String>,
}

impl BroadcastHeader {
    pub fn new(indices: Vec<String>) -> Self {
        Self { indices }
    }

    /// Base-level validation. Concrete requests may re-check the same rule;
    /// overlapping entries are kept, not deduplicated.
    pub fn validate(&self, report: &mut ValidationErrors) {
        if self.indices.is_empty() {
            report.add("index is missing");
        }
    }

    pub fn encode(&self, buf: &mut impl BufMut) {
        wire::put_string_array(buf, &self.indices);
    }

    pub fn decode(buf: &mut impl Buf) -> Result<Self, WireError> {
        Ok(Self {
            indices: wire::get_string_array(buf)?,
        })
    }
}

// ── Validation report ────────────────────────────────────────────────────────

/// Accumulating validation report: every failed rule, by name, in the order
/// checked. A request is validated in full rather than failing on the first
/// violation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    failures: Vec<String>,
}

impl ValidationErrors {
    pub fn add(&mut self, rule: impl Into<String>) {
        self.failures.push(rule.into());
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    /// `Ok(())` when no rule failed, otherwise the report itself.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation failed: {}", self.failures.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

// ── Request contract ─────────────────────────────────────────────────────────

/// Contract between a concrete broadcast request and the dispatch layer.
///
/// The dispatcher validates, then calls [`before_local_fork`] exactly once
/// immediately before work leaves the current execution context. The hook
/// must be idempotent; a second call is harmless and must no-op. Ordering is
/// the caller's responsibility — the request holds no synchronization.
///
/// [`before_local_fork`]: BroadcastRequest::before_local_fork
pub trait BroadcastRequest {
    fn indices(&self) -> &[String];

    /// Full validation report, merged with the base contract's rules.
    fn validate(&self) -> Result<(), ValidationErrors>;

    /// Called before the request is handed to an independent execution
    /// context. Default: nothing to make safe.
    fn before_local_fork(&mut self) {}
}
