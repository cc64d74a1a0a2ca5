//! Perco integration test harness.
//!
//! End-to-end scenarios across perco-core and perco-dispatch: request
//! construction through validation, the wire round trip, the pre-fork
//! ownership guard, and local fan-out against a stub executor.
//!
//! Everything here runs in-process; no external environment is required.

mod fanout;
mod guard;
mod scenarios;
