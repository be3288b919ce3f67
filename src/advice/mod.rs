//! Advice subsystem: backend client, periodic poller and the advice log.
//!
//! This module provides:
//! * [`AdviceClient`]: async trait implemented by advisor backends.
//! * [`HttpAdviceClient`]: JSON-over-HTTP client for the advice endpoint.
//! * [`AdvicePoller`]: fixed-cadence snapshot-and-request loop.
//! * [`AdviceLog`]: append-only, deduplicating log shown to the user.
//! * [`AdviceError`]: transport / parse failures.

pub mod client;
pub mod history;
pub mod poller;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use client::{AdviceClient, AdviceError, AdviceReply, HttpAdviceClient, Snapshot};
pub use history::{AdviceEntry, AdviceLog, EntryKind, BACKEND_ERROR_MESSAGE};
pub use poller::{AdviceDelivery, AdvicePoller};
