//! Outbound communication with the review server.
//!
//! This module provides:
//! * [`ReviewTransport`]: async trait implemented by all backends.
//! * [`HttpTransport`]: JSON-over-HTTP client built on `reqwest`.
//! * [`NullTransport`]: offline stand-in that only logs.
//! * [`Outbox`]: non-blocking queue handle used by the UI thread.
//! * [`run_outbox`]: async worker that delivers queued messages, submissions
//!   ahead of actions, and [`drain_outbox`] to wait for it on shutdown.
//!
//! # Architecture
//!
//! ```text
//! ReviewSession ──Outbox::try_send──▶ submissions ─┐
//!                                     actions ─────┴▶ run_outbox()  (tokio task)
//!                                                        │
//!                                                        ├─ ReviewTransport::*
//!                                                        ▼
//! ReviewSession ◀──────── DeliveryReport ─────────────── mpsc
//! ```

pub mod client;
pub mod error;
pub mod message;
pub mod null;
pub mod outbox;
pub mod worker;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use client::{HttpTransport, ReviewTransport};
pub use error::TransportError;
pub use message::{ActionKind, DeliveryReport, ServerMessage};
pub use null::NullTransport;
pub use outbox::{Outbox, OutboxQueues};
pub use worker::{drain_outbox, run_outbox};
