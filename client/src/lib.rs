//! Client library for the Facto web compiler backend.
//!
//! The backend compiles Facto source into Factorio blueprint strings and
//! exposes four HTTP endpoints: a streaming `POST /compile` (server-sent
//! events), an atomic `POST /compile/sync`, `GET /health`, and
//! `POST /connect`. This crate wraps all four behind [`CompileClient`]:
//!
//! - [`CompileClient::compile_streaming`] — incremental event delivery
//!   through a [`CompileObserver`], with exactly-once completion no matter
//!   how the stream ends.
//! - [`CompileClient::compile_sync`] — whole result in one response.
//! - [`CompileClient::check_health`] / [`CompileClient::record_connection`]
//!   — failure-swallowing connectivity probes.
//!
//! Callers supply a [`CompileRequest`] and, for the streaming path, an
//! observer; the client promises in-order event delivery and that
//! `on_complete` fires exactly once per invocation.

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod request;
mod streaming;
mod sync;

pub use client::CompileClient;
pub use config::BackendConfig;
pub use error::{ClientError, Result};
pub use events::{CompileEvent, CompileObserver, CompletionLatch};
pub use request::{CompileRequest, CompileResult, LogLevel, PowerPoleKind};
