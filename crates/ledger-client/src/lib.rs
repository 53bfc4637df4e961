//! Client-side transaction execution for the ledger.
//!
//! This crate exposes:
//! - the network seam (`LedgerNetwork`) and an in-memory `MockNetwork`,
//! - the execution pipeline: sign, submit, await receipt, acquire record,
//! - a lock-free listener registry for submitted/handled notifications,
//! - a hot-swappable record acquisition strategy,
//! - typed requests for every transaction kind and the `ProtocolClient`
//!   facade that runs them.

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod listener;
pub mod network;
pub mod pipeline;
pub mod record_strategy;
pub mod requests;
pub mod signer;

pub use client::ProtocolClient;
pub use config::{ClientConfig, ConfigError, DEFAULT_CONTRACT_GAS, DEFAULT_NODE_ACCOUNT_ID};
pub use context::{ClientContext, OperatorAccount, TransactionIdGenerator};
pub use error::{ErrorContext, ErrorKind, ProtocolError};
pub use listener::{ListenerError, ListenerRegistration, ListenerRegistry, TransactionListener};
pub use network::{Endpoint, LedgerNetwork, MockNetwork, NetworkError};
pub use pipeline::ExecutionPipeline;
pub use record_strategy::{
    DirectRecordStrategy, RecordFetcher, RecordRequest, RecordStrategy, RecordStrategyCell,
    RecordStrategyError,
};
pub use requests::{Finality, Outcome, TransactionOptions, TransactionRequest};
pub use signer::TransactionSigner;
