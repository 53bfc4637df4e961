//! Pluggable policy for obtaining the execution record of a transaction.
//!
//! Exactly one strategy is active per client. It lives in an `ArcSwap` cell so
//! it can be replaced while operations are in flight: each record-requiring
//! call loads the current strategy once and keeps it for the whole call.

use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use ledger_types::{Transaction, TransactionId, TransactionReceipt, TransactionRecord};
use thiserror::Error;
use tracing::debug;

use crate::network::{LedgerNetwork, NetworkError};

#[derive(Debug, Error)]
pub enum RecordStrategyError {
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error("{0}")]
    Message(String),
}

/// Direct record lookup by transaction id.
#[async_trait]
pub trait RecordFetcher: Send + Sync {
    async fn fetch_record(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<TransactionRecord, NetworkError>;
}

#[async_trait]
impl<N: LedgerNetwork> RecordFetcher for N {
    async fn fetch_record(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<TransactionRecord, NetworkError> {
        LedgerNetwork::fetch_record(self, transaction_id).await
    }
}

/// Everything a strategy may use to produce a record.
#[derive(Clone, Copy)]
pub struct RecordRequest<'a> {
    pub transaction: &'a Transaction,
    pub receipt: &'a TransactionReceipt,
    pub fetcher: &'a dyn RecordFetcher,
}

impl RecordRequest<'_> {
    pub fn transaction_id(&self) -> TransactionId {
        self.receipt.transaction_id
    }

    /// Fetches the record for this request's transaction from the network.
    pub async fn fetch(&self) -> Result<TransactionRecord, NetworkError> {
        self.fetcher.fetch_record(&self.receipt.transaction_id).await
    }
}

#[async_trait]
pub trait RecordStrategy: Send + Sync {
    async fn acquire(
        &self,
        request: RecordRequest<'_>,
    ) -> Result<TransactionRecord, RecordStrategyError>;
}

/// Default strategy: one direct fetch, no retries.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectRecordStrategy;

#[async_trait]
impl RecordStrategy for DirectRecordStrategy {
    async fn acquire(
        &self,
        request: RecordRequest<'_>,
    ) -> Result<TransactionRecord, RecordStrategyError> {
        debug!(
            transaction_id = %request.transaction_id(),
            "fetching record directly"
        );
        Ok(request.fetch().await?)
    }
}

/// Atomically replaceable holder of the active strategy.
pub struct RecordStrategyCell {
    current: ArcSwap<Box<dyn RecordStrategy>>,
}

impl Default for RecordStrategyCell {
    fn default() -> Self {
        Self::new(DirectRecordStrategy)
    }
}

impl RecordStrategyCell {
    pub fn new(strategy: impl RecordStrategy + 'static) -> Self {
        Self {
            current: ArcSwap::from_pointee(Box::new(strategy)),
        }
    }

    pub fn current(&self) -> Arc<Box<dyn RecordStrategy>> {
        self.current.load_full()
    }

    /// Installs `strategy` for subsequent calls. Calls that already loaded
    /// the previous strategy finish with it; it is dropped after the last one.
    pub fn replace(&self, strategy: impl RecordStrategy + 'static) {
        self.current.store(Arc::new(Box::new(strategy)));
    }
}
