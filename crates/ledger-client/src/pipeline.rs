//! Execution pipeline: validate, sign, submit, await receipt, notify and,
//! for record-finality operations, acquire the record.
//!
//! Every step runs in sequence on the caller's task. Failures are wrapped in
//! `ProtocolError` tagged with the stage and whatever transaction context was
//! known at that point.

use std::sync::Arc;

use ledger_crypto::PrivateKey;
use ledger_types::{Transaction, TransactionReceipt, TransactionRecord};
use tracing::{debug, warn};

use crate::context::ClientContext;
use crate::error::{ErrorKind, ProtocolError};
use crate::listener::ListenerRegistry;
use crate::network::LedgerNetwork;
use crate::record_strategy::{RecordRequest, RecordStrategyCell};
use crate::signer::TransactionSigner;

pub struct ExecutionPipeline<N> {
    network: N,
    signer: TransactionSigner,
    listeners: ListenerRegistry,
    strategy: Arc<RecordStrategyCell>,
}

impl<N: LedgerNetwork> ExecutionPipeline<N> {
    pub fn new(
        network: N,
        context: Arc<ClientContext>,
        listeners: ListenerRegistry,
        strategy: Arc<RecordStrategyCell>,
    ) -> Self {
        Self {
            network,
            signer: TransactionSigner::new(context),
            listeners,
            strategy,
        }
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    /// Runs `transaction` through consensus and returns its successful receipt.
    pub async fn execute_for_receipt(
        &self,
        mut transaction: Transaction,
        keys: &[PrivateKey],
    ) -> Result<TransactionReceipt, ProtocolError> {
        self.submit_and_await_receipt(&mut transaction, keys).await
    }

    /// Like `execute_for_receipt`, then acquires the record through the
    /// strategy that is active when the receipt arrives.
    pub async fn execute_for_record(
        &self,
        mut transaction: Transaction,
        keys: &[PrivateKey],
    ) -> Result<TransactionRecord, ProtocolError> {
        let receipt = self.submit_and_await_receipt(&mut transaction, keys).await?;
        let kind = transaction.kind();
        let transaction_id = receipt.transaction_id;

        let strategy = self.strategy.current();
        let request = RecordRequest {
            transaction: &transaction,
            receipt: &receipt,
            fetcher: &self.network,
        };
        match strategy.acquire(request).await {
            Ok(record) => {
                debug!(kind = %kind, transaction_id = %transaction_id, "record acquired");
                Ok(record)
            }
            Err(err) => {
                warn!(
                    kind = %kind,
                    transaction_id = %transaction_id,
                    error = %err,
                    "record acquisition failed"
                );
                Err(ProtocolError::new(
                    ErrorKind::Record,
                    format!("failed to receive record of {kind} transaction {transaction_id}"),
                )
                .with_transaction(kind, Some(transaction_id))
                .with_receipt(receipt)
                .with_source(err))
            }
        }
    }

    async fn submit_and_await_receipt(
        &self,
        transaction: &mut Transaction,
        keys: &[PrivateKey],
    ) -> Result<TransactionReceipt, ProtocolError> {
        let kind = transaction.kind();
        transaction
            .validate()
            .map_err(|err| ProtocolError::validation(Some(kind), err))?;
        self.signer.sign(transaction, keys)?;
        self.signer.prepare_for_submission(transaction)?;

        let response = self.network.submit(transaction).await.map_err(|err| {
            ProtocolError::new(
                ErrorKind::Submission,
                format!("failed to submit {kind} transaction"),
            )
            .with_transaction(kind, transaction.transaction_id())
            .with_source(err)
        })?;
        let transaction_id = response.transaction_id;
        debug!(
            kind = %kind,
            transaction_id = %transaction_id,
            node = %response.node_account_id,
            "transaction submitted"
        );
        self.listeners.notify_submitted(kind, &transaction_id);

        let receipt = self
            .network
            .fetch_receipt(&transaction_id)
            .await
            .map_err(|err| {
                ProtocolError::new(
                    ErrorKind::Receipt,
                    format!("failed to receive receipt of {kind} transaction {transaction_id}"),
                )
                .with_transaction(kind, Some(transaction_id))
                .with_source(err)
            })?;
        if !receipt.status.is_success() {
            let status = receipt.status;
            return Err(ProtocolError::new(
                ErrorKind::Receipt,
                format!("{kind} transaction {transaction_id} failed with status {status}"),
            )
            .with_transaction(kind, Some(transaction_id))
            .with_receipt(receipt));
        }
        debug!(
            kind = %kind,
            transaction_id = %transaction_id,
            status = %receipt.status,
            "receipt received"
        );
        self.listeners
            .notify_handled(kind, &transaction_id, receipt.status);
        Ok(receipt)
    }
}
