use std::sync::Arc;

use ledger_crypto::{encode_transaction_body, PrivateKey};
use ledger_types::{FrozenBody, Transaction, TransactionError, TransactionId};
use tracing::trace;

use crate::context::ClientContext;
use crate::error::ProtocolError;

/// Freezes transactions with the client context and applies signatures.
#[derive(Debug, Clone)]
pub struct TransactionSigner {
    context: Arc<ClientContext>,
}

impl TransactionSigner {
    pub fn new(context: Arc<ClientContext>) -> Self {
        Self { context }
    }

    /// Freezes `transaction` and applies `keys` in order.
    ///
    /// With no keys the transaction is left untouched. Otherwise it must not
    /// be frozen yet; a key that has already signed is not applied twice.
    pub fn sign(
        &self,
        transaction: &mut Transaction,
        keys: &[PrivateKey],
    ) -> Result<(), ProtocolError> {
        if keys.is_empty() {
            return Ok(());
        }
        self.freeze(transaction).map_err(ProtocolError::signing)?;
        for key in keys {
            sign_with(transaction, key).map_err(ProtocolError::signing)?;
        }
        Ok(())
    }

    /// Freezes if needed and adds the operator signature if it is missing.
    pub fn prepare_for_submission(&self, transaction: &mut Transaction) -> Result<(), ProtocolError> {
        if !transaction.is_frozen() {
            self.freeze(transaction).map_err(ProtocolError::signing)?;
        }
        sign_with(transaction, &self.context.operator().private_key)
            .map_err(ProtocolError::signing)?;
        Ok(())
    }

    fn freeze(&self, transaction: &mut Transaction) -> Result<TransactionId, TransactionError> {
        if transaction.is_frozen() {
            return Err(TransactionError::AlreadyFrozen(transaction.kind()));
        }
        let transaction_id = self.context.next_transaction_id();
        let node_account_id = self.context.node_account_id();
        let body_bytes = encode_transaction_body(transaction, &transaction_id, &node_account_id);
        transaction.freeze(FrozenBody {
            transaction_id,
            node_account_id,
            body_bytes,
        })?;
        trace!(
            kind = %transaction.kind(),
            transaction_id = %transaction_id,
            "transaction frozen"
        );
        Ok(transaction_id)
    }
}

fn sign_with(transaction: &mut Transaction, key: &PrivateKey) -> Result<bool, TransactionError> {
    if transaction.is_signed_by(&key.public_key()) {
        return Ok(false);
    }
    let pair = match transaction.frozen() {
        Some(frozen) => key.sign(&frozen.body_bytes),
        None => return Err(TransactionError::NotFrozen(transaction.kind())),
    };
    transaction.add_signature(pair)
}
