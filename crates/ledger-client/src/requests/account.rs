use ledger_crypto::PrivateKey;
use ledger_types::{
    AccountId, Hbar, PublicKey, Status, Timestamp, Transaction, TransactionBody, TransactionHash,
    TransactionId, TransactionKind, ValidationError,
};

use super::{
    expect_record, impl_transaction_options, required, Finality, Outcome, Prepared,
    TransactionOptions, TransactionRequest,
};
use crate::context::ClientContext;
use crate::error::ProtocolError;

/// Creates an account funded by the operator with a freshly generated key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountCreateRequest {
    pub initial_balance: Hbar,
    options: TransactionOptions,
}

impl Default for AccountCreateRequest {
    fn default() -> Self {
        Self::new(Hbar::ZERO)
    }
}

impl AccountCreateRequest {
    pub fn new(initial_balance: Hbar) -> Self {
        Self {
            initial_balance,
            options: TransactionOptions::default(),
        }
    }
}

/// A newly created account together with its key pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub account_id: AccountId,
    pub public_key: PublicKey,
    pub private_key: PrivateKey,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountCreateResult {
    pub transaction_id: TransactionId,
    pub status: Status,
    pub transaction_hash: TransactionHash,
    pub consensus_timestamp: Timestamp,
    pub transaction_fee: Hbar,
    pub account: NewAccount,
}

impl TransactionRequest for AccountCreateRequest {
    type Output = AccountCreateResult;
    type Carry = PrivateKey;

    const KIND: TransactionKind = TransactionKind::AccountCreate;
    const FINALITY: Finality = Finality::Record;

    fn prepare(&self, _context: &ClientContext) -> Result<Prepared<PrivateKey>, ValidationError> {
        if self.initial_balance < Hbar::ZERO {
            return Err(ValidationError::InvalidField {
                field: "initial_balance",
                reason: "must not be negative",
            });
        }
        let private_key = PrivateKey::generate();
        let transaction = self.options.apply(Transaction::new(TransactionBody::AccountCreate {
            key: private_key.public_key(),
            initial_balance: self.initial_balance,
        }));
        Ok(Prepared {
            transaction,
            signing_keys: Vec::new(),
            carry: private_key,
        })
    }

    fn complete(outcome: Outcome, private_key: PrivateKey) -> Result<AccountCreateResult, ProtocolError> {
        let account_id = required(
            outcome.receipt().account_id,
            Self::KIND,
            &outcome,
            "account_id",
        )?;
        let record = expect_record(outcome, Self::KIND)?;
        Ok(AccountCreateResult {
            transaction_id: record.transaction_id,
            status: record.receipt.status,
            transaction_hash: record.transaction_hash,
            consensus_timestamp: record.consensus_timestamp,
            transaction_fee: record.transaction_fee,
            account: NewAccount {
                account_id,
                public_key: private_key.public_key(),
                private_key,
            },
        })
    }
}

/// Deletes an account, moving its remaining balance to a beneficiary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountDeleteRequest {
    pub account_id: AccountId,
    pub account_key: PrivateKey,
    /// Beneficiary and its key; the operator account when absent.
    pub transfer_account: Option<(AccountId, PrivateKey)>,
    options: TransactionOptions,
}

impl AccountDeleteRequest {
    pub fn new(account_id: AccountId, account_key: PrivateKey) -> Self {
        Self {
            account_id,
            account_key,
            transfer_account: None,
            options: TransactionOptions::default(),
        }
    }

    pub fn with_transfer_account(mut self, account_id: AccountId, account_key: PrivateKey) -> Self {
        self.transfer_account = Some((account_id, account_key));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountDeleteResult {
    pub transaction_id: TransactionId,
    pub status: Status,
    pub transaction_hash: TransactionHash,
    pub consensus_timestamp: Timestamp,
    pub transaction_fee: Hbar,
}

impl TransactionRequest for AccountDeleteRequest {
    type Output = AccountDeleteResult;
    type Carry = ();

    const KIND: TransactionKind = TransactionKind::AccountDelete;
    const FINALITY: Finality = Finality::Record;

    fn prepare(&self, context: &ClientContext) -> Result<Prepared<()>, ValidationError> {
        let (transfer_account_id, transfer_key) = match &self.transfer_account {
            Some((account_id, key)) => (*account_id, key.clone()),
            None => (
                context.operator().account_id,
                context.operator().private_key.clone(),
            ),
        };
        if transfer_account_id == self.account_id {
            return Err(ValidationError::InvalidField {
                field: "transfer_account",
                reason: "must differ from the deleted account",
            });
        }
        let transaction = self.options.apply(Transaction::new(TransactionBody::AccountDelete {
            account_id: self.account_id,
            transfer_account_id,
        }));
        Ok(Prepared::new(
            transaction,
            vec![self.account_key.clone(), transfer_key],
        ))
    }

    fn complete(outcome: Outcome, _carry: ()) -> Result<AccountDeleteResult, ProtocolError> {
        let record = expect_record(outcome, Self::KIND)?;
        Ok(AccountDeleteResult {
            transaction_id: record.transaction_id,
            status: record.receipt.status,
            transaction_hash: record.transaction_hash,
            consensus_timestamp: record.consensus_timestamp,
            transaction_fee: record.transaction_fee,
        })
    }
}

impl_transaction_options!(AccountCreateRequest, AccountDeleteRequest);

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ledger_crypto::PrivateKey;
    use ledger_types::{AccountId, Hbar, TransactionBody};

    use super::{AccountCreateRequest, AccountDeleteRequest};
    use crate::config::ClientConfig;
    use crate::context::{ClientContext, OperatorAccount};
    use crate::requests::TransactionRequest;

    fn context() -> Arc<ClientContext> {
        Arc::new(ClientContext::new(
            OperatorAccount::new(AccountId::from_num(2), PrivateKey::from_bytes([0x02; 32])),
            ClientConfig::default(),
        ))
    }

    #[test]
    fn create_uses_generated_key() {
        let prepared = AccountCreateRequest::new(Hbar::new(1))
            .prepare(&context())
            .unwrap();
        match prepared.transaction.body() {
            TransactionBody::AccountCreate { key, initial_balance } => {
                assert_eq!(*key, prepared.carry.public_key());
                assert_eq!(*initial_balance, Hbar::new(1));
            }
            other => panic!("unexpected body {other:?}"),
        }
        assert!(prepared.signing_keys.is_empty());
    }

    #[test]
    fn delete_defaults_beneficiary_to_operator() {
        let context = context();
        let deleted_key = PrivateKey::from_bytes([0x09; 32]);
        let prepared = AccountDeleteRequest::new(AccountId::from_num(50), deleted_key.clone())
            .prepare(&context)
            .unwrap();
        assert!(matches!(
            prepared.transaction.body(),
            TransactionBody::AccountDelete { transfer_account_id, .. }
                if *transfer_account_id == AccountId::from_num(2)
        ));
        assert_eq!(
            prepared.signing_keys,
            vec![deleted_key, context.operator().private_key.clone()]
        );
    }

    #[test]
    fn delete_into_itself_is_rejected() {
        let key = PrivateKey::from_bytes([0x09; 32]);
        let request = AccountDeleteRequest::new(AccountId::from_num(50), key.clone())
            .with_transfer_account(AccountId::from_num(50), key);
        assert!(request.prepare(&context()).is_err());
    }
}
