//! Typed requests and results for every transaction kind.
//!
//! A request knows how to build its network transaction (`prepare`) and how
//! to turn the final receipt or record into its result (`complete`). The
//! client runs all of them through one generic `execute`.

use std::time::Duration;

use ledger_crypto::PrivateKey;
use ledger_types::{
    Hbar, Status, Transaction, TransactionId, TransactionKind, TransactionReceipt,
    TransactionRecord, ValidationError, DEFAULT_MAX_TRANSACTION_FEE, DEFAULT_VALID_DURATION,
};

use crate::context::ClientContext;
use crate::error::ProtocolError;

pub mod account;
pub mod contract;
pub mod file;
pub mod query;
pub mod token;
pub mod topic;

pub use account::{
    AccountCreateRequest, AccountCreateResult, AccountDeleteRequest, AccountDeleteResult,
    NewAccount,
};
pub use contract::{
    ContractCallRequest, ContractCallResult, ContractCreateRequest, ContractCreateResult,
    ContractDeleteRequest,
};
pub use file::{
    FileAppendRequest, FileCreateRequest, FileCreateResult, FileDeleteRequest, FileUpdateRequest,
};
pub use query::{
    AccountBalanceRequest, AccountBalanceResponse, FileContentsRequest, FileContentsResponse,
    FileInfoRequest, FileInfoResponse, QueryPayment, QueryRequest, TopicMessageRequest,
    TopicMessageResult,
};
pub use token::{
    TokenAssociateRequest, TokenBurnRequest, TokenBurnResult, TokenCreateRequest,
    TokenCreateResult, TokenDissociateRequest, TokenMintRequest, TokenMintResult,
    TokenTransferRequest,
};
pub use topic::{
    TopicCreateRequest, TopicCreateResult, TopicDeleteRequest, TopicSubmitMessageRequest,
    TopicSubmitMessageResult, TopicUpdateRequest,
};

/// Which consensus artifact an operation waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finality {
    Receipt,
    Record,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Receipt(TransactionReceipt),
    Record(TransactionRecord),
}

impl Outcome {
    pub fn receipt(&self) -> &TransactionReceipt {
        match self {
            Self::Receipt(receipt) => receipt,
            Self::Record(record) => &record.receipt,
        }
    }

    pub fn transaction_id(&self) -> TransactionId {
        self.receipt().transaction_id
    }
}

/// A transaction ready for the pipeline plus the extra keys that must sign
/// it and any request-side data the result needs afterwards.
pub struct Prepared<C> {
    pub transaction: Transaction,
    pub signing_keys: Vec<PrivateKey>,
    pub carry: C,
}

impl Prepared<()> {
    pub fn new(transaction: Transaction, signing_keys: Vec<PrivateKey>) -> Self {
        Self {
            transaction,
            signing_keys,
            carry: (),
        }
    }
}

pub trait TransactionRequest {
    type Output;
    type Carry: Send;

    const KIND: TransactionKind;
    const FINALITY: Finality;

    fn prepare(&self, context: &ClientContext) -> Result<Prepared<Self::Carry>, ValidationError>;

    fn complete(outcome: Outcome, carry: Self::Carry) -> Result<Self::Output, ProtocolError>;
}

/// Fee ceiling and validity window shared by every transaction request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionOptions {
    pub max_transaction_fee: Hbar,
    pub transaction_valid_duration: Duration,
}

impl Default for TransactionOptions {
    fn default() -> Self {
        Self {
            max_transaction_fee: DEFAULT_MAX_TRANSACTION_FEE,
            transaction_valid_duration: DEFAULT_VALID_DURATION,
        }
    }
}

impl TransactionOptions {
    pub(crate) fn apply(&self, transaction: Transaction) -> Transaction {
        transaction
            .with_max_transaction_fee(self.max_transaction_fee)
            .with_valid_duration(self.transaction_valid_duration)
    }
}

macro_rules! impl_transaction_options {
    ($($name:ident),+ $(,)?) => {
        $(
            impl $name {
                pub fn with_max_transaction_fee(mut self, fee: ledger_types::Hbar) -> Self {
                    self.options.max_transaction_fee = fee;
                    self
                }

                pub fn with_transaction_valid_duration(
                    mut self,
                    duration: std::time::Duration,
                ) -> Self {
                    self.options.transaction_valid_duration = duration;
                    self
                }

                pub fn options(&self) -> &$crate::requests::TransactionOptions {
                    &self.options
                }
            }
        )+
    };
}
pub(crate) use impl_transaction_options;

/// Result of operations that report nothing beyond their outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionResult {
    pub transaction_id: TransactionId,
    pub status: Status,
}

impl TransactionResult {
    pub(crate) fn from_outcome(outcome: &Outcome) -> Self {
        let receipt = outcome.receipt();
        Self {
            transaction_id: receipt.transaction_id,
            status: receipt.status,
        }
    }
}

pub type FileUpdateResult = TransactionResult;
pub type FileAppendResult = TransactionResult;
pub type FileDeleteResult = TransactionResult;
pub type ContractDeleteResult = TransactionResult;
pub type TopicUpdateResult = TransactionResult;
pub type TopicDeleteResult = TransactionResult;
pub type TokenAssociateResult = TransactionResult;
pub type TokenDissociateResult = TransactionResult;
pub type TokenTransferResult = TransactionResult;

/// Reads a field the result cannot do without.
pub(crate) fn required<T>(
    value: Option<T>,
    kind: TransactionKind,
    outcome: &Outcome,
    field: &'static str,
) -> Result<T, ProtocolError> {
    value.ok_or_else(|| {
        ProtocolError::mapping(kind, outcome.transaction_id(), field)
            .with_receipt(outcome.receipt().clone())
    })
}

/// The record of a record-finality operation.
pub(crate) fn expect_record(
    outcome: Outcome,
    kind: TransactionKind,
) -> Result<TransactionRecord, ProtocolError> {
    match outcome {
        Outcome::Record(record) => Ok(record),
        Outcome::Receipt(receipt) => {
            Err(ProtocolError::mapping(kind, receipt.transaction_id, "record").with_receipt(receipt))
        }
    }
}

/// Checks that exactly one of two alternative payload fields is set.
pub(crate) fn exactly_one(
    kind: TransactionKind,
    first: (&'static str, bool),
    second: (&'static str, bool),
) -> Result<(), ValidationError> {
    if first.1 == second.1 {
        return Err(ValidationError::ExclusiveFields {
            kind,
            first: first.0,
            second: second.0,
        });
    }
    Ok(())
}
