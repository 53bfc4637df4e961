//! Uniform error type for every client operation.
//!
//! Each failure carries the stage it happened in (`ErrorKind`), a message,
//! the underlying cause and whatever transaction context was known at the
//! time. Callers can treat an operation as one fallible unit and still tell
//! a rejected submission apart from a failed record fetch.

use std::error::Error as StdError;
use std::fmt;

use ledger_types::{
    Status, TransactionError, TransactionId, TransactionKind, TransactionReceipt, ValidationError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Local checks failed before any network call.
    Validation,
    /// Freeze/sign misuse.
    Signing,
    Submission,
    Receipt,
    Record,
    Query,
    /// Receipt or record lacked a field the result needs.
    Mapping,
}

impl ErrorKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Signing => "signing",
            Self::Submission => "submission",
            Self::Receipt => "receipt",
            Self::Record => "record",
            Self::Query => "query",
            Self::Mapping => "mapping",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    pub transaction_kind: Option<TransactionKind>,
    pub transaction_id: Option<TransactionId>,
    pub receipt: Option<Box<TransactionReceipt>>,
}

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
#[error("{kind} failed{}: {message}", describe_context(.context))]
pub struct ProtocolError {
    kind: ErrorKind,
    message: String,
    context: ErrorContext,
    #[source]
    source: Option<BoxError>,
}

impl ProtocolError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    pub fn validation(transaction_kind: Option<TransactionKind>, err: ValidationError) -> Self {
        let mut error = Self::new(ErrorKind::Validation, err.to_string()).with_source(err);
        error.context.transaction_kind = transaction_kind;
        error
    }

    pub fn signing(err: TransactionError) -> Self {
        Self::new(ErrorKind::Signing, err.to_string()).with_source(err)
    }

    pub fn mapping(
        transaction_kind: TransactionKind,
        transaction_id: TransactionId,
        missing: &'static str,
    ) -> Self {
        Self::new(
            ErrorKind::Mapping,
            format!("{transaction_kind} result is missing `{missing}`"),
        )
        .with_transaction(transaction_kind, Some(transaction_id))
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn with_transaction(
        mut self,
        transaction_kind: TransactionKind,
        transaction_id: Option<TransactionId>,
    ) -> Self {
        self.context.transaction_kind = Some(transaction_kind);
        self.context.transaction_id = transaction_id;
        self
    }

    pub fn with_receipt(mut self, receipt: TransactionReceipt) -> Self {
        self.context.transaction_id = Some(receipt.transaction_id);
        self.context.receipt = Some(Box::new(receipt));
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn context(&self) -> &ErrorContext {
        &self.context
    }

    pub fn transaction_kind(&self) -> Option<TransactionKind> {
        self.context.transaction_kind
    }

    pub fn transaction_id(&self) -> Option<TransactionId> {
        self.context.transaction_id
    }

    pub fn receipt(&self) -> Option<&TransactionReceipt> {
        self.context.receipt.as_deref()
    }

    pub fn receipt_status(&self) -> Option<Status> {
        self.receipt().map(|receipt| receipt.status)
    }

    /// Downcasts the underlying cause, e.g. to a `NetworkError`.
    pub fn source_as<E: StdError + 'static>(&self) -> Option<&E> {
        self.source.as_ref().and_then(|source| source.downcast_ref::<E>())
    }
}

fn describe_context(context: &ErrorContext) -> String {
    match (context.transaction_kind, context.transaction_id) {
        (Some(kind), Some(id)) => format!(" for {kind} {id}"),
        (Some(kind), None) => format!(" for {kind}"),
        (None, Some(id)) => format!(" for {id}"),
        (None, None) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use ledger_types::{
        AccountId, Status, Timestamp, TransactionId, TransactionKind, TransactionReceipt,
        ValidationError,
    };

    use super::{ErrorKind, ProtocolError};

    #[test]
    fn validation_error_has_no_network_context() {
        let err = ProtocolError::validation(
            Some(TransactionKind::TokenBurn),
            ValidationError::MissingField("amount"),
        );
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.transaction_id(), None);
        assert!(err.receipt().is_none());
        assert!(err.source_as::<ValidationError>().is_some());
        assert_eq!(
            err.to_string(),
            "validation failed for TOKEN_BURN: missing required field `amount`"
        );
    }

    #[test]
    fn receipt_context_exposes_status() {
        let id = TransactionId::new(AccountId::from_num(2), Timestamp::new(5, 6));
        let err = ProtocolError::new(ErrorKind::Record, "record unavailable")
            .with_transaction(TransactionKind::ContractCall, Some(id))
            .with_receipt(TransactionReceipt::new(id, Status::Success));
        assert_eq!(err.receipt_status(), Some(Status::Success));
        assert_eq!(err.transaction_id(), Some(id));
        assert!(err.source().is_none());
        assert!(err.to_string().starts_with("record failed for CONTRACT_CALL 0.0.2@"));
    }
}
