//! Error types for local validation, transaction state and key handling.

use thiserror::Error;

use crate::transaction::TransactionKind;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid length for {kind}: expected {expected}, got {actual}")]
    InvalidLength {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),
    #[error("{0}")]
    Message(String),
}

/// Local request validation failures, raised before any network call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid length for {kind}: expected {expected}, got {actual}")]
    InvalidLength {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error(
        "{kind} payload of {actual} bytes exceeds the {limit} byte limit of a single transaction; \
         split the contents and send the rest with multiple file append transactions"
    )]
    PayloadTooLarge {
        kind: TransactionKind,
        limit: usize,
        actual: usize,
    },
    #[error("{kind} requires exactly one of {first} or {second}")]
    ExclusiveFields {
        kind: TransactionKind,
        first: &'static str,
        second: &'static str,
    },
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("invalid field `{field}`: {reason}")]
    InvalidField {
        field: &'static str,
        reason: &'static str,
    },
    #[error("{0}")]
    Message(String),
}

/// Misuse of the transaction freeze/sign lifecycle.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("{0} transaction is already frozen")]
    AlreadyFrozen(TransactionKind),
    #[error("{0} transaction must be frozen before it is signed")]
    NotFrozen(TransactionKind),
}

/// Contract ABI encode/decode failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AbiError {
    #[error("result too short: word {index} needs {needed} bytes, got {actual}")]
    OutOfBounds {
        index: usize,
        needed: usize,
        actual: usize,
    },
    #[error("value at word {index} does not fit in {target}")]
    Overflow { index: usize, target: &'static str },
    #[error("invalid utf-8 string at word {0}")]
    InvalidUtf8(usize),
    #[error("{0}")]
    Message(String),
}
