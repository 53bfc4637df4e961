use ledger_types::{
    FileId, Status, Timestamp, Transaction, TransactionBody, TransactionId, TransactionKind,
    ValidationError,
};

use super::{
    impl_transaction_options, required, FileAppendResult, FileDeleteResult, FileUpdateResult,
    Finality, Outcome, Prepared, TransactionOptions, TransactionRequest, TransactionResult,
};
use crate::context::ClientContext;
use crate::error::ProtocolError;

/// Creates a file owned by the operator key. Contents above the single
/// transaction limit must be split and sent with `FileAppendRequest`s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCreateRequest {
    pub contents: Vec<u8>,
    pub memo: String,
    pub expiration_time: Option<Timestamp>,
    options: TransactionOptions,
}

impl FileCreateRequest {
    pub fn new(contents: impl Into<Vec<u8>>) -> Self {
        Self {
            contents: contents.into(),
            memo: String::new(),
            expiration_time: None,
            options: TransactionOptions::default(),
        }
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = memo.into();
        self
    }

    pub fn with_expiration_time(mut self, expiration_time: Timestamp) -> Self {
        self.expiration_time = Some(expiration_time);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileCreateResult {
    pub transaction_id: TransactionId,
    pub status: Status,
    pub file_id: FileId,
}

impl TransactionRequest for FileCreateRequest {
    type Output = FileCreateResult;
    type Carry = ();

    const KIND: TransactionKind = TransactionKind::FileCreate;
    const FINALITY: Finality = Finality::Receipt;

    fn prepare(&self, context: &ClientContext) -> Result<Prepared<()>, ValidationError> {
        let transaction = self.options.apply(Transaction::new(TransactionBody::FileCreate {
            keys: vec![context.operator().public_key()],
            contents: self.contents.clone(),
            memo: self.memo.clone(),
            expiration_time: self.expiration_time,
        }));
        transaction.body().validate()?;
        Ok(Prepared::new(transaction, Vec::new()))
    }

    fn complete(outcome: Outcome, _carry: ()) -> Result<FileCreateResult, ProtocolError> {
        let receipt = outcome.receipt();
        Ok(FileCreateResult {
            transaction_id: receipt.transaction_id,
            status: receipt.status,
            file_id: required(receipt.file_id, Self::KIND, &outcome, "file_id")?,
        })
    }
}

/// Replaces any of contents, memo or expiration of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpdateRequest {
    pub file_id: FileId,
    pub contents: Option<Vec<u8>>,
    pub memo: Option<String>,
    pub expiration_time: Option<Timestamp>,
    options: TransactionOptions,
}

impl FileUpdateRequest {
    pub fn new(file_id: FileId) -> Self {
        Self {
            file_id,
            contents: None,
            memo: None,
            expiration_time: None,
            options: TransactionOptions::default(),
        }
    }

    pub fn with_contents(mut self, contents: impl Into<Vec<u8>>) -> Self {
        self.contents = Some(contents.into());
        self
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }

    pub fn with_expiration_time(mut self, expiration_time: Timestamp) -> Self {
        self.expiration_time = Some(expiration_time);
        self
    }
}

impl TransactionRequest for FileUpdateRequest {
    type Output = FileUpdateResult;
    type Carry = ();

    const KIND: TransactionKind = TransactionKind::FileUpdate;
    const FINALITY: Finality = Finality::Receipt;

    fn prepare(&self, _context: &ClientContext) -> Result<Prepared<()>, ValidationError> {
        let transaction = self.options.apply(Transaction::new(TransactionBody::FileUpdate {
            file_id: self.file_id,
            contents: self.contents.clone(),
            memo: self.memo.clone(),
            expiration_time: self.expiration_time,
        }));
        transaction.body().validate()?;
        Ok(Prepared::new(transaction, Vec::new()))
    }

    fn complete(outcome: Outcome, _carry: ()) -> Result<FileUpdateResult, ProtocolError> {
        Ok(TransactionResult::from_outcome(&outcome))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAppendRequest {
    pub file_id: FileId,
    pub contents: Vec<u8>,
    options: TransactionOptions,
}

impl FileAppendRequest {
    pub fn new(file_id: FileId, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            file_id,
            contents: contents.into(),
            options: TransactionOptions::default(),
        }
    }
}

impl TransactionRequest for FileAppendRequest {
    type Output = FileAppendResult;
    type Carry = ();

    const KIND: TransactionKind = TransactionKind::FileAppend;
    const FINALITY: Finality = Finality::Receipt;

    fn prepare(&self, _context: &ClientContext) -> Result<Prepared<()>, ValidationError> {
        let transaction = self.options.apply(Transaction::new(TransactionBody::FileAppend {
            file_id: self.file_id,
            contents: self.contents.clone(),
        }));
        transaction.body().validate()?;
        Ok(Prepared::new(transaction, Vec::new()))
    }

    fn complete(outcome: Outcome, _carry: ()) -> Result<FileAppendResult, ProtocolError> {
        Ok(TransactionResult::from_outcome(&outcome))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDeleteRequest {
    pub file_id: FileId,
    options: TransactionOptions,
}

impl FileDeleteRequest {
    pub fn new(file_id: FileId) -> Self {
        Self {
            file_id,
            options: TransactionOptions::default(),
        }
    }
}

impl TransactionRequest for FileDeleteRequest {
    type Output = FileDeleteResult;
    type Carry = ();

    const KIND: TransactionKind = TransactionKind::FileDelete;
    const FINALITY: Finality = Finality::Receipt;

    fn prepare(&self, _context: &ClientContext) -> Result<Prepared<()>, ValidationError> {
        let transaction = self.options.apply(Transaction::new(TransactionBody::FileDelete {
            file_id: self.file_id,
        }));
        Ok(Prepared::new(transaction, Vec::new()))
    }

    fn complete(outcome: Outcome, _carry: ()) -> Result<FileDeleteResult, ProtocolError> {
        Ok(TransactionResult::from_outcome(&outcome))
    }
}

impl_transaction_options!(
    FileCreateRequest,
    FileUpdateRequest,
    FileAppendRequest,
    FileDeleteRequest,
);
