use ledger_crypto::PrivateKey;
use ledger_types::{
    PublicKey, Status, Transaction, TransactionBody, TransactionId, TransactionKind, TopicId,
    ValidationError,
};

use super::{
    impl_transaction_options, required, Finality, Outcome, Prepared, TopicDeleteResult,
    TopicUpdateResult, TransactionOptions, TransactionRequest, TransactionResult,
};
use crate::context::ClientContext;
use crate::error::ProtocolError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TopicCreateRequest {
    /// Signs the create and controls later updates and deletion.
    pub admin_key: Option<PrivateKey>,
    pub submit_key: Option<PublicKey>,
    pub memo: Option<String>,
    options: TransactionOptions,
}

impl TopicCreateRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_admin_key(mut self, key: PrivateKey) -> Self {
        self.admin_key = Some(key);
        self
    }

    pub fn with_submit_key(mut self, key: PublicKey) -> Self {
        self.submit_key = Some(key);
        self
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicCreateResult {
    pub transaction_id: TransactionId,
    pub status: Status,
    pub topic_id: TopicId,
}

impl TransactionRequest for TopicCreateRequest {
    type Output = TopicCreateResult;
    type Carry = ();

    const KIND: TransactionKind = TransactionKind::TopicCreate;
    const FINALITY: Finality = Finality::Receipt;

    fn prepare(&self, _context: &ClientContext) -> Result<Prepared<()>, ValidationError> {
        let transaction = self.options.apply(Transaction::new(TransactionBody::TopicCreate {
            admin_key: self.admin_key.as_ref().map(PrivateKey::public_key),
            submit_key: self.submit_key,
            memo: self.memo.clone(),
        }));
        Ok(Prepared::new(
            transaction,
            self.admin_key.iter().cloned().collect(),
        ))
    }

    fn complete(outcome: Outcome, _carry: ()) -> Result<TopicCreateResult, ProtocolError> {
        let receipt = outcome.receipt();
        Ok(TopicCreateResult {
            transaction_id: receipt.transaction_id,
            status: receipt.status,
            topic_id: required(receipt.topic_id, Self::KIND, &outcome, "topic_id")?,
        })
    }
}

/// Updates a topic. Rotating the admin key needs both the current and the
/// new admin key to sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicUpdateRequest {
    pub topic_id: TopicId,
    pub admin_key: PrivateKey,
    pub new_admin_key: Option<PrivateKey>,
    pub submit_key: Option<PublicKey>,
    pub memo: Option<String>,
    options: TransactionOptions,
}

impl TopicUpdateRequest {
    pub fn new(topic_id: TopicId, admin_key: PrivateKey) -> Self {
        Self {
            topic_id,
            admin_key,
            new_admin_key: None,
            submit_key: None,
            memo: None,
            options: TransactionOptions::default(),
        }
    }

    pub fn with_new_admin_key(mut self, key: PrivateKey) -> Self {
        self.new_admin_key = Some(key);
        self
    }

    pub fn with_submit_key(mut self, key: PublicKey) -> Self {
        self.submit_key = Some(key);
        self
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }
}

impl TransactionRequest for TopicUpdateRequest {
    type Output = TopicUpdateResult;
    type Carry = ();

    const KIND: TransactionKind = TransactionKind::TopicUpdate;
    const FINALITY: Finality = Finality::Receipt;

    fn prepare(&self, _context: &ClientContext) -> Result<Prepared<()>, ValidationError> {
        let transaction = self.options.apply(Transaction::new(TransactionBody::TopicUpdate {
            topic_id: self.topic_id,
            admin_key: self.new_admin_key.as_ref().map(PrivateKey::public_key),
            submit_key: self.submit_key,
            memo: self.memo.clone(),
        }));
        let mut keys = vec![self.admin_key.clone()];
        keys.extend(self.new_admin_key.iter().cloned());
        Ok(Prepared::new(transaction, keys))
    }

    fn complete(outcome: Outcome, _carry: ()) -> Result<TopicUpdateResult, ProtocolError> {
        Ok(TransactionResult::from_outcome(&outcome))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicDeleteRequest {
    pub topic_id: TopicId,
    pub admin_key: PrivateKey,
    options: TransactionOptions,
}

impl TopicDeleteRequest {
    pub fn new(topic_id: TopicId, admin_key: PrivateKey) -> Self {
        Self {
            topic_id,
            admin_key,
            options: TransactionOptions::default(),
        }
    }
}

impl TransactionRequest for TopicDeleteRequest {
    type Output = TopicDeleteResult;
    type Carry = ();

    const KIND: TransactionKind = TransactionKind::TopicDelete;
    const FINALITY: Finality = Finality::Receipt;

    fn prepare(&self, _context: &ClientContext) -> Result<Prepared<()>, ValidationError> {
        let transaction = self.options.apply(Transaction::new(TransactionBody::TopicDelete {
            topic_id: self.topic_id,
        }));
        Ok(Prepared::new(transaction, vec![self.admin_key.clone()]))
    }

    fn complete(outcome: Outcome, _carry: ()) -> Result<TopicDeleteResult, ProtocolError> {
        Ok(TransactionResult::from_outcome(&outcome))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSubmitMessageRequest {
    pub topic_id: TopicId,
    pub message: Vec<u8>,
    /// Required when the topic was created with a submit key.
    pub submit_key: Option<PrivateKey>,
    options: TransactionOptions,
}

impl TopicSubmitMessageRequest {
    pub fn new(topic_id: TopicId, message: impl Into<Vec<u8>>) -> Self {
        Self {
            topic_id,
            message: message.into(),
            submit_key: None,
            options: TransactionOptions::default(),
        }
    }

    pub fn with_submit_key(mut self, key: PrivateKey) -> Self {
        self.submit_key = Some(key);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicSubmitMessageResult {
    pub transaction_id: TransactionId,
    pub status: Status,
    pub topic_sequence_number: u64,
}

impl TransactionRequest for TopicSubmitMessageRequest {
    type Output = TopicSubmitMessageResult;
    type Carry = ();

    const KIND: TransactionKind = TransactionKind::TopicMessageSubmit;
    const FINALITY: Finality = Finality::Receipt;

    fn prepare(&self, _context: &ClientContext) -> Result<Prepared<()>, ValidationError> {
        if self.message.is_empty() {
            return Err(ValidationError::MissingField("message"));
        }
        let transaction = self.options.apply(Transaction::new(TransactionBody::TopicMessageSubmit {
            topic_id: self.topic_id,
            message: self.message.clone(),
        }));
        Ok(Prepared::new(
            transaction,
            self.submit_key.iter().cloned().collect(),
        ))
    }

    fn complete(outcome: Outcome, _carry: ()) -> Result<TopicSubmitMessageResult, ProtocolError> {
        let receipt = outcome.receipt();
        Ok(TopicSubmitMessageResult {
            transaction_id: receipt.transaction_id,
            status: receipt.status,
            topic_sequence_number: receipt.topic_sequence_number,
        })
    }
}

impl_transaction_options!(
    TopicCreateRequest,
    TopicUpdateRequest,
    TopicDeleteRequest,
    TopicSubmitMessageRequest,
);

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ledger_crypto::PrivateKey;
    use ledger_types::{AccountId, TopicId, TransactionBody};

    use super::{TopicCreateRequest, TopicSubmitMessageRequest, TopicUpdateRequest};
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
    fn create_without_admin_key_needs_no_extra_signature() {
        let prepared = TopicCreateRequest::new().prepare(&context()).unwrap();
        assert!(prepared.signing_keys.is_empty());
    }

    #[test]
    fn rotating_admin_key_signs_with_old_and_new() {
        let old = PrivateKey::from_bytes([0x31; 32]);
        let new = PrivateKey::from_bytes([0x32; 32]);
        let prepared = TopicUpdateRequest::new(TopicId::from_num(8), old.clone())
            .with_new_admin_key(new.clone())
            .prepare(&context())
            .unwrap();
        assert_eq!(prepared.signing_keys, vec![old, new.clone()]);
        assert!(matches!(
            prepared.transaction.body(),
            TransactionBody::TopicUpdate { admin_key: Some(key), .. } if *key == new.public_key()
        ));
    }

    #[test]
    fn empty_message_is_rejected() {
        let request = TopicSubmitMessageRequest::new(TopicId::from_num(8), Vec::new());
        assert!(request.prepare(&context()).is_err());
    }
}
