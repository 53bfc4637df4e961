//! Network-bound transaction model: kind, body, and the freeze/sign state.
//!
//! A `Transaction` is configured through its `with_*` builders, frozen exactly
//! once (which fixes its id, node and canonical body bytes), signed, and then
//! handed to the network. Signatures always cover the frozen body bytes.

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{TransactionError, ValidationError};
use crate::ids::{
    AccountId, ContractId, FileId, Hbar, NftId, PublicKey, Timestamp, TokenId, TopicId,
    TransactionId,
};

/// Largest file payload accepted in a single create, update or append.
pub const MAX_FILE_CHUNK_BYTES: usize = 2048;

pub const DEFAULT_MAX_TRANSACTION_FEE: Hbar = Hbar::new(20);

pub const DEFAULT_VALID_DURATION: Duration = Duration::from_secs(120);

pub const MAX_VALID_DURATION: Duration = Duration::from_secs(180);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    AccountCreate,
    AccountDelete,
    FileCreate,
    FileUpdate,
    FileAppend,
    FileDelete,
    ContractCreate,
    ContractDelete,
    ContractCall,
    TopicCreate,
    TopicUpdate,
    TopicDelete,
    TopicMessageSubmit,
    TokenCreate,
    TokenAssociate,
    TokenDissociate,
    TokenMint,
    TokenBurn,
    TokenTransfer,
}

impl TransactionKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AccountCreate => "ACCOUNT_CREATE",
            Self::AccountDelete => "ACCOUNT_DELETE",
            Self::FileCreate => "FILE_CREATE",
            Self::FileUpdate => "FILE_UPDATE",
            Self::FileAppend => "FILE_APPEND",
            Self::FileDelete => "FILE_DELETE",
            Self::ContractCreate => "CONTRACT_CREATE",
            Self::ContractDelete => "CONTRACT_DELETE",
            Self::ContractCall => "CONTRACT_CALL",
            Self::TopicCreate => "TOPIC_CREATE",
            Self::TopicUpdate => "TOPIC_UPDATE",
            Self::TopicDelete => "TOPIC_DELETE",
            Self::TopicMessageSubmit => "TOPIC_MESSAGE_SUBMIT",
            Self::TokenCreate => "TOKEN_CREATE",
            Self::TokenAssociate => "TOKEN_ASSOCIATE",
            Self::TokenDissociate => "TOKEN_DISSOCIATE",
            Self::TokenMint => "TOKEN_MINT",
            Self::TokenBurn => "TOKEN_BURN",
            Self::TokenTransfer => "TOKEN_TRANSFER",
        }
    }

    /// Stable one-byte tag used by the canonical body encoding.
    pub const fn tag(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenType {
    FungibleCommon,
    NonFungibleUnique,
}

/// Mint either a fungible amount or one NFT per metadata entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MintSupply {
    Amount(u64),
    Metadata(Vec<Vec<u8>>),
}

/// Burn either a fungible amount or the listed NFT serials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BurnSupply {
    Amount(u64),
    Serials(Vec<u64>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTransfer {
    pub token_id: TokenId,
    pub account_id: AccountId,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftTransfer {
    pub nft_id: NftId,
    pub sender: AccountId,
    pub receiver: AccountId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionBody {
    AccountCreate {
        key: PublicKey,
        initial_balance: Hbar,
    },
    AccountDelete {
        account_id: AccountId,
        transfer_account_id: AccountId,
    },
    FileCreate {
        keys: Vec<PublicKey>,
        contents: Vec<u8>,
        memo: String,
        expiration_time: Option<Timestamp>,
    },
    FileUpdate {
        file_id: FileId,
        contents: Option<Vec<u8>>,
        memo: Option<String>,
        expiration_time: Option<Timestamp>,
    },
    FileAppend {
        file_id: FileId,
        contents: Vec<u8>,
    },
    FileDelete {
        file_id: FileId,
    },
    ContractCreate {
        bytecode_file_id: FileId,
        gas: u64,
        constructor_parameters: Vec<u8>,
    },
    ContractDelete {
        contract_id: ContractId,
        transfer_account_id: Option<AccountId>,
        transfer_contract_id: Option<ContractId>,
    },
    ContractCall {
        contract_id: ContractId,
        gas: u64,
        function_parameters: Vec<u8>,
    },
    TopicCreate {
        admin_key: Option<PublicKey>,
        submit_key: Option<PublicKey>,
        memo: Option<String>,
    },
    TopicUpdate {
        topic_id: TopicId,
        admin_key: Option<PublicKey>,
        submit_key: Option<PublicKey>,
        memo: Option<String>,
    },
    TopicDelete {
        topic_id: TopicId,
    },
    TopicMessageSubmit {
        topic_id: TopicId,
        message: Vec<u8>,
    },
    TokenCreate {
        name: String,
        symbol: String,
        treasury_account_id: AccountId,
        token_type: TokenType,
        supply_key: PublicKey,
    },
    TokenAssociate {
        account_id: AccountId,
        token_ids: Vec<TokenId>,
    },
    TokenDissociate {
        account_id: AccountId,
        token_ids: Vec<TokenId>,
    },
    TokenMint {
        token_id: TokenId,
        supply: MintSupply,
    },
    TokenBurn {
        token_id: TokenId,
        supply: BurnSupply,
    },
    TokenTransfer {
        token_transfers: Vec<TokenTransfer>,
        nft_transfers: Vec<NftTransfer>,
    },
}

impl TransactionBody {
    pub fn kind(&self) -> TransactionKind {
        match self {
            Self::AccountCreate { .. } => TransactionKind::AccountCreate,
            Self::AccountDelete { .. } => TransactionKind::AccountDelete,
            Self::FileCreate { .. } => TransactionKind::FileCreate,
            Self::FileUpdate { .. } => TransactionKind::FileUpdate,
            Self::FileAppend { .. } => TransactionKind::FileAppend,
            Self::FileDelete { .. } => TransactionKind::FileDelete,
            Self::ContractCreate { .. } => TransactionKind::ContractCreate,
            Self::ContractDelete { .. } => TransactionKind::ContractDelete,
            Self::ContractCall { .. } => TransactionKind::ContractCall,
            Self::TopicCreate { .. } => TransactionKind::TopicCreate,
            Self::TopicUpdate { .. } => TransactionKind::TopicUpdate,
            Self::TopicDelete { .. } => TransactionKind::TopicDelete,
            Self::TopicMessageSubmit { .. } => TransactionKind::TopicMessageSubmit,
            Self::TokenCreate { .. } => TransactionKind::TokenCreate,
            Self::TokenAssociate { .. } => TransactionKind::TokenAssociate,
            Self::TokenDissociate { .. } => TransactionKind::TokenDissociate,
            Self::TokenMint { .. } => TransactionKind::TokenMint,
            Self::TokenBurn { .. } => TransactionKind::TokenBurn,
            Self::TokenTransfer { .. } => TransactionKind::TokenTransfer,
        }
    }

    /// Kind-specific local checks; no network state is consulted.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let kind = self.kind();
        match self {
            Self::FileCreate { contents, .. } | Self::FileAppend { contents, .. } => {
                check_file_chunk(kind, contents)
            }
            Self::FileUpdate {
                contents: Some(contents),
                ..
            } => check_file_chunk(kind, contents),
            Self::TokenAssociate { token_ids, .. } | Self::TokenDissociate { token_ids, .. }
                if token_ids.is_empty() =>
            {
                Err(ValidationError::InvalidField {
                    field: "token_ids",
                    reason: "at least one token is required",
                })
            }
            Self::TokenMint {
                supply: MintSupply::Metadata(metadata),
                ..
            } if metadata.is_empty() => Err(ValidationError::InvalidField {
                field: "metadata",
                reason: "at least one metadata entry is required",
            }),
            Self::TokenBurn {
                supply: BurnSupply::Serials(serials),
                ..
            } => {
                if serials.is_empty() {
                    return Err(ValidationError::InvalidField {
                        field: "serials",
                        reason: "at least one serial is required",
                    });
                }
                let mut seen = HashSet::with_capacity(serials.len());
                if !serials.iter().all(|serial| seen.insert(*serial)) {
                    return Err(ValidationError::InvalidField {
                        field: "serials",
                        reason: "serials must not repeat",
                    });
                }
                Ok(())
            }
            Self::TokenTransfer {
                token_transfers,
                nft_transfers,
            } => {
                if token_transfers.is_empty() && nft_transfers.is_empty() {
                    return Err(ValidationError::InvalidField {
                        field: "transfers",
                        reason: "at least one transfer is required",
                    });
                }
                let net = token_transfers
                    .iter()
                    .try_fold(0i64, |acc, t| acc.checked_add(t.amount));
                if net != Some(0) {
                    return Err(ValidationError::InvalidField {
                        field: "token_transfers",
                        reason: "fungible transfers must sum to zero",
                    });
                }
                let mut seen = HashSet::with_capacity(nft_transfers.len());
                if !nft_transfers.iter().all(|nft| seen.insert(nft.nft_id)) {
                    return Err(ValidationError::InvalidField {
                        field: "nft_transfers",
                        reason: "an nft may be transferred only once per transaction",
                    });
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

fn check_file_chunk(kind: TransactionKind, contents: &[u8]) -> Result<(), ValidationError> {
    if contents.len() > MAX_FILE_CHUNK_BYTES {
        return Err(ValidationError::PayloadTooLarge {
            kind,
            limit: MAX_FILE_CHUNK_BYTES,
            actual: contents.len(),
        });
    }
    Ok(())
}

/// State fixed by freezing: everything a signature commits to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrozenBody {
    pub transaction_id: TransactionId,
    pub node_account_id: AccountId,
    pub body_bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignaturePair {
    pub public_key: PublicKey,
    pub signature: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    body: TransactionBody,
    max_transaction_fee: Hbar,
    valid_duration: Duration,
    memo: String,
    frozen: Option<FrozenBody>,
    signatures: Vec<SignaturePair>,
}

impl Transaction {
    pub fn new(body: TransactionBody) -> Self {
        Self {
            body,
            max_transaction_fee: DEFAULT_MAX_TRANSACTION_FEE,
            valid_duration: DEFAULT_VALID_DURATION,
            memo: String::new(),
            frozen: None,
            signatures: Vec::new(),
        }
    }

    pub fn with_max_transaction_fee(mut self, fee: Hbar) -> Self {
        self.max_transaction_fee = fee;
        self
    }

    pub fn with_valid_duration(mut self, duration: Duration) -> Self {
        self.valid_duration = duration;
        self
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = memo.into();
        self
    }

    pub fn kind(&self) -> TransactionKind {
        self.body.kind()
    }

    pub fn body(&self) -> &TransactionBody {
        &self.body
    }

    pub fn max_transaction_fee(&self) -> Hbar {
        self.max_transaction_fee
    }

    pub fn valid_duration(&self) -> Duration {
        self.valid_duration
    }

    pub fn memo(&self) -> &str {
        &self.memo
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.valid_duration.is_zero() || self.valid_duration > MAX_VALID_DURATION {
            return Err(ValidationError::InvalidField {
                field: "transaction_valid_duration",
                reason: "must be between 1 and 180 seconds",
            });
        }
        if self.max_transaction_fee.to_tinybars() <= 0 {
            return Err(ValidationError::InvalidField {
                field: "max_transaction_fee",
                reason: "must be positive",
            });
        }
        self.body.validate()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.is_some()
    }

    pub fn frozen(&self) -> Option<&FrozenBody> {
        self.frozen.as_ref()
    }

    pub fn transaction_id(&self) -> Option<TransactionId> {
        self.frozen.as_ref().map(|frozen| frozen.transaction_id)
    }

    /// Fixes the transaction for signing. Freezing twice is a caller bug.
    pub fn freeze(&mut self, frozen: FrozenBody) -> Result<(), TransactionError> {
        if self.frozen.is_some() {
            return Err(TransactionError::AlreadyFrozen(self.kind()));
        }
        self.frozen = Some(frozen);
        Ok(())
    }

    /// Adds a signature; returns `false` when this key has already signed.
    pub fn add_signature(&mut self, pair: SignaturePair) -> Result<bool, TransactionError> {
        if self.frozen.is_none() {
            return Err(TransactionError::NotFrozen(self.kind()));
        }
        if self.is_signed_by(&pair.public_key) {
            return Ok(false);
        }
        self.signatures.push(pair);
        Ok(true)
    }

    pub fn is_signed_by(&self, public_key: &PublicKey) -> bool {
        self.signatures
            .iter()
            .any(|existing| &existing.public_key == public_key)
    }

    pub fn signatures(&self) -> &[SignaturePair] {
        &self.signatures
    }
}

#[cfg(test)]
mod tests {
    use super::{
        BurnSupply, FrozenBody, NftTransfer, SignaturePair, TokenTransfer, Transaction,
        TransactionBody, TransactionKind, MAX_FILE_CHUNK_BYTES,
    };
    use crate::error::{TransactionError, ValidationError};
    use crate::ids::{AccountId, FileId, NftId, PublicKey, Timestamp, TokenId, TransactionId};

    fn frozen_body() -> FrozenBody {
        FrozenBody {
            transaction_id: TransactionId::new(AccountId::from_num(2), Timestamp::new(10, 0)),
            node_account_id: AccountId::from_num(3),
            body_bytes: vec![1, 2, 3],
        }
    }

    #[test]
    fn freezing_twice_is_rejected() {
        let mut tx = Transaction::new(TransactionBody::FileDelete {
            file_id: FileId::from_num(5),
        });
        tx.freeze(frozen_body()).unwrap();
        let err = tx.freeze(frozen_body()).expect_err("second freeze must fail");
        assert_eq!(err, TransactionError::AlreadyFrozen(TransactionKind::FileDelete));
    }

    #[test]
    fn signing_requires_frozen_state_and_dedupes_keys() {
        let mut tx = Transaction::new(TransactionBody::FileDelete {
            file_id: FileId::from_num(5),
        });
        let pair = SignaturePair {
            public_key: PublicKey::new([7; 32]),
            signature: vec![0; 64],
        };
        assert!(matches!(
            tx.add_signature(pair.clone()),
            Err(TransactionError::NotFrozen(_))
        ));
        tx.freeze(frozen_body()).unwrap();
        assert!(tx.add_signature(pair.clone()).unwrap());
        assert!(!tx.add_signature(pair).unwrap());
        assert_eq!(tx.signatures().len(), 1);
    }

    #[test]
    fn oversized_file_payload_is_rejected() {
        let tx = Transaction::new(TransactionBody::FileAppend {
            file_id: FileId::from_num(5),
            contents: vec![0; MAX_FILE_CHUNK_BYTES + 1],
        });
        let err = tx.validate().expect_err("payload above limit");
        assert!(matches!(err, ValidationError::PayloadTooLarge { actual, .. } if actual == MAX_FILE_CHUNK_BYTES + 1));
        assert!(err.to_string().contains("file append"));
    }

    #[test]
    fn payload_at_limit_is_accepted() {
        let tx = Transaction::new(TransactionBody::FileAppend {
            file_id: FileId::from_num(5),
            contents: vec![0; MAX_FILE_CHUNK_BYTES],
        });
        tx.validate().unwrap();
    }

    #[test]
    fn unbalanced_fungible_transfer_is_rejected() {
        let token_id = TokenId::from_num(9);
        let body = TransactionBody::TokenTransfer {
            token_transfers: vec![
                TokenTransfer {
                    token_id,
                    account_id: AccountId::from_num(10),
                    amount: -5,
                },
                TokenTransfer {
                    token_id,
                    account_id: AccountId::from_num(11),
                    amount: 4,
                },
            ],
            nft_transfers: Vec::new(),
        };
        assert!(body.validate().is_err());
    }

    #[test]
    fn empty_burn_serials_are_rejected() {
        let body = TransactionBody::TokenBurn {
            token_id: TokenId::from_num(9),
            supply: BurnSupply::Serials(Vec::new()),
        };
        assert!(body.validate().is_err());
    }

    #[test]
    fn repeated_burn_serials_are_rejected() {
        let body = TransactionBody::TokenBurn {
            token_id: TokenId::from_num(9),
            supply: BurnSupply::Serials(vec![1, 2, 1]),
        };
        let err = body.validate().expect_err("repeated serial");
        assert_eq!(
            err,
            ValidationError::InvalidField {
                field: "serials",
                reason: "serials must not repeat",
            }
        );
    }

    #[test]
    fn repeated_nft_transfer_is_rejected() {
        let nft_id = NftId {
            token_id: TokenId::from_num(9),
            serial: 4,
        };
        let transfer = NftTransfer {
            nft_id,
            sender: AccountId::from_num(10),
            receiver: AccountId::from_num(11),
        };
        let body = TransactionBody::TokenTransfer {
            token_transfers: Vec::new(),
            nft_transfers: vec![transfer.clone(), transfer],
        };
        assert!(matches!(
            body.validate(),
            Err(ValidationError::InvalidField { field: "nft_transfers", .. })
        ));
    }
}
