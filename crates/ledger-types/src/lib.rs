pub mod error;
pub mod ids;
pub mod query;
pub mod receipt;
pub mod status;
pub mod transaction;

pub use error::{AbiError, CryptoError, TransactionError, ValidationError};
pub use ids::{
    AccountId, ContractId, FileId, Hbar, NftId, PublicKey, Timestamp, TokenId, TopicId,
    TransactionHash, TransactionId,
};
pub use query::{FileInfo, Query, QueryKind, QueryResponse, TopicMessage};
pub use receipt::{ContractFunctionResult, TransactionReceipt, TransactionRecord, TransactionResponse};
pub use status::Status;
pub use transaction::{
    BurnSupply, FrozenBody, MintSupply, NftTransfer, SignaturePair, TokenTransfer, TokenType,
    Transaction, TransactionBody, TransactionKind, DEFAULT_MAX_TRANSACTION_FEE,
    DEFAULT_VALID_DURATION, MAX_FILE_CHUNK_BYTES, MAX_VALID_DURATION,
};
