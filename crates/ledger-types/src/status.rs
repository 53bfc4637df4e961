use std::fmt;

use serde::{Deserialize, Serialize};

/// Consensus outcome code reported in receipts and precheck rejections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Success,
    InvalidSignature,
    InvalidTransaction,
    DuplicateTransaction,
    InsufficientTxFee,
    InsufficientPayerBalance,
    InvalidAccountId,
    AccountDeleted,
    TransferAccountSameAsDeleteAccount,
    InvalidFileId,
    FileDeleted,
    InvalidContractId,
    ContractDeleted,
    InvalidTopicId,
    InvalidTokenId,
    TokenAlreadyAssociatedToAccount,
    TokenNotAssociatedToAccount,
    InsufficientTokenBalance,
    InvalidNftId,
    SenderDoesNotOwnNftSerialNo,
    InvalidTokenMintAmount,
    InvalidTokenBurnAmount,
    Unauthorized,
}

impl Status {
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::InvalidTransaction => "INVALID_TRANSACTION",
            Self::DuplicateTransaction => "DUPLICATE_TRANSACTION",
            Self::InsufficientTxFee => "INSUFFICIENT_TX_FEE",
            Self::InsufficientPayerBalance => "INSUFFICIENT_PAYER_BALANCE",
            Self::InvalidAccountId => "INVALID_ACCOUNT_ID",
            Self::AccountDeleted => "ACCOUNT_DELETED",
            Self::TransferAccountSameAsDeleteAccount => "TRANSFER_ACCOUNT_SAME_AS_DELETE_ACCOUNT",
            Self::InvalidFileId => "INVALID_FILE_ID",
            Self::FileDeleted => "FILE_DELETED",
            Self::InvalidContractId => "INVALID_CONTRACT_ID",
            Self::ContractDeleted => "CONTRACT_DELETED",
            Self::InvalidTopicId => "INVALID_TOPIC_ID",
            Self::InvalidTokenId => "INVALID_TOKEN_ID",
            Self::TokenAlreadyAssociatedToAccount => "TOKEN_ALREADY_ASSOCIATED_TO_ACCOUNT",
            Self::TokenNotAssociatedToAccount => "TOKEN_NOT_ASSOCIATED_TO_ACCOUNT",
            Self::InsufficientTokenBalance => "INSUFFICIENT_TOKEN_BALANCE",
            Self::InvalidNftId => "INVALID_NFT_ID",
            Self::SenderDoesNotOwnNftSerialNo => "SENDER_DOES_NOT_OWN_NFT_SERIAL_NO",
            Self::InvalidTokenMintAmount => "INVALID_TOKEN_MINT_AMOUNT",
            Self::InvalidTokenBurnAmount => "INVALID_TOKEN_BURN_AMOUNT",
            Self::Unauthorized => "UNAUTHORIZED",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
