use serde::{Deserialize, Serialize};

use crate::ids::{
    AccountId, ContractId, FileId, Hbar, Timestamp, TokenId, TopicId, TransactionHash,
    TransactionId,
};
use crate::status::Status;

/// Acknowledgement returned by the node that accepted a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub transaction_id: TransactionId,
    pub node_account_id: AccountId,
    pub transaction_hash: TransactionHash,
}

/// Consensus outcome of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub transaction_id: TransactionId,
    pub status: Status,
    pub account_id: Option<AccountId>,
    pub file_id: Option<FileId>,
    pub contract_id: Option<ContractId>,
    pub topic_id: Option<TopicId>,
    pub token_id: Option<TokenId>,
    pub total_supply: u64,
    pub serials: Vec<u64>,
    pub topic_sequence_number: u64,
}

impl TransactionReceipt {
    pub fn new(transaction_id: TransactionId, status: Status) -> Self {
        Self {
            transaction_id,
            status,
            account_id: None,
            file_id: None,
            contract_id: None,
            topic_id: None,
            token_id: None,
            total_supply: 0,
            serials: Vec::new(),
            topic_sequence_number: 0,
        }
    }
}

/// Raw outcome of a contract execution; decoding lives with the ABI helpers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractFunctionResult {
    pub contract_id: ContractId,
    pub result: Vec<u8>,
    pub gas_used: u64,
    pub error_message: Option<String>,
}

/// Detailed execution record; a superset of the receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub receipt: TransactionReceipt,
    pub transaction_id: TransactionId,
    pub transaction_hash: TransactionHash,
    pub consensus_timestamp: Timestamp,
    pub transaction_fee: Hbar,
    pub memo: String,
    pub contract_function_result: Option<ContractFunctionResult>,
}
