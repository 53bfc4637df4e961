use serde::{Deserialize, Serialize};

use crate::ids::{AccountId, FileId, Hbar, Timestamp, TopicId};

/// Read-only request answered directly by a node, outside consensus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub kind: QueryKind,
    pub query_payment: Hbar,
    pub max_query_payment: Hbar,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryKind {
    AccountBalance { account_id: AccountId },
    FileContents { file_id: FileId },
    FileInfo { file_id: FileId },
    /// Messages of a topic in consensus order. `start_time` is inclusive,
    /// `end_time` exclusive; `limit` caps the number of messages returned.
    TopicMessages {
        topic_id: TopicId,
        start_time: Option<Timestamp>,
        end_time: Option<Timestamp>,
        limit: Option<u64>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryResponse {
    AccountBalance { hbars: Hbar },
    FileContents { contents: Vec<u8> },
    FileInfo(FileInfo),
    TopicMessages { messages: Vec<TopicMessage> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub file_id: FileId,
    pub size: u64,
    pub deleted: bool,
    pub expiration_time: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicMessage {
    pub topic_id: TopicId,
    pub consensus_timestamp: Timestamp,
    pub sequence_number: u64,
    pub contents: Vec<u8>,
}
