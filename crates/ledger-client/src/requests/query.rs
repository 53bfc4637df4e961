//! Read-only queries answered by a node outside consensus.

use ledger_types::{
    AccountId, FileId, Hbar, Query, QueryKind, QueryResponse, Timestamp, TopicId, TopicMessage,
    ValidationError,
};

/// Default payment attached to a query and the ceiling the caller accepts.
pub const DEFAULT_QUERY_PAYMENT: Hbar = Hbar::from_tinybars(0);
pub const DEFAULT_MAX_QUERY_PAYMENT: Hbar = Hbar::new(1);

/// Builds the network query and reads the matching response variant.
pub trait QueryRequest {
    type Output;

    const NAME: &'static str;

    fn to_query(&self) -> Query;

    /// `None` when the node answered with a different response variant.
    fn from_response(&self, response: QueryResponse) -> Option<Self::Output>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryPayment {
    pub query_payment: Hbar,
    pub max_query_payment: Hbar,
}

impl Default for QueryPayment {
    fn default() -> Self {
        Self {
            query_payment: DEFAULT_QUERY_PAYMENT,
            max_query_payment: DEFAULT_MAX_QUERY_PAYMENT,
        }
    }
}

impl QueryPayment {
    fn query(&self, kind: QueryKind) -> Query {
        Query {
            kind,
            query_payment: self.query_payment,
            max_query_payment: self.max_query_payment,
        }
    }
}

macro_rules! impl_query_payment {
    ($($name:ident),+ $(,)?) => {
        $(
            impl $name {
                pub fn with_query_payment(mut self, payment: Hbar) -> Self {
                    self.payment.query_payment = payment;
                    self
                }

                pub fn with_max_query_payment(mut self, payment: Hbar) -> Self {
                    self.payment.max_query_payment = payment;
                    self
                }
            }
        )+
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountBalanceRequest {
    pub account_id: AccountId,
    payment: QueryPayment,
}

impl AccountBalanceRequest {
    pub fn new(account_id: AccountId) -> Self {
        Self {
            account_id,
            payment: QueryPayment::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountBalanceResponse {
    pub account_id: AccountId,
    pub hbars: Hbar,
}

impl QueryRequest for AccountBalanceRequest {
    type Output = AccountBalanceResponse;

    const NAME: &'static str = "account_balance";

    fn to_query(&self) -> Query {
        self.payment.query(QueryKind::AccountBalance {
            account_id: self.account_id,
        })
    }

    fn from_response(&self, response: QueryResponse) -> Option<AccountBalanceResponse> {
        match response {
            QueryResponse::AccountBalance { hbars } => Some(AccountBalanceResponse {
                account_id: self.account_id,
                hbars,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileContentsRequest {
    pub file_id: FileId,
    payment: QueryPayment,
}

impl FileContentsRequest {
    pub fn new(file_id: FileId) -> Self {
        Self {
            file_id,
            payment: QueryPayment::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContentsResponse {
    pub file_id: FileId,
    pub contents: Vec<u8>,
}

impl QueryRequest for FileContentsRequest {
    type Output = FileContentsResponse;

    const NAME: &'static str = "file_contents";

    fn to_query(&self) -> Query {
        self.payment.query(QueryKind::FileContents {
            file_id: self.file_id,
        })
    }

    fn from_response(&self, response: QueryResponse) -> Option<FileContentsResponse> {
        match response {
            QueryResponse::FileContents { contents } => Some(FileContentsResponse {
                file_id: self.file_id,
                contents,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileInfoRequest {
    pub file_id: FileId,
    payment: QueryPayment,
}

impl FileInfoRequest {
    pub fn new(file_id: FileId) -> Self {
        Self {
            file_id,
            payment: QueryPayment::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileInfoResponse {
    pub file_id: FileId,
    pub size: u64,
    pub deleted: bool,
    pub expiration_time: Option<Timestamp>,
}

impl QueryRequest for FileInfoRequest {
    type Output = FileInfoResponse;

    const NAME: &'static str = "file_info";

    fn to_query(&self) -> Query {
        self.payment.query(QueryKind::FileInfo {
            file_id: self.file_id,
        })
    }

    fn from_response(&self, response: QueryResponse) -> Option<FileInfoResponse> {
        match response {
            QueryResponse::FileInfo(info) => Some(FileInfoResponse {
                file_id: info.file_id,
                size: info.size,
                deleted: info.deleted,
                expiration_time: info.expiration_time,
            }),
            _ => None,
        }
    }
}

/// Messages of one topic within an optional consensus-time window.
///
/// `start_time` is inclusive and `end_time` exclusive. Without a limit every
/// matching message is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicMessageRequest {
    pub topic_id: TopicId,
    pub start_time: Option<Timestamp>,
    pub end_time: Option<Timestamp>,
    pub limit: Option<u64>,
    payment: QueryPayment,
}

impl TopicMessageRequest {
    pub fn new(topic_id: TopicId) -> Self {
        Self {
            topic_id,
            start_time: None,
            end_time: None,
            limit: None,
            payment: QueryPayment::default(),
        }
    }

    pub fn with_start_time(mut self, start_time: Timestamp) -> Self {
        self.start_time = Some(start_time);
        self
    }

    pub fn with_end_time(mut self, end_time: Timestamp) -> Self {
        self.end_time = Some(end_time);
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) if end <= start => Err(ValidationError::InvalidField {
                field: "end_time",
                reason: "must be after the start time",
            }),
            _ => Ok(()),
        }
    }
}

/// Summary of a finished topic subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicMessageResult {
    pub topic_id: TopicId,
    pub delivered: usize,
    pub last_sequence_number: Option<u64>,
}

impl QueryRequest for TopicMessageRequest {
    type Output = Vec<TopicMessage>;

    const NAME: &'static str = "topic_messages";

    fn to_query(&self) -> Query {
        self.payment.query(QueryKind::TopicMessages {
            topic_id: self.topic_id,
            start_time: self.start_time,
            end_time: self.end_time,
            limit: self.limit,
        })
    }

    fn from_response(&self, response: QueryResponse) -> Option<Vec<TopicMessage>> {
        match response {
            QueryResponse::TopicMessages { messages } => Some(messages),
            _ => None,
        }
    }
}

impl_query_payment!(
    AccountBalanceRequest,
    FileContentsRequest,
    FileInfoRequest,
    TopicMessageRequest,
);

#[cfg(test)]
mod tests {
    use ledger_types::{
        AccountId, FileId, Hbar, QueryKind, QueryResponse, Timestamp, TopicId, ValidationError,
    };

    use super::{AccountBalanceRequest, FileContentsRequest, QueryRequest, TopicMessageRequest};

    #[test]
    fn payment_fields_reach_the_query() {
        let query = AccountBalanceRequest::new(AccountId::from_num(2))
            .with_query_payment(Hbar::from_tinybars(5))
            .with_max_query_payment(Hbar::from_tinybars(50))
            .to_query();
        assert_eq!(query.query_payment, Hbar::from_tinybars(5));
        assert_eq!(query.max_query_payment, Hbar::from_tinybars(50));
        assert!(matches!(query.kind, QueryKind::AccountBalance { .. }));
    }

    #[test]
    fn mismatched_response_is_rejected() {
        let request = FileContentsRequest::new(FileId::from_num(1));
        let response = QueryResponse::AccountBalance {
            hbars: Hbar::new(1),
        };
        assert!(request.from_response(response).is_none());
    }

    #[test]
    fn topic_window_reaches_the_query() {
        let query = TopicMessageRequest::new(TopicId::from_num(8))
            .with_start_time(Timestamp::new(10, 0))
            .with_end_time(Timestamp::new(20, 0))
            .with_limit(3)
            .to_query();
        assert_eq!(
            query.kind,
            QueryKind::TopicMessages {
                topic_id: TopicId::from_num(8),
                start_time: Some(Timestamp::new(10, 0)),
                end_time: Some(Timestamp::new(20, 0)),
                limit: Some(3),
            }
        );
    }

    #[test]
    fn empty_topic_window_is_rejected() {
        let request = TopicMessageRequest::new(TopicId::from_num(8))
            .with_start_time(Timestamp::new(20, 0))
            .with_end_time(Timestamp::new(20, 0));
        assert_eq!(
            request.validate(),
            Err(ValidationError::InvalidField {
                field: "end_time",
                reason: "must be after the start time",
            })
        );
        assert!(TopicMessageRequest::new(TopicId::from_num(8))
            .with_end_time(Timestamp::new(20, 0))
            .validate()
            .is_ok());
    }
}
