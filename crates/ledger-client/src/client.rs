//! ProtocolClient: one entry point per ledger operation on top of the
//! execution pipeline.

use std::sync::Arc;

use ledger_types::{AccountId, TopicMessage};
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::context::{ClientContext, OperatorAccount};
use crate::error::{ErrorKind, ProtocolError};
use crate::listener::{ListenerRegistration, ListenerRegistry, TransactionListener};
use crate::network::LedgerNetwork;
use crate::pipeline::ExecutionPipeline;
use crate::record_strategy::{RecordStrategy, RecordStrategyCell};
use crate::requests::{
    AccountBalanceRequest, AccountBalanceResponse, AccountCreateRequest, AccountCreateResult,
    AccountDeleteRequest, AccountDeleteResult, ContractCallRequest, ContractCallResult,
    ContractCreateRequest, ContractCreateResult, ContractDeleteRequest, ContractDeleteResult,
    FileAppendRequest, FileAppendResult, FileContentsRequest, FileContentsResponse,
    FileCreateRequest, FileCreateResult, FileDeleteRequest, FileDeleteResult, FileInfoRequest,
    FileInfoResponse, FileUpdateRequest, FileUpdateResult, Finality, Outcome, Prepared,
    QueryRequest, TokenAssociateRequest, TokenAssociateResult, TokenBurnRequest, TokenBurnResult,
    TokenCreateRequest, TokenCreateResult, TokenDissociateRequest, TokenDissociateResult,
    TokenMintRequest, TokenMintResult, TokenTransferRequest, TokenTransferResult,
    TopicCreateRequest, TopicCreateResult, TopicDeleteRequest, TopicDeleteResult,
    TopicMessageRequest, TopicMessageResult, TopicSubmitMessageRequest, TopicSubmitMessageResult,
    TopicUpdateRequest, TopicUpdateResult, TransactionRequest,
};

/// Client facade shared by any number of concurrent callers.
pub struct ProtocolClient<N> {
    context: Arc<ClientContext>,
    pipeline: ExecutionPipeline<N>,
    listeners: ListenerRegistry,
    strategy: Arc<RecordStrategyCell>,
}

impl<N: LedgerNetwork> ProtocolClient<N> {
    pub fn new(network: N, operator: OperatorAccount, config: ClientConfig) -> Self {
        let context = Arc::new(ClientContext::new(operator, config));
        let listeners = ListenerRegistry::new();
        let strategy = Arc::new(RecordStrategyCell::default());
        let pipeline = ExecutionPipeline::new(
            network,
            context.clone(),
            listeners.clone(),
            strategy.clone(),
        );
        Self {
            context,
            pipeline,
            listeners,
            strategy,
        }
    }

    pub fn operator_account_id(&self) -> AccountId {
        self.context.operator().account_id
    }

    pub fn context(&self) -> &ClientContext {
        &self.context
    }

    pub fn network(&self) -> &N {
        self.pipeline.network()
    }

    /// Registers a listener for submitted and handled notifications.
    pub fn add_transaction_listener(
        &self,
        listener: Arc<dyn TransactionListener>,
    ) -> ListenerRegistration {
        self.listeners.register(listener)
    }

    /// Replaces the record strategy. Calls already waiting on a record keep
    /// the strategy they started with.
    pub fn set_record_strategy(&self, strategy: impl RecordStrategy + 'static) {
        self.strategy.replace(strategy);
        debug!("record strategy replaced");
    }

    /// Runs any transaction request through the pipeline and maps its
    /// outcome.
    pub async fn execute<R>(&self, request: &R) -> Result<R::Output, ProtocolError>
    where
        R: TransactionRequest + Sync,
    {
        let Prepared {
            transaction,
            signing_keys,
            carry,
        } = request
            .prepare(&self.context)
            .map_err(|err| ProtocolError::validation(Some(R::KIND), err))?;
        let outcome = match R::FINALITY {
            Finality::Receipt => Outcome::Receipt(
                self.pipeline
                    .execute_for_receipt(transaction, &signing_keys)
                    .await?,
            ),
            Finality::Record => Outcome::Record(
                self.pipeline
                    .execute_for_record(transaction, &signing_keys)
                    .await?,
            ),
        };
        info!(
            kind = %R::KIND,
            transaction_id = %outcome.transaction_id(),
            status = %outcome.receipt().status,
            "transaction completed"
        );
        R::complete(outcome, carry)
    }

    /// Sends a read-only query straight to the network.
    pub async fn query<Q>(&self, request: &Q) -> Result<Q::Output, ProtocolError>
    where
        Q: QueryRequest + Sync,
    {
        let response = self
            .pipeline
            .network()
            .execute_query(&request.to_query())
            .await
            .map_err(|err| {
                ProtocolError::new(ErrorKind::Query, format!("{} query failed", Q::NAME))
                    .with_source(err)
            })?;
        request.from_response(response).ok_or_else(|| {
            ProtocolError::new(
                ErrorKind::Query,
                format!("unexpected response to {} query", Q::NAME),
            )
        })
    }

    pub async fn account_create(
        &self,
        request: &AccountCreateRequest,
    ) -> Result<AccountCreateResult, ProtocolError> {
        self.execute(request).await
    }

    pub async fn account_delete(
        &self,
        request: &AccountDeleteRequest,
    ) -> Result<AccountDeleteResult, ProtocolError> {
        self.execute(request).await
    }

    pub async fn file_create(
        &self,
        request: &FileCreateRequest,
    ) -> Result<FileCreateResult, ProtocolError> {
        self.execute(request).await
    }

    pub async fn file_update(
        &self,
        request: &FileUpdateRequest,
    ) -> Result<FileUpdateResult, ProtocolError> {
        self.execute(request).await
    }

    pub async fn file_append(
        &self,
        request: &FileAppendRequest,
    ) -> Result<FileAppendResult, ProtocolError> {
        self.execute(request).await
    }

    pub async fn file_delete(
        &self,
        request: &FileDeleteRequest,
    ) -> Result<FileDeleteResult, ProtocolError> {
        self.execute(request).await
    }

    pub async fn contract_create(
        &self,
        request: &ContractCreateRequest,
    ) -> Result<ContractCreateResult, ProtocolError> {
        self.execute(request).await
    }

    pub async fn contract_delete(
        &self,
        request: &ContractDeleteRequest,
    ) -> Result<ContractDeleteResult, ProtocolError> {
        self.execute(request).await
    }

    pub async fn contract_call(
        &self,
        request: &ContractCallRequest,
    ) -> Result<ContractCallResult, ProtocolError> {
        self.execute(request).await
    }

    pub async fn topic_create(
        &self,
        request: &TopicCreateRequest,
    ) -> Result<TopicCreateResult, ProtocolError> {
        self.execute(request).await
    }

    pub async fn topic_update(
        &self,
        request: &TopicUpdateRequest,
    ) -> Result<TopicUpdateResult, ProtocolError> {
        self.execute(request).await
    }

    pub async fn topic_delete(
        &self,
        request: &TopicDeleteRequest,
    ) -> Result<TopicDeleteResult, ProtocolError> {
        self.execute(request).await
    }

    pub async fn topic_submit_message(
        &self,
        request: &TopicSubmitMessageRequest,
    ) -> Result<TopicSubmitMessageResult, ProtocolError> {
        self.execute(request).await
    }

    pub async fn token_create(
        &self,
        request: &TokenCreateRequest,
    ) -> Result<TokenCreateResult, ProtocolError> {
        self.execute(request).await
    }

    pub async fn token_associate(
        &self,
        request: &TokenAssociateRequest,
    ) -> Result<TokenAssociateResult, ProtocolError> {
        self.execute(request).await
    }

    pub async fn token_dissociate(
        &self,
        request: &TokenDissociateRequest,
    ) -> Result<TokenDissociateResult, ProtocolError> {
        self.execute(request).await
    }

    pub async fn token_mint(
        &self,
        request: &TokenMintRequest,
    ) -> Result<TokenMintResult, ProtocolError> {
        self.execute(request).await
    }

    pub async fn token_burn(
        &self,
        request: &TokenBurnRequest,
    ) -> Result<TokenBurnResult, ProtocolError> {
        self.execute(request).await
    }

    pub async fn token_transfer(
        &self,
        request: &TokenTransferRequest,
    ) -> Result<TokenTransferResult, ProtocolError> {
        self.execute(request).await
    }

    pub async fn account_balance(
        &self,
        request: &AccountBalanceRequest,
    ) -> Result<AccountBalanceResponse, ProtocolError> {
        self.query(request).await
    }

    pub async fn file_contents(
        &self,
        request: &FileContentsRequest,
    ) -> Result<FileContentsResponse, ProtocolError> {
        self.query(request).await
    }

    pub async fn file_info(
        &self,
        request: &FileInfoRequest,
    ) -> Result<FileInfoResponse, ProtocolError> {
        self.query(request).await
    }

    /// Delivers the topic messages matching the request window to
    /// `subscription`, one call per message in consensus order.
    pub async fn topic_messages<F>(
        &self,
        request: &TopicMessageRequest,
        mut subscription: F,
    ) -> Result<TopicMessageResult, ProtocolError>
    where
        F: FnMut(&TopicMessage) + Send,
    {
        request
            .validate()
            .map_err(|err| ProtocolError::validation(None, err))?;
        let messages = self.query(request).await?;
        for message in &messages {
            subscription(message);
        }
        let result = TopicMessageResult {
            topic_id: request.topic_id,
            delivered: messages.len(),
            last_sequence_number: messages.last().map(|message| message.sequence_number),
        };
        debug!(
            topic_id = %result.topic_id,
            delivered = result.delivered,
            "topic messages delivered"
        );
        Ok(result)
    }
}
