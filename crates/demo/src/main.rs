use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use ledger_client::requests::{
    AccountBalanceRequest, AccountCreateRequest, AccountDeleteRequest, ContractCallRequest,
    ContractCreateRequest, FileAppendRequest, FileContentsRequest, FileCreateRequest,
    FileInfoRequest, TokenAssociateRequest, TokenCreateRequest, TokenMintRequest,
    TokenTransferRequest, TopicCreateRequest, TopicMessageRequest, TopicSubmitMessageRequest,
};
use ledger_client::{
    ClientConfig, ListenerError, MockNetwork, OperatorAccount, ProtocolClient,
    TransactionListener,
};
use ledger_crypto::{ContractParam, PrivateKey};
use ledger_network_mock::{DemoScenario, DEMO_OPERATOR_BALANCE, DEMO_OPERATOR_ID};
use ledger_types::{AccountId, Hbar, Status, TransactionId, TransactionKind};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "ledger-demo",
    about = "Run every transaction kind against an in-memory ledger"
)]
struct Cli {
    /// Optional TOML client config (node_account_id, contract_gas).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Operator account id.
    #[arg(long, default_value_t = DEMO_OPERATOR_ID)]
    operator_id: AccountId,

    /// Hex-encoded 32-byte operator key seed.
    #[arg(long, default_value = "0202020202020202020202020202020202020202020202020202020202020202")]
    operator_seed: String,

    /// Overrides the node account id from the config.
    #[arg(long)]
    node_account_id: Option<AccountId>,

    /// Initial balance of the demo account, in hbar.
    #[arg(long, default_value = "10")]
    initial_balance: i64,
}

/// Logs every notification at info level.
struct LoggingListener;

impl TransactionListener for LoggingListener {
    fn transaction_submitted(
        &self,
        kind: TransactionKind,
        transaction_id: &TransactionId,
    ) -> Result<(), ListenerError> {
        info!(kind = %kind, transaction_id = %transaction_id, "submitted");
        Ok(())
    }

    fn transaction_handled(
        &self,
        kind: TransactionKind,
        transaction_id: &TransactionId,
        status: Status,
    ) -> Result<(), ListenerError> {
        info!(kind = %kind, transaction_id = %transaction_id, status = %status, "handled");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::default(),
    };
    if let Some(node_account_id) = cli.node_account_id {
        config.node_account_id = node_account_id;
    }
    let operator_key = PrivateKey::from_hex(&cli.operator_seed)?;
    let scenario =
        DemoScenario::with_operator(cli.operator_id, operator_key.clone(), DEMO_OPERATOR_BALANCE);

    let network = MockNetwork::new(scenario.ledger);
    let client = ProtocolClient::new(
        network,
        OperatorAccount::new(scenario.operator_id, operator_key.clone()),
        config,
    );
    let _registration = client.add_transaction_listener(Arc::new(LoggingListener));

    let created = client
        .account_create(&AccountCreateRequest::new(Hbar::new(cli.initial_balance)))
        .await?;
    let alice = created.account;
    info!(
        account_id = %alice.account_id,
        fee = %created.transaction_fee,
        "account created"
    );

    let file = client
        .file_create(&FileCreateRequest::new(b"6080604052".to_vec()).with_memo("bytecode"))
        .await?;
    client
        .file_append(&FileAppendRequest::new(file.file_id, b"348015600f57".to_vec()))
        .await?;
    let info = client.file_info(&FileInfoRequest::new(file.file_id)).await?;
    let contents = client
        .file_contents(&FileContentsRequest::new(file.file_id))
        .await?;
    info!(
        file_id = %file.file_id,
        size = info.size,
        contents = %String::from_utf8_lossy(&contents.contents),
        "file stored"
    );

    let contract = client
        .contract_create(
            &ContractCreateRequest::new(file.file_id)
                .with_constructor_params(vec![ContractParam::String("hello".to_string())]),
        )
        .await?;
    let call = client
        .contract_call(
            &ContractCallRequest::new(contract.contract_id, "echo")
                .with_params(vec![ContractParam::Uint64(42), ContractParam::Bool(true)]),
        )
        .await?;
    info!(
        contract_id = %contract.contract_id,
        first = call.get_u64(0)?,
        second = call.get_bool(1)?,
        gas_used = call.gas_used(),
        "contract called"
    );

    let topic = client
        .topic_create(&TopicCreateRequest::new().with_memo("demo topic"))
        .await?;
    let message = client
        .topic_submit_message(&TopicSubmitMessageRequest::new(topic.topic_id, b"hello".to_vec()))
        .await?;
    info!(
        topic_id = %topic.topic_id,
        sequence = message.topic_sequence_number,
        "message submitted"
    );
    client
        .topic_messages(&TopicMessageRequest::new(topic.topic_id), |message| {
            info!(
                sequence = message.sequence_number,
                contents = %String::from_utf8_lossy(&message.contents),
                "topic message"
            );
        })
        .await?;

    let supply_key = PrivateKey::generate();
    let token = client
        .token_create(&TokenCreateRequest::new(
            "Demo Token",
            "DMT",
            scenario.operator_id,
            operator_key.clone(),
            supply_key.clone(),
        ))
        .await?;
    client
        .token_associate(&TokenAssociateRequest::new(
            alice.account_id,
            alice.private_key.clone(),
            vec![token.token_id],
        ))
        .await?;
    let minted = client
        .token_mint(&TokenMintRequest::new(token.token_id, supply_key).with_amount(1_000))
        .await?;
    client
        .token_transfer(
            &TokenTransferRequest::new(
                token.token_id,
                scenario.operator_id,
                operator_key,
                alice.account_id,
            )
            .with_amount(250),
        )
        .await?;
    info!(
        token_id = %token.token_id,
        total_supply = minted.total_supply,
        "tokens minted and transferred"
    );

    let deleted = client
        .account_delete(&AccountDeleteRequest::new(
            alice.account_id,
            alice.private_key.clone(),
        ))
        .await?;
    info!(transaction_id = %deleted.transaction_id, "account deleted");
    let balance = client
        .account_balance(&AccountBalanceRequest::new(scenario.operator_id))
        .await?;
    info!(hbars = %balance.hbars, "operator balance");

    Ok(())
}
