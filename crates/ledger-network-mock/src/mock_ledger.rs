//! MockLedger: in-memory ledger that prechecks, executes and records transactions.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use ledger_crypto::{compute_transaction_hash, encode_transaction_body, verify_signature};
use ledger_types::{
    AccountId, BurnSupply, ContractFunctionResult, ContractId, FileId, FileInfo, Hbar, MintSupply,
    PublicKey, Query, QueryKind, QueryResponse, Status, Timestamp, TokenId, TokenType, TopicId,
    TopicMessage, Transaction, TransactionBody, TransactionId, TransactionKind,
    TransactionReceipt, TransactionRecord, TransactionResponse,
};
use thiserror::Error;
use tracing::debug;

const FIRST_ENTITY_NUM: u64 = 1001;
const GENESIS_CONSENSUS_SECONDS: u64 = 1_700_000_000;
const DEFAULT_FILE_LIFETIME_SECONDS: u64 = 90 * 24 * 60 * 60;
const CONTRACT_CALL_BASE_GAS: u64 = 21_000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MockLedgerError {
    #[error("precheck failed with {status}: {message}")]
    Precheck { status: Status, message: String },
    #[error("no {what} found for transaction {transaction_id}")]
    NotFound {
        what: &'static str,
        transaction_id: TransactionId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockAccount {
    pub key: PublicKey,
    pub balance: Hbar,
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockFile {
    pub keys: Vec<PublicKey>,
    pub contents: Vec<u8>,
    pub memo: String,
    pub expiration_time: Timestamp,
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockContract {
    pub bytecode_file_id: FileId,
    pub constructor_parameters: Vec<u8>,
    pub balance: Hbar,
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockTopic {
    pub admin_key: Option<PublicKey>,
    pub submit_key: Option<PublicKey>,
    pub memo: String,
    pub sequence_number: u64,
    pub messages: Vec<TopicMessage>,
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockToken {
    pub name: String,
    pub symbol: String,
    pub treasury: AccountId,
    pub token_type: TokenType,
    pub supply_key: PublicKey,
    pub total_supply: u64,
    pub next_serial: u64,
    pub nft_owners: BTreeMap<u64, AccountId>,
}

/// Effects a successful execution adds to the receipt and record.
#[derive(Default)]
struct Effects {
    account_id: Option<AccountId>,
    file_id: Option<FileId>,
    contract_id: Option<ContractId>,
    topic_id: Option<TopicId>,
    token_id: Option<TokenId>,
    total_supply: u64,
    serials: Vec<u64>,
    topic_sequence_number: u64,
    function_result: Option<ContractFunctionResult>,
}

#[derive(Debug, Clone)]
pub struct MockLedger {
    pub accounts: HashMap<AccountId, MockAccount>,
    pub files: HashMap<FileId, MockFile>,
    pub contracts: HashMap<ContractId, MockContract>,
    pub topics: HashMap<TopicId, MockTopic>,
    pub tokens: HashMap<TokenId, MockToken>,
    /// Presence marks an association; the value is the fungible balance.
    pub token_balances: HashMap<(AccountId, TokenId), u64>,
    receipts: HashMap<TransactionId, TransactionReceipt>,
    records: HashMap<TransactionId, TransactionRecord>,
    next_entity_num: u64,
    consensus_time: Timestamp,
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLedger {
    pub fn new() -> Self {
        Self {
            accounts: HashMap::new(),
            files: HashMap::new(),
            contracts: HashMap::new(),
            topics: HashMap::new(),
            tokens: HashMap::new(),
            token_balances: HashMap::new(),
            receipts: HashMap::new(),
            records: HashMap::new(),
            next_entity_num: FIRST_ENTITY_NUM,
            consensus_time: Timestamp::new(GENESIS_CONSENSUS_SECONDS, 0),
        }
    }

    pub fn add_account(&mut self, account_id: AccountId, key: PublicKey, balance: Hbar) {
        self.accounts.insert(
            account_id,
            MockAccount {
                key,
                balance,
                deleted: false,
            },
        );
    }

    pub fn balance_of(&self, account_id: &AccountId) -> Option<Hbar> {
        self.accounts.get(account_id).map(|account| account.balance)
    }

    pub fn token_balance(&self, account_id: AccountId, token_id: TokenId) -> Option<u64> {
        self.token_balances.get(&(account_id, token_id)).copied()
    }

    pub fn nft_owner(&self, token_id: TokenId, serial: u64) -> Option<AccountId> {
        self.tokens
            .get(&token_id)
            .and_then(|token| token.nft_owners.get(&serial).copied())
    }

    /// Prechecks and executes a frozen, signed transaction.
    ///
    /// Precheck failures are returned as errors and leave no receipt. Once a
    /// transaction passes precheck it always reaches consensus and gets a
    /// receipt and record, successful or not.
    pub fn submit(
        &mut self,
        transaction: &Transaction,
    ) -> Result<TransactionResponse, MockLedgerError> {
        let signers = self.precheck(transaction)?;
        let frozen = transaction.frozen().ok_or_else(|| {
            precheck(Status::InvalidTransaction, "transaction is not frozen")
        })?;
        let transaction_id = frozen.transaction_id;
        let transaction_hash = compute_transaction_hash(frozen, transaction.signatures());

        self.consensus_time = next_consensus_time(self.consensus_time);
        let consensus_timestamp = self.consensus_time;
        let kind = transaction.kind();
        let fee = fee_for(kind);

        let (status, effects, charged) = if transaction.max_transaction_fee() < fee {
            (Status::InsufficientTxFee, Effects::default(), Hbar::ZERO)
        } else if !self.charge(&transaction_id.payer, fee) {
            (Status::InsufficientPayerBalance, Effects::default(), Hbar::ZERO)
        } else {
            match self.execute(transaction.body(), &transaction_id, &signers) {
                Ok(effects) => (Status::Success, effects, fee),
                Err(status) => (status, Effects::default(), fee),
            }
        };
        debug!(
            kind = %kind,
            transaction_id = %transaction_id,
            status = %status,
            "mock ledger reached consensus"
        );

        let receipt = TransactionReceipt {
            transaction_id,
            status,
            account_id: effects.account_id,
            file_id: effects.file_id,
            contract_id: effects.contract_id,
            topic_id: effects.topic_id,
            token_id: effects.token_id,
            total_supply: effects.total_supply,
            serials: effects.serials,
            topic_sequence_number: effects.topic_sequence_number,
        };
        let record = TransactionRecord {
            receipt: receipt.clone(),
            transaction_id,
            transaction_hash,
            consensus_timestamp,
            transaction_fee: charged,
            memo: transaction.memo().to_string(),
            contract_function_result: effects.function_result,
        };
        self.receipts.insert(transaction_id, receipt);
        self.records.insert(transaction_id, record);

        Ok(TransactionResponse {
            transaction_id,
            node_account_id: frozen.node_account_id,
            transaction_hash,
        })
    }

    pub fn receipt(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<TransactionReceipt, MockLedgerError> {
        self.receipts
            .get(transaction_id)
            .cloned()
            .ok_or(MockLedgerError::NotFound {
                what: "receipt",
                transaction_id: *transaction_id,
            })
    }

    pub fn record(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<TransactionRecord, MockLedgerError> {
        self.records
            .get(transaction_id)
            .cloned()
            .ok_or(MockLedgerError::NotFound {
                what: "record",
                transaction_id: *transaction_id,
            })
    }

    pub fn query(&self, query: &Query) -> Result<QueryResponse, MockLedgerError> {
        match &query.kind {
            QueryKind::AccountBalance { account_id } => {
                let account = self.accounts.get(account_id).ok_or_else(|| {
                    precheck(Status::InvalidAccountId, format!("unknown account {account_id}"))
                })?;
                if account.deleted {
                    return Err(precheck(
                        Status::AccountDeleted,
                        format!("account {account_id} is deleted"),
                    ));
                }
                Ok(QueryResponse::AccountBalance {
                    hbars: account.balance,
                })
            }
            QueryKind::FileContents { file_id } => {
                let file = self.file_for_query(file_id)?;
                if file.deleted {
                    return Err(precheck(
                        Status::FileDeleted,
                        format!("file {file_id} is deleted"),
                    ));
                }
                Ok(QueryResponse::FileContents {
                    contents: file.contents.clone(),
                })
            }
            QueryKind::FileInfo { file_id } => {
                let file = self.file_for_query(file_id)?;
                Ok(QueryResponse::FileInfo(FileInfo {
                    file_id: *file_id,
                    size: file.contents.len() as u64,
                    deleted: file.deleted,
                    expiration_time: Some(file.expiration_time),
                }))
            }
            QueryKind::TopicMessages {
                topic_id,
                start_time,
                end_time,
                limit,
            } => {
                // History stays readable after the topic is deleted.
                let topic = self.topics.get(topic_id).ok_or_else(|| {
                    precheck(Status::InvalidTopicId, format!("unknown topic {topic_id}"))
                })?;
                let limit = limit.map_or(usize::MAX, |limit| {
                    usize::try_from(limit).unwrap_or(usize::MAX)
                });
                let messages = topic
                    .messages
                    .iter()
                    .filter(|message| {
                        start_time.map_or(true, |start| message.consensus_timestamp >= start)
                            && end_time.map_or(true, |end| message.consensus_timestamp < end)
                    })
                    .take(limit)
                    .cloned()
                    .collect();
                Ok(QueryResponse::TopicMessages { messages })
            }
        }
    }

    fn file_for_query(&self, file_id: &FileId) -> Result<&MockFile, MockLedgerError> {
        self.files
            .get(file_id)
            .ok_or_else(|| precheck(Status::InvalidFileId, format!("unknown file {file_id}")))
    }

    /// Node-side checks that reject a submission outright.
    fn precheck(&self, transaction: &Transaction) -> Result<HashSet<PublicKey>, MockLedgerError> {
        let frozen = transaction
            .frozen()
            .ok_or_else(|| precheck(Status::InvalidTransaction, "transaction is not frozen"))?;
        transaction
            .validate()
            .map_err(|err| precheck(Status::InvalidTransaction, err.to_string()))?;

        let expected_body = encode_transaction_body(
            transaction,
            &frozen.transaction_id,
            &frozen.node_account_id,
        );
        if expected_body != frozen.body_bytes {
            return Err(precheck(
                Status::InvalidTransaction,
                "frozen body bytes do not match the transaction",
            ));
        }
        if self.receipts.contains_key(&frozen.transaction_id) {
            return Err(precheck(
                Status::DuplicateTransaction,
                format!("transaction {} was already submitted", frozen.transaction_id),
            ));
        }

        let mut signers = HashSet::new();
        for pair in transaction.signatures() {
            verify_signature(&pair.public_key, &frozen.body_bytes, &pair.signature).map_err(
                |err| precheck(Status::InvalidSignature, format!("{}: {err}", pair.public_key)),
            )?;
            signers.insert(pair.public_key);
        }

        let payer = frozen.transaction_id.payer;
        let payer_account = self
            .accounts
            .get(&payer)
            .filter(|account| !account.deleted)
            .ok_or_else(|| precheck(Status::InvalidAccountId, format!("unknown payer {payer}")))?;
        if !signers.contains(&payer_account.key) {
            return Err(precheck(
                Status::InvalidSignature,
                format!("payer {payer} did not sign"),
            ));
        }
        Ok(signers)
    }

    fn charge(&mut self, payer: &AccountId, fee: Hbar) -> bool {
        let Some(account) = self.accounts.get_mut(payer) else {
            return false;
        };
        match account.balance.checked_sub(fee) {
            Some(remaining) if remaining >= Hbar::ZERO => {
                account.balance = remaining;
                true
            }
            _ => false,
        }
    }

    fn next_entity_num(&mut self) -> u64 {
        let num = self.next_entity_num;
        self.next_entity_num += 1;
        num
    }

    /// Applies the body. Every branch checks before it mutates, so a failed
    /// status leaves the ledger unchanged apart from the fee.
    fn execute(
        &mut self,
        body: &TransactionBody,
        transaction_id: &TransactionId,
        signers: &HashSet<PublicKey>,
    ) -> Result<Effects, Status> {
        let signed = |key: &PublicKey| signers.contains(key);
        let mut effects = Effects::default();
        match body {
            TransactionBody::AccountCreate {
                key,
                initial_balance,
            } => {
                let payer = self.live_account(&transaction_id.payer)?;
                if payer.balance < *initial_balance {
                    return Err(Status::InsufficientPayerBalance);
                }
                self.debit(&transaction_id.payer, *initial_balance);
                let account_id = AccountId::from_num(self.next_entity_num());
                self.add_account(account_id, *key, *initial_balance);
                effects.account_id = Some(account_id);
            }
            TransactionBody::AccountDelete {
                account_id,
                transfer_account_id,
            } => {
                if account_id == transfer_account_id {
                    return Err(Status::TransferAccountSameAsDeleteAccount);
                }
                let deleted = self.live_account(account_id)?.clone();
                self.live_account(transfer_account_id)?;
                require(signed(&deleted.key))?;
                self.debit(account_id, deleted.balance);
                self.credit(transfer_account_id, deleted.balance);
                if let Some(account) = self.accounts.get_mut(account_id) {
                    account.deleted = true;
                }
            }
            TransactionBody::FileCreate {
                keys,
                contents,
                memo,
                expiration_time,
            } => {
                require(keys.iter().all(signed))?;
                let file_id = FileId::from_num(self.next_entity_num());
                let expiration_time = expiration_time
                    .unwrap_or_else(|| self.consensus_time.plus_seconds(DEFAULT_FILE_LIFETIME_SECONDS));
                self.files.insert(
                    file_id,
                    MockFile {
                        keys: keys.clone(),
                        contents: contents.clone(),
                        memo: memo.clone(),
                        expiration_time,
                        deleted: false,
                    },
                );
                effects.file_id = Some(file_id);
            }
            TransactionBody::FileUpdate {
                file_id,
                contents,
                memo,
                expiration_time,
            } => {
                require(self.live_file(file_id)?.keys.iter().all(signed))?;
                if let Some(file) = self.files.get_mut(file_id) {
                    if let Some(contents) = contents {
                        file.contents = contents.clone();
                    }
                    if let Some(memo) = memo {
                        file.memo = memo.clone();
                    }
                    if let Some(expiration_time) = expiration_time {
                        file.expiration_time = *expiration_time;
                    }
                }
            }
            TransactionBody::FileAppend { file_id, contents } => {
                require(self.live_file(file_id)?.keys.iter().all(signed))?;
                if let Some(file) = self.files.get_mut(file_id) {
                    file.contents.extend_from_slice(contents);
                }
            }
            TransactionBody::FileDelete { file_id } => {
                require(self.live_file(file_id)?.keys.iter().all(signed))?;
                if let Some(file) = self.files.get_mut(file_id) {
                    file.deleted = true;
                    file.contents.clear();
                }
            }
            TransactionBody::ContractCreate {
                bytecode_file_id,
                constructor_parameters,
                ..
            } => {
                self.live_file(bytecode_file_id)?;
                let contract_id = ContractId::from_num(self.next_entity_num());
                self.contracts.insert(
                    contract_id,
                    MockContract {
                        bytecode_file_id: *bytecode_file_id,
                        constructor_parameters: constructor_parameters.clone(),
                        balance: Hbar::ZERO,
                        deleted: false,
                    },
                );
                effects.contract_id = Some(contract_id);
            }
            TransactionBody::ContractDelete {
                contract_id,
                transfer_account_id,
                transfer_contract_id,
            } => {
                let balance = self.live_contract(contract_id)?.balance;
                match (transfer_account_id, transfer_contract_id) {
                    (Some(account_id), None) => {
                        self.live_account(account_id)?;
                        self.credit(account_id, balance);
                    }
                    (None, Some(target)) => {
                        if target == contract_id {
                            return Err(Status::InvalidContractId);
                        }
                        self.live_contract(target)?;
                        if let Some(target) = self.contracts.get_mut(target) {
                            target.balance = target.balance.checked_add(balance).unwrap_or(target.balance);
                        }
                    }
                    _ => return Err(Status::InvalidTransaction),
                }
                if let Some(contract) = self.contracts.get_mut(contract_id) {
                    contract.deleted = true;
                    contract.balance = Hbar::ZERO;
                }
            }
            TransactionBody::ContractCall {
                contract_id,
                gas,
                function_parameters,
            } => {
                self.live_contract(contract_id)?;
                // The mock contract echoes its arguments back as the result.
                let result = function_parameters.get(4..).unwrap_or_default().to_vec();
                effects.contract_id = Some(*contract_id);
                effects.function_result = Some(ContractFunctionResult {
                    contract_id: *contract_id,
                    result,
                    gas_used: (*gas).min(CONTRACT_CALL_BASE_GAS + 16 * function_parameters.len() as u64),
                    error_message: None,
                });
            }
            TransactionBody::TopicCreate {
                admin_key,
                submit_key,
                memo,
            } => {
                require(admin_key.as_ref().map_or(true, signed))?;
                let topic_id = TopicId::from_num(self.next_entity_num());
                self.topics.insert(
                    topic_id,
                    MockTopic {
                        admin_key: *admin_key,
                        submit_key: *submit_key,
                        memo: memo.clone().unwrap_or_default(),
                        sequence_number: 0,
                        messages: Vec::new(),
                        deleted: false,
                    },
                );
                effects.topic_id = Some(topic_id);
            }
            TransactionBody::TopicUpdate {
                topic_id,
                admin_key,
                submit_key,
                memo,
            } => {
                let current_admin = self.live_topic(topic_id)?.admin_key.ok_or(Status::Unauthorized)?;
                require(signed(&current_admin))?;
                require(admin_key.as_ref().map_or(true, signed))?;
                if let Some(topic) = self.topics.get_mut(topic_id) {
                    if admin_key.is_some() {
                        topic.admin_key = *admin_key;
                    }
                    if submit_key.is_some() {
                        topic.submit_key = *submit_key;
                    }
                    if let Some(memo) = memo {
                        topic.memo = memo.clone();
                    }
                }
            }
            TransactionBody::TopicDelete { topic_id } => {
                let admin = self.live_topic(topic_id)?.admin_key.ok_or(Status::Unauthorized)?;
                require(signed(&admin))?;
                if let Some(topic) = self.topics.get_mut(topic_id) {
                    topic.deleted = true;
                }
            }
            TransactionBody::TopicMessageSubmit { topic_id, message } => {
                let submit_key = self.live_topic(topic_id)?.submit_key;
                require(submit_key.as_ref().map_or(true, signed))?;
                let consensus_timestamp = self.consensus_time;
                if let Some(topic) = self.topics.get_mut(topic_id) {
                    topic.sequence_number += 1;
                    topic.messages.push(TopicMessage {
                        topic_id: *topic_id,
                        consensus_timestamp,
                        sequence_number: topic.sequence_number,
                        contents: message.clone(),
                    });
                    effects.topic_sequence_number = topic.sequence_number;
                }
            }
            TransactionBody::TokenCreate {
                name,
                symbol,
                treasury_account_id,
                token_type,
                supply_key,
            } => {
                let treasury_key = self.live_account(treasury_account_id)?.key;
                require(signed(&treasury_key) && signed(supply_key))?;
                let token_id = TokenId::from_num(self.next_entity_num());
                self.tokens.insert(
                    token_id,
                    MockToken {
                        name: name.clone(),
                        symbol: symbol.clone(),
                        treasury: *treasury_account_id,
                        token_type: *token_type,
                        supply_key: *supply_key,
                        total_supply: 0,
                        next_serial: 1,
                        nft_owners: BTreeMap::new(),
                    },
                );
                self.token_balances.insert((*treasury_account_id, token_id), 0);
                effects.token_id = Some(token_id);
            }
            TransactionBody::TokenAssociate {
                account_id,
                token_ids,
            } => {
                let key = self.live_account(account_id)?.key;
                require(signed(&key))?;
                for token_id in token_ids {
                    self.token(token_id)?;
                    if self.token_balances.contains_key(&(*account_id, *token_id)) {
                        return Err(Status::TokenAlreadyAssociatedToAccount);
                    }
                }
                for token_id in token_ids {
                    self.token_balances.insert((*account_id, *token_id), 0);
                }
            }
            TransactionBody::TokenDissociate {
                account_id,
                token_ids,
            } => {
                let key = self.live_account(account_id)?.key;
                require(signed(&key))?;
                for token_id in token_ids {
                    self.token(token_id)?;
                    if !self.token_balances.contains_key(&(*account_id, *token_id)) {
                        return Err(Status::TokenNotAssociatedToAccount);
                    }
                }
                for token_id in token_ids {
                    self.token_balances.remove(&(*account_id, *token_id));
                }
            }
            TransactionBody::TokenMint { token_id, supply } => {
                let token = self.token(token_id)?;
                require(signed(&token.supply_key))?;
                let treasury = token.treasury;
                let token_type = token.token_type;
                let token = self.tokens.get_mut(token_id).ok_or(Status::InvalidTokenId)?;
                match (supply, token_type) {
                    (MintSupply::Amount(amount), TokenType::FungibleCommon) if *amount > 0 => {
                        token.total_supply = token
                            .total_supply
                            .checked_add(*amount)
                            .ok_or(Status::InvalidTokenMintAmount)?;
                        *self.token_balances.entry((treasury, *token_id)).or_insert(0) += amount;
                    }
                    (MintSupply::Metadata(metadata), TokenType::NonFungibleUnique) => {
                        for _ in metadata {
                            let serial = token.next_serial;
                            token.next_serial += 1;
                            token.nft_owners.insert(serial, treasury);
                            effects.serials.push(serial);
                        }
                        token.total_supply += metadata.len() as u64;
                    }
                    _ => return Err(Status::InvalidTokenMintAmount),
                }
                effects.total_supply = token.total_supply;
            }
            TransactionBody::TokenBurn { token_id, supply } => {
                let token = self.token(token_id)?;
                require(signed(&token.supply_key))?;
                let treasury = token.treasury;
                match (supply, token.token_type) {
                    (BurnSupply::Amount(amount), TokenType::FungibleCommon) if *amount > 0 => {
                        let held = self.token_balance(treasury, *token_id).unwrap_or(0);
                        if held < *amount || token.total_supply < *amount {
                            return Err(Status::InsufficientTokenBalance);
                        }
                        self.token_balances.insert((treasury, *token_id), held - amount);
                        let token = self.tokens.get_mut(token_id).ok_or(Status::InvalidTokenId)?;
                        token.total_supply -= amount;
                        effects.total_supply = token.total_supply;
                    }
                    (BurnSupply::Serials(serials), TokenType::NonFungibleUnique) => {
                        let mut distinct = BTreeSet::new();
                        for serial in serials {
                            if !distinct.insert(*serial)
                                || token.nft_owners.get(serial) != Some(&treasury)
                            {
                                return Err(Status::InvalidNftId);
                            }
                        }
                        let token = self.tokens.get_mut(token_id).ok_or(Status::InvalidTokenId)?;
                        let removed = distinct
                            .iter()
                            .filter(|serial| token.nft_owners.remove(serial).is_some())
                            .count() as u64;
                        token.total_supply = token
                            .total_supply
                            .checked_sub(removed)
                            .ok_or(Status::InvalidTokenBurnAmount)?;
                        effects.total_supply = token.total_supply;
                    }
                    _ => return Err(Status::InvalidTokenBurnAmount),
                }
            }
            TransactionBody::TokenTransfer {
                token_transfers,
                nft_transfers,
            } => {
                for transfer in token_transfers {
                    self.token(&transfer.token_id)?;
                    let key = self.live_account(&transfer.account_id)?.key;
                    let held = self
                        .token_balance(transfer.account_id, transfer.token_id)
                        .ok_or(Status::TokenNotAssociatedToAccount)?;
                    if transfer.amount < 0 {
                        require(signed(&key))?;
                        if held < transfer.amount.unsigned_abs() {
                            return Err(Status::InsufficientTokenBalance);
                        }
                    }
                }
                let mut moved = BTreeSet::new();
                for transfer in nft_transfers {
                    if !moved.insert(transfer.nft_id) {
                        return Err(Status::InvalidNftId);
                    }
                    let token_id = transfer.nft_id.token_id;
                    let sender_key = self.live_account(&transfer.sender)?.key;
                    self.live_account(&transfer.receiver)?;
                    require(signed(&sender_key))?;
                    let owner = self
                        .nft_owner(token_id, transfer.nft_id.serial)
                        .ok_or(Status::InvalidNftId)?;
                    if owner != transfer.sender {
                        return Err(Status::SenderDoesNotOwnNftSerialNo);
                    }
                    if self.token_balance(transfer.receiver, token_id).is_none() {
                        return Err(Status::TokenNotAssociatedToAccount);
                    }
                }
                for transfer in token_transfers {
                    let balance = self
                        .token_balances
                        .entry((transfer.account_id, transfer.token_id))
                        .or_insert(0);
                    *balance = balance.saturating_add_signed(transfer.amount);
                }
                for transfer in nft_transfers {
                    if let Some(token) = self.tokens.get_mut(&transfer.nft_id.token_id) {
                        token
                            .nft_owners
                            .insert(transfer.nft_id.serial, transfer.receiver);
                    }
                }
            }
        }
        Ok(effects)
    }

    fn live_account(&self, account_id: &AccountId) -> Result<&MockAccount, Status> {
        let account = self.accounts.get(account_id).ok_or(Status::InvalidAccountId)?;
        if account.deleted {
            return Err(Status::AccountDeleted);
        }
        Ok(account)
    }

    fn live_file(&self, file_id: &FileId) -> Result<&MockFile, Status> {
        let file = self.files.get(file_id).ok_or(Status::InvalidFileId)?;
        if file.deleted {
            return Err(Status::FileDeleted);
        }
        Ok(file)
    }

    fn live_contract(&self, contract_id: &ContractId) -> Result<&MockContract, Status> {
        let contract = self
            .contracts
            .get(contract_id)
            .ok_or(Status::InvalidContractId)?;
        if contract.deleted {
            return Err(Status::ContractDeleted);
        }
        Ok(contract)
    }

    fn live_topic(&self, topic_id: &TopicId) -> Result<&MockTopic, Status> {
        self.topics
            .get(topic_id)
            .filter(|topic| !topic.deleted)
            .ok_or(Status::InvalidTopicId)
    }

    fn token(&self, token_id: &TokenId) -> Result<&MockToken, Status> {
        self.tokens.get(token_id).ok_or(Status::InvalidTokenId)
    }

    fn debit(&mut self, account_id: &AccountId, amount: Hbar) {
        if let Some(account) = self.accounts.get_mut(account_id) {
            account.balance = account.balance.checked_sub(amount).unwrap_or(Hbar::ZERO);
        }
    }

    fn credit(&mut self, account_id: &AccountId, amount: Hbar) {
        if let Some(account) = self.accounts.get_mut(account_id) {
            account.balance = account.balance.checked_add(amount).unwrap_or(account.balance);
        }
    }
}

/// Fixed network fee charged per transaction kind.
pub fn fee_for(kind: TransactionKind) -> Hbar {
    let tinybars = match kind {
        TransactionKind::AccountCreate => 5_000_000,
        TransactionKind::AccountDelete => 500_000,
        TransactionKind::FileCreate | TransactionKind::FileUpdate => 5_000_000,
        TransactionKind::FileAppend => 5_000_000,
        TransactionKind::FileDelete => 700_000,
        TransactionKind::ContractCreate => 100_000_000,
        TransactionKind::ContractDelete => 700_000,
        TransactionKind::ContractCall => 50_000_000,
        TransactionKind::TopicCreate => 1_000_000,
        TransactionKind::TopicUpdate | TransactionKind::TopicDelete => 500_000,
        TransactionKind::TopicMessageSubmit => 10_000,
        TransactionKind::TokenCreate => 100_000_000,
        TransactionKind::TokenAssociate | TransactionKind::TokenDissociate => 5_000_000,
        TransactionKind::TokenMint => 2_000_000,
        TransactionKind::TokenBurn => 100_000,
        TransactionKind::TokenTransfer => 100_000,
    };
    Hbar::from_tinybars(tinybars)
}

fn next_consensus_time(previous: Timestamp) -> Timestamp {
    Timestamp::from_unix_nanos(previous.as_unix_nanos() + 1_000_000)
}

fn require(signed: bool) -> Result<(), Status> {
    if signed {
        Ok(())
    } else {
        Err(Status::InvalidSignature)
    }
}

fn precheck(status: Status, message: impl Into<String>) -> MockLedgerError {
    MockLedgerError::Precheck {
        status,
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use ledger_crypto::{encode_transaction_body, PrivateKey};
    use ledger_types::{
        AccountId, BurnSupply, FileId, FrozenBody, Hbar, MintSupply, NftId, NftTransfer, Query,
        QueryKind, QueryResponse, Status, Timestamp, TokenType, Transaction, TransactionBody,
        TransactionId, TransactionKind,
    };

    use super::{fee_for, MockLedger, MockLedgerError};

    const NODE: AccountId = AccountId::from_num(3);
    const OPERATOR: AccountId = AccountId::from_num(2);

    fn operator_key() -> PrivateKey {
        PrivateKey::from_bytes([0x02; 32])
    }

    fn make_ledger() -> MockLedger {
        let mut ledger = MockLedger::new();
        ledger.add_account(OPERATOR, operator_key().public_key(), Hbar::new(10_000));
        ledger
    }

    fn signed(body: TransactionBody, nanos: u32, keys: &[&PrivateKey]) -> Transaction {
        let mut tx = Transaction::new(body);
        let transaction_id = TransactionId::new(OPERATOR, Timestamp::new(1_000, nanos));
        let body_bytes = encode_transaction_body(&tx, &transaction_id, &NODE);
        tx.freeze(FrozenBody {
            transaction_id,
            node_account_id: NODE,
            body_bytes: body_bytes.clone(),
        })
        .unwrap();
        tx.add_signature(operator_key().sign(&body_bytes)).unwrap();
        for key in keys {
            tx.add_signature(key.sign(&body_bytes)).unwrap();
        }
        tx
    }

    fn status_of(ledger: &mut MockLedger, tx: &Transaction) -> Status {
        let response = ledger.submit(tx).unwrap();
        ledger.receipt(&response.transaction_id).unwrap().status
    }

    #[test]
    fn file_create_then_append_extends_contents() {
        let mut ledger = make_ledger();
        let create = signed(
            TransactionBody::FileCreate {
                keys: vec![operator_key().public_key()],
                contents: b"hello".to_vec(),
                memo: String::new(),
                expiration_time: None,
            },
            1,
            &[],
        );
        let response = ledger.submit(&create).unwrap();
        let file_id = ledger.receipt(&response.transaction_id).unwrap().file_id.unwrap();
        assert_eq!(file_id, FileId::from_num(1001));

        let append = signed(
            TransactionBody::FileAppend {
                file_id,
                contents: b" world".to_vec(),
            },
            2,
            &[],
        );
        assert_eq!(status_of(&mut ledger, &append), Status::Success);
        let contents = ledger
            .query(&Query {
                kind: QueryKind::FileContents { file_id },
                query_payment: Hbar::ZERO,
                max_query_payment: Hbar::ZERO,
            })
            .unwrap();
        assert_eq!(
            contents,
            QueryResponse::FileContents {
                contents: b"hello world".to_vec()
            }
        );
    }

    #[test]
    fn rejects_unsigned_payer_and_duplicates() {
        let mut ledger = make_ledger();
        let body = TransactionBody::FileDelete {
            file_id: FileId::from_num(1),
        };
        let mut unsigned = Transaction::new(body.clone());
        let transaction_id = TransactionId::new(OPERATOR, Timestamp::new(1_000, 9));
        unsigned
            .freeze(FrozenBody {
                transaction_id,
                node_account_id: NODE,
                body_bytes: encode_transaction_body(&unsigned, &transaction_id, &NODE),
            })
            .unwrap();
        assert!(matches!(
            ledger.submit(&unsigned),
            Err(MockLedgerError::Precheck {
                status: Status::InvalidSignature,
                ..
            })
        ));

        let tx = signed(body, 10, &[]);
        ledger.submit(&tx).unwrap();
        assert!(matches!(
            ledger.submit(&tx),
            Err(MockLedgerError::Precheck {
                status: Status::DuplicateTransaction,
                ..
            })
        ));
    }

    #[test]
    fn low_fee_ceiling_is_reported_in_receipt() {
        let mut ledger = make_ledger();
        let mut tx = Transaction::new(TransactionBody::TopicCreate {
            admin_key: None,
            submit_key: None,
            memo: None,
        })
        .with_max_transaction_fee(Hbar::from_tinybars(1));
        let transaction_id = TransactionId::new(OPERATOR, Timestamp::new(1_000, 11));
        let body_bytes = encode_transaction_body(&tx, &transaction_id, &NODE);
        tx.freeze(FrozenBody {
            transaction_id,
            node_account_id: NODE,
            body_bytes: body_bytes.clone(),
        })
        .unwrap();
        tx.add_signature(operator_key().sign(&body_bytes)).unwrap();
        assert_eq!(status_of(&mut ledger, &tx), Status::InsufficientTxFee);
        assert_eq!(ledger.balance_of(&OPERATOR), Some(Hbar::new(10_000)));
    }

    #[test]
    fn account_delete_requires_account_key_and_moves_balance() {
        let mut ledger = make_ledger();
        let doomed_key = PrivateKey::from_bytes([0x44; 32]);
        let doomed = AccountId::from_num(50);
        ledger.add_account(doomed, doomed_key.public_key(), Hbar::new(5));
        let body = TransactionBody::AccountDelete {
            account_id: doomed,
            transfer_account_id: OPERATOR,
        };
        assert_eq!(
            status_of(&mut ledger, &signed(body.clone(), 12, &[])),
            Status::InvalidSignature
        );
        assert_eq!(
            status_of(&mut ledger, &signed(body, 13, &[&doomed_key])),
            Status::Success
        );
        assert!(ledger.accounts[&doomed].deleted);
        // both attempts reached consensus and paid the fee
        let fee = fee_for(TransactionKind::AccountDelete).to_tinybars();
        let expected = Hbar::from_tinybars(Hbar::new(10_005).to_tinybars() - 2 * fee);
        assert_eq!(ledger.balance_of(&OPERATOR), Some(expected));
    }

    #[test]
    fn nft_mint_burn_and_transfer() {
        let mut ledger = make_ledger();
        let supply = PrivateKey::from_bytes([0x55; 32]);
        let create = signed(
            TransactionBody::TokenCreate {
                name: "Art".to_string(),
                symbol: "ART".to_string(),
                treasury_account_id: OPERATOR,
                token_type: TokenType::NonFungibleUnique,
                supply_key: supply.public_key(),
            },
            20,
            &[&supply],
        );
        let response = ledger.submit(&create).unwrap();
        let token_id = ledger.receipt(&response.transaction_id).unwrap().token_id.unwrap();

        let mint = signed(
            TransactionBody::TokenMint {
                token_id,
                supply: MintSupply::Metadata(vec![b"a".to_vec(), b"b".to_vec()]),
            },
            21,
            &[&supply],
        );
        let response = ledger.submit(&mint).unwrap();
        let receipt = ledger.receipt(&response.transaction_id).unwrap();
        assert_eq!(receipt.serials, vec![1, 2]);
        assert_eq!(receipt.total_supply, 2);

        let holder_key = PrivateKey::from_bytes([0x66; 32]);
        let holder = AccountId::from_num(60);
        ledger.add_account(holder, holder_key.public_key(), Hbar::new(1));
        let transfer = TransactionBody::TokenTransfer {
            token_transfers: Vec::new(),
            nft_transfers: vec![NftTransfer {
                nft_id: NftId::new(token_id, 1),
                sender: OPERATOR,
                receiver: holder,
            }],
        };
        assert_eq!(
            status_of(&mut ledger, &signed(transfer.clone(), 22, &[])),
            Status::TokenNotAssociatedToAccount
        );
        let associate = signed(
            TransactionBody::TokenAssociate {
                account_id: holder,
                token_ids: vec![token_id],
            },
            23,
            &[&holder_key],
        );
        assert_eq!(status_of(&mut ledger, &associate), Status::Success);
        assert_eq!(status_of(&mut ledger, &signed(transfer, 24, &[])), Status::Success);
        assert_eq!(ledger.nft_owner(token_id, 1), Some(holder));

        let burn_foreign = signed(
            TransactionBody::TokenBurn {
                token_id,
                supply: BurnSupply::Serials(vec![1]),
            },
            25,
            &[&supply],
        );
        assert_eq!(status_of(&mut ledger, &burn_foreign), Status::InvalidNftId);
    }

    #[test]
    fn repeated_burn_serial_leaves_supply_untouched() {
        let mut ledger = make_ledger();
        let supply = PrivateKey::from_bytes([0x57; 32]);
        let create = signed(
            TransactionBody::TokenCreate {
                name: "Art".to_string(),
                symbol: "ART".to_string(),
                treasury_account_id: OPERATOR,
                token_type: TokenType::NonFungibleUnique,
                supply_key: supply.public_key(),
            },
            26,
            &[&supply],
        );
        let response = ledger.submit(&create).unwrap();
        let token_id = ledger.receipt(&response.transaction_id).unwrap().token_id.unwrap();
        let mint = signed(
            TransactionBody::TokenMint {
                token_id,
                supply: MintSupply::Metadata(vec![b"a".to_vec(), b"b".to_vec()]),
            },
            27,
            &[&supply],
        );
        assert_eq!(status_of(&mut ledger, &mint), Status::Success);

        for (nanos, serial) in [(28, 1), (29, 2)] {
            let burn = signed(
                TransactionBody::TokenBurn {
                    token_id,
                    supply: BurnSupply::Serials(vec![serial, serial]),
                },
                nanos,
                &[&supply],
            );
            assert_eq!(status_of(&mut ledger, &burn), Status::InvalidNftId);
        }
        assert_eq!(ledger.tokens[&token_id].total_supply, 2);
        assert_eq!(ledger.nft_owner(token_id, 1), Some(OPERATOR));
        assert_eq!(ledger.nft_owner(token_id, 2), Some(OPERATOR));

        let burn = signed(
            TransactionBody::TokenBurn {
                token_id,
                supply: BurnSupply::Serials(vec![2, 1]),
            },
            30,
            &[&supply],
        );
        let response = ledger.submit(&burn).unwrap();
        let receipt = ledger.receipt(&response.transaction_id).unwrap();
        assert_eq!(receipt.status, Status::Success);
        assert_eq!(receipt.total_supply, 0);
    }

    #[test]
    fn contract_call_echoes_arguments() {
        let mut ledger = make_ledger();
        let file = signed(
            TransactionBody::FileCreate {
                keys: vec![operator_key().public_key()],
                contents: vec![0x60, 0x80],
                memo: String::new(),
                expiration_time: None,
            },
            30,
            &[],
        );
        let response = ledger.submit(&file).unwrap();
        let file_id = ledger.receipt(&response.transaction_id).unwrap().file_id.unwrap();
        let create = signed(
            TransactionBody::ContractCreate {
                bytecode_file_id: file_id,
                gas: 5_000_000,
                constructor_parameters: Vec::new(),
            },
            31,
            &[],
        );
        let response = ledger.submit(&create).unwrap();
        let contract_id = ledger
            .receipt(&response.transaction_id)
            .unwrap()
            .contract_id
            .unwrap();

        let call = signed(
            TransactionBody::ContractCall {
                contract_id,
                gas: 100_000,
                function_parameters: vec![0xaa, 0xbb, 0xcc, 0xdd, 1, 2, 3],
            },
            32,
            &[],
        );
        let response = ledger.submit(&call).unwrap();
        let record = ledger.record(&response.transaction_id).unwrap();
        let result = record.contract_function_result.unwrap();
        assert_eq!(result.result, vec![1, 2, 3]);
        assert_eq!(record.transaction_fee, fee_for(TransactionKind::ContractCall));
    }
}
