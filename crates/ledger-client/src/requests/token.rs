use ledger_crypto::PrivateKey;
use ledger_types::{
    AccountId, BurnSupply, MintSupply, NftId, NftTransfer, Status, TokenId, TokenTransfer,
    TokenType, Transaction, TransactionBody, TransactionId, TransactionKind, ValidationError,
};

use super::{
    exactly_one, impl_transaction_options, required, Finality, Outcome, Prepared,
    TokenAssociateResult, TokenDissociateResult, TokenTransferResult, TransactionOptions,
    TransactionRequest, TransactionResult,
};
use crate::context::ClientContext;
use crate::error::ProtocolError;

/// Creates a token whose treasury receives minted supply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenCreateRequest {
    pub name: String,
    pub symbol: String,
    pub treasury_account_id: AccountId,
    pub treasury_key: PrivateKey,
    pub token_type: TokenType,
    pub supply_key: PrivateKey,
    options: TransactionOptions,
}

impl TokenCreateRequest {
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        treasury_account_id: AccountId,
        treasury_key: PrivateKey,
        supply_key: PrivateKey,
    ) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            treasury_account_id,
            treasury_key,
            token_type: TokenType::FungibleCommon,
            supply_key,
            options: TransactionOptions::default(),
        }
    }

    pub fn with_token_type(mut self, token_type: TokenType) -> Self {
        self.token_type = token_type;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenCreateResult {
    pub transaction_id: TransactionId,
    pub status: Status,
    pub token_id: TokenId,
}

impl TransactionRequest for TokenCreateRequest {
    type Output = TokenCreateResult;
    type Carry = ();

    const KIND: TransactionKind = TransactionKind::TokenCreate;
    const FINALITY: Finality = Finality::Receipt;

    fn prepare(&self, _context: &ClientContext) -> Result<Prepared<()>, ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        if self.symbol.is_empty() {
            return Err(ValidationError::MissingField("symbol"));
        }
        let transaction = self.options.apply(Transaction::new(TransactionBody::TokenCreate {
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            treasury_account_id: self.treasury_account_id,
            token_type: self.token_type,
            supply_key: self.supply_key.public_key(),
        }));
        Ok(Prepared::new(
            transaction,
            vec![self.treasury_key.clone(), self.supply_key.clone()],
        ))
    }

    fn complete(outcome: Outcome, _carry: ()) -> Result<TokenCreateResult, ProtocolError> {
        let receipt = outcome.receipt();
        Ok(TokenCreateResult {
            transaction_id: receipt.transaction_id,
            status: receipt.status,
            token_id: required(receipt.token_id, Self::KIND, &outcome, "token_id")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenAssociateRequest {
    pub account_id: AccountId,
    pub account_key: PrivateKey,
    pub token_ids: Vec<TokenId>,
    options: TransactionOptions,
}

impl TokenAssociateRequest {
    pub fn new(account_id: AccountId, account_key: PrivateKey, token_ids: Vec<TokenId>) -> Self {
        Self {
            account_id,
            account_key,
            token_ids,
            options: TransactionOptions::default(),
        }
    }
}

impl TransactionRequest for TokenAssociateRequest {
    type Output = TokenAssociateResult;
    type Carry = ();

    const KIND: TransactionKind = TransactionKind::TokenAssociate;
    const FINALITY: Finality = Finality::Receipt;

    fn prepare(&self, _context: &ClientContext) -> Result<Prepared<()>, ValidationError> {
        let transaction = self.options.apply(Transaction::new(TransactionBody::TokenAssociate {
            account_id: self.account_id,
            token_ids: self.token_ids.clone(),
        }));
        transaction.body().validate()?;
        Ok(Prepared::new(transaction, vec![self.account_key.clone()]))
    }

    fn complete(outcome: Outcome, _carry: ()) -> Result<TokenAssociateResult, ProtocolError> {
        Ok(TransactionResult::from_outcome(&outcome))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenDissociateRequest {
    pub account_id: AccountId,
    pub account_key: PrivateKey,
    pub token_ids: Vec<TokenId>,
    options: TransactionOptions,
}

impl TokenDissociateRequest {
    pub fn new(account_id: AccountId, account_key: PrivateKey, token_ids: Vec<TokenId>) -> Self {
        Self {
            account_id,
            account_key,
            token_ids,
            options: TransactionOptions::default(),
        }
    }
}

impl TransactionRequest for TokenDissociateRequest {
    type Output = TokenDissociateResult;
    type Carry = ();

    const KIND: TransactionKind = TransactionKind::TokenDissociate;
    const FINALITY: Finality = Finality::Receipt;

    fn prepare(&self, _context: &ClientContext) -> Result<Prepared<()>, ValidationError> {
        let transaction = self.options.apply(Transaction::new(TransactionBody::TokenDissociate {
            account_id: self.account_id,
            token_ids: self.token_ids.clone(),
        }));
        transaction.body().validate()?;
        Ok(Prepared::new(transaction, vec![self.account_key.clone()]))
    }

    fn complete(outcome: Outcome, _carry: ()) -> Result<TokenDissociateResult, ProtocolError> {
        Ok(TransactionResult::from_outcome(&outcome))
    }
}

/// Mints either a fungible `amount` or one NFT per `metadata` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMintRequest {
    pub token_id: TokenId,
    pub supply_key: PrivateKey,
    pub amount: Option<u64>,
    pub metadata: Option<Vec<Vec<u8>>>,
    options: TransactionOptions,
}

impl TokenMintRequest {
    pub fn new(token_id: TokenId, supply_key: PrivateKey) -> Self {
        Self {
            token_id,
            supply_key,
            amount: None,
            metadata: None,
            options: TransactionOptions::default(),
        }
    }

    pub fn with_amount(mut self, amount: u64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_metadata(mut self, metadata: Vec<Vec<u8>>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMintResult {
    pub transaction_id: TransactionId,
    pub status: Status,
    pub total_supply: u64,
    pub serials: Vec<u64>,
}

impl TransactionRequest for TokenMintRequest {
    type Output = TokenMintResult;
    type Carry = ();

    const KIND: TransactionKind = TransactionKind::TokenMint;
    const FINALITY: Finality = Finality::Receipt;

    fn prepare(&self, _context: &ClientContext) -> Result<Prepared<()>, ValidationError> {
        exactly_one(
            Self::KIND,
            ("amount", self.amount.is_some()),
            ("metadata", self.metadata.is_some()),
        )?;
        let supply = match (&self.amount, &self.metadata) {
            (Some(amount), _) => MintSupply::Amount(*amount),
            (None, Some(metadata)) => MintSupply::Metadata(metadata.clone()),
            (None, None) => return Err(ValidationError::MissingField("amount")),
        };
        let transaction = self.options.apply(Transaction::new(TransactionBody::TokenMint {
            token_id: self.token_id,
            supply,
        }));
        transaction.body().validate()?;
        Ok(Prepared::new(transaction, vec![self.supply_key.clone()]))
    }

    fn complete(outcome: Outcome, _carry: ()) -> Result<TokenMintResult, ProtocolError> {
        let receipt = outcome.receipt();
        Ok(TokenMintResult {
            transaction_id: receipt.transaction_id,
            status: receipt.status,
            total_supply: receipt.total_supply,
            serials: receipt.serials.clone(),
        })
    }
}

/// Burns either a fungible `amount` or the listed NFT `serials` from the
/// treasury.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBurnRequest {
    pub token_id: TokenId,
    pub supply_key: PrivateKey,
    pub amount: Option<u64>,
    pub serials: Option<Vec<u64>>,
    options: TransactionOptions,
}

impl TokenBurnRequest {
    pub fn new(token_id: TokenId, supply_key: PrivateKey) -> Self {
        Self {
            token_id,
            supply_key,
            amount: None,
            serials: None,
            options: TransactionOptions::default(),
        }
    }

    pub fn with_amount(mut self, amount: u64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_serials(mut self, serials: Vec<u64>) -> Self {
        self.serials = Some(serials);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenBurnResult {
    pub transaction_id: TransactionId,
    pub status: Status,
    pub total_supply: u64,
}

impl TransactionRequest for TokenBurnRequest {
    type Output = TokenBurnResult;
    type Carry = ();

    const KIND: TransactionKind = TransactionKind::TokenBurn;
    const FINALITY: Finality = Finality::Receipt;

    fn prepare(&self, _context: &ClientContext) -> Result<Prepared<()>, ValidationError> {
        exactly_one(
            Self::KIND,
            ("amount", self.amount.is_some()),
            ("serials", self.serials.is_some()),
        )?;
        let supply = match (&self.amount, &self.serials) {
            (Some(amount), _) => BurnSupply::Amount(*amount),
            (None, Some(serials)) => BurnSupply::Serials(serials.clone()),
            (None, None) => return Err(ValidationError::MissingField("amount")),
        };
        let transaction = self.options.apply(Transaction::new(TransactionBody::TokenBurn {
            token_id: self.token_id,
            supply,
        }));
        transaction.body().validate()?;
        Ok(Prepared::new(transaction, vec![self.supply_key.clone()]))
    }

    fn complete(outcome: Outcome, _carry: ()) -> Result<TokenBurnResult, ProtocolError> {
        let receipt = outcome.receipt();
        Ok(TokenBurnResult {
            transaction_id: receipt.transaction_id,
            status: receipt.status,
            total_supply: receipt.total_supply,
        })
    }
}

/// Moves a fungible `amount` or the listed NFT `serials` of one token from
/// `sender` to `receiver`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenTransferRequest {
    pub token_id: TokenId,
    pub sender: AccountId,
    pub sender_key: PrivateKey,
    pub receiver: AccountId,
    pub amount: Option<u64>,
    pub serials: Option<Vec<u64>>,
    options: TransactionOptions,
}

impl TokenTransferRequest {
    pub fn new(
        token_id: TokenId,
        sender: AccountId,
        sender_key: PrivateKey,
        receiver: AccountId,
    ) -> Self {
        Self {
            token_id,
            sender,
            sender_key,
            receiver,
            amount: None,
            serials: None,
            options: TransactionOptions::default(),
        }
    }

    pub fn with_amount(mut self, amount: u64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_serials(mut self, serials: Vec<u64>) -> Self {
        self.serials = Some(serials);
        self
    }

    fn transfers(&self) -> Result<(Vec<TokenTransfer>, Vec<NftTransfer>), ValidationError> {
        if let Some(amount) = self.amount {
            let amount = i64::try_from(amount).map_err(|_| ValidationError::InvalidField {
                field: "amount",
                reason: "exceeds the signed 64-bit transfer range",
            })?;
            let debit = TokenTransfer {
                token_id: self.token_id,
                account_id: self.sender,
                amount: -amount,
            };
            let credit = TokenTransfer {
                token_id: self.token_id,
                account_id: self.receiver,
                amount,
            };
            return Ok((vec![debit, credit], Vec::new()));
        }
        let nfts = self
            .serials
            .iter()
            .flatten()
            .map(|serial| NftTransfer {
                nft_id: NftId::new(self.token_id, *serial),
                sender: self.sender,
                receiver: self.receiver,
            })
            .collect();
        Ok((Vec::new(), nfts))
    }
}

impl TransactionRequest for TokenTransferRequest {
    type Output = TokenTransferResult;
    type Carry = ();

    const KIND: TransactionKind = TransactionKind::TokenTransfer;
    const FINALITY: Finality = Finality::Receipt;

    fn prepare(&self, _context: &ClientContext) -> Result<Prepared<()>, ValidationError> {
        exactly_one(
            Self::KIND,
            ("amount", self.amount.is_some()),
            ("serials", self.serials.is_some()),
        )?;
        if self.sender == self.receiver {
            return Err(ValidationError::InvalidField {
                field: "receiver",
                reason: "must differ from the sender",
            });
        }
        let (token_transfers, nft_transfers) = self.transfers()?;
        let transaction = self.options.apply(Transaction::new(TransactionBody::TokenTransfer {
            token_transfers,
            nft_transfers,
        }));
        transaction.body().validate()?;
        Ok(Prepared::new(transaction, vec![self.sender_key.clone()]))
    }

    fn complete(outcome: Outcome, _carry: ()) -> Result<TokenTransferResult, ProtocolError> {
        Ok(TransactionResult::from_outcome(&outcome))
    }
}

impl_transaction_options!(
    TokenCreateRequest,
    TokenAssociateRequest,
    TokenDissociateRequest,
    TokenMintRequest,
    TokenBurnRequest,
    TokenTransferRequest,
);
