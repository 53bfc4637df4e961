use alloy_primitives::{Address, I256, U256};
use ledger_crypto::abi::{self, ContractParam};
use ledger_crypto::PrivateKey;
use ledger_types::{
    AbiError, AccountId, ContractFunctionResult, ContractId, FileId, Hbar, Status, Timestamp,
    Transaction, TransactionBody, TransactionHash, TransactionId, TransactionKind,
    ValidationError,
};

use super::{
    exactly_one, expect_record, impl_transaction_options, required, ContractDeleteResult,
    Finality, Outcome, Prepared, TransactionOptions, TransactionRequest, TransactionResult,
};
use crate::context::ClientContext;
use crate::error::ProtocolError;

/// Instantiates a contract from bytecode already stored in a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCreateRequest {
    pub bytecode_file_id: FileId,
    pub constructor_params: Vec<ContractParam>,
    /// Falls back to the client's configured contract gas.
    pub gas: Option<u64>,
    options: TransactionOptions,
}

impl ContractCreateRequest {
    pub fn new(bytecode_file_id: FileId) -> Self {
        Self {
            bytecode_file_id,
            constructor_params: Vec::new(),
            gas: None,
            options: TransactionOptions::default(),
        }
    }

    pub fn with_constructor_params(mut self, params: Vec<ContractParam>) -> Self {
        self.constructor_params = params;
        self
    }

    pub fn with_gas(mut self, gas: u64) -> Self {
        self.gas = Some(gas);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractCreateResult {
    pub transaction_id: TransactionId,
    pub status: Status,
    pub contract_id: ContractId,
}

impl TransactionRequest for ContractCreateRequest {
    type Output = ContractCreateResult;
    type Carry = ();

    const KIND: TransactionKind = TransactionKind::ContractCreate;
    const FINALITY: Finality = Finality::Receipt;

    fn prepare(&self, context: &ClientContext) -> Result<Prepared<()>, ValidationError> {
        let gas = resolve_gas(self.gas, context)?;
        let transaction = self.options.apply(Transaction::new(TransactionBody::ContractCreate {
            bytecode_file_id: self.bytecode_file_id,
            gas,
            constructor_parameters: abi::encode_parameters(&self.constructor_params),
        }));
        Ok(Prepared::new(transaction, Vec::new()))
    }

    fn complete(outcome: Outcome, _carry: ()) -> Result<ContractCreateResult, ProtocolError> {
        let receipt = outcome.receipt();
        Ok(ContractCreateResult {
            transaction_id: receipt.transaction_id,
            status: receipt.status,
            contract_id: required(receipt.contract_id, Self::KIND, &outcome, "contract_id")?,
        })
    }
}

/// Deletes a contract, sending its balance to exactly one of an account or
/// another contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractDeleteRequest {
    pub contract_id: ContractId,
    pub transfer_account_id: Option<AccountId>,
    pub transfer_contract_id: Option<ContractId>,
    options: TransactionOptions,
}

impl ContractDeleteRequest {
    pub fn new(contract_id: ContractId) -> Self {
        Self {
            contract_id,
            transfer_account_id: None,
            transfer_contract_id: None,
            options: TransactionOptions::default(),
        }
    }

    pub fn with_transfer_account_id(mut self, account_id: AccountId) -> Self {
        self.transfer_account_id = Some(account_id);
        self
    }

    pub fn with_transfer_contract_id(mut self, contract_id: ContractId) -> Self {
        self.transfer_contract_id = Some(contract_id);
        self
    }
}

impl TransactionRequest for ContractDeleteRequest {
    type Output = ContractDeleteResult;
    type Carry = ();

    const KIND: TransactionKind = TransactionKind::ContractDelete;
    const FINALITY: Finality = Finality::Receipt;

    fn prepare(&self, _context: &ClientContext) -> Result<Prepared<()>, ValidationError> {
        exactly_one(
            Self::KIND,
            ("transfer_account_id", self.transfer_account_id.is_some()),
            ("transfer_contract_id", self.transfer_contract_id.is_some()),
        )?;
        let transaction = self.options.apply(Transaction::new(TransactionBody::ContractDelete {
            contract_id: self.contract_id,
            transfer_account_id: self.transfer_account_id,
            transfer_contract_id: self.transfer_contract_id,
        }));
        Ok(Prepared::new(transaction, Vec::new()))
    }

    fn complete(outcome: Outcome, _carry: ()) -> Result<ContractDeleteResult, ProtocolError> {
        Ok(TransactionResult::from_outcome(&outcome))
    }
}

/// Calls a contract function by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCallRequest {
    pub contract_id: ContractId,
    pub function_name: String,
    pub params: Vec<ContractParam>,
    pub gas: Option<u64>,
    /// Extra keys the called contract expects on the transaction.
    pub signing_keys: Vec<PrivateKey>,
    options: TransactionOptions,
}

impl ContractCallRequest {
    pub fn new(contract_id: ContractId, function_name: impl Into<String>) -> Self {
        Self {
            contract_id,
            function_name: function_name.into(),
            params: Vec::new(),
            gas: None,
            signing_keys: Vec::new(),
            options: TransactionOptions::default(),
        }
    }

    pub fn with_params(mut self, params: Vec<ContractParam>) -> Self {
        self.params = params;
        self
    }

    pub fn with_gas(mut self, gas: u64) -> Self {
        self.gas = Some(gas);
        self
    }

    pub fn with_signing_key(mut self, key: PrivateKey) -> Self {
        self.signing_keys.push(key);
        self
    }
}

/// Record of a contract call plus typed access to its return data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCallResult {
    pub transaction_id: TransactionId,
    pub status: Status,
    pub transaction_hash: TransactionHash,
    pub consensus_timestamp: Timestamp,
    pub transaction_fee: Hbar,
    pub contract_id: ContractId,
    pub function_result: ContractFunctionResult,
}

impl ContractCallResult {
    pub fn raw(&self) -> &[u8] {
        &self.function_result.result
    }

    pub fn gas_used(&self) -> u64 {
        self.function_result.gas_used
    }

    pub fn get_u256(&self, index: usize) -> Result<U256, AbiError> {
        abi::uint_at(self.raw(), index)
    }

    pub fn get_i256(&self, index: usize) -> Result<I256, AbiError> {
        abi::int256_at(self.raw(), index)
    }

    /// Signed word narrowed to `i128`; fails when the value does not fit.
    pub fn get_i128(&self, index: usize) -> Result<i128, AbiError> {
        abi::int_at(self.raw(), index)
    }

    pub fn get_u64(&self, index: usize) -> Result<u64, AbiError> {
        abi::u64_at(self.raw(), index)
    }

    pub fn get_address(&self, index: usize) -> Result<Address, AbiError> {
        abi::address_at(self.raw(), index)
    }

    pub fn get_bool(&self, index: usize) -> Result<bool, AbiError> {
        abi::bool_at(self.raw(), index)
    }

    pub fn get_string(&self, index: usize) -> Result<String, AbiError> {
        abi::string_at(self.raw(), index)
    }

    pub fn get_bytes(&self, index: usize) -> Result<Vec<u8>, AbiError> {
        abi::bytes_at(self.raw(), index)
    }

    pub fn get_bytes32(&self, index: usize) -> Result<[u8; 32], AbiError> {
        abi::bytes32_at(self.raw(), index)
    }
}

impl TransactionRequest for ContractCallRequest {
    type Output = ContractCallResult;
    type Carry = ();

    const KIND: TransactionKind = TransactionKind::ContractCall;
    const FINALITY: Finality = Finality::Record;

    fn prepare(&self, context: &ClientContext) -> Result<Prepared<()>, ValidationError> {
        if self.function_name.is_empty() {
            return Err(ValidationError::MissingField("function_name"));
        }
        let gas = resolve_gas(self.gas, context)?;
        let transaction = self.options.apply(Transaction::new(TransactionBody::ContractCall {
            contract_id: self.contract_id,
            gas,
            function_parameters: abi::encode_function_call(&self.function_name, &self.params),
        }));
        Ok(Prepared::new(transaction, self.signing_keys.clone()))
    }

    fn complete(outcome: Outcome, _carry: ()) -> Result<ContractCallResult, ProtocolError> {
        let contract_id = required(
            outcome.receipt().contract_id,
            Self::KIND,
            &outcome,
            "contract_id",
        )?;
        let transaction_id = outcome.transaction_id();
        let receipt = outcome.receipt().clone();
        let record = expect_record(outcome, Self::KIND)?;
        let function_result = record.contract_function_result.ok_or_else(|| {
            ProtocolError::mapping(Self::KIND, transaction_id, "contract_function_result")
                .with_receipt(receipt)
        })?;
        Ok(ContractCallResult {
            transaction_id: record.transaction_id,
            status: record.receipt.status,
            transaction_hash: record.transaction_hash,
            consensus_timestamp: record.consensus_timestamp,
            transaction_fee: record.transaction_fee,
            contract_id,
            function_result,
        })
    }
}

fn resolve_gas(gas: Option<u64>, context: &ClientContext) -> Result<u64, ValidationError> {
    match gas.unwrap_or(context.config().contract_gas) {
        0 => Err(ValidationError::InvalidField {
            field: "gas",
            reason: "must be positive",
        }),
        gas => Ok(gas),
    }
}

impl_transaction_options!(ContractCreateRequest, ContractDeleteRequest, ContractCallRequest);
