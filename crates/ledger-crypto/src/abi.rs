//! Solidity ABI helpers for contract create and call payloads.
//!
//! Encoding follows the standard head/tail layout: static values occupy one
//! 32-byte head word, dynamic values (`string`, `bytes`) store an offset in
//! the head and their length-prefixed, zero-padded data in the tail.

use alloy_primitives::{keccak256, Address, I256, U256};
use ledger_types::{AbiError, AccountId, ContractId};

const WORD: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractParam {
    Address(Address),
    Bool(bool),
    String(String),
    Bytes(Vec<u8>),
    Bytes32([u8; 32]),
    Uint256(U256),
    Int256(i128),
    Uint64(u64),
    Int64(i64),
}

impl ContractParam {
    pub fn solidity_type(&self) -> &'static str {
        match self {
            Self::Address(_) => "address",
            Self::Bool(_) => "bool",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Bytes32(_) => "bytes32",
            Self::Uint256(_) => "uint256",
            Self::Int256(_) => "int256",
            Self::Uint64(_) => "uint64",
            Self::Int64(_) => "int64",
        }
    }

    fn is_dynamic(&self) -> bool {
        matches!(self, Self::String(_) | Self::Bytes(_))
    }

    fn static_word(&self) -> [u8; WORD] {
        let mut word = [0u8; WORD];
        match self {
            Self::Address(address) => word[12..].copy_from_slice(address.as_slice()),
            Self::Bool(value) => word[31] = u8::from(*value),
            Self::Bytes32(bytes) => word = *bytes,
            Self::Uint256(value) => word = value.to_be_bytes::<32>(),
            Self::Int256(value) => word = sign_extend(&value.to_be_bytes(), *value < 0),
            Self::Uint64(value) => word[24..].copy_from_slice(&value.to_be_bytes()),
            Self::Int64(value) => word = sign_extend(&value.to_be_bytes(), *value < 0),
            Self::String(_) | Self::Bytes(_) => {}
        }
        word
    }

    fn dynamic_tail(&self) -> Vec<u8> {
        let data: &[u8] = match self {
            Self::String(value) => value.as_bytes(),
            Self::Bytes(value) => value,
            _ => return Vec::new(),
        };
        let mut tail = usize_word(data.len()).to_vec();
        tail.extend_from_slice(data);
        tail.resize(WORD + padded_len(data.len()), 0);
        tail
    }
}

/// First four bytes of `keccak256("name(type,...)")`.
pub fn function_selector(name: &str, params: &[ContractParam]) -> [u8; 4] {
    let types: Vec<&str> = params.iter().map(ContractParam::solidity_type).collect();
    let signature = format!("{name}({})", types.join(","));
    let hash = keccak256(signature.as_bytes());
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&hash.0[..4]);
    selector
}

/// Selector followed by the encoded arguments.
pub fn encode_function_call(name: &str, params: &[ContractParam]) -> Vec<u8> {
    let mut out = function_selector(name, params).to_vec();
    out.extend_from_slice(&encode_parameters(params));
    out
}

/// Argument encoding without a selector, as used for constructors.
pub fn encode_parameters(params: &[ContractParam]) -> Vec<u8> {
    let head_len = params.len() * WORD;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();
    for param in params {
        if param.is_dynamic() {
            head.extend_from_slice(&usize_word(head_len + tail.len()));
            tail.extend_from_slice(&param.dynamic_tail());
        } else {
            head.extend_from_slice(&param.static_word());
        }
    }
    head.extend_from_slice(&tail);
    head
}

/// Long-zero EVM address of a ledger entity: 4 bytes shard, 8 realm, 8 num.
pub fn address_from_entity(shard: u64, realm: u64, num: u64) -> Address {
    let mut bytes = [0u8; 20];
    bytes[..4].copy_from_slice(&(shard as u32).to_be_bytes());
    bytes[4..12].copy_from_slice(&realm.to_be_bytes());
    bytes[12..].copy_from_slice(&num.to_be_bytes());
    Address::from(bytes)
}

pub fn account_address(account_id: &AccountId) -> Address {
    address_from_entity(account_id.shard, account_id.realm, account_id.num)
}

pub fn contract_address(contract_id: &ContractId) -> Address {
    address_from_entity(contract_id.shard, contract_id.realm, contract_id.num)
}

pub fn word_at(data: &[u8], index: usize) -> Result<[u8; WORD], AbiError> {
    let end = index
        .checked_mul(WORD)
        .and_then(|start| start.checked_add(WORD))
        .ok_or(AbiError::OutOfBounds {
            index,
            needed: usize::MAX,
            actual: data.len(),
        })?;
    let slice = data.get(end - WORD..end).ok_or(AbiError::OutOfBounds {
        index,
        needed: end,
        actual: data.len(),
    })?;
    let mut word = [0u8; WORD];
    word.copy_from_slice(slice);
    Ok(word)
}

pub fn uint_at(data: &[u8], index: usize) -> Result<U256, AbiError> {
    Ok(U256::from_be_bytes(word_at(data, index)?))
}

pub fn int256_at(data: &[u8], index: usize) -> Result<I256, AbiError> {
    Ok(I256::from_raw(uint_at(data, index)?))
}

pub fn u64_at(data: &[u8], index: usize) -> Result<u64, AbiError> {
    let word = word_at(data, index)?;
    if word[..24].iter().any(|b| *b != 0) {
        return Err(AbiError::Overflow {
            index,
            target: "u64",
        });
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&word[24..]);
    Ok(u64::from_be_bytes(bytes))
}

pub fn int_at(data: &[u8], index: usize) -> Result<i128, AbiError> {
    let word = word_at(data, index)?;
    let negative = word[16] & 0x80 != 0;
    let fill = if negative { 0xff } else { 0x00 };
    if word[..16].iter().any(|b| *b != fill) {
        return Err(AbiError::Overflow {
            index,
            target: "i128",
        });
    }
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&word[16..]);
    Ok(i128::from_be_bytes(bytes))
}

pub fn bool_at(data: &[u8], index: usize) -> Result<bool, AbiError> {
    Ok(u64_at(data, index)? != 0)
}

pub fn address_at(data: &[u8], index: usize) -> Result<Address, AbiError> {
    let word = word_at(data, index)?;
    Ok(Address::from_slice(&word[12..]))
}

pub fn bytes32_at(data: &[u8], index: usize) -> Result<[u8; 32], AbiError> {
    word_at(data, index)
}

pub fn bytes_at(data: &[u8], index: usize) -> Result<Vec<u8>, AbiError> {
    let offset = to_usize(u64_at(data, index)?, index)?;
    let len_word = offset / WORD;
    if offset % WORD != 0 {
        return Err(AbiError::Message(format!(
            "unaligned dynamic offset {offset} at word {index}"
        )));
    }
    let len = to_usize(u64_at(data, len_word)?, len_word)?;
    let out_of_bounds = |needed| AbiError::OutOfBounds {
        index: len_word,
        needed,
        actual: data.len(),
    };
    // offset + WORD cannot overflow once the length word at offset was read
    let start = offset + WORD;
    let end = start.checked_add(len).ok_or(out_of_bounds(usize::MAX))?;
    data.get(start..end)
        .map(<[u8]>::to_vec)
        .ok_or(out_of_bounds(end))
}

pub fn string_at(data: &[u8], index: usize) -> Result<String, AbiError> {
    String::from_utf8(bytes_at(data, index)?).map_err(|_| AbiError::InvalidUtf8(index))
}

fn sign_extend(bytes: &[u8], negative: bool) -> [u8; WORD] {
    let mut word = if negative { [0xff; WORD] } else { [0u8; WORD] };
    word[WORD - bytes.len()..].copy_from_slice(bytes);
    word
}

fn usize_word(value: usize) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[24..].copy_from_slice(&(value as u64).to_be_bytes());
    word
}

fn padded_len(len: usize) -> usize {
    len.div_ceil(WORD) * WORD
}

fn to_usize(value: u64, index: usize) -> Result<usize, AbiError> {
    usize::try_from(value).map_err(|_| AbiError::Overflow {
        index,
        target: "usize",
    })
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{I256, U256};
    use ledger_types::{AccountId, ContractId};

    use super::*;

    #[test]
    fn transfer_selector_matches_erc20() {
        let selector = function_selector(
            "transfer",
            &[
                ContractParam::Address(account_address(&AccountId::from_num(1))),
                ContractParam::Uint256(U256::from(1u64)),
            ],
        );
        assert_eq!(hex::encode(selector), "a9059cbb");
    }

    #[test]
    fn static_arguments_are_one_word_each() {
        let encoded = encode_parameters(&[
            ContractParam::Uint64(7),
            ContractParam::Bool(true),
            ContractParam::Int64(-1),
        ]);
        assert_eq!(encoded.len(), 3 * 32);
        assert_eq!(u64_at(&encoded, 0).unwrap(), 7);
        assert!(bool_at(&encoded, 1).unwrap());
        assert_eq!(int_at(&encoded, 2).unwrap(), -1);
        assert_eq!(int256_at(&encoded, 2).unwrap(), I256::MINUS_ONE);
    }

    #[test]
    fn dynamic_string_uses_offset_and_padded_tail() {
        let encoded = encode_parameters(&[
            ContractParam::String("hello".to_string()),
            ContractParam::Uint64(42),
        ]);
        // head: offset + u64, tail: length + one padded word
        assert_eq!(encoded.len(), 4 * 32);
        assert_eq!(u64_at(&encoded, 0).unwrap(), 64);
        assert_eq!(u64_at(&encoded, 1).unwrap(), 42);
        assert_eq!(string_at(&encoded, 0).unwrap(), "hello");
    }

    #[test]
    fn long_zero_address_carries_entity_num() {
        let address = contract_address(&ContractId::from_num(0x1234));
        assert_eq!(
            hex::encode(address.as_slice()),
            "0000000000000000000000000000000000001234"
        );
        let encoded = encode_parameters(&[ContractParam::Address(address)]);
        assert_eq!(address_at(&encoded, 0).unwrap(), address);
    }

    #[test]
    fn short_result_reports_out_of_bounds() {
        let err = uint_at(&[0u8; 16], 0).unwrap_err();
        assert!(matches!(err, AbiError::OutOfBounds { actual: 16, .. }));
    }

    #[test]
    fn large_value_does_not_fit_u64() {
        let encoded = encode_parameters(&[ContractParam::Uint256(U256::MAX)]);
        assert!(matches!(
            u64_at(&encoded, 0),
            Err(AbiError::Overflow { target: "u64", .. })
        ));
        assert_eq!(uint_at(&encoded, 0).unwrap(), U256::MAX);
    }

    #[test]
    fn huge_word_index_is_out_of_bounds() {
        let err = word_at(&[0u8; 64], usize::MAX / 8).unwrap_err();
        assert!(matches!(
            err,
            AbiError::OutOfBounds {
                needed: usize::MAX,
                actual: 64,
                ..
            }
        ));
    }

    #[test]
    fn hostile_length_word_is_out_of_bounds() {
        let mut data = vec![0u8; 3 * 32];
        // offset 32 points at a length word of u64::MAX
        data[31] = 32;
        data[56..64].copy_from_slice(&u64::MAX.to_be_bytes());
        let err = bytes_at(&data, 0).unwrap_err();
        assert!(matches!(
            err,
            AbiError::OutOfBounds { index: 1, actual: 96, .. } | AbiError::Overflow { .. }
        ));
        assert!(string_at(&data, 0).is_err());
    }

    #[test]
    fn offset_past_the_data_is_out_of_bounds() {
        let mut data = vec![0u8; 32];
        data[24..32].copy_from_slice(&(u64::MAX - 31).to_be_bytes());
        assert!(bytes_at(&data, 0).is_err());
    }
}
