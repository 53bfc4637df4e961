use ledger_types::{
    AccountId, BurnSupply, FrozenBody, MintSupply, PublicKey, SignaturePair, Timestamp,
    Transaction, TransactionBody, TransactionHash, TransactionId,
};
use sha2::{Digest, Sha256};

const BODY_TAG: &[u8] = b"ledger.tx.body.v1";
const TX_HASH_TAG: &[u8] = b"ledger.tx.hash.v1";

/// Canonical encoding rules used by every function in this module:
/// 1. Big-endian fixed-width integers: u32/u64/i64.
/// 2. Variable-length bytes and strings are length-prefixed with u32.
/// 3. Optional fields are encoded with a one-byte presence tag (0 or 1).
/// 4. The body starts with a one-byte transaction kind tag.
/// 5. Hashes are SHA-256 over tagged canonical payloads; signature entries
///    are sorted by public key before hashing.
pub fn encode_transaction_body(
    transaction: &Transaction,
    transaction_id: &TransactionId,
    node_account_id: &AccountId,
) -> Vec<u8> {
    let mut enc = Vec::new();
    enc.extend_from_slice(BODY_TAG);
    put_transaction_id(&mut enc, transaction_id);
    put_entity(&mut enc, node_account_id.shard, node_account_id.realm, node_account_id.num);
    put_i64(&mut enc, transaction.max_transaction_fee().to_tinybars());
    put_u64(&mut enc, transaction.valid_duration().as_secs());
    put_string(&mut enc, transaction.memo());
    put_u8(&mut enc, transaction.kind().tag());
    put_body(&mut enc, transaction.body());
    enc
}

/// Hash identifying a signed transaction, independent of signature order.
pub fn compute_transaction_hash(frozen: &FrozenBody, signatures: &[SignaturePair]) -> TransactionHash {
    let mut sorted: Vec<&SignaturePair> = signatures.iter().collect();
    sorted.sort_by_key(|pair| pair.public_key);

    let mut enc = Vec::new();
    enc.extend_from_slice(TX_HASH_TAG);
    put_bytes(&mut enc, &frozen.body_bytes);
    put_u32(&mut enc, sorted.len() as u32);
    for pair in sorted {
        enc.extend_from_slice(pair.public_key.as_bytes());
        put_bytes(&mut enc, &pair.signature);
    }
    TransactionHash::new(sha256_32(&enc))
}

fn put_body(out: &mut Vec<u8>, body: &TransactionBody) {
    match body {
        TransactionBody::AccountCreate {
            key,
            initial_balance,
        } => {
            put_key(out, key);
            put_i64(out, initial_balance.to_tinybars());
        }
        TransactionBody::AccountDelete {
            account_id,
            transfer_account_id,
        } => {
            put_entity(out, account_id.shard, account_id.realm, account_id.num);
            put_entity(
                out,
                transfer_account_id.shard,
                transfer_account_id.realm,
                transfer_account_id.num,
            );
        }
        TransactionBody::FileCreate {
            keys,
            contents,
            memo,
            expiration_time,
        } => {
            put_u32(out, keys.len() as u32);
            for key in keys {
                put_key(out, key);
            }
            put_bytes(out, contents);
            put_string(out, memo);
            put_option(out, expiration_time.as_ref(), put_timestamp);
        }
        TransactionBody::FileUpdate {
            file_id,
            contents,
            memo,
            expiration_time,
        } => {
            put_entity(out, file_id.shard, file_id.realm, file_id.num);
            put_option(out, contents.as_deref(), put_bytes);
            put_option(out, memo.as_deref(), put_string);
            put_option(out, expiration_time.as_ref(), put_timestamp);
        }
        TransactionBody::FileAppend { file_id, contents } => {
            put_entity(out, file_id.shard, file_id.realm, file_id.num);
            put_bytes(out, contents);
        }
        TransactionBody::FileDelete { file_id } => {
            put_entity(out, file_id.shard, file_id.realm, file_id.num);
        }
        TransactionBody::ContractCreate {
            bytecode_file_id,
            gas,
            constructor_parameters,
        } => {
            put_entity(
                out,
                bytecode_file_id.shard,
                bytecode_file_id.realm,
                bytecode_file_id.num,
            );
            put_u64(out, *gas);
            put_bytes(out, constructor_parameters);
        }
        TransactionBody::ContractDelete {
            contract_id,
            transfer_account_id,
            transfer_contract_id,
        } => {
            put_entity(out, contract_id.shard, contract_id.realm, contract_id.num);
            put_option(out, transfer_account_id.as_ref(), |out, id: &AccountId| {
                put_entity(out, id.shard, id.realm, id.num)
            });
            put_option(out, transfer_contract_id.as_ref(), |out, id| {
                put_entity(out, id.shard, id.realm, id.num)
            });
        }
        TransactionBody::ContractCall {
            contract_id,
            gas,
            function_parameters,
        } => {
            put_entity(out, contract_id.shard, contract_id.realm, contract_id.num);
            put_u64(out, *gas);
            put_bytes(out, function_parameters);
        }
        TransactionBody::TopicCreate {
            admin_key,
            submit_key,
            memo,
        } => {
            put_option(out, admin_key.as_ref(), put_key);
            put_option(out, submit_key.as_ref(), put_key);
            put_option(out, memo.as_deref(), put_string);
        }
        TransactionBody::TopicUpdate {
            topic_id,
            admin_key,
            submit_key,
            memo,
        } => {
            put_entity(out, topic_id.shard, topic_id.realm, topic_id.num);
            put_option(out, admin_key.as_ref(), put_key);
            put_option(out, submit_key.as_ref(), put_key);
            put_option(out, memo.as_deref(), put_string);
        }
        TransactionBody::TopicDelete { topic_id } => {
            put_entity(out, topic_id.shard, topic_id.realm, topic_id.num);
        }
        TransactionBody::TopicMessageSubmit { topic_id, message } => {
            put_entity(out, topic_id.shard, topic_id.realm, topic_id.num);
            put_bytes(out, message);
        }
        TransactionBody::TokenCreate {
            name,
            symbol,
            treasury_account_id,
            token_type,
            supply_key,
        } => {
            put_string(out, name);
            put_string(out, symbol);
            put_entity(
                out,
                treasury_account_id.shard,
                treasury_account_id.realm,
                treasury_account_id.num,
            );
            put_u8(out, *token_type as u8);
            put_key(out, supply_key);
        }
        TransactionBody::TokenAssociate {
            account_id,
            token_ids,
        }
        | TransactionBody::TokenDissociate {
            account_id,
            token_ids,
        } => {
            put_entity(out, account_id.shard, account_id.realm, account_id.num);
            put_u32(out, token_ids.len() as u32);
            for token_id in token_ids {
                put_entity(out, token_id.shard, token_id.realm, token_id.num);
            }
        }
        TransactionBody::TokenMint { token_id, supply } => {
            put_entity(out, token_id.shard, token_id.realm, token_id.num);
            match supply {
                MintSupply::Amount(amount) => {
                    put_u8(out, 0);
                    put_u64(out, *amount);
                }
                MintSupply::Metadata(metadata) => {
                    put_u8(out, 1);
                    put_u32(out, metadata.len() as u32);
                    for entry in metadata {
                        put_bytes(out, entry);
                    }
                }
            }
        }
        TransactionBody::TokenBurn { token_id, supply } => {
            put_entity(out, token_id.shard, token_id.realm, token_id.num);
            match supply {
                BurnSupply::Amount(amount) => {
                    put_u8(out, 0);
                    put_u64(out, *amount);
                }
                BurnSupply::Serials(serials) => {
                    put_u8(out, 1);
                    put_u32(out, serials.len() as u32);
                    for serial in serials {
                        put_u64(out, *serial);
                    }
                }
            }
        }
        TransactionBody::TokenTransfer {
            token_transfers,
            nft_transfers,
        } => {
            put_u32(out, token_transfers.len() as u32);
            for transfer in token_transfers {
                let (token, account) = (transfer.token_id, transfer.account_id);
                put_entity(out, token.shard, token.realm, token.num);
                put_entity(out, account.shard, account.realm, account.num);
                put_i64(out, transfer.amount);
            }
            put_u32(out, nft_transfers.len() as u32);
            for transfer in nft_transfers {
                let token = transfer.nft_id.token_id;
                put_entity(out, token.shard, token.realm, token.num);
                put_u64(out, transfer.nft_id.serial);
                put_entity(
                    out,
                    transfer.sender.shard,
                    transfer.sender.realm,
                    transfer.sender.num,
                );
                put_entity(
                    out,
                    transfer.receiver.shard,
                    transfer.receiver.realm,
                    transfer.receiver.num,
                );
            }
        }
    }
}

fn sha256_32(input: &[u8]) -> [u8; 32] {
    let digest: [u8; 32] = Sha256::digest(input).into();
    digest
}

fn put_u8(out: &mut Vec<u8>, value: u8) {
    out.push(value);
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn put_u64(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn put_i64(out: &mut Vec<u8>, value: i64) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn put_bytes(out: &mut Vec<u8>, value: &[u8]) {
    put_u32(out, value.len() as u32);
    out.extend_from_slice(value);
}

fn put_string(out: &mut Vec<u8>, value: &str) {
    put_bytes(out, value.as_bytes());
}

fn put_key(out: &mut Vec<u8>, key: &PublicKey) {
    out.extend_from_slice(key.as_bytes());
}

fn put_entity(out: &mut Vec<u8>, shard: u64, realm: u64, num: u64) {
    put_u64(out, shard);
    put_u64(out, realm);
    put_u64(out, num);
}

fn put_timestamp(out: &mut Vec<u8>, ts: &Timestamp) {
    put_u64(out, ts.seconds);
    put_u32(out, ts.nanos);
}

fn put_transaction_id(out: &mut Vec<u8>, id: &TransactionId) {
    put_entity(out, id.payer.shard, id.payer.realm, id.payer.num);
    put_timestamp(out, &id.valid_start);
}

fn put_option<T: ?Sized>(out: &mut Vec<u8>, value: Option<&T>, put: impl Fn(&mut Vec<u8>, &T)) {
    match value {
        Some(value) => {
            put_u8(out, 1);
            put(out, value);
        }
        None => put_u8(out, 0),
    }
}

#[cfg(test)]
mod tests {
    use ledger_types::{
        AccountId, FileId, FrozenBody, Hbar, SignaturePair, Timestamp, Transaction,
        TransactionBody, TransactionId,
    };

    use super::{compute_transaction_hash, encode_transaction_body};
    use crate::PrivateKey;

    fn file_create() -> Transaction {
        Transaction::new(TransactionBody::FileCreate {
            keys: vec![PrivateKey::from_bytes([1; 32]).public_key()],
            contents: b"hello".to_vec(),
            memo: "memo".to_string(),
            expiration_time: None,
        })
    }

    fn ids() -> (TransactionId, AccountId) {
        (
            TransactionId::new(AccountId::from_num(2), Timestamp::new(1_700_000_000, 7)),
            AccountId::from_num(3),
        )
    }

    #[test]
    fn body_encoding_is_deterministic_and_field_sensitive() {
        let (tx_id, node) = ids();
        let a = encode_transaction_body(&file_create(), &tx_id, &node);
        let b = encode_transaction_body(&file_create(), &tx_id, &node);
        assert_eq!(a, b);

        let higher_fee = file_create().with_max_transaction_fee(Hbar::new(21));
        assert_ne!(a, encode_transaction_body(&higher_fee, &tx_id, &node));

        let other_node = AccountId::from_num(4);
        assert_ne!(a, encode_transaction_body(&file_create(), &tx_id, &other_node));
    }

    #[test]
    fn body_encoding_distinguishes_kinds_with_same_fields() {
        let (tx_id, node) = ids();
        let delete = Transaction::new(TransactionBody::FileDelete {
            file_id: FileId::from_num(9),
        });
        let append = Transaction::new(TransactionBody::FileAppend {
            file_id: FileId::from_num(9),
            contents: Vec::new(),
        });
        assert_ne!(
            encode_transaction_body(&delete, &tx_id, &node),
            encode_transaction_body(&append, &tx_id, &node)
        );
    }

    #[test]
    fn transaction_hash_ignores_signature_order() {
        let (tx_id, node) = ids();
        let frozen = FrozenBody {
            transaction_id: tx_id,
            node_account_id: node,
            body_bytes: encode_transaction_body(&file_create(), &tx_id, &node),
        };
        let a: SignaturePair = PrivateKey::from_bytes([5; 32]).sign(&frozen.body_bytes);
        let b: SignaturePair = PrivateKey::from_bytes([6; 32]).sign(&frozen.body_bytes);
        assert_eq!(
            compute_transaction_hash(&frozen, &[a.clone(), b.clone()]),
            compute_transaction_hash(&frozen, &[b, a.clone()])
        );
        assert_ne!(
            compute_transaction_hash(&frozen, &[a]),
            compute_transaction_hash(&frozen, &[])
        );
    }
}
