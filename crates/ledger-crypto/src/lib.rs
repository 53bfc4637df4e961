//! Crypto for the ledger client: ed25519 keys, canonical body hashing and
//! contract ABI encoding.

pub mod abi;
pub mod ed25519;
pub mod hashing;

pub use abi::{encode_function_call, encode_parameters, ContractParam};
pub use ed25519::{verify_signature, PrivateKey};
pub use hashing::{compute_transaction_hash, encode_transaction_body};
