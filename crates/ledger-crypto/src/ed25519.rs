use std::fmt;

use ed25519_dalek::{Signature, Signer as DalekSigner, SigningKey, Verifier as DalekVerifier, VerifyingKey};
use ledger_types::{CryptoError, PublicKey, SignaturePair};
use rand::rngs::OsRng;

/// ed25519 private key used to authorize transactions.
#[derive(Clone)]
pub struct PrivateKey {
    signing_key: SigningKey,
}

impl PrivateKey {
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    pub fn from_bytes(seed: [u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    pub fn from_hex(value: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(value.trim_start_matches("0x"))
            .map_err(|err| CryptoError::Message(format!("invalid hex: {err}")))?;
        let seed: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::InvalidLength {
                kind: "private key",
                expected: 32,
                actual: bytes.len(),
            })?;
        Ok(Self::from_bytes(seed))
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::new(self.signing_key.verifying_key().to_bytes())
    }

    pub fn sign(&self, message: &[u8]) -> SignaturePair {
        SignaturePair {
            public_key: self.public_key(),
            signature: self.signing_key.sign(message).to_bytes().to_vec(),
        }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey(public={})", self.public_key())
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.public_key() == other.public_key()
    }
}

impl Eq for PrivateKey {}

pub fn verify_signature(
    public_key: &PublicKey,
    message: &[u8],
    signature: &[u8],
) -> Result<(), CryptoError> {
    let verify_key = VerifyingKey::from_bytes(public_key.as_bytes())
        .map_err(|err| CryptoError::InvalidPublicKey(err.to_string()))?;
    let signature: [u8; 64] = signature
        .try_into()
        .map_err(|_| CryptoError::InvalidLength {
            kind: "signature",
            expected: 64,
            actual: signature.len(),
        })?;
    verify_key
        .verify(message, &Signature::from_bytes(&signature))
        .map_err(|_| CryptoError::InvalidSignature)
}
