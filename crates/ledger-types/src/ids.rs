use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

macro_rules! impl_fixed_bytes_id {
    ($name:ident, $len:expr) => {
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name([u8; $len]);

        impl $name {
            pub const LEN: usize = $len;

            pub const fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            pub fn from_slice(bytes: &[u8]) -> Result<Self, ValidationError> {
                if bytes.len() != Self::LEN {
                    return Err(ValidationError::InvalidLength {
                        kind: stringify!($name),
                        expected: Self::LEN,
                        actual: bytes.len(),
                    });
                }
                let mut out = [0u8; Self::LEN];
                out.copy_from_slice(bytes);
                Ok(Self(out))
            }

            pub const fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(value: [u8; $len]) -> Self {
                Self::new(value)
            }
        }

        impl TryFrom<&[u8]> for $name {
            type Error = ValidationError;

            fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
                Self::from_slice(value)
            }
        }
    };
}

impl_fixed_bytes_id!(PublicKey, 32);
impl_fixed_bytes_id!(TransactionHash, 32);

/// Entity identifiers share the `shard.realm.num` layout.
macro_rules! impl_entity_id {
    ($name:ident) => {
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name {
            pub shard: u64,
            pub realm: u64,
            pub num: u64,
        }

        impl $name {
            pub const fn new(shard: u64, realm: u64, num: u64) -> Self {
                Self { shard, realm, num }
            }

            pub const fn from_num(num: u64) -> Self {
                Self::new(0, 0, num)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let (shard, realm, num) = parse_entity_triple(stringify!($name), s)?;
                Ok(Self::new(shard, realm, num))
            }
        }
    };
}

impl_entity_id!(AccountId);
impl_entity_id!(FileId);
impl_entity_id!(ContractId);
impl_entity_id!(TokenId);
impl_entity_id!(TopicId);

fn parse_entity_triple(kind: &'static str, s: &str) -> Result<(u64, u64, u64), ValidationError> {
    let mut parts = s.trim().split('.');
    let mut next = || -> Result<u64, ValidationError> {
        parts
            .next()
            .and_then(|part| part.parse::<u64>().ok())
            .ok_or_else(|| ValidationError::Message(format!("invalid {kind} `{s}`")))
    };
    let triple = (next()?, next()?, next()?);
    if parts.next().is_some() {
        return Err(ValidationError::Message(format!("invalid {kind} `{s}`")));
    }
    Ok(triple)
}

/// Consensus-style timestamp: seconds and nanoseconds since the Unix epoch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp {
    pub seconds: u64,
    pub nanos: u32,
}

impl Timestamp {
    pub const fn new(seconds: u64, nanos: u32) -> Self {
        Self { seconds, nanos }
    }

    pub const fn from_unix_nanos(nanos: u128) -> Self {
        Self {
            seconds: (nanos / 1_000_000_000) as u64,
            nanos: (nanos % 1_000_000_000) as u32,
        }
    }

    pub const fn as_unix_nanos(&self) -> u128 {
        self.seconds as u128 * 1_000_000_000 + self.nanos as u128
    }

    pub const fn plus_seconds(&self, seconds: u64) -> Self {
        Self::new(self.seconds.saturating_add(seconds), self.nanos)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.seconds, self.nanos)
    }
}

/// Identifies one transaction: the paying account and its valid-start time.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransactionId {
    pub payer: AccountId,
    pub valid_start: Timestamp,
}

impl TransactionId {
    pub const fn new(payer: AccountId, valid_start: Timestamp) -> Self {
        Self { payer, valid_start }
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.payer, self.valid_start)
    }
}

impl fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionId({self})")
    }
}

impl FromStr for TransactionId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::Message(format!("invalid TransactionId `{s}`"));
        let (payer, valid_start) = s.split_once('@').ok_or_else(invalid)?;
        let (seconds, nanos) = valid_start.split_once('.').ok_or_else(invalid)?;
        Ok(Self {
            payer: payer.parse()?,
            valid_start: Timestamp::new(
                seconds.parse().map_err(|_| invalid())?,
                nanos.parse().map_err(|_| invalid())?,
            ),
        })
    }
}

/// Non-fungible token instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NftId {
    pub token_id: TokenId,
    pub serial: u64,
}

impl NftId {
    pub const fn new(token_id: TokenId, serial: u64) -> Self {
        Self { token_id, serial }
    }
}

impl fmt::Display for NftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.token_id, self.serial)
    }
}

/// Native currency amount, stored in tinybars.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hbar(i64);

impl Hbar {
    pub const TINYBARS_PER_HBAR: i64 = 100_000_000;
    pub const ZERO: Hbar = Hbar(0);

    pub const fn from_tinybars(tinybars: i64) -> Self {
        Self(tinybars)
    }

    pub const fn new(hbars: i64) -> Self {
        Self(hbars.saturating_mul(Self::TINYBARS_PER_HBAR))
    }

    pub const fn to_tinybars(&self) -> i64 {
        self.0
    }

    pub const fn checked_add(self, other: Hbar) -> Option<Hbar> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Hbar(v)),
            None => None,
        }
    }

    pub const fn checked_sub(self, other: Hbar) -> Option<Hbar> {
        match self.0.checked_sub(other.0) {
            Some(v) => Some(Hbar(v)),
            None => None,
        }
    }
}

impl fmt::Display for Hbar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % Self::TINYBARS_PER_HBAR == 0 {
            write!(f, "{} ℏ", self.0 / Self::TINYBARS_PER_HBAR)
        } else {
            write!(f, "{} tℏ", self.0)
        }
    }
}
