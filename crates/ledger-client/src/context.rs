use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use ledger_crypto::PrivateKey;
use ledger_types::{AccountId, PublicKey, Timestamp, TransactionId};

use crate::config::ClientConfig;

/// Account that pays for and co-signs every transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorAccount {
    pub account_id: AccountId,
    pub private_key: PrivateKey,
}

impl OperatorAccount {
    pub fn new(account_id: AccountId, private_key: PrivateKey) -> Self {
        Self {
            account_id,
            private_key,
        }
    }

    pub fn public_key(&self) -> PublicKey {
        self.private_key.public_key()
    }
}

/// Issues transaction ids with strictly increasing valid-start times, even
/// when several callers ask within the same clock tick.
#[derive(Debug, Default)]
pub struct TransactionIdGenerator {
    last_nanos: AtomicU64,
}

impl TransactionIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self, payer: AccountId) -> TransactionId {
        let now = unix_nanos_now();
        let mut last = self.last_nanos.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(last.saturating_add(1));
            match self.last_nanos.compare_exchange_weak(
                last,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    return TransactionId::new(
                        payer,
                        Timestamp::from_unix_nanos(u128::from(candidate)),
                    )
                }
                Err(observed) => last = observed,
            }
        }
    }
}

fn unix_nanos_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Credentials and settings shared by every operation of one client.
#[derive(Debug)]
pub struct ClientContext {
    operator: OperatorAccount,
    config: ClientConfig,
    transaction_ids: TransactionIdGenerator,
}

impl ClientContext {
    pub fn new(operator: OperatorAccount, config: ClientConfig) -> Self {
        Self {
            operator,
            config,
            transaction_ids: TransactionIdGenerator::new(),
        }
    }

    pub fn operator(&self) -> &OperatorAccount {
        &self.operator
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn node_account_id(&self) -> AccountId {
        self.config.node_account_id
    }

    pub fn next_transaction_id(&self) -> TransactionId {
        self.transaction_ids.next(self.operator.account_id)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use ledger_types::AccountId;

    use super::TransactionIdGenerator;

    #[test]
    fn ids_strictly_increase() {
        let generator = TransactionIdGenerator::new();
        let payer = AccountId::from_num(2);
        let first = generator.next(payer);
        let second = generator.next(payer);
        assert!(second.valid_start > first.valid_start);
        assert_eq!(second.payer, payer);
    }

    #[test]
    fn ids_are_unique_across_threads() {
        let generator = Arc::new(TransactionIdGenerator::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let generator = generator.clone();
                std::thread::spawn(move || {
                    (0..250)
                        .map(|_| generator.next(AccountId::from_num(2)))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate transaction id {id}");
            }
        }
        assert_eq!(seen.len(), 2_000);
    }
}
