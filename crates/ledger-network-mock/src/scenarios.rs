use ledger_crypto::PrivateKey;
use ledger_types::{AccountId, Hbar};

use crate::mock_ledger::MockLedger;

pub const DEMO_OPERATOR_ID: AccountId = AccountId::from_num(2);
pub const DEMO_NODE_ACCOUNT_ID: AccountId = AccountId::from_num(3);
pub const DEMO_OPERATOR_SEED: [u8; 32] = [0x02; 32];

/// Operator funding used when no explicit balance is given.
pub const DEMO_OPERATOR_BALANCE: Hbar = Hbar::new(10_000);

#[derive(Debug, Clone)]
pub struct DemoScenario {
    pub operator_id: AccountId,
    pub operator_key: PrivateKey,
    pub node_account_id: AccountId,
    pub ledger: MockLedger,
}

impl DemoScenario {
    pub fn new() -> Self {
        Self::with_operator(
            DEMO_OPERATOR_ID,
            PrivateKey::from_bytes(DEMO_OPERATOR_SEED),
            DEMO_OPERATOR_BALANCE,
        )
    }

    pub fn with_operator(operator_id: AccountId, operator_key: PrivateKey, balance: Hbar) -> Self {
        let mut ledger = MockLedger::new();
        ledger.add_account(operator_id, operator_key.public_key(), balance);
        Self {
            operator_id,
            operator_key,
            node_account_id: DEMO_NODE_ACCOUNT_ID,
            ledger,
        }
    }
}

impl Default for DemoScenario {
    fn default() -> Self {
        Self::new()
    }
}
