//! In-memory ledger for exercising the client without a real network.

pub mod mock_ledger;
pub mod scenarios;

pub use mock_ledger::{
    fee_for, MockAccount, MockContract, MockFile, MockLedger, MockLedgerError, MockToken,
    MockTopic,
};
pub use scenarios::{
    DemoScenario, DEMO_NODE_ACCOUNT_ID, DEMO_OPERATOR_BALANCE, DEMO_OPERATOR_ID,
    DEMO_OPERATOR_SEED,
};
