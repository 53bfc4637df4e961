use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use ledger_network_mock::{MockLedger, MockLedgerError};
use ledger_types::{
    Query, QueryResponse, Status, Transaction, TransactionId, TransactionReceipt,
    TransactionRecord, TransactionResponse,
};
use thiserror::Error;

/// Error model for network operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("request timed out")]
    Timeout,
    #[error("node unavailable: {0}")]
    Unavailable(String),
    #[error("request rejected: status={status}, message={message}")]
    Rejected { status: Status, message: String },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal network error: {0}")]
    Internal(String),
}

impl From<MockLedgerError> for NetworkError {
    fn from(err: MockLedgerError) -> Self {
        match err {
            MockLedgerError::Precheck { status, message } => Self::Rejected { status, message },
            not_found @ MockLedgerError::NotFound { .. } => Self::NotFound(not_found.to_string()),
        }
    }
}

/// Ledger network interface. Implementations may use the in-memory mock or a real node client.
#[async_trait]
pub trait LedgerNetwork: Send + Sync {
    async fn submit(&self, transaction: &Transaction) -> Result<TransactionResponse, NetworkError>;

    async fn fetch_receipt(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<TransactionReceipt, NetworkError>;

    async fn fetch_record(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<TransactionRecord, NetworkError>;

    async fn execute_query(&self, query: &Query) -> Result<QueryResponse, NetworkError>;
}

#[async_trait]
impl<N: LedgerNetwork + ?Sized> LedgerNetwork for Arc<N> {
    async fn submit(&self, transaction: &Transaction) -> Result<TransactionResponse, NetworkError> {
        (**self).submit(transaction).await
    }

    async fn fetch_receipt(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<TransactionReceipt, NetworkError> {
        (**self).fetch_receipt(transaction_id).await
    }

    async fn fetch_record(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<TransactionRecord, NetworkError> {
        (**self).fetch_record(transaction_id).await
    }

    async fn execute_query(&self, query: &Query) -> Result<QueryResponse, NetworkError> {
        (**self).execute_query(query).await
    }
}

/// Endpoints of the network seam, used for call counting and fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Submit,
    Receipt,
    Record,
    Query,
}

#[derive(Debug, Default)]
struct CallCounters {
    submit: AtomicUsize,
    receipt: AtomicUsize,
    record: AtomicUsize,
    query: AtomicUsize,
}

impl CallCounters {
    fn counter(&self, endpoint: Endpoint) -> &AtomicUsize {
        match endpoint {
            Endpoint::Submit => &self.submit,
            Endpoint::Receipt => &self.receipt,
            Endpoint::Record => &self.record,
            Endpoint::Query => &self.query,
        }
    }
}

#[derive(Debug, Default)]
struct Faults {
    submit: Option<NetworkError>,
    receipt: Option<NetworkError>,
    record: Option<NetworkError>,
    query: Option<NetworkError>,
}

impl Faults {
    fn slot(&mut self, endpoint: Endpoint) -> &mut Option<NetworkError> {
        match endpoint {
            Endpoint::Submit => &mut self.submit,
            Endpoint::Receipt => &mut self.receipt,
            Endpoint::Record => &mut self.record,
            Endpoint::Query => &mut self.query,
        }
    }
}

/// In-memory network backed by `MockLedger`, with per-endpoint call
/// counters and injectable failures for tests.
#[derive(Clone)]
pub struct MockNetwork {
    ledger: Arc<Mutex<MockLedger>>,
    calls: Arc<CallCounters>,
    faults: Arc<Mutex<Faults>>,
}

impl MockNetwork {
    pub fn new(ledger: MockLedger) -> Self {
        Self {
            ledger: Arc::new(Mutex::new(ledger)),
            calls: Arc::new(CallCounters::default()),
            faults: Arc::new(Mutex::new(Faults::default())),
        }
    }

    /// Makes every subsequent call to `endpoint` fail with `error` until cleared.
    pub fn fail(&self, endpoint: Endpoint, error: NetworkError) {
        *self.faults().slot(endpoint) = Some(error);
    }

    pub fn clear_fault(&self, endpoint: Endpoint) {
        *self.faults().slot(endpoint) = None;
    }

    pub fn calls(&self, endpoint: Endpoint) -> usize {
        self.calls.counter(endpoint).load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        [
            Endpoint::Submit,
            Endpoint::Receipt,
            Endpoint::Record,
            Endpoint::Query,
        ]
        .into_iter()
        .map(|endpoint| self.calls(endpoint))
        .sum()
    }

    /// Runs `f` against the ledger, e.g. to seed accounts or inspect state.
    pub fn with_ledger<R>(&self, f: impl FnOnce(&mut MockLedger) -> R) -> Result<R, NetworkError> {
        let mut lock = self
            .ledger
            .lock()
            .map_err(|_| NetworkError::Unavailable("mutex poisoned".to_string()))?;
        Ok(f(&mut lock))
    }

    // Fault slots hold plain values, so a poisoned guard is still usable.
    fn faults(&self) -> MutexGuard<'_, Faults> {
        self.faults.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn call<R>(
        &self,
        endpoint: Endpoint,
        f: impl FnOnce(&mut MockLedger) -> Result<R, MockLedgerError>,
    ) -> Result<R, NetworkError> {
        self.calls.counter(endpoint).fetch_add(1, Ordering::SeqCst);
        let injected = self.faults().slot(endpoint).clone();
        if let Some(error) = injected {
            return Err(error);
        }
        self.with_ledger(f)?.map_err(NetworkError::from)
    }
}

#[async_trait]
impl LedgerNetwork for MockNetwork {
    async fn submit(&self, transaction: &Transaction) -> Result<TransactionResponse, NetworkError> {
        self.call(Endpoint::Submit, |ledger| ledger.submit(transaction))
    }

    async fn fetch_receipt(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<TransactionReceipt, NetworkError> {
        self.call(Endpoint::Receipt, |ledger| ledger.receipt(transaction_id))
    }

    async fn fetch_record(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<TransactionRecord, NetworkError> {
        self.call(Endpoint::Record, |ledger| ledger.record(transaction_id))
    }

    async fn execute_query(&self, query: &Query) -> Result<QueryResponse, NetworkError> {
        self.call(Endpoint::Query, |ledger| ledger.query(query))
    }
}

#[cfg(test)]
mod tests {
    use ledger_network_mock::DemoScenario;
    use ledger_types::{AccountId, Hbar, Query, QueryKind, QueryResponse, Status};

    use super::{Endpoint, LedgerNetwork, MockNetwork, NetworkError};

    fn balance_query(account_id: AccountId) -> Query {
        Query {
            kind: QueryKind::AccountBalance { account_id },
            query_payment: Hbar::ZERO,
            max_query_payment: Hbar::new(1),
        }
    }

    #[tokio::test]
    async fn query_reaches_ledger_and_is_counted() {
        let scenario = DemoScenario::new();
        let network = MockNetwork::new(scenario.ledger);
        let response = network
            .execute_query(&balance_query(scenario.operator_id))
            .await
            .expect("must succeed");
        assert!(matches!(response, QueryResponse::AccountBalance { .. }));
        assert_eq!(network.calls(Endpoint::Query), 1);
        assert_eq!(network.total_calls(), 1);
    }

    #[tokio::test]
    async fn precheck_rejection_maps_to_rejected() {
        let network = MockNetwork::new(DemoScenario::new().ledger);
        let err = network
            .execute_query(&balance_query(AccountId::from_num(999)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            NetworkError::Rejected {
                status: Status::InvalidAccountId,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn injected_fault_applies_until_cleared() {
        let scenario = DemoScenario::new();
        let network = MockNetwork::new(scenario.ledger);
        network.fail(Endpoint::Query, NetworkError::Timeout);
        assert_eq!(
            network
                .execute_query(&balance_query(scenario.operator_id))
                .await
                .unwrap_err(),
            NetworkError::Timeout
        );
        network.clear_fault(Endpoint::Query);
        assert!(network
            .execute_query(&balance_query(scenario.operator_id))
            .await
            .is_ok());
        assert_eq!(network.calls(Endpoint::Query), 2);
    }

    #[tokio::test]
    async fn fault_injection_survives_poisoned_lock() {
        let scenario = DemoScenario::new();
        let network = MockNetwork::new(scenario.ledger);
        let poisoner = network.clone();
        let joined = std::thread::spawn(move || {
            let _guard = poisoner.faults.lock().unwrap();
            panic!("poison the fault table");
        })
        .join();
        assert!(joined.is_err());
        assert!(network.faults.is_poisoned());

        network.fail(Endpoint::Query, NetworkError::Timeout);
        assert_eq!(
            network
                .execute_query(&balance_query(scenario.operator_id))
                .await
                .unwrap_err(),
            NetworkError::Timeout
        );
        network.clear_fault(Endpoint::Query);
        assert!(network
            .execute_query(&balance_query(scenario.operator_id))
            .await
            .is_ok());
    }
}
