//! Integration tests for pipeline ordering, listeners, record strategies,
//! error context and concurrent use of one client.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ledger_client::requests::{
    AccountCreateRequest, ContractCallRequest, ContractCreateRequest, FileCreateRequest,
    FileDeleteRequest, TopicCreateRequest,
};
use ledger_client::{
    ClientConfig, Endpoint, ErrorKind, ListenerError, MockNetwork, NetworkError, OperatorAccount,
    ProtocolClient, RecordRequest, RecordStrategy, RecordStrategyError, TransactionListener,
};
use ledger_crypto::ContractParam;
use ledger_network_mock::DemoScenario;
use ledger_types::{
    FileId, Hbar, Status, TransactionId, TransactionKind, TransactionRecord, MAX_FILE_CHUNK_BYTES,
};
use tokio::sync::Notify;

fn client() -> (ProtocolClient<MockNetwork>, MockNetwork) {
    let scenario = DemoScenario::new();
    let network = MockNetwork::new(scenario.ledger);
    let client = ProtocolClient::new(
        network.clone(),
        OperatorAccount::new(scenario.operator_id, scenario.operator_key),
        ClientConfig::default(),
    );
    (client, network)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Submitted(TransactionKind, TransactionId),
    Handled(TransactionKind, TransactionId, Status),
}

#[derive(Default)]
struct Recording {
    events: Mutex<Vec<Event>>,
}

impl Recording {
    fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }
}

impl TransactionListener for Recording {
    fn transaction_submitted(
        &self,
        kind: TransactionKind,
        transaction_id: &TransactionId,
    ) -> Result<(), ListenerError> {
        self.events
            .lock()
            .unwrap()
            .push(Event::Submitted(kind, *transaction_id));
        Ok(())
    }

    fn transaction_handled(
        &self,
        kind: TransactionKind,
        transaction_id: &TransactionId,
        status: Status,
    ) -> Result<(), ListenerError> {
        self.events
            .lock()
            .unwrap()
            .push(Event::Handled(kind, *transaction_id, status));
        Ok(())
    }
}

struct Failing;

impl TransactionListener for Failing {
    fn transaction_submitted(
        &self,
        _kind: TransactionKind,
        _transaction_id: &TransactionId,
    ) -> Result<(), ListenerError> {
        Err(ListenerError::Message("listener refused".to_string()))
    }

    fn transaction_handled(
        &self,
        _kind: TransactionKind,
        _transaction_id: &TransactionId,
        _status: Status,
    ) -> Result<(), ListenerError> {
        panic!("listener blew up");
    }
}

/// Fetches directly and counts how often it was used.
#[derive(Default)]
struct Counting {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl RecordStrategy for Counting {
    async fn acquire(
        &self,
        request: RecordRequest<'_>,
    ) -> Result<TransactionRecord, RecordStrategyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(request.fetch().await?)
    }
}

/// Announces that it started, then waits for a signal before fetching.
struct Gated {
    entered: Arc<Notify>,
    gate: Arc<Notify>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl RecordStrategy for Gated {
    async fn acquire(
        &self,
        request: RecordRequest<'_>,
    ) -> Result<TransactionRecord, RecordStrategyError> {
        self.entered.notify_one();
        self.gate.notified().await;
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(request.fetch().await?)
    }
}

struct Unavailable;

#[async_trait]
impl RecordStrategy for Unavailable {
    async fn acquire(
        &self,
        _request: RecordRequest<'_>,
    ) -> Result<TransactionRecord, RecordStrategyError> {
        Err(RecordStrategyError::Message("mirror unavailable".to_string()))
    }
}

#[tokio::test]
async fn validation_failure_touches_nothing() {
    let (client, network) = client();
    let recording = Arc::new(Recording::default());
    let _registration = client.add_transaction_listener(recording.clone());

    let err = client
        .file_create(&FileCreateRequest::new(vec![0u8; MAX_FILE_CHUNK_BYTES + 1]))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err.receipt().is_none());
    assert_eq!(network.total_calls(), 0);
    assert!(recording.events().is_empty());
}

#[tokio::test]
async fn submitted_precedes_handled_with_true_kind() {
    let (client, _network) = client();
    let recording = Arc::new(Recording::default());
    let _registration = client.add_transaction_listener(recording.clone());

    let topic = client
        .topic_create(&TopicCreateRequest::new())
        .await
        .unwrap();

    assert_eq!(
        recording.events(),
        vec![
            Event::Submitted(TransactionKind::TopicCreate, topic.transaction_id),
            Event::Handled(TransactionKind::TopicCreate, topic.transaction_id, Status::Success),
        ]
    );
}

#[tokio::test]
async fn failed_status_notifies_submission_only() {
    let (client, _network) = client();
    let recording = Arc::new(Recording::default());
    let _registration = client.add_transaction_listener(recording.clone());

    let err = client
        .file_delete(&FileDeleteRequest::new(FileId::from_num(9999)))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Receipt);
    assert_eq!(err.receipt_status(), Some(Status::InvalidFileId));
    let id = err.transaction_id().unwrap();
    assert_eq!(
        recording.events(),
        vec![Event::Submitted(TransactionKind::FileDelete, id)]
    );
}

#[tokio::test]
async fn misbehaving_listener_is_skipped() {
    let (client, _network) = client();
    let _failing = client.add_transaction_listener(Arc::new(Failing));
    let recording = Arc::new(Recording::default());
    let _registration = client.add_transaction_listener(recording.clone());

    let result = client
        .file_create(&FileCreateRequest::new(b"data".to_vec()))
        .await
        .expect("listener failures must not fail the operation");

    assert_eq!(result.status, Status::Success);
    assert_eq!(recording.events().len(), 2);
}

#[tokio::test]
async fn unregistered_listener_stops_receiving() {
    let (client, _network) = client();
    let recording = Arc::new(Recording::default());
    let first = client.add_transaction_listener(recording.clone());
    let second = client.add_transaction_listener(recording.clone());
    assert_ne!(first.id(), second.id());

    client
        .file_create(&FileCreateRequest::new(b"one".to_vec()))
        .await
        .unwrap();
    assert_eq!(recording.events().len(), 4);

    assert!(first.unregister());
    client
        .file_create(&FileCreateRequest::new(b"two".to_vec()))
        .await
        .unwrap();
    assert_eq!(recording.events().len(), 6);

    assert!(second.unregister());
    client
        .file_create(&FileCreateRequest::new(b"three".to_vec()))
        .await
        .unwrap();
    assert_eq!(recording.events().len(), 6);
}

#[tokio::test]
async fn swapped_strategy_serves_next_record_call() {
    let (client, network) = client();
    let calls = Arc::new(AtomicUsize::new(0));
    client.set_record_strategy(Counting {
        calls: calls.clone(),
    });

    client
        .account_create(&AccountCreateRequest::new(Hbar::new(1)))
        .await
        .unwrap();
    client
        .file_create(&FileCreateRequest::new(b"receipt only".to_vec()))
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(network.calls(Endpoint::Record), 1);
}

#[tokio::test]
async fn in_flight_call_keeps_its_strategy() {
    let (client, _network) = client();
    let entered = Arc::new(Notify::new());
    let gate = Arc::new(Notify::new());
    let gated_calls = Arc::new(AtomicUsize::new(0));
    let counting_calls = Arc::new(AtomicUsize::new(0));
    client.set_record_strategy(Gated {
        entered: entered.clone(),
        gate: gate.clone(),
        calls: gated_calls.clone(),
    });

    let request = AccountCreateRequest::new(Hbar::new(1));
    let in_flight = client.account_create(&request);
    let swap = async {
        entered.notified().await;
        client.set_record_strategy(Counting {
            calls: counting_calls.clone(),
        });
        gate.notify_one();
    };
    let (result, ()) = tokio::join!(in_flight, swap);
    result.expect("gated account create");
    assert_eq!(gated_calls.load(Ordering::SeqCst), 1);
    assert_eq!(counting_calls.load(Ordering::SeqCst), 0);

    client.account_create(&request).await.unwrap();
    assert_eq!(gated_calls.load(Ordering::SeqCst), 1);
    assert_eq!(counting_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn record_failure_keeps_receipt_and_cause() {
    let (client, _network) = client();
    let recording = Arc::new(Recording::default());
    let _registration = client.add_transaction_listener(recording.clone());
    client.set_record_strategy(Unavailable);

    let err = client
        .account_create(&AccountCreateRequest::new(Hbar::new(1)))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Record);
    assert_eq!(err.transaction_kind(), Some(TransactionKind::AccountCreate));
    assert_eq!(err.receipt_status(), Some(Status::Success));
    assert!(err.receipt().unwrap().account_id.is_some());
    assert!(matches!(
        err.source_as::<RecordStrategyError>(),
        Some(RecordStrategyError::Message(_))
    ));
    // The receipt succeeded, so both notifications were already delivered.
    assert_eq!(recording.events().len(), 2);
}

#[tokio::test]
async fn contract_call_record_fetch_failure_keeps_receipt() {
    let (client, network) = client();
    let file = client
        .file_create(&FileCreateRequest::new(b"6080".to_vec()))
        .await
        .unwrap();
    let contract = client
        .contract_create(&ContractCreateRequest::new(file.file_id))
        .await
        .unwrap();
    network.fail(
        Endpoint::Record,
        NetworkError::Unavailable("mirror lagging".to_string()),
    );

    let err = client
        .contract_call(
            &ContractCallRequest::new(contract.contract_id, "ping")
                .with_params(vec![ContractParam::Uint64(1)]),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Record);
    assert_eq!(err.transaction_kind(), Some(TransactionKind::ContractCall));
    assert!(err.transaction_id().is_some());
    assert_eq!(err.receipt_status(), Some(Status::Success));
    assert_eq!(
        err.receipt().unwrap().contract_id,
        Some(contract.contract_id)
    );
    assert_eq!(network.calls(Endpoint::Record), 1);
}

#[tokio::test]
async fn submission_failure_is_tagged_and_not_notified() {
    let (client, network) = client();
    let recording = Arc::new(Recording::default());
    let _registration = client.add_transaction_listener(recording.clone());
    network.fail(
        Endpoint::Submit,
        NetworkError::Unavailable("node down".to_string()),
    );

    let err = client
        .file_create(&FileCreateRequest::new(b"data".to_vec()))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Submission);
    assert_eq!(err.transaction_kind(), Some(TransactionKind::FileCreate));
    assert!(err.transaction_id().is_some());
    assert!(err.source_as::<NetworkError>().is_some());
    assert_eq!(network.calls(Endpoint::Receipt), 0);
    assert!(recording.events().is_empty());
}

#[tokio::test]
async fn receipt_timeout_after_submission() {
    let (client, network) = client();
    let recording = Arc::new(Recording::default());
    let _registration = client.add_transaction_listener(recording.clone());
    network.fail(Endpoint::Receipt, NetworkError::Timeout);

    let err = client
        .file_create(&FileCreateRequest::new(b"data".to_vec()))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Receipt);
    assert!(err.receipt().is_none());
    assert_eq!(
        err.source_as::<NetworkError>(),
        Some(&NetworkError::Timeout)
    );
    let events = recording.events();
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], Event::Submitted(TransactionKind::FileCreate, _)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_callers_share_one_client() {
    let (client, network) = client();
    let client = Arc::new(client);
    let recording = Arc::new(Recording::default());
    let _registration = client.add_transaction_listener(recording.clone());

    let tasks: Vec<_> = (0..16u8)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move {
                client
                    .file_create(&FileCreateRequest::new(vec![i; 16]))
                    .await
            })
        })
        .collect();
    let results = futures::future::join_all(tasks).await;

    let mut ids = HashSet::new();
    let mut files = HashSet::new();
    for result in results {
        let created = result.expect("task panicked").expect("file create");
        assert!(ids.insert(created.transaction_id));
        assert!(files.insert(created.file_id));
    }
    assert_eq!(ids.len(), 16);
    assert_eq!(network.calls(Endpoint::Submit), 16);
    assert_eq!(recording.events().len(), 32);
}
