use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;

use mqttconnect::mqtt::{
    AttemptController, BrokerConnector, ConnectParams, ConnectionController, ConnectionSettings,
    Credentials, TransportError, INVALID_ADDRESS_MESSAGE,
};

/// Connector that blocks until the test hands out a permit, then succeeds.
struct GatedConnector {
    calls: AtomicUsize,
    gate: Semaphore,
    seen: Mutex<Vec<ConnectParams>>,
}

impl GatedConnector {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            gate: Semaphore::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn release(&self) {
        self.gate.add_permits(1);
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrokerConnector for GatedConnector {
    async fn connect(&self, params: ConnectParams) -> Result<(), TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(params);
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| TransportError::Other(e.to_string()))?;
        permit.forget();
        Ok(())
    }
}

/// Connector that never answers.
struct SilentConnector;

#[async_trait]
impl BrokerConnector for SilentConnector {
    async fn connect(&self, _params: ConnectParams) -> Result<(), TransportError> {
        std::future::pending().await
    }
}

/// Connector that fails for one port and succeeds for every other.
struct PortSensitiveConnector {
    failing_port: u16,
}

#[async_trait]
impl BrokerConnector for PortSensitiveConnector {
    async fn connect(&self, params: ConnectParams) -> Result<(), TransportError> {
        if params.address.port() == self.failing_port {
            Err(TransportError::Other("Connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

fn controller_with(
    connector: Arc<dyn BrokerConnector>,
    settings: ConnectionSettings,
) -> ConnectionController {
    ConnectionController::new(AttemptController::new(connector, settings), Handle::current())
}

#[tokio::test]
async fn hostname_is_rejected_without_network_call() {
    let connector = GatedConnector::new();
    let mut controller = controller_with(connector.clone(), ConnectionSettings::default())
        .with_server("not-an-ip", "1883");

    assert!(controller.connect());
    controller.wait_idle().await;

    assert!(controller.input_enabled());
    assert_eq!(controller.error_text(), INVALID_ADDRESS_MESSAGE);
    assert_eq!(connector.calls(), 0);
}

#[tokio::test]
async fn non_numeric_port_is_rejected() {
    let connector = GatedConnector::new();
    let mut controller = controller_with(connector.clone(), ConnectionSettings::default())
        .with_server("127.0.0.1", "abc");

    assert!(controller.connect());
    controller.wait_idle().await;

    assert_eq!(controller.error_text(), "Invalid server address.");
    assert_eq!(connector.calls(), 0);
}

#[tokio::test]
async fn entry_state_is_observable_before_connect_completes() {
    let connector = GatedConnector::new();
    let mut controller = controller_with(connector.clone(), ConnectionSettings::default())
        .with_server("127.0.0.1", "1883");
    let mut observer = controller.subscribe();
    let _ = observer.borrow_and_update();

    assert!(controller.connect());

    assert!(observer.has_changed().unwrap());
    let seen = observer.borrow_and_update().clone();
    assert!(!seen.attempt.input_enabled);
    assert_eq!(seen.attempt.error_text, "");

    connector.release();
    controller.wait_idle().await;

    assert!(controller.input_enabled());
    assert_eq!(controller.error_text(), "");
    assert!(observer.borrow_and_update().attempt.input_enabled);
    assert_eq!(connector.calls(), 1);
}

#[tokio::test]
async fn second_connect_is_ignored_while_busy() {
    let connector = GatedConnector::new();
    let mut controller = controller_with(connector.clone(), ConnectionSettings::default())
        .with_server("127.0.0.1", "1883");

    assert!(controller.connect());
    assert!(!controller.can_connect());
    assert!(!controller.connect());

    // let the first attempt reach the connector before releasing it
    while connector.calls() == 0 {
        tokio::task::yield_now().await;
    }
    connector.release();
    controller.wait_idle().await;

    assert_eq!(connector.calls(), 1);
    assert!(controller.can_connect());
}

#[tokio::test]
async fn silent_broker_times_out_and_restores_input() {
    let settings = ConnectionSettings {
        connect_timeout: Duration::from_millis(100),
        ..Default::default()
    };
    let mut controller =
        controller_with(Arc::new(SilentConnector), settings).with_server("192.168.1.5", "1883");

    let started = std::time::Instant::now();
    assert!(controller.connect());
    controller.wait_idle().await;

    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(controller.input_enabled());
    assert_eq!(
        controller.error_text(),
        "Connection attempt timed out after 100 ms"
    );
}

#[tokio::test]
async fn default_deadline_is_one_second() {
    let mut controller = controller_with(Arc::new(SilentConnector), ConnectionSettings::default())
        .with_server("192.168.1.5", "1883");

    let started = std::time::Instant::now();
    assert!(controller.connect());
    controller.wait_idle().await;
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_secs(1));
    assert!(elapsed < Duration::from_millis(1500));
    assert!(!controller.error_text().is_empty());
}

#[tokio::test]
async fn stale_error_is_cleared_and_corrected_input_succeeds() {
    let connector = Arc::new(PortSensitiveConnector { failing_port: 1884 });
    let mut controller = controller_with(connector, ConnectionSettings::default())
        .with_server("127.0.0.1", "1884");

    assert!(controller.connect());
    controller.wait_idle().await;
    assert_eq!(controller.error_text(), "Connection refused");

    controller.set_server_port("1883");
    assert!(controller.connect());
    assert_eq!(controller.error_text(), "");
    controller.wait_idle().await;

    assert_eq!(controller.error_text(), "");
    assert!(controller.input_enabled());
}

#[tokio::test]
async fn each_attempt_gets_fresh_client_id_and_configured_credentials() {
    let connector = GatedConnector::new();
    let settings = ConnectionSettings {
        credentials: Credentials::new("operator", "secret"),
        ..Default::default()
    };
    let mut controller =
        controller_with(connector.clone(), settings).with_server("10.0.0.7", "1883");

    for _ in 0..2 {
        connector.release();
        assert!(controller.connect());
        controller.wait_idle().await;
    }

    let seen = connector.seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_ne!(seen[0].client_id, seen[1].client_id);
    for params in seen.iter() {
        assert_eq!(params.credentials, Credentials::new("operator", "secret"));
        assert_eq!(params.address.to_string(), "10.0.0.7:1883");
    }
}

#[tokio::test]
async fn shutdown_cancels_attempt_and_restores_input() {
    let mut controller = controller_with(Arc::new(SilentConnector), ConnectionSettings::default())
        .with_server("127.0.0.1", "1883");

    assert!(controller.connect());
    controller.shutdown();
    controller.wait_idle().await;

    assert!(controller.input_enabled());
    assert_eq!(controller.error_text(), "");
}

#[tokio::test]
async fn connect_after_shutdown_is_refused() {
    let connector = GatedConnector::new();
    let mut controller = controller_with(connector.clone(), ConnectionSettings::default())
        .with_server("127.0.0.1", "1883");
    let mut observer = controller.subscribe();
    let _ = observer.borrow_and_update();

    controller.shutdown();
    connector.release();

    assert!(!controller.can_connect());
    assert!(!controller.connect());
    assert!(!controller.connect());
    tokio::task::yield_now().await;
    assert_eq!(controller.pump(), 0);

    assert_eq!(connector.calls(), 0);
    assert!(controller.input_enabled());
    assert!(!observer.has_changed().unwrap());
}
