//! Connection Controller - view model behind the connect panel
//!
//! Splits the work between two execution contexts:
//!
//! ```text
//! UI thread                                 tokio worker
//! ─────────                                 ────────────
//! connect() ── guard, disable, clear ──┐
//!                                      └──► AttemptController::run
//!                                               validate ─► connect (deadline)
//! pump()  ◄── StateUpdate (mpsc) ────────────── error text, input restored
//!   │
//!   └──► watch subscribers
//! ```
//!
//! Only the thread owning [`ConnectionController`] ever mutates [`ClientInfo`]. The
//! background attempt posts [`StateUpdate`]s through [`UiHandoff`] and the owner
//! applies them in arrival order when it calls [`ConnectionController::pump`].

use std::sync::Arc;

use chrono::{DateTime, Local};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::address::ConnectionRequest;
use super::attempt::{AttemptError, ConnectionAttempt};
use super::config::ConnectionSettings;
use super::connector::BrokerConnector;

/// State the presentation layer observes for the running attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptState {
    pub input_enabled: bool,
    pub error_text: String,
}

impl Default for AttemptState {
    fn default() -> Self {
        Self {
            input_enabled: true,
            error_text: String::new(),
        }
    }
}

/// Everything announced to subscribers: the two input fields plus the attempt state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub server_ip_address: String,
    pub server_port: String,
    pub attempt: AttemptState,
}

/// Mutation posted from the attempt back to the UI thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateUpdate {
    InputEnabled(bool),
    ErrorText(String),
}

/// Callback that wakes the UI thread after an update was posted.
pub type Waker = Arc<dyn Fn() + Send + Sync>;

/// Sending half of the UI hand-off. Cheap to clone, usable from any thread.
#[derive(Clone)]
pub struct UiHandoff {
    tx: mpsc::UnboundedSender<StateUpdate>,
    waker: Option<Waker>,
}

impl UiHandoff {
    pub fn post(&self, update: StateUpdate) {
        if self.tx.send(update).is_err() {
            debug!("UI side is gone, dropping state update");
            return;
        }
        if let Some(wake) = &self.waker {
            wake();
        }
    }
}

/// Restores input on drop, so every exit path of an attempt ends idle:
/// success, failure, shutdown cancellation and panics alike.
struct RestoreInput {
    handoff: UiHandoff,
}

impl Drop for RestoreInput {
    fn drop(&mut self) {
        self.handoff.post(StateUpdate::InputEnabled(true));
    }
}

/// Runs attempts in the background. Holds no UI state.
pub struct AttemptController {
    connector: Arc<dyn BrokerConnector>,
    settings: ConnectionSettings,
}

impl AttemptController {
    pub fn new(connector: Arc<dyn BrokerConnector>, settings: ConnectionSettings) -> Self {
        Self {
            connector,
            settings,
        }
    }

    /// Runs one attempt and posts its error text, if any, through `handoff`.
    ///
    /// Re-enabling input is left to the drop guard held by the spawned task.
    pub async fn run(
        &self,
        request: ConnectionRequest,
        handoff: &UiHandoff,
    ) -> Result<(), AttemptError> {
        let result = self.attempt(request).await;
        if let Err(e) = &result {
            handoff.post(StateUpdate::ErrorText(e.to_string()));
        }
        result
    }

    async fn attempt(&self, request: ConnectionRequest) -> Result<(), AttemptError> {
        let validated = ConnectionAttempt::create(request).validate()?;
        let settled = validated
            .connect(self.connector.as_ref(), &self.settings)
            .await?;
        debug!(
            "Attempt {} settled after {} ms",
            settled.client_id(),
            settled.elapsed().num_milliseconds()
        );
        Ok(())
    }
}

/// View model for the connect panel. Lives on the UI thread.
pub struct ConnectionController {
    info: watch::Sender<ClientInfo>,
    updates_tx: mpsc::UnboundedSender<StateUpdate>,
    updates_rx: mpsc::UnboundedReceiver<StateUpdate>,
    waker: Option<Waker>,
    runner: Arc<AttemptController>,
    runtime: Handle,
    shutdown: CancellationToken,
    last_attempt_at: Option<DateTime<Local>>,
}

impl ConnectionController {
    pub fn new(runner: AttemptController, runtime: Handle) -> Self {
        let (info, _) = watch::channel(ClientInfo::default());
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        Self {
            info,
            updates_tx,
            updates_rx,
            waker: None,
            runner: Arc::new(runner),
            runtime,
            shutdown: CancellationToken::new(),
            last_attempt_at: None,
        }
    }

    /// Prefills the input fields.
    pub fn with_server(self, host: impl Into<String>, port: impl Into<String>) -> Self {
        self.set_server_ip_address(host);
        self.set_server_port(port);
        self
    }

    pub fn set_waker(&mut self, waker: Waker) {
        self.waker = Some(waker);
    }

    pub fn subscribe(&self) -> watch::Receiver<ClientInfo> {
        self.info.subscribe()
    }

    pub fn snapshot(&self) -> ClientInfo {
        self.info.borrow().clone()
    }

    pub fn state(&self) -> AttemptState {
        self.info.borrow().attempt.clone()
    }

    pub fn server_ip_address(&self) -> String {
        self.info.borrow().server_ip_address.clone()
    }

    pub fn server_port(&self) -> String {
        self.info.borrow().server_port.clone()
    }

    pub fn input_enabled(&self) -> bool {
        self.info.borrow().attempt.input_enabled
    }

    pub fn error_text(&self) -> String {
        self.info.borrow().attempt.error_text.clone()
    }

    pub fn last_attempt_at(&self) -> Option<DateTime<Local>> {
        self.last_attempt_at
    }

    pub fn set_server_ip_address(&self, value: impl Into<String>) {
        let value = value.into();
        self.info.send_if_modified(|info| {
            if info.server_ip_address == value {
                return false;
            }
            info.server_ip_address = value;
            true
        });
    }

    pub fn set_server_port(&self, value: impl Into<String>) {
        let value = value.into();
        self.info.send_if_modified(|info| {
            if info.server_port == value {
                return false;
            }
            info.server_port = value;
            true
        });
    }

    /// Whether the connect action is currently accepted.
    pub fn can_connect(&self) -> bool {
        self.input_enabled() && !self.shutdown.is_cancelled()
    }

    /// Starts an attempt with the current field values.
    ///
    /// Returns `false` without doing anything while another attempt is outstanding
    /// or after [`ConnectionController::shutdown`]. Input is disabled and the
    /// previous error cleared before this returns.
    pub fn connect(&mut self) -> bool {
        if self.shutdown.is_cancelled() {
            debug!("Connect ignored, controller is shut down");
            return false;
        }
        if !self.input_enabled() {
            debug!("Connect ignored, attempt already running");
            return false;
        }

        self.apply(StateUpdate::InputEnabled(false));
        self.apply(StateUpdate::ErrorText(String::new()));
        self.last_attempt_at = Some(Local::now());

        let request = ConnectionRequest::new(self.server_ip_address(), self.server_port());
        info!(
            "Starting connection attempt to {}:{}",
            request.host_text, request.port_text
        );

        let runner = self.runner.clone();
        let handoff = self.handoff();
        let shutdown = self.shutdown.clone();
        // captured by the task so it also fires if the task is dropped unpolled
        let restore = RestoreInput {
            handoff: handoff.clone(),
        };
        self.runtime.spawn(async move {
            let _restore = restore;
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    warn!("Connection attempt cancelled by shutdown");
                }
                _ = runner.run(request, &handoff) => {}
            }
        });
        true
    }

    /// Applies all posted updates. Call once per frame on the UI thread.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(update) = self.updates_rx.try_recv() {
            self.apply(update);
            applied += 1;
        }
        applied
    }

    /// Applies posted updates until input is enabled again.
    pub async fn wait_idle(&mut self) {
        while !self.input_enabled() {
            match self.updates_rx.recv().await {
                Some(update) => self.apply(update),
                None => break,
            }
        }
    }

    /// Cancels any running attempt and refuses further ones. Input is restored
    /// through the regular update path.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    fn handoff(&self) -> UiHandoff {
        UiHandoff {
            tx: self.updates_tx.clone(),
            waker: self.waker.clone(),
        }
    }

    fn apply(&self, update: StateUpdate) {
        self.info.send_if_modified(|info| match update {
            StateUpdate::InputEnabled(enabled) => {
                let changed = info.attempt.input_enabled != enabled;
                info.attempt.input_enabled = enabled;
                changed
            }
            StateUpdate::ErrorText(text) => {
                let changed = info.attempt.error_text != text;
                info.attempt.error_text = text;
                changed
            }
        });
    }
}

impl Drop for ConnectionController {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
