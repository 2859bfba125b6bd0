//! Single connection attempt as a statum state machine
//!
//! An attempt moves strictly forward. Every step either hands back the attempt in its
//! next state or fails with an [`AttemptError`]; there is no way back and no retry.
//!
//! ```text
//! Requested ──validate──► Validated ──connect──► Settled
//!     │                       │
//!     └──► ValidationError    └──► TimeoutError / TransportError
//! ```

use std::time::Duration;

use chrono::{DateTime, Local};
use statum::{machine, state};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::address::{ConnectableAddress, ConnectionRequest, ValidationError};
use super::config::ConnectionSettings;
use super::connector::{BrokerConnector, ConnectParams, TransportError};

/// Every way an attempt can end without a connection.
#[derive(Debug, Error)]
pub enum AttemptError {
    /// Host/port did not validate, no network call was made
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Broker did not accept within the deadline
    #[error("Connection attempt timed out after {} ms", .0.as_millis())]
    Timeout(Duration),

    /// Connection failed before the deadline
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[state]
#[derive(Debug, Clone)]
pub enum AttemptPhase {
    Requested, // Raw operator input
    Validated, // Address checked, no network activity yet
    Settled,   // Broker accepted the connection
}

#[machine]
#[derive(Debug)]
pub struct ConnectionAttempt<S: AttemptPhase> {
    request: ConnectionRequest,
    address: Option<ConnectableAddress>,
    client_id: Option<String>,
    started_at: DateTime<Local>,
}

impl ConnectionAttempt<Requested> {
    pub fn create(request: ConnectionRequest) -> Self {
        Self::new(request, None, None, Local::now())
    }

    pub fn validate(mut self) -> Result<ConnectionAttempt<Validated>, AttemptError> {
        let address = self.request.validate()?;
        debug!("Validated broker address {}", address);
        self.address = Some(address);
        Ok(self.transition())
    }
}

impl ConnectionAttempt<Validated> {
    /// Issues the one connection request of this attempt, bounded by
    /// `settings.connect_timeout`.
    pub async fn connect(
        mut self,
        connector: &dyn BrokerConnector,
        settings: &ConnectionSettings,
    ) -> Result<ConnectionAttempt<Settled>, AttemptError> {
        let address = self.address.ok_or(ValidationError)?;
        let client_id = settings.client_id();
        let params = ConnectParams {
            client_id: client_id.clone(),
            credentials: settings.credentials.clone(),
            address,
            keep_alive: settings.keep_alive,
        };
        self.client_id = Some(client_id);

        info!(
            "Connecting to {} (deadline {} ms)",
            address,
            settings.connect_timeout.as_millis()
        );
        match tokio::time::timeout(settings.connect_timeout, connector.connect(params)).await {
            Ok(Ok(())) => {
                info!("Connected to {}", address);
                Ok(self.transition())
            }
            Ok(Err(e)) => {
                warn!("Connection to {} failed: {}", address, e);
                Err(AttemptError::Transport(e))
            }
            Err(_) => {
                warn!("Connection to {} timed out", address);
                Err(AttemptError::Timeout(settings.connect_timeout))
            }
        }
    }
}

impl ConnectionAttempt<Settled> {
    pub fn client_id(&self) -> &str {
        self.client_id.as_deref().unwrap_or_default()
    }

    pub fn elapsed(&self) -> chrono::Duration {
        Local::now() - self.started_at
    }
}
