//! Transport-level broker connection
//!
//! [`BrokerConnector`] is the single suspension point of an attempt: it opens the TCP
//! connection and completes the MQTT CONNECT/CONNACK handshake. The production
//! implementation drives a `rumqttc` event loop until the broker acknowledges; the
//! session is dropped right after, nothing is kept alive.

use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, ConnectionError, Event, MqttOptions, Packet};
use thiserror::Error;
use tracing::{debug, info};

use super::address::ConnectableAddress;
use super::config::Credentials;

/// Everything the connector needs for one attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectParams {
    pub client_id: String,
    pub credentials: Credentials,
    pub address: ConnectableAddress,
    pub keep_alive: Duration,
}

/// Failures raised while establishing the connection.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network or protocol failure reported by the MQTT client, including a
    /// refused CONNACK (`ConnectionRefused`) or a non-CONNACK first packet
    /// (`NotConnAck`)
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Failure described by a connector not built on `rumqttc`
    #[error("{0}")]
    Other(String),
}

/// Connection primitive used by an attempt.
#[async_trait]
pub trait BrokerConnector: Send + Sync + 'static {
    /// Resolves once the broker accepted the connection.
    async fn connect(&self, params: ConnectParams) -> Result<(), TransportError>;
}

/// [`BrokerConnector`] backed by `rumqttc`.
#[derive(Debug, Clone)]
pub struct RumqttcConnector {
    request_capacity: usize,
}

impl Default for RumqttcConnector {
    fn default() -> Self {
        Self {
            request_capacity: 10,
        }
    }
}

impl RumqttcConnector {
    fn options(params: &ConnectParams) -> MqttOptions {
        let mut mqtt_options = MqttOptions::new(
            params.client_id.clone(),
            params.address.host(),
            params.address.port(),
        );
        mqtt_options
            .set_credentials(
                params.credentials.username.clone(),
                params.credentials.password.clone(),
            )
            .set_keep_alive(params.keep_alive)
            .set_clean_session(true);
        mqtt_options
    }
}

#[async_trait]
impl BrokerConnector for RumqttcConnector {
    async fn connect(&self, params: ConnectParams) -> Result<(), TransportError> {
        debug!(
            "Opening MQTT connection to {} as {}",
            params.address, params.client_id
        );
        let (_client, mut eventloop) =
            AsyncClient::new(Self::options(&params), self.request_capacity);

        // the first poll performs CONNECT/CONNACK; a refused CONNACK is returned as an error.
        // both halves stay alive until then, dropping them afterwards closes the socket
        loop {
            match eventloop.poll().await? {
                Event::Incoming(Packet::ConnAck(_)) => {
                    info!("Broker at {} accepted {}", params.address, params.client_id);
                    return Ok(());
                }
                event => {
                    debug!("Event before CONNACK: {:?}", event);
                }
            }
        }
    }
}
