//! Broker address validation
//!
//! Turns the raw host/port text typed by the operator into a [`ConnectableAddress`].
//! Validation happens before any network activity and is intentionally strict:
//! the host must be an IP literal, hostnames are rejected.
//!
//! ```text
//! "192.168.1.5" + "1883" ──► mqtt://192.168.1.5:1883 ──► ConnectableAddress
//! "[::1]"       + "1883" ──► mqtt://[::1]:1883       ──► ConnectableAddress
//! "broker.lan"  + "1883" ──► ValidationError
//! ```

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use thiserror::Error;
use tracing::debug;
use url::Url;

/// Message shown to the operator for every rejected address.
pub const INVALID_ADDRESS_MESSAGE: &str = "Invalid server address.";

/// Scheme used to compose the address string. Only the authority part is inspected.
const PLACEHOLDER_SCHEME: &str = "mqtt";

/// Input does not form `host:port` with an IP literal host.
///
/// Carries no detail on purpose; the operator only ever sees [`INVALID_ADDRESS_MESSAGE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid server address.")]
pub struct ValidationError;

/// Raw, unvalidated operator input for a single attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionRequest {
    pub host_text: String,
    pub port_text: String,
}

impl ConnectionRequest {
    pub fn new(host_text: impl Into<String>, port_text: impl Into<String>) -> Self {
        Self {
            host_text: host_text.into(),
            port_text: port_text.into(),
        }
    }

    /// Validates the request into a connectable address.
    ///
    /// Both fields are trimmed, composed into `mqtt://host:port` and parsed as an
    /// absolute URL. The result must carry an explicit port, no userinfo, path,
    /// query or fragment, and a host that parses as an [`IpAddr`].
    pub fn validate(&self) -> Result<ConnectableAddress, ValidationError> {
        let raw = format!(
            "{}://{}:{}",
            PLACEHOLDER_SCHEME,
            self.host_text.trim(),
            self.port_text.trim()
        );

        let url = Url::parse(&raw).map_err(|e| {
            debug!("Rejecting address {}: {}", raw, e);
            ValidationError
        })?;

        if !url.username().is_empty()
            || url.password().is_some()
            || !url.path().is_empty()
            || url.query().is_some()
            || url.fragment().is_some()
        {
            debug!("Rejecting address {}: unexpected components", raw);
            return Err(ValidationError);
        }

        let Some(port) = url.port() else {
            debug!("Rejecting address {}: missing port", raw);
            return Err(ValidationError);
        };

        let Some(host) = url.host_str() else {
            debug!("Rejecting address {}: missing host", raw);
            return Err(ValidationError);
        };
        let Some(ip) = parse_ip_literal(host) else {
            debug!("Rejecting address {}: host is not an IP literal", raw);
            return Err(ValidationError);
        };

        Ok(ConnectableAddress { ip, port })
    }
}

// IPv6 hosts come back from the parser in brackets
fn parse_ip_literal(host: &str) -> Option<IpAddr> {
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    host.parse().ok()
}

/// Validated broker address. Only obtainable through [`ConnectionRequest::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectableAddress {
    ip: IpAddr,
    port: u16,
}

impl ConnectableAddress {
    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Host in the unbracketed form the MQTT client expects.
    pub fn host(&self) -> String {
        self.ip.to_string()
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

impl fmt::Display for ConnectableAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.socket_addr())
    }
}
