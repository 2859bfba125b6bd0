//! # MQTT Connection Module
//!
//! Connects to an MQTT broker exactly once per operator request and reports how
//! that went. This module owns everything between the "Connect" button and the
//! broker's CONNACK; it does not subscribe, publish or keep a session alive.
//!
//! ## Module Architecture
//!
//! ```text
//! mqtt/
//! ├── address.rs     - host/port validation into a ConnectableAddress
//! ├── config.rs      - connection settings, credentials, client id generation
//! ├── connector.rs   - BrokerConnector trait and the rumqttc implementation
//! ├── attempt.rs     - statum state machine for a single attempt
//! └── controller.rs  - view model: input guard, UI hand-off, observers
//! ```
//!
//! ## Attempt Lifecycle
//!
//! 1. The UI thread calls [`ConnectionController::connect`]. If input is enabled it
//!    disables input, clears the previous error and spawns the attempt.
//! 2. The attempt validates the address. Invalid input ends the attempt with
//!    "Invalid server address." and no network traffic.
//! 3. A valid address is handed to the [`BrokerConnector`] under a fixed deadline.
//! 4. Whatever happened, the error text (if any) and the re-enable are posted back
//!    to the UI thread, which applies them on its next [`ConnectionController::pump`].
//!
//! ## Error Model
//!
//! All failures are [`AttemptError`]s and all of them are recoverable: the panel
//! goes back to idle and the operator can try again with corrected input.

pub mod address;
pub mod attempt;
pub mod config;
pub mod connector;
pub mod controller;

pub use address::{ConnectableAddress, ConnectionRequest, ValidationError, INVALID_ADDRESS_MESSAGE};
pub use attempt::AttemptError;
pub use config::{ConnectionSettings, Credentials};
pub use connector::{BrokerConnector, ConnectParams, RumqttcConnector, TransportError};
pub use controller::{AttemptController, AttemptState, ClientInfo, ConnectionController};
