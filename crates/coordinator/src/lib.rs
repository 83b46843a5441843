//! Client-side coordination for the Solace counseling assistant.
//!
//! The coordinator is the piece that makes a conversation with the
//! assistant feel live: it watches the user's direct channel, fires a
//! gateway trigger for each message the user sends (exactly once, even
//! when the backend delivers the message more than once), and drives the
//! bot's composing indicator while a reply is pending.
//!
//! - [`TriggerCoordinator`] - the watch loop and trigger logic
//! - [`TriggerTransport`] / [`HttpTrigger`] - how triggers reach the
//!   gateway
//! - [`CoordinatorConfig`] - identities and timings

mod config;
mod coordinator;
mod dedupe;
mod transport;

pub use config::CoordinatorConfig;
pub use coordinator::{CoordinatorError, CoordinatorEvent, TriggerCoordinator};
pub use transport::{HttpTrigger, TransportError, TriggerTransport};
