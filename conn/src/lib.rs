//! Host and client connection loops for tickrep.
//!
//! This crate ties the lower layers together into the per-tick protocol:
//! a [`Host`] broadcasts state deltas chosen against each peer's
//! acknowledged snapshot, and a [`Client`] applies them in tick-monotonic
//! order while uploading commands and events. The application plugs in
//! through the [`HostSimulation`] and [`ClientSimulation`] traits and a
//! fire-and-forget byte transport.
//!
//! Malformed or stale inbound traffic never surfaces as an error; it is
//! logged and discarded, and the protocol recovers through the normal
//! ack-driven resend behavior.

mod client;
mod config;
mod error;
mod history;
mod host;
mod message;
mod peer;
mod sim;

pub use client::Client;
pub use config::Config;
pub use error::{ConnError, ConnResult};
pub use history::{HistoryError, Snapshot, SnapshotHistory};
pub use host::Host;
pub use message::{Command, Event, MAX_MESSAGE_VALUES};
pub use peer::PeerId;
pub use sim::{ClientSimulation, HostSimulation, HostTransport, Transport};
