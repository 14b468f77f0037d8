//! # snmp-engine
//!
//! An SNMP engine with a callback-driven command generator.
//!
//! The engine owns a local configuration store (security identities, target
//! parameters and target addresses), the community-based security models,
//! the SNMPv1/v2c message-processing models and a dispatcher multiplexing
//! transport endpoints and timers. Requests are submitted against symbolic
//! target names; each request's callback runs exactly once, from inside the
//! engine's run loop, with either the agent's response or an error
//! indication.
//!
//! ## Features
//!
//! - SNMPv1 and SNMPv2c command generation: GET, GETNEXT, SET, GETBULK
//! - Single-threaded cooperative event loop on Tokio
//! - Per-request timeout and retry policy with backoff
//! - Zero-copy BER encoding/decoding
//! - IPv4 and IPv6 UDP transport domains
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use snmp_engine::{
//!     SecurityIdentity, SecurityLevel, SnmpEngine, TargetAddress, TargetParams,
//!     TransportDomain, UdpEndpoint, Version, oid,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> snmp_engine::Result<()> {
//!     let mut engine = SnmpEngine::builder().build()?;
//!     engine.add_identity(SecurityIdentity::community("my-area", "public"))?;
//!     engine.add_target_params(TargetParams::new(
//!         "my-creds",
//!         "my-area",
//!         SecurityLevel::NoAuthNoPriv,
//!         Version::V2c,
//!     ))?;
//!     engine.add_target_address(TargetAddress::udp(
//!         "my-router",
//!         "192.168.1.1:161".parse().unwrap(),
//!         "my-creds",
//!     ))?;
//!     engine.register_endpoint(
//!         TransportDomain::Udp,
//!         UdpEndpoint::client(TransportDomain::Udp).await?,
//!     )?;
//!
//!     engine.get("my-router", &[oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)], |_, _, outcome| {
//!         match outcome.into_result() {
//!             Ok(varbinds) => println!("sysDescr: {:?}", varbinds[0].value),
//!             Err(e) => eprintln!("request failed: {}", e),
//!         }
//!     })?;
//!
//!     engine.run_until_complete().await;
//!     Ok(())
//! }
//! ```

pub mod ber;
pub mod cmdgen;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod message;
pub mod oid;
pub mod pdu;
pub mod security;
pub mod transport;
pub mod value;
pub mod varbind;
pub mod version;

// Re-exports for convenience
pub use cmdgen::{
    Backoff, Outcome, RequestHandle, RequestKind, RequestOptions, RequestState, Retry,
    RetryBuilder,
};
pub use config::{LocalConfig, SecurityIdentity, TargetAddress, TargetParams};
pub use engine::{EngineBuilder, EngineHandle, SnmpEngine};
pub use error::{
    ConfigErrorKind, DecodeErrorKind, Error, ErrorStatus, OidErrorKind, Result, SecurityErrorKind,
};
pub use message::SecurityLevel;
pub use oid::Oid;
pub use pdu::{Pdu, PduType};
pub use security::SecurityModelId;
pub use transport::{Endpoint, TransportDomain, UdpEndpoint};
pub use value::Value;
pub use varbind::VarBind;
pub use version::Version;
