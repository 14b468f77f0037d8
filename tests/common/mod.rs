//! Shared test infrastructure for snmp-engine.
//!
//! Provides TestAgent (in-process SNMP agent over UDP), fixtures, and
//! utilities.

// Not every test file uses every helper
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod agent;
pub mod fixtures;

pub use agent::TestAgent;
pub use fixtures::{
    COMMUNITY, SECURITY_NAME, TARGET, engine_for, nonexistent_oid, reference_scalars, sys_descr,
    sys_location, sys_name, sys_services, system_mib, system_subtree,
};

use snmp_engine::{Outcome, RequestHandle, SnmpEngine};
use std::cell::RefCell;
use std::rc::Rc;

/// Outcomes collected by [`record`] callbacks, in delivery order.
pub type Results = Rc<RefCell<Vec<(RequestHandle, Outcome)>>>;

/// Callback that appends its outcome to `results`.
pub fn record(results: &Results) -> impl FnOnce(&mut SnmpEngine, RequestHandle, Outcome) + 'static {
    let results = results.clone();
    move |_engine, handle, outcome| results.borrow_mut().push((handle, outcome))
}

/// Install a `tracing` subscriber honoring `RUST_LOG`, once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
