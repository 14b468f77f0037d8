//! SET Multiple Scalars Example
//!
//! Sends one SNMPv1 SetRequest with community "private" writing two scalars:
//! - sysDescr.0 (1.3.6.1.2.1.1.1.0) = OctetString "my value"
//! - sysServices.0 (1.3.6.1.2.1.1.7.0) = Integer 123
//!
//! The result is reported by the request callback once the response arrives
//! or all retries time out. The engine loop exits when nothing is pending.
//!
//! Run with: cargo run --example set_multiple_scalars [agent-addr]
//!
//! Test against net-snmp:
//!   # Start snmpd with "rwcommunity private" in snmpd.conf
//!   sudo snmpd -f -Lo -c /etc/snmp/snmpd.conf

use snmp_engine::{
    ErrorStatus, Retry, SecurityIdentity, SecurityLevel, SnmpEngine, TargetAddress, TargetParams,
    TransportDomain, UdpEndpoint, Value, VarBind, Version, oid,
};
use std::time::Duration;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("snmp_engine=info".parse()?),
        )
        .init();

    let agent = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:161".to_string())
        .parse()?;

    let mut engine = SnmpEngine::builder()
        .timeout(Duration::from_secs(3))
        .retry(Retry::immediate(2))
        .build()?;

    // community "private" maps to security name "my-area"
    engine.add_identity(SecurityIdentity::community("my-area", "private"))?;
    engine.add_target_params(TargetParams::new(
        "my-creds",
        "my-area",
        SecurityLevel::NoAuthNoPriv,
        Version::V1,
    ))?;
    engine.add_target_address(TargetAddress::udp("my-router", agent, "my-creds"))?;
    engine.register_endpoint(
        TransportDomain::Udp,
        UdpEndpoint::client(TransportDomain::Udp).await?,
    )?;

    engine.set(
        "my-router",
        vec![
            VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), Value::from("my value")),
            VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 7, 0), Value::Integer(123)),
        ],
        |_engine, handle, outcome| {
            if let Some(error) = &outcome.error_indication {
                eprintln!("request {handle:?} failed: {error}");
                return;
            }
            match outcome.error_status {
                Some(ErrorStatus::NoError) | None => {
                    for vb in &outcome.varbinds {
                        println!("{} = {}", vb.oid, vb.value);
                    }
                }
                Some(status) => {
                    let at = outcome
                        .error_varbind()
                        .map(|vb| vb.oid.to_string())
                        .unwrap_or_else(|| "?".to_string());
                    eprintln!("agent reported {status} at {at}");
                }
            }
        },
    )?;

    engine.run_until_complete().await;
    Ok(())
}
