//! Community-based security (RFC 3584).
//!
//! Stateless: the community string is the credential. Authentication and
//! privacy cannot be provided, so only `noAuthNoPriv` is accepted.

use bytes::Bytes;

use super::{IncomingSecurity, SecurityModelId};
use crate::config::LocalConfig;
use crate::error::{Error, Result, SecurityErrorKind};
use crate::message::SecurityLevel;

pub(super) fn outgoing(
    model: SecurityModelId,
    security_name: &str,
    security_level: SecurityLevel,
    config: &LocalConfig,
) -> Result<Bytes> {
    if security_level != SecurityLevel::NoAuthNoPriv {
        return Err(Error::security(SecurityErrorKind::UnsupportedSecurityLevel {
            model,
            level: security_level,
        }));
    }

    let identity = config.identity(security_name).ok_or_else(|| {
        Error::security(SecurityErrorKind::UnknownSecurityName(
            security_name.to_string(),
        ))
    })?;
    Ok(identity.community.clone())
}

pub(super) fn incoming(
    model: SecurityModelId,
    community: &[u8],
    config: &LocalConfig,
) -> Result<IncomingSecurity> {
    let Some(identity) = config.identity_by_community(community) else {
        tracing::debug!(target: "snmp_engine::security", { snmp.security_model = %model }, "unknown community name");
        return Err(Error::security(SecurityErrorKind::UnknownCommunity));
    };

    Ok(IncomingSecurity {
        security_name: identity.security_name.clone(),
        security_level: SecurityLevel::NoAuthNoPriv,
    })
}
