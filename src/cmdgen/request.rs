//! Request descriptions and PDU construction.

use std::time::Duration;

use super::Retry;
use crate::error::{Error, Result};
use crate::pdu::{Pdu, PduType};
use crate::value::Value;
use crate::varbind::VarBind;

/// Kind of request a command generator can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Get,
    GetNext,
    Set,
    /// SNMPv2c only.
    GetBulk {
        non_repeaters: i32,
        max_repetitions: i32,
    },
}

impl RequestKind {
    /// PDU type sent for this kind.
    pub fn pdu_type(self) -> PduType {
        match self {
            Self::Get => PduType::GetRequest,
            Self::GetNext => PduType::GetNextRequest,
            Self::Set => PduType::SetRequest,
            Self::GetBulk { .. } => PduType::GetBulkRequest,
        }
    }
}

/// Per-request overrides of the target and engine defaults.
///
/// Precedence is request, then target address, then engine.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Time to wait for each response.
    pub timeout: Option<Duration>,
    /// Retransmission policy.
    pub retry: Option<Retry>,
}

impl RequestOptions {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn retry(mut self, retry: impl Into<Retry>) -> Self {
        self.retry = Some(retry.into());
        self
    }
}

/// Lifecycle of a request.
///
/// ```text
/// Submitted -> AwaitingResponse -> Completed
///                |      ^
///                v      |
///               Retrying ----> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    /// Target resolved and message wrapped; not yet on the wire.
    Submitted,
    /// Sent; the response timer is armed.
    AwaitingResponse,
    /// Timed out with retries left; waiting out the backoff.
    Retrying,
    /// A matching response arrived. The callback has not run yet.
    Completed,
    /// Terminal failure. The callback has not run yet.
    Failed,
}

/// Build the request PDU, rejecting bindings the PDU cannot carry.
pub(crate) fn build_pdu(kind: RequestKind, request_id: i32, varbinds: Vec<VarBind>) -> Result<Pdu> {
    for vb in &varbinds {
        if vb.oid.is_empty() {
            return Err(Error::InvalidBinding {
                oid: vb.oid.clone(),
                reason: "empty OID",
            }
            .boxed());
        }
        vb.oid.validate_all()?;

        if kind == RequestKind::Set {
            match vb.value {
                Value::Null => {
                    return Err(Error::InvalidBinding {
                        oid: vb.oid.clone(),
                        reason: "SET requires a value",
                    }
                    .boxed());
                }
                _ if vb.value.is_exception() => {
                    return Err(Error::InvalidBinding {
                        oid: vb.oid.clone(),
                        reason: "exception values cannot be set",
                    }
                    .boxed());
                }
                _ => {}
            }
        }
    }

    let pdu = match kind {
        RequestKind::Get | RequestKind::GetNext | RequestKind::Set => Pdu {
            pdu_type: kind.pdu_type(),
            request_id,
            error_status: 0,
            error_index: 0,
            varbinds,
        },
        RequestKind::GetBulk {
            non_repeaters,
            max_repetitions,
        } => Pdu::get_bulk(request_id, non_repeaters, max_repetitions, varbinds),
    };
    Ok(pdu)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OidErrorKind;
    use crate::oid;
    use crate::oid::Oid;

    #[test]
    fn test_build_set() {
        let pdu = build_pdu(
            RequestKind::Set,
            5,
            vec![VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 7, 0), Value::Integer(123))],
        )
        .unwrap();
        assert_eq!(pdu.pdu_type, PduType::SetRequest);
        assert_eq!(pdu.request_id, 5);
    }

    #[test]
    fn test_build_get_bulk() {
        let kind = RequestKind::GetBulk {
            non_repeaters: 0,
            max_repetitions: 10,
        };
        let pdu = build_pdu(kind, 1, vec![VarBind::null(oid!(1, 3, 6, 1, 2, 1, 2, 2))]).unwrap();
        assert_eq!(pdu.pdu_type, PduType::GetBulkRequest);
        assert_eq!(pdu.error_index, 10);
    }

    #[test]
    fn test_set_rejects_null_and_exceptions() {
        for value in [Value::Null, Value::NoSuchInstance] {
            let err = build_pdu(
                RequestKind::Set,
                1,
                vec![VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 4, 0), value)],
            )
            .unwrap_err();
            assert!(matches!(*err, Error::InvalidBinding { .. }));
        }

        // a GET carries NULL placeholders
        build_pdu(RequestKind::Get, 1, vec![VarBind::null(oid!(1, 3, 6, 1))]).unwrap();
    }

    #[test]
    fn test_invalid_oids_rejected() {
        let err = build_pdu(RequestKind::Get, 1, vec![VarBind::null(oid!(3, 1))]).unwrap_err();
        assert!(matches!(
            *err,
            Error::InvalidOid {
                kind: OidErrorKind::InvalidFirstArc(3),
                ..
            }
        ));

        let err = build_pdu(RequestKind::Get, 1, vec![VarBind::null(Oid::empty())]).unwrap_err();
        assert!(matches!(*err, Error::InvalidBinding { .. }));
    }
}
