//! What a request callback receives.

use crate::error::{Error, ErrorStatus, Result};
use crate::varbind::VarBind;

/// Caller-side handle for a submitted request.
///
/// Wraps the request id, which is unique among pending requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestHandle(pub(crate) i32);

impl RequestHandle {
    /// Request id carried in the PDU.
    pub fn request_id(self) -> i32 {
        self.0
    }
}

/// Result of a request, delivered exactly once to its callback.
///
/// Exactly one of two shapes:
///
/// - a failure: `error_indication` is set and every other field is empty
/// - a response: `error_indication` is `None`, `error_status` and
///   `error_index` are set, and `varbinds` holds the response bindings in
///   wire order
///
/// A response may still report an agent-side error through `error_status`.
#[derive(Debug)]
pub struct Outcome {
    pub error_indication: Option<Box<Error>>,
    pub error_status: Option<ErrorStatus>,
    pub error_index: Option<u32>,
    pub varbinds: Vec<VarBind>,
}

impl Outcome {
    pub(crate) fn failed(error: Box<Error>) -> Self {
        Self {
            error_indication: Some(error),
            error_status: None,
            error_index: None,
            varbinds: Vec::new(),
        }
    }

    pub(crate) fn response(error_status: ErrorStatus, error_index: u32, varbinds: Vec<VarBind>) -> Self {
        Self {
            error_indication: None,
            error_status: Some(error_status),
            error_index: Some(error_index),
            varbinds,
        }
    }

    /// A response arrived with `noError`.
    pub fn is_success(&self) -> bool {
        self.error_indication.is_none() && self.error_status.is_some_and(|s| s.is_ok())
    }

    /// The binding `error_index` points at (1-based), if any.
    pub fn error_varbind(&self) -> Option<&VarBind> {
        match self.error_index {
            Some(index) if index > 0 => self.varbinds.get(index as usize - 1),
            _ => None,
        }
    }

    /// Collapse into the response bindings or an error.
    ///
    /// A non-zero error status becomes [`Error::Snmp`].
    pub fn into_result(self) -> Result<Vec<VarBind>> {
        let Outcome {
            error_indication,
            error_status,
            error_index,
            varbinds,
        } = self;

        if let Some(error) = error_indication {
            return Err(error);
        }
        match error_status {
            Some(status) if !status.is_ok() => {
                let index = error_index.unwrap_or(0);
                let oid = index
                    .checked_sub(1)
                    .and_then(|i| varbinds.get(i as usize))
                    .map(|vb| vb.oid.clone());
                Err(Error::Snmp { status, index, oid }.boxed())
            }
            _ => Ok(varbinds),
        }
    }
}
