//! Wire envelope for a host's rendered report

use serde::{Deserialize, Serialize};

use super::{Frame, HandlerId};
use crate::error::Result;

/// `(sender, payload)` pair shipped from a peer to the sink
///
/// `payload` is the sender's fully rendered local report. The sink prints
/// it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostReportEnvelope {
    pub sender: u32,
    pub payload: String,
}

impl HostReportEnvelope {
    pub fn new(sender: u32, payload: impl Into<String>) -> Self {
        Self {
            sender,
            payload: payload.into(),
        }
    }

    /// Serialize into the body of a `HOST_REPORT` frame
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse a frame body
    pub fn decode(body: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(body)?)
    }

    /// Wrap into a frame addressed to the report handler
    pub fn into_frame(self) -> Result<Frame> {
        let body = self.encode()?;
        Ok(Frame::new(HandlerId::HOST_REPORT, self.sender, body))
    }
}
