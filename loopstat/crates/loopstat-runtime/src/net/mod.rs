//! Network Module - Host-to-Host Message Passing
//!
//! The distributed reporter only needs three things from a network layer:
//! a buffered send, a flush that delivers everything buffered so far, and a
//! non-blocking poll for inbound frames. [`Transport`] captures exactly that;
//! [`handle_receives`] is the drain loop that hands each queued frame to a
//! handler on the calling thread.
//!
//! [`InProcessNetwork`] connects several hosts living in one process, which
//! is how tests and the `loopstat demo` command simulate a cluster.

use std::fmt;

use crate::error::Result;

pub mod envelope;
pub mod inproc;

pub use envelope::HostReportEnvelope;
pub use inproc::{InProcessEndpoint, InProcessNetwork};

/// Identifies which handler on the receiving host consumes a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(pub u16);

impl HandlerId {
    /// Per-host report gathered by the sink
    pub const HOST_REPORT: HandlerId = HandlerId(1);
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            HandlerId::HOST_REPORT => f.write_str("host-report"),
            HandlerId(id) => write!(f, "handler-{}", id),
        }
    }
}

/// One message between hosts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub handler: HandlerId,
    pub sender: u32,
    pub body: Vec<u8>,
}

impl Frame {
    pub fn new(handler: HandlerId, sender: u32, body: Vec<u8>) -> Self {
        Self {
            handler,
            sender,
            body,
        }
    }
}

/// Host-to-host message transport
///
/// Frames from one sender to one destination arrive in send order once
/// flushed. There is no ordering between different senders.
pub trait Transport: Send + Sync {
    /// Id of this host, `0..host_count`
    fn host_id(&self) -> u32;

    /// Number of hosts in the run
    fn host_count(&self) -> u32;

    /// Queue a frame for `dest`; may buffer until [`Transport::flush`]
    fn send(&self, dest: u32, frame: Frame) -> Result<()>;

    /// Deliver every buffered frame
    fn flush(&self) -> Result<()>;

    /// Next inbound frame, without blocking
    fn try_recv(&self) -> Result<Option<Frame>>;
}

/// Drain every frame currently queued for this host
///
/// Calls `handler` once per frame, oldest first, on the calling thread and
/// returns how many frames were handled. Stops at the first handler error.
pub fn handle_receives<T, F>(transport: &T, handler: F) -> Result<usize>
where
    T: Transport + ?Sized,
    F: FnMut(Frame) -> Result<()>,
{
    handle_receives_up_to(transport, usize::MAX, handler)
}

/// Like [`handle_receives`], but handles at most `limit` frames
///
/// Returns early once `limit` frames were handled even if more are queued,
/// so a caller with a deadline can check it between batches.
pub fn handle_receives_up_to<T, F>(transport: &T, limit: usize, mut handler: F) -> Result<usize>
where
    T: Transport + ?Sized,
    F: FnMut(Frame) -> Result<()>,
{
    let mut handled = 0;
    while handled < limit {
        let Some(frame) = transport.try_recv()? else {
            break;
        };
        log::trace!(
            "host {}: frame for {} from host {} ({} bytes)",
            transport.host_id(),
            frame.handler,
            frame.sender,
            frame.body.len()
        );
        handler(frame)?;
        handled += 1;
    }
    Ok(handled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StatError;

    #[test]
    fn test_handle_receives_drains_in_order() {
        let mut endpoints = InProcessNetwork::build(2);
        let receiver = endpoints.remove(0);
        let sender = endpoints.remove(0);

        for i in 0..3u8 {
            sender
                .send(0, Frame::new(HandlerId::HOST_REPORT, 1, vec![i]))
                .unwrap();
        }
        sender.flush().unwrap();

        let mut seen = Vec::new();
        let handled = handle_receives(&receiver, |frame| {
            seen.push(frame.body[0]);
            Ok(())
        })
        .unwrap();

        assert_eq!(handled, 3);
        assert_eq!(seen, vec![0, 1, 2]);
        assert_eq!(handle_receives(&receiver, |_| Ok(())).unwrap(), 0);
    }

    #[test]
    fn test_handle_receives_stops_on_error() {
        let mut endpoints = InProcessNetwork::build(2);
        let receiver = endpoints.remove(0);
        let sender = endpoints.remove(0);

        sender.send(0, Frame::new(HandlerId(9), 1, Vec::new())).unwrap();
        sender.send(0, Frame::new(HandlerId(9), 1, Vec::new())).unwrap();
        sender.flush().unwrap();

        let result = handle_receives(&receiver, |_| Err(StatError::Transport("rejected".into())));
        assert!(result.is_err());
        assert!(receiver.try_recv().unwrap().is_some());
    }

    #[test]
    fn test_handle_receives_up_to_leaves_the_rest_queued() {
        let mut endpoints = InProcessNetwork::build(2);
        let receiver = endpoints.remove(0);
        let sender = endpoints.remove(0);

        for i in 0..5u8 {
            sender
                .send(0, Frame::new(HandlerId::HOST_REPORT, 1, vec![i]))
                .unwrap();
        }
        sender.flush().unwrap();

        let mut seen = Vec::new();
        let handled = handle_receives_up_to(&receiver, 2, |frame| {
            seen.push(frame.body[0]);
            Ok(())
        })
        .unwrap();

        assert_eq!(handled, 2);
        assert_eq!(seen, vec![0, 1]);
        assert_eq!(receiver.queued(), 3);
    }

    #[test]
    fn test_handler_display() {
        assert_eq!(HandlerId::HOST_REPORT.to_string(), "host-report");
        assert_eq!(HandlerId(7).to_string(), "handler-7");
    }
}
