//! In-process transport over crossbeam channels
//!
//! Every host owns one unbounded inbox. Sends are staged in a per-endpoint
//! outbox and only pushed into the destination inbox by `flush`, which keeps
//! the send/flush split of a real network layer observable in tests.

use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use parking_lot::Mutex;

use super::{Frame, Transport};
use crate::error::{Result, StatError};

/// Builder for a set of connected in-process endpoints
pub struct InProcessNetwork;

impl InProcessNetwork {
    /// Create `host_count` endpoints; index `i` of the result is host `i`
    pub fn build(host_count: u32) -> Vec<InProcessEndpoint> {
        let (senders, receivers): (Vec<Sender<Frame>>, Vec<Receiver<Frame>>) =
            (0..host_count).map(|_| channel::unbounded()).unzip();

        receivers
            .into_iter()
            .zip(0..host_count)
            .map(|(inbox, host_id)| InProcessEndpoint {
                host_id,
                host_count,
                inbox,
                peers: senders.clone(),
                outbox: Mutex::new(Vec::new()),
            })
            .collect()
    }
}

/// One host's view of an in-process network
pub struct InProcessEndpoint {
    host_id: u32,
    host_count: u32,
    inbox: Receiver<Frame>,
    peers: Vec<Sender<Frame>>,
    outbox: Mutex<Vec<(u32, Frame)>>,
}

impl InProcessEndpoint {
    /// Frames sent but not yet flushed
    pub fn buffered(&self) -> usize {
        self.outbox.lock().len()
    }

    /// Frames waiting in this host's inbox
    pub fn queued(&self) -> usize {
        self.inbox.len()
    }
}

impl Transport for InProcessEndpoint {
    fn host_id(&self) -> u32 {
        self.host_id
    }

    fn host_count(&self) -> u32 {
        self.host_count
    }

    fn send(&self, dest: u32, frame: Frame) -> Result<()> {
        if dest >= self.host_count {
            return Err(StatError::Transport(format!(
                "host {} does not exist ({} hosts)",
                dest, self.host_count
            )));
        }
        self.outbox.lock().push((dest, frame));
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let staged = std::mem::take(&mut *self.outbox.lock());
        for (dest, frame) in staged {
            let peer = self.peers.get(dest as usize).ok_or_else(|| {
                StatError::Transport(format!("host {} does not exist", dest))
            })?;
            peer.send(frame)
                .map_err(|_| StatError::Transport(format!("host {} is gone", dest)))?;
        }
        Ok(())
    }

    fn try_recv(&self) -> Result<Option<Frame>> {
        match self.inbox.try_recv() {
            Ok(frame) => Ok(Some(frame)),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => Ok(None),
        }
    }
}

impl std::fmt::Debug for InProcessEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InProcessEndpoint")
            .field("host_id", &self.host_id)
            .field("host_count", &self.host_count)
            .field("buffered", &self.buffered())
            .field("queued", &self.queued())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::HandlerId;

    fn frame(sender: u32) -> Frame {
        Frame::new(HandlerId::HOST_REPORT, sender, b"x".to_vec())
    }

    #[test]
    fn test_build_assigns_ids() {
        let endpoints = InProcessNetwork::build(3);
        let ids: Vec<_> = endpoints.iter().map(|e| e.host_id()).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert!(endpoints.iter().all(|e| e.host_count() == 3));
    }

    #[test]
    fn test_send_buffers_until_flush() {
        let endpoints = InProcessNetwork::build(2);
        endpoints[1].send(0, frame(1)).unwrap();

        assert_eq!(endpoints[1].buffered(), 1);
        assert_eq!(endpoints[0].try_recv().unwrap(), None);

        endpoints[1].flush().unwrap();
        assert_eq!(endpoints[1].buffered(), 0);
        assert_eq!(endpoints[0].try_recv().unwrap(), Some(frame(1)));
    }

    #[test]
    fn test_send_to_unknown_host() {
        let endpoints = InProcessNetwork::build(2);
        let err = endpoints[0].send(5, frame(0)).unwrap_err();
        assert!(matches!(err, StatError::Transport(_)));
    }

    #[test]
    fn test_flush_to_dropped_peer() {
        let mut endpoints = InProcessNetwork::build(2);
        let peer = endpoints.pop().unwrap();
        drop(endpoints);

        peer.send(0, frame(1)).unwrap();
        assert!(matches!(peer.flush(), Err(StatError::Transport(_))));
    }

    #[test]
    fn test_endpoints_move_across_threads() {
        let mut endpoints = InProcessNetwork::build(2);
        let peer = endpoints.pop().unwrap();
        let sink = endpoints.pop().unwrap();

        std::thread::spawn(move || {
            peer.send(0, frame(1)).unwrap();
            peer.flush().unwrap();
        })
        .join()
        .unwrap();

        assert_eq!(sink.queued(), 1);
    }
}
