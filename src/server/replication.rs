use crate::protocol::Value;
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::sync::mpsc::UnboundedSender;

/// The set of connections that have registered as attached replicas
/// (via `REPLCONF listening-port`), keyed by peer address so repeated
/// registration from the same connection is a no-op.
///
/// Owned by the single dispatcher task, so fan-out needs no locking.
#[derive(Default)]
pub struct ReplicaRegistry {
    writers: HashMap<SocketAddr, UnboundedSender<Value>>,
}

impl ReplicaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, peer: SocketAddr, writer: UnboundedSender<Value>) {
        self.writers.insert(peer, writer);
    }

    pub fn len(&self) -> usize {
        self.writers.len()
    }

    /// Writes `value` to every attached replica. A replica whose channel
    /// has closed (connection gone) is dropped from the registry instead
    /// of aborting propagation to the others.
    pub fn propagate(&mut self, value: &Value) {
        self.writers.retain(|_, writer| writer.send(value.clone()).is_ok());
    }
}
