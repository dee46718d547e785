use std::net::SocketAddr;

use rand::distributions::Alphanumeric;
use rand::Rng;
use tokio::sync::mpsc::{self, UnboundedSender};

use super::database::{Database, SetOutcome};
use super::replication::ReplicaRegistry;
use crate::protocol::{Command, Value, EMPTY_RDB};

/// This server's replication role, fixed at startup by whether
/// `--replicaof` was given.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Master,
    Slave,
}

/// The fixed replid `PSYNC` answers with. Per the design, `INFO`'s
/// `master_replid` is generated fresh on every call instead — the two are
/// allowed to disagree (see DESIGN.md).
const FULLRESYNC_REPLID: &str = "8371b4fb1155b71f4a04d3e1bc3e18c4a990aeeb";

/// A unit of work sent to the dispatcher task.
pub enum DispatchRequest {
    /// A command read from a normal (non replica-inbound) client
    /// connection. `reply_tx` carries the reply values back to that
    /// connection's writer task.
    Client {
        peer: SocketAddr,
        command: Command,
        reply_tx: UnboundedSender<Value>,
    },

    /// A write command applied from the replication stream. Replica-inbound
    /// connections never get a dispatcher-issued reply (the connection loop
    /// answers `REPLCONF GETACK` itself, locally), so there is no reply
    /// channel here.
    ApplyReplicated(Command),
}

/// Owns the keyspace and the attached-replica registry as a single actor
/// task, so neither needs a lock — the same shape as the teacher's command
/// handler task, generalized to the full command table and to replication
/// fan-out.
pub struct Dispatcher {
    database: Database,
    replicas: ReplicaRegistry,
    role: Role,
}

impl Dispatcher {
    pub fn new(role: Role) -> Self {
        Self {
            database: Database::new(),
            replicas: ReplicaRegistry::new(),
            role,
        }
    }

    /// Spawns the dispatcher task and returns the sender clients hand
    /// requests to.
    pub fn start(role: Role) -> UnboundedSender<DispatchRequest> {
        let (tx, mut rx) = mpsc::unbounded_channel::<DispatchRequest>();

        tokio::spawn(async move {
            let mut dispatcher = Dispatcher::new(role);
            println!("started command dispatcher task");

            while let Some(request) = rx.recv().await {
                match request {
                    DispatchRequest::Client {
                        peer,
                        command,
                        reply_tx,
                    } => {
                        let is_write = command.is_write();
                        let response = dispatcher.handle(peer, command.clone(), &reply_tx);

                        let mut reply_failed = false;
                        for value in response {
                            if reply_tx.send(value).is_err() {
                                reply_failed = true;
                                break;
                            }
                        }

                        // Propagate only after the client reply is on its
                        // way, and only commands that actually mutated the
                        // keyspace.
                        if is_write && !reply_failed {
                            dispatcher.replicas.propagate(&command.to_value());
                        }
                    }
                    DispatchRequest::ApplyReplicated(command) => {
                        dispatcher.apply_replicated(command);
                    }
                }
            }

            println!("command dispatcher task finished");
        });

        tx
    }

    /// Handles one command from a normal client connection, returning the
    /// values to send back (empty means "no reply", as with `SET` on an
    /// existing key).
    fn handle(
        &mut self,
        peer: SocketAddr,
        command: Command,
        reply_tx: &UnboundedSender<Value>,
    ) -> Vec<Value> {
        match command {
            Command::Ping { message, .. } => self.ping(message),
            Command::Echo { message, .. } => vec![Value::BulkString(message)],
            Command::Get { key, .. } => self.get(&key),
            Command::Set {
                key,
                value,
                expiry_ms,
                ..
            } => self.set(key, value, expiry_ms),
            Command::Del { keys, .. } => self.del(&keys),
            Command::Info { sections, .. } => self.info(&sections),
            Command::Replconf { key, value, .. } => self.replconf(peer, &key, &value, reply_tx),
            Command::Psync { .. } => self.psync(),
        }
    }

    /// Applies a command received over the replication stream. The keyspace
    /// is mutated the same way a local client would, but there is no reply
    /// and no further propagation — this connection *is* the fan-out.
    fn apply_replicated(&mut self, command: Command) {
        match command {
            Command::Set {
                key,
                value,
                expiry_ms,
                ..
            } => {
                self.database.set(key, value, expiry_ms);
            }
            Command::Del { keys, .. } => {
                for key in &keys {
                    self.database.del(key);
                }
            }
            _ => {}
        }
    }

    fn ping(&self, message: Option<Vec<u8>>) -> Vec<Value> {
        let reply = match message {
            None => Value::simple_string("PONG"),
            Some(message) => Value::BulkString(message),
        };
        vec![reply]
    }

    fn get(&mut self, key: &[u8]) -> Vec<Value> {
        match self.database.get(key) {
            Some(value) => vec![Value::BulkString(value)],
            None => vec![Value::NullBulkString],
        }
    }

    fn set(&mut self, key: Vec<u8>, value: Vec<u8>, expiry_ms: Option<u64>) -> Vec<Value> {
        match self.database.set(key, value, expiry_ms) {
            SetOutcome::Stored => vec![Value::ok()],
            SetOutcome::AlreadyExists => vec![],
        }
    }

    fn del(&mut self, keys: &[Vec<u8>]) -> Vec<Value> {
        let removed = keys.iter().filter(|key| self.database.del(key)).count();
        vec![Value::Integer(removed as i64)]
    }

    fn info(&self, sections: &[Vec<u8>]) -> Vec<Value> {
        let wants_replication = sections.is_empty()
            || sections
                .iter()
                .any(|section| section.eq_ignore_ascii_case(b"replication"));

        if !wants_replication {
            return vec![Value::BulkString(Vec::new())];
        }

        let mut lines = Vec::new();
        match self.role {
            Role::Master => {
                lines.push("role:master".to_string());
                lines.push(format!("master_replid:{}", random_replid()));
                lines.push("master_repl_offset:0".to_string());
            }
            Role::Slave => {
                lines.push("role:slave".to_string());
                lines.push(format!("master_replid:{}", random_replid()));
                lines.push("master_repl_offset:0".to_string());
            }
        }

        vec![Value::bulk_string(&lines.join("\r\n"))]
    }

    fn replconf(
        &mut self,
        peer: SocketAddr,
        key: &[u8],
        _value: &[u8],
        reply_tx: &UnboundedSender<Value>,
    ) -> Vec<Value> {
        match key {
            b"listening-port" => {
                self.replicas.register(peer, reply_tx.clone());
                vec![Value::ok()]
            }
            b"capa" => vec![Value::ok()],
            // GETACK only ever arrives on a replica's own master-facing
            // connection, which answers it locally (it needs the
            // connection's private replication offset, which the
            // dispatcher doesn't track). Nothing to do here.
            b"getack" => vec![],
            // ACK is the replica's reply to GETACK, received here on the
            // master side; it isn't itself answered.
            b"ack" => vec![],
            _ => vec![Value::ok()],
        }
    }

    fn psync(&self) -> Vec<Value> {
        vec![
            Value::simple_string(&format!("FULLRESYNC {} 0", FULLRESYNC_REPLID)),
            Value::RdbPayload(EMPTY_RDB.to_vec()),
        ]
    }
}

fn random_replid() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(40)
        .map(char::from)
        .collect()
}
