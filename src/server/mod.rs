mod connection;
pub mod database;
pub mod dispatcher;
mod handshake;
mod listener;
pub mod replication;

use crate::cli::StartupOptions;
use crate::protocol::RedisError;

pub use dispatcher::Role;

/// Wires up the dispatcher, the listener and (if configured as a replica)
/// the handshake driver, and runs until the listener task exits.
pub async fn start(options: StartupOptions) -> Result<(), RedisError> {
    let role = match &options.replica_of {
        Some(_) => Role::Slave,
        None => Role::Master,
    };

    let dispatcher = dispatcher::Dispatcher::start(role);
    let listener = listener::start(options.port, dispatcher.clone());

    if let Some((host, port)) = options.replica_of.clone() {
        let dispatcher = dispatcher.clone();
        let own_port = options.port;
        tokio::spawn(async move {
            if let Err(err) = handshake::run(&host, port, own_port, dispatcher).await {
                eprintln!("replication handshake failed: {}", err);
            }
        });
    }

    listener
        .await
        .map_err(|err| RedisError::Unexpected(anyhow::Error::new(err)))??;

    Ok(())
}
