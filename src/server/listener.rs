use tokio::net::TcpListener;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::{JoinHandle, JoinSet};

use super::connection::run_client_connection;
use super::dispatcher::DispatchRequest;
use crate::protocol::RedisError;

/// Accepts connections on `port` and spawns one task per connection, each
/// driving its own read/dispatch/write loop against the shared dispatcher.
pub fn start(port: u16, dispatcher: UnboundedSender<DispatchRequest>) -> JoinHandle<Result<(), RedisError>> {
    tokio::spawn(async move {
        listen(port, dispatcher)
            .await
            .map_err(|err| RedisError::Unexpected(anyhow::Error::new(err)))
    })
}

async fn listen(port: u16, dispatcher: UnboundedSender<DispatchRequest>) -> std::io::Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await?;
    println!("listening on {}", listener.local_addr().unwrap());

    let mut connections = JoinSet::new();

    loop {
        match listener.accept().await {
            Ok((socket, peer_addr)) => {
                println!("accepted connection from {}", peer_addr);
                let dispatcher = dispatcher.clone();
                connections.spawn(async move {
                    run_client_connection(socket, peer_addr, dispatcher).await;
                });
            }
            Err(err) => {
                println!("error accepting connection; shutting down: {}", err);
                break;
            }
        }
    }

    while connections.join_next().await.is_some() {}
    Ok(())
}
