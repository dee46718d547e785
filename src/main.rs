use redis_rust_server::{cli, server};

#[tokio::main]
async fn main() {
    let options = cli::parse_options();

    if let Err(err) = server::start(options).await {
        eprintln!("server exited with error: {}", err);
        std::process::exit(1);
    }
}
