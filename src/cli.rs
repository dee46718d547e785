//! Command-line argument parsing: `--port|-p <int>` and
//! `--replicaof "<host> <port>"`. Out of scope for correctness guarantees —
//! a malformed value is silently ignored and the default is kept, matching
//! the teacher's own forgiving `parse_args`.

const DEFAULT_PORT: u16 = 6379;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StartupOptions {
    pub port: u16,
    pub replica_of: Option<(String, u16)>,
}

#[derive(Clone, Copy)]
enum ArgState {
    Normal,
    Port,
    ReplicaOf,
}

pub fn parse_options() -> StartupOptions {
    parse_from(std::env::args().skip(1))
}

fn parse_from(args: impl Iterator<Item = String>) -> StartupOptions {
    let mut state = ArgState::Normal;
    let mut port: Option<u16> = None;
    let mut replica_of: Option<(String, u16)> = None;

    for arg in args {
        match (state, arg.as_str()) {
            (ArgState::Normal, "--port") | (ArgState::Normal, "-p") => state = ArgState::Port,
            (ArgState::Normal, "--replicaof") => state = ArgState::ReplicaOf,
            (ArgState::Port, value) => {
                port = value.parse().ok();
                state = ArgState::Normal;
            }
            (ArgState::ReplicaOf, value) => {
                replica_of = parse_replica_of(value);
                state = ArgState::Normal;
            }
            (_, value) => eprintln!("ignoring invalid argument: {}", value),
        }
    }

    StartupOptions {
        port: port.unwrap_or(DEFAULT_PORT),
        replica_of,
    }
}

/// Splits `"<host> <port>"` into its two tokens. Anything else is ignored
/// (the server starts as a master).
fn parse_replica_of(value: &str) -> Option<(String, u16)> {
    let mut parts = value.split_whitespace();
    let host = parts.next()?.to_string();
    let port: u16 = parts.next()?.parse().ok()?;
    Some((host, port))
}
