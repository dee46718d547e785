//! Library surface for the binary in `main.rs`, and the seam integration
//! tests under `tests/` drive: a full master (and, where exercised, a
//! replica) started in-process against loopback sockets.

pub mod cli;
pub mod protocol;
pub mod server;
