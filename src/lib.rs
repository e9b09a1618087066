//! linecho: a one-shot line echo server and its console client.
//!
//! The server accepts a single TCP connection and answers every line it
//! receives with `Sent: <line>`. The client reads lines from the console,
//! sends them, and prints each reply. Typing `Exit` ends the session on
//! both sides.
//!
//! Features:
//! - Lock-step, newline-delimited request/response over blocking sockets
//! - Exactly one session per server run
//! - Configuration via CLI arguments, environment or TOML file

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod protocol;
pub mod server;

pub use error::Error;
