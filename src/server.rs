//! One-shot TCP server for the line protocol.
//!
//! Binds, accepts a single connection, and answers every line with
//! `Sent: <line>` until the client sends `Exit`. The connection and the
//! listening socket are closed when [`Server::run`] returns; a second client
//! is never accepted.

use crate::config::{resolve_addr, ServerConfig};
use crate::error::Error;
use crate::protocol::{is_sentinel, read_line, reply_for, write_line};
use std::io::{self, BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener};
use tracing::{debug, info, trace, warn};

/// Pending-connection queue length for the listener.
const LISTEN_BACKLOG: i32 = 50;

/// What happened during a completed session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    /// Address of the client that was served.
    pub peer: SocketAddr,
    /// Lines received, the closing `Exit` included.
    pub lines: usize,
}

/// Server instance holding the bound listener.
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl Server {
    /// Bind the listening socket described by `config`.
    pub fn bind(config: &ServerConfig) -> Result<Self, Error> {
        let addr = resolve_addr(&config.listen)?;
        let listener = create_listener(addr)?;
        let local_addr = listener.local_addr()?;

        info!(address = %local_addr, "Server listening");

        Ok(Server {
            listener,
            local_addr,
        })
    }

    /// Address the listener is actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept one client and serve it until `Exit`.
    ///
    /// Consumes the server: the listener is closed once the session ends,
    /// whether it ended cleanly or with an error.
    pub fn run<C: Write>(self, console: &mut C) -> Result<SessionSummary, Error> {
        print_console(console, &format!("Port: {}", self.local_addr.port()));

        let (stream, peer) = self.listener.accept()?;
        info!(peer = %peer, "Client connected");
        print_console(console, &format!("Client: {peer}"));

        let reader = BufReader::new(stream.try_clone()?);
        let mut writer = stream;
        let lines = serve_session(reader, &mut writer, console)?;

        info!(peer = %peer, lines, "Session ended");
        Ok(SessionSummary { peer, lines })
    }
}

/// Serve one session over an already-established stream.
///
/// Each received line is printed to `console` and answered with
/// `Sent: <line>`. Returns the number of lines handled after replying to
/// `Exit`. End-of-stream before `Exit` is [`Error::PeerClosed`]; a console
/// that cannot be written to does not interrupt the session.
pub fn serve_session<R, W, C>(mut reader: R, writer: &mut W, console: &mut C) -> Result<usize, Error>
where
    R: BufRead,
    W: Write,
    C: Write,
{
    let mut lines = 0;

    loop {
        let Some(line) = read_line(&mut reader)? else {
            warn!(lines, "Connection closed before Exit");
            return Err(Error::PeerClosed);
        };
        lines += 1;
        debug!(line = %line, "Received line");

        print_console(console, &line);

        let reply = reply_for(&line);
        write_line(writer, &reply)?;
        trace!(reply = %reply, "Sent reply");

        if is_sentinel(&line) {
            return Ok(lines);
        }
    }
}

/// Print one line on the operator console.
///
/// Console output is not part of the wire exchange, so failures are only
/// logged.
fn print_console<C: Write>(console: &mut C, text: &str) {
    if let Err(e) = writeln!(console, "{text}").and_then(|()| console.flush()) {
        warn!(error = %e, "Failed to write to console");
    }
}

/// Create a blocking TCP listener with SO_REUSEADDR set.
fn create_listener(addr: SocketAddr) -> io::Result<TcpListener> {
    let socket = socket2::Socket::new(
        match addr {
            SocketAddr::V4(_) => socket2::Domain::IPV4,
            SocketAddr::V6(_) => socket2::Domain::IPV6,
        },
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.listen(LISTEN_BACKLOG)?;

    Ok(socket.into())
}
