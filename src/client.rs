//! Console client for the line protocol.
//!
//! Prompts for a line, sends it, prints the server's reply, and repeats until
//! the user types `Exit`. Any I/O failure ends the run; there is no
//! reconnection.

use crate::config::{resolve_addr, ClientConfig};
use crate::error::Error;
use crate::protocol::{is_sentinel, read_line, write_line};
use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpStream};
use tracing::{debug, info};

/// Prompt shown before every console read.
pub const PROMPT: &str = "Type Message or Exit ";

/// What happened during a completed client run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSummary {
    /// Request/reply pairs completed, the closing `Exit` included.
    pub exchanges: usize,
}

/// A connected client.
pub struct Client {
    stream: TcpStream,
    peer: SocketAddr,
}

impl Client {
    /// Connect to the server named in `config`.
    pub fn connect(config: &ClientConfig) -> Result<Self, Error> {
        let addr = resolve_addr(&config.connect)?;
        let stream = TcpStream::connect(addr)?;

        info!(peer = %addr, "Connected to server");

        Ok(Client { stream, peer: addr })
    }

    /// Address of the server this client is connected to.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Run the prompt/send/print loop until `Exit`.
    ///
    /// Consumes the client; the connection is closed when this returns.
    pub fn run<I, O>(self, input: &mut I, output: &mut O) -> Result<ClientSummary, Error>
    where
        I: BufRead,
        O: Write,
    {
        writeln!(output, "Connection Established")?;

        let reader = BufReader::new(self.stream.try_clone()?);
        let mut writer = self.stream;
        let exchanges = run_session(reader, &mut writer, input, output)?;

        info!(peer = %self.peer, exchanges, "Session ended");
        Ok(ClientSummary { exchanges })
    }
}

/// Drive one client session over an already-established stream.
///
/// `input` is the console the user types into, `output` the console replies
/// are printed to. The loop ends after the reply to `Exit` has been printed.
pub fn run_session<R, W, I, O>(
    mut reader: R,
    writer: &mut W,
    input: &mut I,
    output: &mut O,
) -> Result<usize, Error>
where
    R: BufRead,
    W: Write,
    I: BufRead,
    O: Write,
{
    let mut exchanges = 0;

    loop {
        write!(output, "{PROMPT}")?;
        output.flush()?;

        let message = read_line(input)?.ok_or(Error::ConsoleClosed)?;
        write_line(writer, &message)?;
        debug!(message = %message, "Sent line");

        let reply = read_line(&mut reader)?.ok_or(Error::PeerClosed)?;
        writeln!(output, "{reply}")?;
        output.flush()?;
        exchanges += 1;

        if is_sentinel(&message) {
            return Ok(exchanges);
        }
    }
}
