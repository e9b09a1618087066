//! Line protocol shared by the server and the client.
//!
//! The wire format is plain newline-delimited text:
//!
//! ```text
//! Request:  <line>\n
//! Response: Sent: <line>\n
//!
//! Example:
//! Request:  hello\n
//! Response: Sent: hello\n
//! ```
//!
//! The line `Exit` ends the session on whichever side observes it. The server
//! still replies to it (`Sent: Exit`) before closing.

use std::io::{self, BufRead, Write};

/// Line that terminates the session.
pub const SENTINEL: &str = "Exit";

/// Prefix the server puts in front of every echoed line.
pub const REPLY_PREFIX: &str = "Sent: ";

/// Port used when an address is given without one.
pub const DEFAULT_PORT: u16 = 1234;

/// Check whether a line is the session sentinel.
///
/// Case-sensitive, no trimming: ` Exit` and `exit` are ordinary lines.
pub fn is_sentinel(line: &str) -> bool {
    line == SENTINEL
}

/// Build the server's reply for a received line.
pub fn reply_for(line: &str) -> String {
    format!("{REPLY_PREFIX}{line}")
}

/// Strip one trailing `\n` (and a `\r` right before it) from a raw line.
pub fn strip_terminator(raw: &[u8]) -> &[u8] {
    let raw = match raw.split_last() {
        Some((b'\n', rest)) => rest,
        _ => return raw,
    };
    match raw.split_last() {
        Some((b'\r', rest)) => rest,
        _ => raw,
    }
}

/// Read one line, blocking until the terminator or end-of-stream.
///
/// Returns `Ok(None)` when the stream ended before any byte of a new line
/// arrived. A trailing line without terminator is still returned.
/// Invalid UTF-8 is replaced rather than rejected.
pub fn read_line<R: BufRead>(reader: &mut R) -> io::Result<Option<String>> {
    let mut raw = Vec::with_capacity(128);
    let n = reader.read_until(b'\n', &mut raw)?;
    if n == 0 {
        return Ok(None);
    }

    let line = String::from_utf8_lossy(strip_terminator(&raw)).into_owned();
    Ok(Some(line))
}

/// Write one line followed by `\n` and flush it out immediately.
pub fn write_line<W: Write>(writer: &mut W, line: &str) -> io::Result<()> {
    writer.write_all(line.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()
}
