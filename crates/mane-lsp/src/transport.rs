//! JSON-RPC/LSP stdio framing.
//!
//! Messages are JSON values framed by HTTP-like headers:
//!
//! ```text
//! Content-Length: <n>\r\n
//! \r\n
//! <n bytes of UTF-8 JSON>
//! ```

use serde_json::Value;
use std::io::{self, BufRead, Write};

/// Write a single framed JSON-RPC message to `writer`.
///
/// Header and body go out as one buffer followed by a flush.
pub fn write_message<W: Write>(writer: &mut W, value: &Value) -> io::Result<()> {
    let body = serde_json::to_vec(value)?;
    let mut frame = format!("Content-Length: {}\r\n\r\n", body.len()).into_bytes();
    frame.extend_from_slice(&body);
    writer.write_all(&frame)?;
    writer.flush()
}

/// Read a single framed JSON-RPC message from `reader`.
///
/// Returns `Ok(None)` on clean EOF between frames. Unknown headers are
/// skipped; a frame without `Content-Length` is an error.
pub fn read_message<R: BufRead>(reader: &mut R) -> io::Result<Option<Value>> {
    let Some(len) = read_frame_header(reader)? else {
        return Ok(None);
    };
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body)?;
    let value = serde_json::from_slice(&body)?;
    Ok(Some(value))
}

// Consume header lines up to the blank separator and return the announced
// body length. `Ok(None)` means EOF arrived before any header byte.
fn read_frame_header<R: BufRead>(reader: &mut R) -> io::Result<Option<usize>> {
    let mut content_length: Option<usize> = None;
    let mut at_frame_start = true;

    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            if at_frame_start {
                return Ok(None);
            }
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "eof inside frame header",
            ));
        }
        at_frame_start = false;

        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            break;
        }
        if let Some(value) = header_value(line, "Content-Length") {
            content_length = value.parse::<usize>().ok();
        }
    }

    match content_length {
        Some(len) => Ok(Some(len)),
        None => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "frame without Content-Length",
        )),
    }
}

// Header names are case-insensitive in practice.
fn header_value<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let (key, value) = line.split_once(':')?;
    key.trim().eq_ignore_ascii_case(name).then_some(value.trim())
}
