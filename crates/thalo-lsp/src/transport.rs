//! Content-Length message framing over stdio, per the LSP base protocol.
//! Read headers line by line until a blank line, then read exactly
//! `Content-Length` bytes of JSON body; write the mirror image.

use crate::protocol::{JsonRpcRequest, JsonRpcResponse};
use std::collections::HashMap;
use std::io::{self, BufRead, Write};

/// Reads one message. `Ok(None)` means EOF or a malformed frame — both
/// recoverable, the caller should stop or just skip it. `Err` is reserved
/// for actual I/O failure on the stream.
pub fn read_message<R: BufRead>(reader: &mut R) -> io::Result<Option<JsonRpcRequest>> {
    let mut headers = HashMap::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((key, value)) = line.split_once(": ") {
            headers.insert(key.to_string(), value.to_string());
        }
    }

    let Some(length) = headers.get("Content-Length").and_then(|v| v.parse::<usize>().ok()) else {
        return Ok(None);
    };
    let mut content = vec![0u8; length];
    reader.read_exact(&mut content)?;
    match serde_json::from_slice(&content) {
        Ok(request) => Ok(Some(request)),
        Err(e) => {
            tracing::warn!("thalo-lsp: malformed frame: {e}");
            Ok(None)
        }
    }
}

pub fn write_message<W: Write>(writer: &mut W, response: &JsonRpcResponse) -> io::Result<()> {
    write_json(writer, serde_json::to_string(response)?)
}

pub fn write_notification<W: Write>(writer: &mut W, notification: &serde_json::Value) -> io::Result<()> {
    write_json(writer, serde_json::to_string(notification)?)
}

fn write_json<W: Write>(writer: &mut W, content: String) -> io::Result<()> {
    write!(writer, "Content-Length: {}\r\n\r\n{}", content.len(), content)?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use std::io::BufReader;

    #[test]
    fn round_trips_a_request_through_framing() {
        let body = r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#;
        let framed = format!("Content-Length: {}\r\n\r\n{}", body.len(), body);
        let mut reader = BufReader::new(framed.as_bytes());
        let request = read_message(&mut reader).unwrap().expect("request");
        assert_eq!(request.method, "initialize");
    }

    #[test]
    fn truncated_frame_is_an_io_error_not_a_panic() {
        let framed = "Content-Length: 50\r\n\r\n{}";
        let mut reader = BufReader::new(framed.as_bytes());
        assert!(read_message(&mut reader).is_err());
    }

    #[test]
    fn missing_content_length_returns_none() {
        let framed = "X-Other: 1\r\n\r\n";
        let mut reader = BufReader::new(framed.as_bytes());
        assert_eq!(read_message(&mut reader).unwrap().is_none(), true);
    }
}
