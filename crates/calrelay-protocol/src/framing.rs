//! Newline-delimited JSON framing for IPC.
//!
//! One message per line: compact JSON followed by `\n`. serde_json never
//! emits raw newlines inside a compact document, so the line boundary is
//! unambiguous. A maximum line length guards against unbounded reads.

use std::io::{BufRead, Read, Write};

use serde::{Serialize, de::DeserializeOwned};

use crate::MAX_LINE_BYTES;
use crate::error::{ProtocolError, ProtocolResult};

/// Encodes a message as a single JSON line, terminated by `\n`.
pub fn encode_line<T: Serialize>(message: &T) -> ProtocolResult<Vec<u8>> {
    let mut line = serde_json::to_vec(message)?;
    if line.len() > MAX_LINE_BYTES {
        return Err(ProtocolError::LineTooLong {
            size: line.len(),
            max: MAX_LINE_BYTES,
        });
    }
    line.push(b'\n');
    Ok(line)
}

/// Decodes a message from a single line.
///
/// Trailing `\n` / `\r\n` is tolerated; a blank line is an error.
pub fn decode_line<T: DeserializeOwned>(line: &[u8]) -> ProtocolResult<T> {
    let trimmed = trim_line(line);
    if trimmed.is_empty() {
        return Err(ProtocolError::EmptyMessage);
    }
    if trimmed.len() > MAX_LINE_BYTES {
        return Err(ProtocolError::LineTooLong {
            size: trimmed.len(),
            max: MAX_LINE_BYTES,
        });
    }
    Ok(serde_json::from_slice(trimmed)?)
}

fn trim_line(line: &[u8]) -> &[u8] {
    let mut end = line.len();
    while end > 0 && (line[end - 1] == b'\n' || line[end - 1] == b'\r') {
        end -= 1;
    }
    &line[..end]
}

/// Reads line-framed messages from a byte stream.
pub struct LineReader<R> {
    reader: R,
    buffer: Vec<u8>,
}

impl<R: BufRead> LineReader<R> {
    /// Creates a new LineReader wrapping the given reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
        }
    }

    /// Reads a single message line.
    ///
    /// Returns `Ok(None)` on clean EOF before any bytes were read.
    pub fn read_message<T: DeserializeOwned>(&mut self) -> ProtocolResult<Option<T>> {
        self.buffer.clear();
        // Cap the read so a missing newline cannot grow the buffer forever.
        let read = (&mut self.reader)
            .take(MAX_LINE_BYTES as u64 + 1)
            .read_until(b'\n', &mut self.buffer)?;
        if read == 0 {
            return Ok(None);
        }
        if self.buffer.len() > MAX_LINE_BYTES {
            return Err(ProtocolError::LineTooLong {
                size: self.buffer.len(),
                max: MAX_LINE_BYTES,
            });
        }
        decode_line(&self.buffer).map(Some)
    }

    /// Unwraps this LineReader, returning the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

/// Writes line-framed messages to a byte stream.
pub struct LineWriter<W> {
    writer: W,
}

impl<W: Write> LineWriter<W> {
    /// Creates a new LineWriter wrapping the given writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes a single message line.
    pub fn write_message<T: Serialize>(&mut self, message: &T) -> ProtocolResult<()> {
        let line = encode_line(message)?;
        self.writer.write_all(&line)?;
        Ok(())
    }

    /// Flushes the underlying writer.
    pub fn flush(&mut self) -> ProtocolResult<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Unwraps this LineWriter, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Envelope, Request, Response};
    use std::io::Cursor;

    #[test]
    fn encode_decode_roundtrip() {
        let envelope = Envelope::request("req-123", Request::Ping);
        let line = encode_line(&envelope).unwrap();
        assert_eq!(*line.last().unwrap(), b'\n');

        let decoded: Envelope<Request> = decode_line(&line).unwrap();
        assert_eq!(envelope, decoded);
    }

    #[test]
    fn decode_tolerates_crlf() {
        let envelope = Envelope::request("req-1", Request::Status);
        let mut line = serde_json::to_vec(&envelope).unwrap();
        line.extend_from_slice(b"\r\n");

        let decoded: Envelope<Request> = decode_line(&line).unwrap();
        assert_eq!(envelope, decoded);
    }

    #[test]
    fn decode_empty_line_is_error() {
        let result: ProtocolResult<Envelope<Request>> = decode_line(b"\n");
        assert!(matches!(result, Err(ProtocolError::EmptyMessage)));
    }

    #[test]
    fn decode_garbage_is_serialization_error() {
        let result: ProtocolResult<Envelope<Request>> = decode_line(b"not json\n");
        assert!(matches!(result, Err(ProtocolError::Serialization(_))));
    }

    #[test]
    fn reader_single_message() {
        let envelope = Envelope::request("req-1", Request::Ping);
        let line = encode_line(&envelope).unwrap();

        let mut reader = LineReader::new(Cursor::new(line));
        let decoded: Option<Envelope<Request>> = reader.read_message().unwrap();
        assert_eq!(decoded.unwrap(), envelope);
    }

    #[test]
    fn reader_empty_stream() {
        let mut reader = LineReader::new(Cursor::new(Vec::new()));
        let result: Option<Envelope<Request>> = reader.read_message().unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn reader_multiple_messages() {
        let msg1 = Envelope::request("req-1", Request::Ping);
        let msg2 = Envelope::request("req-2", Request::ReplayPending);

        let mut bytes = encode_line(&msg1).unwrap();
        bytes.extend(encode_line(&msg2).unwrap());

        let mut reader = LineReader::new(Cursor::new(bytes));
        let decoded1: Envelope<Request> = reader.read_message().unwrap().unwrap();
        let decoded2: Envelope<Request> = reader.read_message().unwrap().unwrap();
        assert_eq!(decoded1, msg1);
        assert_eq!(decoded2, msg2);

        let eof: Option<Envelope<Request>> = reader.read_message().unwrap();
        assert!(eof.is_none());
    }

    #[test]
    fn reader_rejects_oversized_line() {
        let mut bytes = vec![b'x'; MAX_LINE_BYTES + 10];
        bytes.push(b'\n');

        let mut reader = LineReader::new(Cursor::new(bytes));
        let result: ProtocolResult<Option<Envelope<Request>>> = reader.read_message();
        assert!(matches!(result, Err(ProtocolError::LineTooLong { .. })));
    }

    #[test]
    fn writer_reader_roundtrip() {
        let responses = vec![
            Envelope::response("1", Response::Pong),
            Envelope::response("2", Response::Ok),
            Envelope::response("3", Response::replayed(2)),
        ];

        let mut buffer = Vec::new();
        {
            let mut writer = LineWriter::new(&mut buffer);
            for resp in &responses {
                writer.write_message(resp).unwrap();
            }
            writer.flush().unwrap();
        }

        let mut reader = LineReader::new(Cursor::new(buffer));
        for expected in &responses {
            let actual: Envelope<Response> = reader.read_message().unwrap().unwrap();
            assert_eq!(&actual, expected);
        }
    }
}
