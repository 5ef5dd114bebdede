//! Little-endian cursor and escape coding for node payloads
//!
//! Strings are written as UTF-8. Stored bytes that are not valid UTF-8 are
//! read as Latin-1, so such a string comes back as UTF-8 once re-saved.

use std::io::{self, Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::persistence::format::{ESCAPE, NODE_END, NODE_START};
use crate::persistence::{PersistenceError, PersistenceResult};

/// Check if a byte must be escaped inside a payload
#[inline]
pub fn is_reserved(byte: u8) -> bool {
    byte == NODE_START || byte == NODE_END || byte == ESCAPE
}

/// Escape reserved bytes
pub fn escape(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    for &byte in bytes {
        if is_reserved(byte) {
            out.push(ESCAPE);
        }
        out.push(byte);
    }
    out
}

/// Undo [`escape`]; a trailing lone escape byte is an error
pub fn unescape(bytes: &[u8]) -> PersistenceResult<Vec<u8>> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut iter = bytes.iter().enumerate();
    while let Some((offset, &byte)) = iter.next() {
        if byte == ESCAPE {
            match iter.next() {
                Some((_, &escaped)) => out.push(escaped),
                None => {
                    return Err(PersistenceError::MalformedNode {
                        offset,
                        reason: "dangling escape byte",
                    })
                }
            }
        } else {
            out.push(byte);
        }
    }
    Ok(out)
}

/// Offset of the first unescaped marker at or after `from`
pub fn scan_payload(data: &[u8], from: usize) -> PersistenceResult<usize> {
    let mut i = from;
    while i < data.len() {
        match data[i] {
            ESCAPE => {
                if i + 1 >= data.len() {
                    return Err(PersistenceError::MalformedNode {
                        offset: i,
                        reason: "dangling escape byte",
                    });
                }
                i += 2;
            }
            NODE_START | NODE_END => return Ok(i),
            _ => i += 1,
        }
    }
    Err(PersistenceError::MalformedNode {
        offset: from,
        reason: "unterminated node",
    })
}

/// Offset just past the end marker of the node starting at `start`
pub fn skip_subtree(data: &[u8], start: usize) -> PersistenceResult<usize> {
    let mut depth = 0usize;
    let mut i = start;
    while i < data.len() {
        match data[i] {
            ESCAPE => i += 2,
            NODE_START => {
                depth += 1;
                i += 1;
            }
            NODE_END => {
                depth = depth.saturating_sub(1);
                i += 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
            _ => i += 1,
        }
    }
    Err(PersistenceError::MalformedNode {
        offset: start,
        reason: "unterminated node",
    })
}

fn eof(err: io::Error) -> PersistenceError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        PersistenceError::UnexpectedEof
    } else {
        PersistenceError::IoError(err)
    }
}

/// Decode string bytes, mapping non UTF-8 input byte-for-char
///
/// The Latin-1 fallback is one way: the resulting `String` encodes each
/// byte above 0x7F as two UTF-8 bytes when written back.
pub fn decode_string(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => e.into_bytes().into_iter().map(char::from).collect(),
    }
}

/// Sequential reader over an unescaped payload
#[derive(Debug, Clone, Default)]
pub struct ByteCursor {
    inner: Cursor<Vec<u8>>,
}

impl ByteCursor {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            inner: Cursor::new(bytes),
        }
    }

    /// The whole payload, read or not
    pub fn as_slice(&self) -> &[u8] {
        self.inner.get_ref()
    }

    pub fn position(&self) -> usize {
        self.inner.position() as usize
    }

    pub fn len(&self) -> usize {
        self.inner.get_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn remaining(&self) -> usize {
        self.len().saturating_sub(self.position())
    }

    pub fn get_u8(&mut self) -> PersistenceResult<u8> {
        self.inner.read_u8().map_err(eof)
    }

    pub fn get_u16(&mut self) -> PersistenceResult<u16> {
        self.inner.read_u16::<LittleEndian>().map_err(eof)
    }

    pub fn get_u32(&mut self) -> PersistenceResult<u32> {
        self.inner.read_u32::<LittleEndian>().map_err(eof)
    }

    /// `u16` length followed by that many bytes
    pub fn get_string(&mut self) -> PersistenceResult<String> {
        let len = usize::from(self.get_u16()?);
        if self.remaining() < len {
            return Err(PersistenceError::UnexpectedEof);
        }
        let mut bytes = vec![0u8; len];
        self.inner.read_exact(&mut bytes).map_err(eof)?;
        Ok(decode_string(bytes))
    }

    pub fn skip(&mut self, n: usize) -> PersistenceResult<()> {
        if self.remaining() < n {
            return Err(PersistenceError::UnexpectedEof);
        }
        self.inner.set_position((self.position() + n) as u64);
        Ok(())
    }
}

/// Writer adapter that escapes every byte passed through it
pub struct EscapeWriter<W: Write> {
    inner: W,
    written: u64,
}

impl<W: Write> EscapeWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    /// Write bytes verbatim, used for node markers
    pub fn write_raw(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.inner.write_all(bytes)?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    /// Bytes written to the inner writer so far
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for EscapeWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let escaped = escape(buf);
        self.write_raw(&escaped)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
