//! Length-prefixed framing.
//!
//! ```text
//! <decimal byte length>\n<payload>[\n]
//! ```
//!
//! The trailing newline after a payload is optional on input and always
//! written on output. Blank lines between frames are skipped. A header
//! line longer than [`MAX_HEADER_BYTES`] is rejected and skipped up to its
//! newline without being buffered.

use std::io::{self, BufRead, Read, Write};

/// Longest accepted header line, newline included.
pub const MAX_HEADER_BYTES: usize = 32;

/// Result of reading one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A complete UTF-8 payload.
    Payload(String),
    /// A frame that was consumed but cannot be handled; the reason is
    /// sent back as an error response.
    Invalid(String),
}

/// Reads frames from a buffered input.
pub struct FrameReader<R> {
    inner: R,
    max_frame_bytes: usize,
}

impl<R: BufRead> FrameReader<R> {
    /// Creates a reader that rejects payloads longer than `max_frame_bytes`.
    pub fn new(inner: R, max_frame_bytes: usize) -> Self {
        Self {
            inner,
            max_frame_bytes,
        }
    }

    /// Reads the next frame. `Ok(None)` means end of input.
    pub fn read_frame(&mut self) -> io::Result<Option<Frame>> {
        let header = loop {
            let mut line = Vec::new();
            let limit = MAX_HEADER_BYTES as u64;
            if (&mut self.inner).take(limit).read_until(b'\n', &mut line)? == 0 {
                return Ok(None);
            }
            if line.len() == MAX_HEADER_BYTES && line.last() != Some(&b'\n') {
                let skipped = self.skip_line()?;
                tracing::warn!(bytes = line.len() as u64 + skipped, "frame header too long");
                return Ok(Some(Frame::Invalid(format!(
                    "frame header longer than {MAX_HEADER_BYTES} bytes"
                ))));
            }
            let text = String::from_utf8_lossy(&line);
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                break trimmed.to_string();
            }
        };

        let len: usize = match header.parse() {
            Ok(len) => len,
            Err(_) => {
                return Ok(Some(Frame::Invalid(format!(
                    "invalid frame header '{header}': expected a byte length"
                ))))
            }
        };

        if len > self.max_frame_bytes {
            let drained = io::copy(&mut (&mut self.inner).take(len as u64), &mut io::sink())?;
            if drained < len as u64 {
                tracing::warn!(len, drained, "input ended inside an oversized frame");
                return Ok(None);
            }
            return Ok(Some(Frame::Invalid(format!(
                "frame of {len} bytes exceeds the limit of {} bytes",
                self.max_frame_bytes
            ))));
        }

        let mut payload = vec![0u8; len];
        match self.inner.read_exact(&mut payload) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
                tracing::warn!(len, "input ended inside a frame");
                return Ok(None);
            }
            Err(err) => return Err(err),
        }

        match String::from_utf8(payload) {
            Ok(text) => Ok(Some(Frame::Payload(text))),
            Err(_) => Ok(Some(Frame::Invalid("frame payload is not valid UTF-8".to_string()))),
        }
    }

    /// Discards input through the next newline (or end of input).
    fn skip_line(&mut self) -> io::Result<u64> {
        let mut skipped = 0u64;
        loop {
            let buf = self.inner.fill_buf()?;
            if buf.is_empty() {
                return Ok(skipped);
            }
            match buf.iter().position(|&b| b == b'\n') {
                Some(pos) => {
                    self.inner.consume(pos + 1);
                    return Ok(skipped + pos as u64 + 1);
                }
                None => {
                    let len = buf.len();
                    self.inner.consume(len);
                    skipped += len as u64;
                }
            }
        }
    }
}

/// Writes frames to an output.
pub struct FrameWriter<W> {
    inner: W,
}

impl<W: Write> FrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Writes one frame and flushes.
    pub fn write_frame(&mut self, payload: &str) -> io::Result<()> {
        write!(self.inner, "{}\n{}\n", payload.len(), payload)?;
        self.inner.flush()
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}
