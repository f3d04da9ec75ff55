//! Frame transport - discrete length-prefixed binary frames over a duplex
//! byte channel.
//!
//! Wire layout per frame: 2-byte signed type, 4-byte signed length, then
//! exactly `length` payload bytes, all integers little-endian. Frames are
//! atomic: a short read at any of the three stages is a transport failure,
//! not a partial frame. There are no sequence numbers, checksums, retries
//! or timeouts; ordering and integrity are delegated to the underlying
//! channel (a local pipe), and failure is terminal for the channel.

use std::io::{Read, Write};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Result, WebViewError};

/// One message on the control channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Raw opcode value. Kept as the wire integer so protocol errors are
    /// detected at decode time, after the frame has been fully consumed.
    pub opcode: i16,
    pub payload: Vec<u8>,
}

/// Blocking reader for the receive side of a channel.
pub struct FrameReader<R: Read> {
    inner: R,
}

impl<R: Read> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Block until a complete frame has been received.
    ///
    /// Returns [`WebViewError::Disconnected`] when the peer closes the
    /// channel cleanly between frames. End-of-stream inside a frame is a
    /// transport failure.
    pub fn read_frame(&mut self) -> Result<Frame> {
        let mut opcode = [0u8; 2];
        self.read_exact_or_disconnect(&mut opcode)?;

        let mut length = [0u8; 4];
        self.inner.read_exact(&mut length)?;
        let length = i32::from_le_bytes(length);
        if length < 0 {
            return Err(WebViewError::InvalidLength(i64::from(length)));
        }

        // The payload buffer lives for exactly one frame, bounding memory
        // to a single payload at a time.
        let mut payload = vec![0u8; length as usize];
        self.inner.read_exact(&mut payload)?;

        Ok(Frame {
            opcode: i16::from_le_bytes(opcode),
            payload,
        })
    }

    /// Like `read_exact`, but end-of-stream before the first byte is a
    /// clean disconnect rather than an IO error.
    fn read_exact_or_disconnect(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) if filled == 0 => return Err(WebViewError::Disconnected),
                Ok(0) => {
                    return Err(WebViewError::Io(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "channel closed inside a frame header",
                    )));
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => return Err(WebViewError::Io(e)),
            }
        }
        Ok(())
    }
}

/// Writer for the send side of a channel. Each field is written with
/// `write_all`, so partial writes are retried until complete or the channel
/// reports failure.
pub struct FrameWriter<W: Write> {
    inner: W,
}

impl<W: Write> FrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        let length: i32 = frame
            .payload
            .len()
            .try_into()
            .map_err(|_| WebViewError::InvalidLength(frame.payload.len() as i64))?;
        self.inner.write_all(&frame.opcode.to_le_bytes())?;
        self.inner.write_all(&length.to_le_bytes())?;
        if !frame.payload.is_empty() {
            self.inner.write_all(&frame.payload)?;
        }
        self.inner.flush()?;
        Ok(())
    }
}

/// Cloneable, mutex-guarded frame writer.
///
/// The engine host writes events from engine callbacks while the dispatch
/// loop may report errors on the same channel; the lock keeps each frame
/// logically atomic on the wire.
pub struct FrameSender<W: Write> {
    inner: Arc<Mutex<FrameWriter<W>>>,
}

impl<W: Write> Clone for FrameSender<W> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<W: Write> FrameSender<W> {
    pub fn new(writer: FrameWriter<W>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(writer)),
        }
    }

    pub fn send(&self, frame: &Frame) -> Result<()> {
        self.inner.lock().write_frame(frame)
    }
}
