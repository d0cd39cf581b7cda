use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;

use crate::{Error, Result};

/// Writable byte stream handed out by the transport after a
/// [`crate::Connection::request_send_stream`] reservation.
pub trait StreamWriter {
    /// Append `bytes` to the stream.
    ///
    /// Fails with [`Error::OutputOverflow`] when the reserved capacity is
    /// exceeded.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()>;
}

/// Byte reader over the transport's receive window, rewindable to a saved
/// position.
///
/// Positions are absolute offsets from the start of the window. Bytes left
/// unconsumed (or rewound back) when the transport is acked stay in the
/// window and are presented again on the next read.
pub trait RewindReader {
    /// The current read position, usable as a marker for [`rewind`][Self::rewind].
    fn save_marker(&self) -> usize;

    /// Move the read position back to a previously saved marker.
    fn rewind(&mut self, marker: usize);

    /// Copy up to `dst.len()` bytes into `dst`, advancing the position.
    /// Returns the number of bytes copied.
    fn extract(&mut self, dst: &mut [u8]) -> usize;

    /// Bytes left between the current position and the end of the window.
    fn available(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.available() == 0
    }
}

/// Shared handle to a transport receive stream.
///
/// The stream is shared between the response parser (while headers are
/// incoming) and the body reader (afterwards), never simultaneously.
pub type SharedReader = Rc<RefCell<dyn RewindReader>>;

/// [`StreamWriter`] over a caller-provided slice.
pub struct SliceWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> SliceWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        SliceWriter { buf, pos: 0 }
    }

    /// The bytes written so far.
    pub fn written(&self) -> &[u8] {
        &self.buf[..self.pos]
    }

    pub fn len(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos == 0
    }
}

impl<'a> StreamWriter for SliceWriter<'a> {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        if self.pos + bytes.len() > self.buf.len() {
            return Err(Error::OutputOverflow);
        }

        self.buf[self.pos..(self.pos + bytes.len())].copy_from_slice(bytes);
        self.pos += bytes.len();

        Ok(())
    }
}

/// [`RewindReader`] over a plain byte slice.
pub struct SliceReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        SliceReader { data, pos: 0 }
    }
}

impl<'a> RewindReader for SliceReader<'a> {
    fn save_marker(&self) -> usize {
        self.pos
    }

    fn rewind(&mut self, marker: usize) {
        debug_assert!(marker <= self.pos);
        self.pos = marker;
    }

    fn extract(&mut self, dst: &mut [u8]) -> usize {
        let n = dst.len().min(self.available());
        dst[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        n
    }

    fn available(&self) -> usize {
        self.data.len() - self.pos
    }
}

/// Adapter to use `write!` formatting against a [`StreamWriter`].
pub(crate) struct FmtWriter<'a>(pub &'a mut dyn StreamWriter);

impl<'a> fmt::Write for FmtWriter<'a> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.write_bytes(s.as_bytes()).map_err(|_| fmt::Error)
    }
}
