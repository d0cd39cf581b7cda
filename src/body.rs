use alloc::rc::{Rc, Weak};
use core::cell::RefCell;

use crate::client::HttpClient;
use crate::stream::SharedReader;

/// Length-capped, byte-counting reader over the connection's receive
/// stream. Lives in the client; observers reach it through [`Body`].
pub(crate) struct BodyReader {
    reader: SharedReader,
    limit: u32,
    total_read: u32,
}

impl BodyReader {
    pub(crate) fn new(reader: SharedReader, limit: u32) -> Self {
        BodyReader {
            reader,
            limit,
            total_read: 0,
        }
    }

    pub(crate) fn read(&mut self, dst: &mut [u8]) -> usize {
        let left = (self.limit - self.total_read) as usize;
        let max = dst.len().min(left);

        let n = self.reader.borrow_mut().extract(&mut dst[..max]);
        self.total_read += n as u32;

        n
    }

    pub(crate) fn available(&self) -> usize {
        let left = (self.limit - self.total_read) as usize;
        self.reader.borrow().available().min(left)
    }

    pub(crate) fn total_read(&self) -> u32 {
        self.total_read
    }
}

/// Shared handle to the response body, delivered through
/// [`HttpClientObserver::body_available`][crate::HttpClientObserver::body_available].
///
/// Reads pass through to the connection's receive stream, capped at the
/// response's remaining Content-Length. Dropping the handle releases the
/// body back to the client, which acks the consumed bytes to the transport;
/// the transport does not advance while the handle is held. Holding it
/// across events is the consumer's flow control.
pub struct Body {
    reader: Rc<RefCell<Option<BodyReader>>>,
    client: Weak<HttpClient>,
}

impl Body {
    pub(crate) fn new(reader: Rc<RefCell<Option<BodyReader>>>, client: Weak<HttpClient>) -> Self {
        Body { reader, client }
    }

    /// Copy up to `dst.len()` body bytes into `dst`. Returns 0 at the end
    /// of the body, or when no bytes have arrived yet.
    pub fn read(&self, dst: &mut [u8]) -> usize {
        match self.reader.borrow_mut().as_mut() {
            Some(r) => r.read(dst),
            None => 0,
        }
    }

    /// Body bytes currently waiting in the receive stream.
    pub fn available(&self) -> usize {
        self.reader.borrow().as_ref().map(|r| r.available()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.available() == 0
    }
}

impl Drop for Body {
    fn drop(&mut self) {
        // The client may already be gone (late drop after teardown).
        if let Some(client) = self.client.upgrade() {
            client.body_reader_destroyed();
        }
    }
}
