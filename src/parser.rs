use crate::client::HttpClientObserver;
use crate::util::{compare_lowercase_ascii, parse_u32};
use crate::{Error, Header, RewindReader, StatusCode};

use core::str;

/// Incremental parser for an HTTP/1.1 response head.
///
/// Bytes are pulled from a rewindable reader one line at a time through a
/// caller-supplied header buffer; the buffer capacity bounds the longest
/// status or header line that can be accepted. After each call the reader
/// is positioned exactly past the last fully-consumed CRLF, so the owner
/// can ack the transport without losing a partial line.
///
/// Status and header events are delivered to the observer as they complete.
/// A `Content-Length` header (ASCII case-insensitive) is recorded instead
/// of being delivered. The parser finishes in one of two states: done with
/// a content length, or done with an error; after an error further input is
/// ignored.
pub struct ResponseParser {
    status_parsed: bool,
    done: bool,
    error: Option<Error>,
    content_length: Option<u32>,
}

impl ResponseParser {
    pub fn new() -> Self {
        ResponseParser {
            status_parsed: false,
            done: false,
            error: None,
            content_length: None,
        }
    }

    /// Consume what can be consumed from `reader`.
    ///
    /// Re-entrant: called once per transport data event until
    /// [`is_done()`][Self::is_done]. `header_buffer` must be the same
    /// buffer for the duration of one response.
    pub fn data_received(
        &mut self,
        reader: &mut dyn RewindReader,
        header_buffer: &mut [u8],
        observer: &dyn HttpClientObserver,
    ) {
        if self.done {
            return;
        }

        if !self.status_parsed {
            self.parse_status_line(reader, header_buffer, observer);
        }

        if self.status_parsed && self.error.is_none() {
            self.parse_headers(reader, header_buffer, observer);
        }
    }

    /// True once the header block is fully parsed or parsing failed.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// True when parsing failed. Only meaningful once done.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// The failure, if parsing failed.
    pub fn error(&self) -> Option<Error> {
        self.error
    }

    /// The recorded Content-Length. `Some` when done without error.
    pub fn content_length(&self) -> Option<u32> {
        self.content_length
    }

    fn parse_status_line(
        &mut self,
        reader: &mut dyn RewindReader,
        buf: &mut [u8],
        observer: &dyn HttpClientObserver,
    ) {
        let start = reader.save_marker();
        let n = reader.extract(buf);

        let Some(crlf) = find_crlf(&buf[..n]) else {
            if n == buf.len() {
                self.set_error(Error::HeaderLineOverflow);
            } else {
                // Partial line, keep it in the window for the next event.
                reader.rewind(start);
            }
            return;
        };

        reader.rewind(start + crlf + 2);

        match parse_status(&buf[..crlf]) {
            Ok(status) => observer.status_available(status),
            Err(e) => self.set_error(e),
        }

        self.status_parsed = true;
    }

    fn parse_headers(
        &mut self,
        reader: &mut dyn RewindReader,
        buf: &mut [u8],
        observer: &dyn HttpClientObserver,
    ) {
        while !self.done && !reader.is_empty() {
            let start = reader.save_marker();
            let n = reader.extract(buf);

            let Some(crlf) = find_crlf(&buf[..n]) else {
                if n == buf.len() {
                    self.set_error(Error::HeaderLineOverflow);
                } else {
                    reader.rewind(start);
                }
                return;
            };

            reader.rewind(start + crlf + 2);

            if crlf == 0 {
                // Empty line: end of the header block.
                if self.content_length.is_none() {
                    self.error = Some(Error::MissingContentLength);
                }
                self.done = true;
                return;
            }

            self.handle_header_line(&buf[..crlf], observer);
        }
    }

    fn handle_header_line(&mut self, line: &[u8], observer: &dyn HttpClientObserver) {
        let (field, value) = match line.iter().position(|c| *c == b':') {
            Some(colon) => (&line[..colon], &line[colon + 1..]),
            None => (line, &line[line.len()..]),
        };

        let mut value = value;
        while let Some(&b' ') = value.first() {
            value = &value[1..];
        }

        let field = match str::from_utf8(field) {
            Ok(v) => v,
            Err(e) => {
                self.set_error(e.into());
                return;
            }
        };

        if compare_lowercase_ascii(field, "content-length") {
            match parse_u32(value) {
                Some(v) => self.content_length = Some(v),
                None => self.set_error(Error::ContentLength),
            }
        } else {
            observer.header_available(Header::new_raw(field, value));
        }
    }

    fn set_error(&mut self, e: Error) {
        debug!("response parse failed: {}", e);
        self.done = true;
        self.error = Some(e);
    }
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_status(line: &[u8]) -> Result<StatusCode, Error> {
    // HTTP/1.1 200 OK
    let mut tokens = line.split(|c| *c == b' ').filter(|t| !t.is_empty());

    let Some(version) = tokens.next() else {
        return Err(Error::Status);
    };

    if !matches!(version, b"HTTP/1.0" | b"HTTP/1.1") {
        return Err(Error::Version);
    }

    let Some(code) = tokens.next() else {
        return Err(Error::Status);
    };

    if code.len() != 3 {
        return Err(Error::Status);
    }

    let code = parse_u32(code).ok_or(Error::Status)?;

    StatusCode::from_code(code as u16).ok_or(Error::Status)
}

fn find_crlf(b: &[u8]) -> Option<usize> {
    b.windows(2).position(|w| w == b"\r\n")
}
