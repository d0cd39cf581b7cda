use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Write;

use crate::error::OVERFLOW;
use crate::stream::FmtWriter;
use crate::util::dec_len;
use crate::{Header, Result, StreamWriter, Verb};

const HTTP_VERSION: &str = "HTTP/1.1";

/// Serializer for one HTTP/1.1 request.
///
/// Immutable after construction. [`size()`][RequestFormatter::size] returns
/// the exact number of bytes [`write()`][RequestFormatter::write] emits, so
/// the transport can reserve a send buffer up front.
///
/// Wire order is: request line, the caller's headers untouched, the
/// synthesized `Host` header, `Content-Length` when there is content, the
/// blank line, the raw content bytes.
pub struct RequestFormatter {
    verb: Verb,
    hostname: String,
    target: String,
    content: Vec<u8>,
    content_length: Option<usize>,
    headers: Vec<(String, Vec<u8>)>,
}

impl RequestFormatter {
    /// Formatter for a request without content.
    pub fn new(verb: Verb, hostname: &str, target: &str, headers: &[Header<'_>]) -> Self {
        Self::with_content(verb, hostname, target, &[], headers)
    }

    /// Formatter for a request carrying `content`.
    ///
    /// A `Content-Length` header is synthesized when `content` is non-empty.
    pub fn with_content(
        verb: Verb,
        hostname: &str,
        target: &str,
        content: &[u8],
        headers: &[Header<'_>],
    ) -> Self {
        RequestFormatter {
            verb,
            hostname: String::from(hostname),
            target: String::from(target),
            content: Vec::from(content),
            content_length: (!content.is_empty()).then(|| content.len()),
            headers: headers
                .iter()
                .map(|h| (String::from(h.field()), Vec::from(h.value_raw())))
                .collect(),
        }
    }

    /// Exact number of bytes [`write()`][Self::write] will emit.
    pub fn size(&self) -> usize {
        self.verb.as_str().len()
            + 1
            + self.target.len()
            + 1
            + HTTP_VERSION.len()
            + 2
            + self.headers_size()
            + 2
            + self.content.len()
    }

    /// Serialize the request into `out`.
    ///
    /// The stream must have room for [`size()`][Self::size] bytes.
    pub fn write(&self, out: &mut dyn StreamWriter) -> Result<()> {
        let mut w = FmtWriter(out);

        write!(w, "{} {} {}\r\n", self.verb, self.target, HTTP_VERSION).or(OVERFLOW)?;

        for (field, value) in &self.headers {
            write!(w, "{}: ", field).or(OVERFLOW)?;
            w.0.write_bytes(value)?;
            write!(w, "\r\n").or(OVERFLOW)?;
        }

        write!(w, "Host: {}\r\n", self.hostname).or(OVERFLOW)?;

        if let Some(n) = self.content_length {
            write!(w, "Content-Length: {}\r\n", n).or(OVERFLOW)?;
        }

        write!(w, "\r\n").or(OVERFLOW)?;
        w.0.write_bytes(&self.content)?;

        Ok(())
    }

    fn headers_size(&self) -> usize {
        let mut size = 0;

        for (field, value) in &self.headers {
            size += field.len() + 2 + value.len() + 2;
        }

        size += "Host".len() + 2 + self.hostname.len() + 2;

        if let Some(n) = self.content_length {
            size += "Content-Length".len() + 2 + dec_len(n) + 2;
        }

        size
    }
}
