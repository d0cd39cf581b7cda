use core::fmt;
use core::str::Utf8Error;

/// Errors raised while formatting a request or parsing a response.
///
/// Parse errors are not returned from [`crate::ResponseParser::data_received`];
/// the parser latches into its error state and reports the kind via
/// [`crate::ResponseParser::error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A write did not fit the reserved send buffer.
    ///
    /// The transport promised `RequestFormatter::size()` bytes and handed
    /// out something smaller.
    OutputOverflow,

    /// Malformed response status line.
    Status,

    /// The response names an HTTP version other than 1.0 or 1.1.
    Version,

    /// A status or header line exceeds the header buffer capacity.
    HeaderLineOverflow,

    /// Header field name is not valid UTF-8.
    HeaderName,

    /// The header block ended without a Content-Length header.
    MissingContentLength,

    /// The Content-Length value is not a decimal u32.
    ContentLength,
}

pub(crate) static OVERFLOW: Result<()> = Err(Error::OutputOverflow);

/// `Result` alias with this crate's [`Error`].
pub type Result<T> = core::result::Result<T, Error>;

impl From<Utf8Error> for Error {
    fn from(_: Utf8Error) -> Self {
        Error::HeaderName
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Error::OutputOverflow => "output buffer overflow",
            Error::Status => "invalid response status line",
            Error::Version => "unknown http version",
            Error::HeaderLineOverflow => "header line exceeds buffer",
            Error::HeaderName => "invalid header name",
            Error::MissingContentLength => "missing content-length",
            Error::ContentLength => "invalid content-length value",
        };

        write!(f, "{}", s)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
