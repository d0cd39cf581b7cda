use core::fmt;
use core::str;

/// Request verb. Renders to the uppercase wire token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Connect,
    Options,
}

impl Verb {
    /// The wire token, e.g. `GET`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Head => "HEAD",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
            Verb::Connect => "CONNECT",
            Verb::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Response status codes recognized by the client.
///
/// A response carrying a three-digit code outside this set is treated as a
/// parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StatusCode {
    Continue = 100,
    SwitchingProtocols = 101,
    Ok = 200,
    Created = 201,
    Accepted = 202,
    NonAuthoritativeInformation = 203,
    NoContent = 204,
    ResetContent = 205,
    PartialContent = 206,
    MultipleChoices = 300,
    MovedPermanently = 301,
    Found = 302,
    SeeOther = 303,
    NotModified = 304,
    UseProxy = 305,
    TemporaryRedirect = 307,
    BadRequest = 400,
    Unauthorized = 401,
    PaymentRequired = 402,
    Forbidden = 403,
    NotFound = 404,
    MethodNotAllowed = 405,
    NotAcceptable = 406,
    ProxyAuthenticationRequired = 407,
    RequestTimeOut = 408,
    Conflict = 409,
    Gone = 410,
    LengthRequired = 411,
    PreconditionFailed = 412,
    RequestEntityTooLarge = 413,
    RequestUriTooLarge = 414,
    UnsupportedMediaType = 415,
    RequestRangeNotSatisfiable = 416,
    ExpectationFailed = 417,
    InternalServerError = 500,
    NotImplemented = 501,
    BadGateway = 502,
    ServiceUnavailable = 503,
    GatewayTimeOut = 504,
    HttpVersionNotSupported = 505,
}

impl StatusCode {
    /// Map a numeric code to a known status. `None` for codes outside the
    /// recognized set.
    pub fn from_code(code: u16) -> Option<StatusCode> {
        use StatusCode::*;
        let v = match code {
            100 => Continue,
            101 => SwitchingProtocols,
            200 => Ok,
            201 => Created,
            202 => Accepted,
            203 => NonAuthoritativeInformation,
            204 => NoContent,
            205 => ResetContent,
            206 => PartialContent,
            300 => MultipleChoices,
            301 => MovedPermanently,
            302 => Found,
            303 => SeeOther,
            304 => NotModified,
            305 => UseProxy,
            307 => TemporaryRedirect,
            400 => BadRequest,
            401 => Unauthorized,
            402 => PaymentRequired,
            403 => Forbidden,
            404 => NotFound,
            405 => MethodNotAllowed,
            406 => NotAcceptable,
            407 => ProxyAuthenticationRequired,
            408 => RequestTimeOut,
            409 => Conflict,
            410 => Gone,
            411 => LengthRequired,
            412 => PreconditionFailed,
            413 => RequestEntityTooLarge,
            414 => RequestUriTooLarge,
            415 => UnsupportedMediaType,
            416 => RequestRangeNotSatisfiable,
            417 => ExpectationFailed,
            500 => InternalServerError,
            501 => NotImplemented,
            502 => BadGateway,
            503 => ServiceUnavailable,
            504 => GatewayTimeOut,
            505 => HttpVersionNotSupported,
            _ => return None,
        };
        Some(v)
    }

    /// The numeric code.
    pub fn code(&self) -> u16 {
        *self as u16
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A single header as a borrowed (field, value) pair.
///
/// For outgoing requests the exact byte form is written to the wire
/// untouched. Incoming header values have any run of leading spaces
/// stripped, nothing else.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Header<'a> {
    field: &'a str,
    value: &'a [u8],
}

impl<'a> Header<'a> {
    /// New header from string field and value.
    pub fn new(field: &'a str, value: &'a str) -> Header<'a> {
        Header {
            field,
            value: value.as_bytes(),
        }
    }

    /// New header with a raw byte value.
    pub fn new_raw(field: &'a str, value: &'a [u8]) -> Header<'a> {
        Header { field, value }
    }

    #[inline(always)]
    pub fn field(&self) -> &str {
        self.field
    }

    #[inline(always)]
    pub fn try_value(&self) -> Option<&str> {
        str::from_utf8(self.value).ok()
    }

    #[inline(always)]
    pub fn value(&self) -> &str {
        self.try_value().expect("header value to be valid utf-8")
    }

    #[inline(always)]
    pub fn value_raw(&self) -> &[u8] {
        self.value
    }

    // field ": " value crlf
    pub(crate) fn wire_size(&self) -> usize {
        self.field.len() + 2 + self.value.len() + 2
    }
}

impl<'a> fmt::Debug for Header<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut f = f.debug_struct("Header");
        f.field("field", &self.field);
        if let Some(value) = self.try_value() {
            f.field("value", &value);
        } else {
            f.field("value", &self.value);
        }
        f.finish()
    }
}
