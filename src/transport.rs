//! Contracts towards the byte-oriented connection layer.
//!
//! The transport (TCP, TLS, a test double) lives outside this crate. It
//! calls into the client through [`ConnectionObserver`] and is driven back
//! through [`Connection`]; connects are brokered between a
//! [`ConnectionFactory`] and the connector acting as [`ConnectionRequester`].
//! All calls happen on one logical thread.

use alloc::rc::Rc;
use core::fmt;

use crate::stream::{SharedReader, StreamWriter};

/// An established connection, as seen by the client.
pub trait Connection {
    /// Reserve a send buffer of `size` bytes. The transport answers with
    /// [`ConnectionObserver::send_stream_available`] once the buffer is
    /// ready; until then no further request may be issued.
    fn request_send_stream(&self, size: usize);

    /// The current receive window. The same underlying window is returned
    /// until its bytes are acked; readers stay valid across events.
    fn receive_stream(&self) -> SharedReader;

    /// Tell the transport that the bytes consumed from the receive stream
    /// may be discarded and the window advanced.
    fn ack_received(&self);

    /// Orderly close. Ends with [`ConnectionObserver::closing_connection`].
    fn close_and_destroy(&self);

    /// Tear the connection down immediately.
    fn abort_and_destroy(&self);
}

/// Callbacks a connection delivers to its observer (the client).
pub trait ConnectionObserver {
    /// The connection is handing itself to the observer. Always precedes
    /// [`connected`][Self::connected].
    fn attached(&self, connection: Rc<dyn Connection>);

    /// The connection is ready for traffic.
    fn connected(&self);

    /// A send buffer reserved via [`Connection::request_send_stream`] is
    /// available. The writer is only valid for the duration of the call.
    fn send_stream_available(&self, writer: &mut dyn StreamWriter);

    /// New bytes arrived in the receive window.
    fn data_received(&self);

    /// The connection is going away. No further callbacks follow.
    fn closing_connection(&self);
}

/// Why a connect attempt did not produce a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectFailReason {
    /// The peer refused the connection.
    Refused,
    /// The transport could not allocate a connection.
    ConnectionAllocationFailed,
    /// Name resolution failed.
    NameLookupFailed,
}

impl fmt::Display for ConnectFailReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectFailReason::Refused => "connection refused",
            ConnectFailReason::ConnectionAllocationFailed => "connection allocation failed",
            ConnectFailReason::NameLookupFailed => "name lookup failed",
        };

        write!(f, "{}", s)
    }
}

/// A party asking the transport for a connection, queried for the
/// destination and told about the outcome.
pub trait ConnectionRequester {
    fn hostname(&self) -> Rc<str>;

    fn port(&self) -> u16;

    /// The connect succeeded. The requester passes the observer for the
    /// new connection to `observer_sink`; not calling the sink declines
    /// the connection.
    fn connection_established(&self, observer_sink: &mut dyn FnMut(Rc<dyn ConnectionObserver>));

    /// The connect failed.
    fn connection_failed(&self, reason: ConnectFailReason);
}

/// Transport-side factory that turns connect requests into connections.
pub trait ConnectionFactory {
    /// Start connecting on behalf of `requester`. Resolves asynchronously
    /// into [`ConnectionRequester::connection_established`] or
    /// [`ConnectionRequester::connection_failed`].
    fn connect(&self, requester: Rc<dyn ConnectionRequester>);

    /// Abandon an in-flight connect. No outcome callback follows.
    fn cancel_connect(&self, requester: &Rc<dyn ConnectionRequester>);
}
