//! Event-driven HTTP/1.1 client core for small targets.
//!
//! This crate contains the pieces needed to run HTTP/1.1 exchanges over an
//! external, byte-oriented connection abstraction with cooperative
//! (single-threaded, callback-driven) scheduling:
//!
//! * [`RequestFormatter`] computes the exact wire size of a request and
//!   serializes it into a reserved send buffer.
//! * [`ResponseParser`] parses status line and headers incrementally from a
//!   rewindable reader, through a fixed header buffer that may be shorter
//!   than the incoming data.
//! * [`HttpClient`] is the per-connection state machine tying formatter,
//!   parser and body delivery to an [`HttpClientObserver`].
//! * [`HttpClientConnector`] queues observer factories and serves them,
//!   FIFO, over a single reusable client slot.
//!
//! The transport (TCP, TLS, a test double) is supplied by the caller via
//! the traits in this crate: [`Connection`], [`ConnectionFactory`] and the
//! byte stream traits [`StreamWriter`] and [`RewindReader`].
//!
//! There is no internal locking. Everything is meant to run on one logical
//! thread, and observer callbacks are allowed to close the connection
//! mid-delivery.

#![no_std]
#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![allow(clippy::uninlined_format_args)]

extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

#[macro_use]
extern crate log;

mod body;
mod client;
mod connector;
mod error;
mod model;
mod parser;
mod req;
mod stream;
mod transport;
mod util;

pub use body::Body;
pub use client::{HttpClient, HttpClientObserver};
pub use connector::{HttpClientConnector, HttpClientObserverFactory};
pub use error::{Error, Result};
pub use model::{Header, StatusCode, Verb};
pub use parser::ResponseParser;
pub use req::RequestFormatter;
pub use stream::{RewindReader, SharedReader, SliceReader, SliceWriter, StreamWriter};
pub use transport::{
    ConnectFailReason, Connection, ConnectionFactory, ConnectionObserver, ConnectionRequester,
};
