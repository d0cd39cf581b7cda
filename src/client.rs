use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::string::String;
use core::cell::{Cell, RefCell};
use core::mem;

use crate::body::{Body, BodyReader};
use crate::transport::{Connection, ConnectionObserver};
use crate::{Header, RequestFormatter, ResponseParser, StatusCode, StreamWriter, Verb};

/// Consumer of one HTTP exchange.
///
/// All callbacks arrive on the one logical thread the client runs on and
/// take `&self`; implementations keep their own state in `Cell`/`RefCell`.
/// Any callback may close the connection by calling
/// [`HttpClient::close`] on the client it was attached to.
///
/// For a single exchange the order is: `status_available`, then every
/// `header_available`, then `body_available` deliveries, then
/// `body_complete`. `closing_connection` and `detach` end the
/// relationship.
pub trait HttpClientObserver {
    /// A client is taking this observer. Hold the client weakly (or drop
    /// it on [`detach`][Self::detach]); the client already holds the
    /// observer strongly.
    fn attach(&self, _client: Rc<HttpClient>) {}

    /// The relationship ends. Drop any reference to the client.
    fn detach(&self) {}

    /// The connection is ready; a request may be issued.
    fn connected(&self) {}

    /// The connection is going away.
    fn closing_connection(&self) {}

    /// Response status line was parsed.
    fn status_available(&self, status: StatusCode);

    /// A response header was parsed. Content-Length is consumed by the
    /// client and not delivered here.
    fn header_available(&self, _header: Header<'_>) {}

    /// Body bytes may be read through `body`. Dropping the handle acks the
    /// consumed bytes to the transport; keep it to hold backpressure.
    fn body_available(&self, body: Body);

    /// The body was fully consumed. With a Content-Length of zero this
    /// directly follows the headers.
    fn body_complete(&self);
}

/// Owner notified when a client's connection has closed, so the slot can
/// be reused.
pub(crate) trait ClientOwner {
    fn client_closed(&self);
}

/// HTTP/1.1 client bound to a single connection.
///
/// Issue one request at a time via the verb methods; the response is
/// delivered to the attached [`HttpClientObserver`]. The header buffer
/// handed to [`new`][HttpClient::new] bounds the longest status or header
/// line the client can accept; a longer line aborts the connection.
pub struct HttpClient {
    hostname: String,
    header_buffer: RefCell<Box<[u8]>>,
    observer: RefCell<Option<Rc<dyn HttpClientObserver>>>,
    connection: RefCell<Option<Rc<dyn Connection>>>,
    request: RefCell<Option<RequestFormatter>>,
    response: RefCell<Option<ResponseParser>>,
    content_length: Cell<Option<u32>>,
    body: Rc<RefCell<Option<BodyReader>>>,
    owner: RefCell<Option<Weak<dyn ClientOwner>>>,
    closed: Cell<bool>,
    self_weak: Weak<HttpClient>,
}

impl HttpClient {
    /// New client for requests to `hostname`, parsing response heads
    /// through `header_buffer`.
    pub fn new(header_buffer: Box<[u8]>, hostname: &str) -> Rc<HttpClient> {
        Rc::new_cyclic(|weak| HttpClient {
            hostname: String::from(hostname),
            header_buffer: RefCell::new(header_buffer),
            observer: RefCell::new(None),
            connection: RefCell::new(None),
            request: RefCell::new(None),
            response: RefCell::new(None),
            content_length: Cell::new(None),
            body: Rc::new(RefCell::new(None)),
            owner: RefCell::new(None),
            closed: Cell::new(false),
            self_weak: weak.clone(),
        })
    }

    /// Attach the observer receiving the response events. Calls
    /// `observer.attach` back with this client.
    pub fn attach_observer(&self, observer: Rc<dyn HttpClientObserver>) {
        *self.observer.borrow_mut() = Some(Rc::clone(&observer));

        if let Some(client) = self.self_weak.upgrade() {
            observer.attach(client);
        }
    }

    pub fn get(&self, target: &str, headers: &[Header<'_>]) {
        self.execute_request(RequestFormatter::new(Verb::Get, &self.hostname, target, headers));
    }

    pub fn head(&self, target: &str, headers: &[Header<'_>]) {
        self.execute_request(RequestFormatter::new(Verb::Head, &self.hostname, target, headers));
    }

    pub fn connect(&self, target: &str, headers: &[Header<'_>]) {
        self.execute_request(RequestFormatter::new(
            Verb::Connect,
            &self.hostname,
            target,
            headers,
        ));
    }

    pub fn options(&self, target: &str, headers: &[Header<'_>]) {
        self.execute_request(RequestFormatter::new(
            Verb::Options,
            &self.hostname,
            target,
            headers,
        ));
    }

    pub fn post(&self, target: &str, content: &[u8], headers: &[Header<'_>]) {
        self.execute_request(RequestFormatter::with_content(
            Verb::Post,
            &self.hostname,
            target,
            content,
            headers,
        ));
    }

    pub fn put(&self, target: &str, content: &[u8], headers: &[Header<'_>]) {
        self.execute_request(RequestFormatter::with_content(
            Verb::Put,
            &self.hostname,
            target,
            content,
            headers,
        ));
    }

    pub fn patch(&self, target: &str, content: &[u8], headers: &[Header<'_>]) {
        self.execute_request(RequestFormatter::with_content(
            Verb::Patch,
            &self.hostname,
            target,
            content,
            headers,
        ));
    }

    pub fn delete(&self, target: &str, content: &[u8], headers: &[Header<'_>]) {
        self.execute_request(RequestFormatter::with_content(
            Verb::Delete,
            &self.hostname,
            target,
            content,
            headers,
        ));
    }

    /// Forward an ack to the transport.
    pub fn ack_received(&self) {
        if let Some(connection) = self.connection() {
            connection.ack_received();
        }
    }

    /// Close the connection in an orderly way. The observer sees
    /// `closing_connection` followed by `detach`.
    pub fn close(&self) {
        if let Some(connection) = self.connection() {
            connection.close_and_destroy();
        }
    }

    pub(crate) fn set_owner(&self, owner: Weak<dyn ClientOwner>) {
        *self.owner.borrow_mut() = Some(owner);
    }

    pub(crate) fn take_header_buffer(&self) -> Box<[u8]> {
        mem::take(&mut *self.header_buffer.borrow_mut())
    }

    fn execute_request(&self, request: RequestFormatter) {
        let size = request.size();
        *self.request.borrow_mut() = Some(request);

        if let Some(connection) = self.connection() {
            connection.request_send_stream(size);
        }
    }

    fn connection(&self) -> Option<Rc<dyn Connection>> {
        self.connection.borrow().clone()
    }

    fn observer(&self) -> Option<Rc<dyn HttpClientObserver>> {
        self.observer.borrow().clone()
    }

    fn handle_data(&self) {
        let parsing = self
            .response
            .borrow()
            .as_ref()
            .map(|r| !r.is_done())
            .unwrap_or(false);

        if parsing {
            let Some(connection) = self.connection() else {
                return;
            };
            let Some(observer) = self.observer() else {
                connection.abort_and_destroy();
                return;
            };

            let reader = connection.receive_stream();

            {
                let mut response = self.response.borrow_mut();
                let Some(parser) = response.as_mut() else {
                    return;
                };
                let mut buffer = self.header_buffer.borrow_mut();
                parser.data_received(&mut *reader.borrow_mut(), &mut buffer[..], &*observer);
            }

            // A callback may have closed the connection; in that case the
            // transport must not be touched again.
            if self.closed.get() {
                return;
            }

            if let Some(connection) = self.connection() {
                connection.ack_received();
            }
        }

        let outcome = self
            .response
            .borrow()
            .as_ref()
            .map(|r| (r.is_done(), r.is_error()));

        match outcome {
            Some((true, false)) => self.body_received(),
            Some((true, true)) => {
                if let Some(connection) = self.connection() {
                    connection.abort_and_destroy();
                }
            }
            _ => {}
        }
    }

    fn body_received(&self) {
        if self.content_length.get().is_none() {
            let length = self.response.borrow().as_ref().and_then(|r| r.content_length());
            self.content_length.set(length);
        }

        let remaining = self.content_length.get().unwrap_or(0);

        if remaining == 0 {
            self.body_complete();
        } else {
            let Some(connection) = self.connection() else {
                return;
            };
            *self.body.borrow_mut() = Some(BodyReader::new(connection.receive_stream(), remaining));
            self.deliver_body();
        }
    }

    fn deliver_body(&self) {
        if let Some(observer) = self.observer() {
            observer.body_available(Body::new(Rc::clone(&self.body), self.self_weak.clone()));
        }
    }

    /// Drop hook of [`Body`]. Idempotent: a handle may outlive the
    /// exchange and fire late.
    pub(crate) fn body_reader_destroyed(&self) {
        let Some(reader) = self.body.borrow_mut().take() else {
            return;
        };

        if let Some(connection) = self.connection() {
            connection.ack_received();
        }

        let Some(remaining) = self.content_length.get() else {
            return;
        };

        let remaining = remaining - reader.total_read();
        self.content_length.set(Some(remaining));

        if remaining == 0 {
            self.body_complete();
        }
    }

    fn body_complete(&self) {
        self.content_length.set(None);
        *self.response.borrow_mut() = None;

        if let Some(observer) = self.observer() {
            observer.body_complete();
        }
    }
}

impl ConnectionObserver for HttpClient {
    fn attached(&self, connection: Rc<dyn Connection>) {
        *self.connection.borrow_mut() = Some(connection);
    }

    fn connected(&self) {
        if let Some(observer) = self.observer() {
            observer.connected();
        }
    }

    fn send_stream_available(&self, writer: &mut dyn StreamWriter) {
        let Some(request) = self.request.borrow_mut().take() else {
            return;
        };

        if let Err(e) = request.write(writer) {
            debug!("request write failed: {}", e);
            if let Some(connection) = self.connection() {
                connection.abort_and_destroy();
            }
            return;
        }

        *self.response.borrow_mut() = Some(ResponseParser::new());
    }

    fn data_received(&self) {
        if self.closed.get() {
            return;
        }

        let streaming = self.body.borrow().is_some();
        let has_response = self.response.borrow().is_some();

        if streaming {
            self.deliver_body();
        } else if has_response {
            self.handle_data();
        } else {
            debug!("data received with no outstanding request");
            if let Some(connection) = self.connection() {
                connection.abort_and_destroy();
            }
        }
    }

    fn closing_connection(&self) {
        debug!("connection to {} closing", self.hostname);

        self.closed.set(true);

        if let Some(observer) = self.observer.borrow_mut().take() {
            observer.closing_connection();
            observer.detach();
        }

        *self.connection.borrow_mut() = None;

        let owner = self.owner.borrow().clone();
        if let Some(owner) = owner.and_then(|o| o.upgrade()) {
            owner.client_closed();
        }
    }
}
