use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::rc::{Rc, Weak};
use core::cell::RefCell;

use crate::client::{ClientOwner, HttpClient, HttpClientObserver};
use crate::transport::{
    ConnectFailReason, ConnectionFactory, ConnectionObserver, ConnectionRequester,
};

/// Supplier of one observer per connection, queued on the connector.
///
/// The factory names the destination and, once the transport has a
/// connection, is asked to produce the observer for it. Declining (not
/// calling the sink) releases the connection slot again.
pub trait HttpClientObserverFactory {
    fn hostname(&self) -> &str;

    fn port(&self) -> u16;

    /// The connection is up. Pass the observer for this exchange to
    /// `attach`, or return without calling it to decline.
    fn connection_established(&self, attach: &mut dyn FnMut(Rc<dyn HttpClientObserver>));

    /// The connect attempt failed.
    fn connection_failed(&self, reason: ConnectFailReason);
}

/// Serves queued [`HttpClientObserverFactory`]s over a single client slot.
///
/// Factories are served strictly in FIFO order; at most one transport
/// connect is in flight and at most one client exists at any time. The
/// header buffer given at construction is lent to each client in turn and
/// bounds the longest response status/header line.
pub struct HttpClientConnector {
    connection_factory: Rc<dyn ConnectionFactory>,
    spare_buffer: RefCell<Option<Box<[u8]>>>,
    pending: RefCell<VecDeque<Rc<dyn HttpClientObserverFactory>>>,
    current: RefCell<Option<Rc<dyn HttpClientObserverFactory>>>,
    client: RefCell<Option<Rc<HttpClient>>>,
    self_weak: Weak<HttpClientConnector>,
}

impl HttpClientConnector {
    pub fn new(
        connection_factory: Rc<dyn ConnectionFactory>,
        header_buffer: Box<[u8]>,
    ) -> Rc<HttpClientConnector> {
        Rc::new_cyclic(|weak| HttpClientConnector {
            connection_factory,
            spare_buffer: RefCell::new(Some(header_buffer)),
            pending: RefCell::new(VecDeque::new()),
            current: RefCell::new(None),
            client: RefCell::new(None),
            self_weak: weak.clone(),
        })
    }

    /// Queue `factory` for a connection to its hostname/port.
    pub fn connect(&self, factory: Rc<dyn HttpClientObserverFactory>) {
        debug!("queueing connect to {}:{}", factory.hostname(), factory.port());

        self.pending.borrow_mut().push_back(factory);
        self.try_connect_waiting();
    }

    /// Withdraw `factory`, whether queued or with its connect in flight.
    pub fn cancel_connect(&self, factory: &Rc<dyn HttpClientObserverFactory>) {
        let is_current = self
            .current
            .borrow()
            .as_ref()
            .map(|f| Rc::ptr_eq(f, factory))
            .unwrap_or(false);

        if is_current {
            if let Some(requester) = self.requester() {
                self.connection_factory.cancel_connect(&requester);
            }
            *self.current.borrow_mut() = None;
        } else {
            self.pending.borrow_mut().retain(|f| !Rc::ptr_eq(f, factory));
        }

        self.try_connect_waiting();
    }

    fn requester(&self) -> Option<Rc<dyn ConnectionRequester>> {
        let rc: Rc<dyn ConnectionRequester> = self.self_weak.upgrade()?;
        Some(rc)
    }

    fn try_connect_waiting(&self) {
        if self.current.borrow().is_some() || self.client.borrow().is_some() {
            return;
        }

        let Some(next) = self.pending.borrow_mut().pop_front() else {
            return;
        };

        debug!("connecting to {}:{}", next.hostname(), next.port());
        *self.current.borrow_mut() = Some(next);

        if let Some(requester) = self.requester() {
            self.connection_factory.connect(requester);
        }
    }
}

impl ConnectionRequester for HttpClientConnector {
    fn hostname(&self) -> Rc<str> {
        self.current
            .borrow()
            .as_ref()
            .map(|f| Rc::from(f.hostname()))
            .unwrap_or_else(|| Rc::from(""))
    }

    fn port(&self) -> u16 {
        self.current.borrow().as_ref().map(|f| f.port()).unwrap_or(0)
    }

    fn connection_established(&self, observer_sink: &mut dyn FnMut(Rc<dyn ConnectionObserver>)) {
        let Some(factory) = self.current.borrow_mut().take() else {
            debug!("connection established with no connect in flight");
            return;
        };
        let Some(buffer) = self.spare_buffer.borrow_mut().take() else {
            debug!("connection established while header buffer is still lent out");
            return;
        };

        let client = HttpClient::new(buffer, factory.hostname());
        let owner: Weak<dyn ClientOwner> = self.self_weak.clone();
        client.set_owner(owner);

        let mut attached = false;
        factory.connection_established(&mut |observer| {
            client.attach_observer(observer);
            *self.client.borrow_mut() = Some(Rc::clone(&client));
            observer_sink(Rc::clone(&client) as Rc<dyn ConnectionObserver>);
            attached = true;
        });

        if !attached {
            // The factory declined; free the slot again.
            *self.spare_buffer.borrow_mut() = Some(client.take_header_buffer());
            self.try_connect_waiting();
        }
    }

    fn connection_failed(&self, reason: ConnectFailReason) {
        let Some(factory) = self.current.borrow_mut().take() else {
            debug!("connection failed with no connect in flight");
            return;
        };

        debug!("connect to {} failed: {}", factory.hostname(), reason);
        factory.connection_failed(reason);

        self.try_connect_waiting();
    }
}

impl ClientOwner for HttpClientConnector {
    fn client_closed(&self) {
        if let Some(client) = self.client.borrow_mut().take() {
            *self.spare_buffer.borrow_mut() = Some(client.take_header_buffer());
        }

        self.try_connect_waiting();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Body, Connection, SharedReader, StatusCode};

    use alloc::string::{String, ToString};
    use alloc::vec::Vec;
    use core::cell::Cell;

    use crate::stream::RewindReader;

    struct NullReader;

    impl RewindReader for NullReader {
        fn save_marker(&self) -> usize {
            0
        }

        fn rewind(&mut self, _marker: usize) {}

        fn extract(&mut self, _dst: &mut [u8]) -> usize {
            0
        }

        fn available(&self) -> usize {
            0
        }
    }

    #[derive(Default)]
    struct TestConn {
        observer: RefCell<Option<Rc<dyn ConnectionObserver>>>,
    }

    impl Connection for TestConn {
        fn request_send_stream(&self, _size: usize) {}

        fn receive_stream(&self) -> SharedReader {
            Rc::new(RefCell::new(NullReader))
        }

        fn ack_received(&self) {}

        fn close_and_destroy(&self) {
            if let Some(observer) = self.observer.borrow_mut().take() {
                observer.closing_connection();
            }
        }

        fn abort_and_destroy(&self) {
            self.close_and_destroy();
        }
    }

    #[derive(Default)]
    struct NullObserver;

    impl HttpClientObserver for NullObserver {
        fn status_available(&self, _status: StatusCode) {}

        fn body_available(&self, _body: Body) {}

        fn body_complete(&self) {}
    }

    #[derive(Default)]
    struct TestConnectionFactory {
        pending: RefCell<Vec<Rc<dyn ConnectionRequester>>>,
        connects: RefCell<Vec<String>>,
        cancels: Cell<usize>,
    }

    impl TestConnectionFactory {
        /// Resolve the oldest in-flight connect into `conn`. Returns
        /// whether an observer was attached.
        fn establish(&self, conn: &Rc<TestConn>) -> bool {
            let requester = self.pending.borrow_mut().remove(0);

            let mut attached = false;
            requester.connection_established(&mut |observer| {
                *conn.observer.borrow_mut() = Some(Rc::clone(&observer));
                observer.attached(Rc::clone(conn) as Rc<dyn Connection>);
                observer.connected();
                attached = true;
            });

            attached
        }

        fn fail_next(&self, reason: ConnectFailReason) {
            let requester = self.pending.borrow_mut().remove(0);
            requester.connection_failed(reason);
        }
    }

    impl ConnectionFactory for TestConnectionFactory {
        fn connect(&self, requester: Rc<dyn ConnectionRequester>) {
            self.connects.borrow_mut().push(requester.hostname().to_string());
            self.pending.borrow_mut().push(requester);
        }

        fn cancel_connect(&self, requester: &Rc<dyn ConnectionRequester>) {
            self.cancels.set(self.cancels.get() + 1);
            self.pending.borrow_mut().retain(|r| !Rc::ptr_eq(r, requester));
        }
    }

    struct TestObserverFactory {
        hostname: String,
        port: u16,
        yield_observer: bool,
        established: Cell<usize>,
        failures: RefCell<Vec<ConnectFailReason>>,
    }

    impl TestObserverFactory {
        fn make(hostname: &str, yield_observer: bool) -> Rc<TestObserverFactory> {
            Rc::new(TestObserverFactory {
                hostname: hostname.to_string(),
                port: 80,
                yield_observer,
                established: Cell::new(0),
                failures: RefCell::new(Vec::new()),
            })
        }

        fn new(hostname: &str) -> Rc<TestObserverFactory> {
            Self::make(hostname, true)
        }

        fn declining(hostname: &str) -> Rc<TestObserverFactory> {
            Self::make(hostname, false)
        }
    }

    impl HttpClientObserverFactory for TestObserverFactory {
        fn hostname(&self) -> &str {
            &self.hostname
        }

        fn port(&self) -> u16 {
            self.port
        }

        fn connection_established(&self, attach: &mut dyn FnMut(Rc<dyn HttpClientObserver>)) {
            self.established.set(self.established.get() + 1);

            if self.yield_observer {
                attach(Rc::new(NullObserver));
            }
        }

        fn connection_failed(&self, reason: ConnectFailReason) {
            self.failures.borrow_mut().push(reason);
        }
    }

    fn setup() -> (Rc<TestConnectionFactory>, Rc<HttpClientConnector>) {
        let factory = Rc::new(TestConnectionFactory::default());
        let connector = HttpClientConnector::new(
            Rc::clone(&factory) as Rc<dyn ConnectionFactory>,
            alloc::vec![0u8; 128].into_boxed_slice(),
        );
        (factory, connector)
    }

    #[test]
    fn test_fifo_order_with_queued_cancel() {
        let (factory, connector) = setup();

        let f1 = TestObserverFactory::new("h1");
        let f2 = TestObserverFactory::new("h2");
        let f3 = TestObserverFactory::new("h3");
        let f2_handle: Rc<dyn HttpClientObserverFactory> = Rc::clone(&f2) as Rc<dyn HttpClientObserverFactory>;

        connector.connect(Rc::clone(&f1) as Rc<dyn HttpClientObserverFactory>);
        connector.connect(Rc::clone(&f2_handle));
        connector.connect(Rc::clone(&f3) as Rc<dyn HttpClientObserverFactory>);

        // f1 is in flight, f2 is still queued and can be withdrawn.
        connector.cancel_connect(&f2_handle);

        let conn = Rc::new(TestConn::default());
        assert!(factory.establish(&conn));
        assert_eq!(f1.established.get(), 1);

        // Closing the connection frees the slot for the next factory.
        conn.close_and_destroy();

        assert_eq!(*factory.connects.borrow(), ["h1", "h3"]);
        assert_eq!(f2.established.get(), 0);
        assert_eq!(factory.cancels.get(), 0);
    }

    #[test]
    fn test_single_connect_and_single_client() {
        let (factory, connector) = setup();

        let f1 = TestObserverFactory::new("h1");
        let f2 = TestObserverFactory::new("h2");

        connector.connect(Rc::clone(&f1) as Rc<dyn HttpClientObserverFactory>);
        connector.connect(Rc::clone(&f2) as Rc<dyn HttpClientObserverFactory>);

        // Only one connect in flight.
        assert_eq!(factory.pending.borrow().len(), 1);

        let conn = Rc::new(TestConn::default());
        assert!(factory.establish(&conn));

        // Slot occupied: f2 must keep waiting.
        assert_eq!(*factory.connects.borrow(), ["h1"]);

        conn.close_and_destroy();
        assert_eq!(*factory.connects.borrow(), ["h1", "h2"]);

        // The header buffer was reclaimed, so the next client can be built.
        let conn2 = Rc::new(TestConn::default());
        assert!(factory.establish(&conn2));
        assert_eq!(f2.established.get(), 1);
    }

    #[test]
    fn test_cancel_connect_in_flight() {
        let (factory, connector) = setup();

        let f1 = TestObserverFactory::new("h1");
        let f2 = TestObserverFactory::new("h2");
        let f1_handle: Rc<dyn HttpClientObserverFactory> = Rc::clone(&f1) as Rc<dyn HttpClientObserverFactory>;

        connector.connect(Rc::clone(&f1_handle));
        connector.connect(Rc::clone(&f2) as Rc<dyn HttpClientObserverFactory>);

        connector.cancel_connect(&f1_handle);

        assert_eq!(factory.cancels.get(), 1);
        assert_eq!(*factory.connects.borrow(), ["h1", "h2"]);
        assert_eq!(f1.established.get(), 0);

        let conn = Rc::new(TestConn::default());
        assert!(factory.establish(&conn));
        assert_eq!(f2.established.get(), 1);
    }

    #[test]
    fn test_connection_failed_reaches_factory_and_queue_continues() {
        let (factory, connector) = setup();

        let f1 = TestObserverFactory::new("h1");
        let f2 = TestObserverFactory::new("h2");

        connector.connect(Rc::clone(&f1) as Rc<dyn HttpClientObserverFactory>);
        connector.connect(Rc::clone(&f2) as Rc<dyn HttpClientObserverFactory>);

        factory.fail_next(ConnectFailReason::NameLookupFailed);

        assert_eq!(*f1.failures.borrow(), [ConnectFailReason::NameLookupFailed]);
        assert_eq!(*factory.connects.borrow(), ["h1", "h2"]);

        factory.fail_next(ConnectFailReason::Refused);
        assert_eq!(*f2.failures.borrow(), [ConnectFailReason::Refused]);
    }

    #[test]
    fn test_factory_declining_releases_slot() {
        let (factory, connector) = setup();

        let f1 = TestObserverFactory::declining("h1");
        let f2 = TestObserverFactory::new("h2");

        connector.connect(Rc::clone(&f1) as Rc<dyn HttpClientObserverFactory>);
        connector.connect(Rc::clone(&f2) as Rc<dyn HttpClientObserverFactory>);

        let conn = Rc::new(TestConn::default());
        assert!(!factory.establish(&conn));
        assert_eq!(f1.established.get(), 1);

        // Slot and buffer were freed, f2 proceeds without a close.
        assert_eq!(*factory.connects.borrow(), ["h1", "h2"]);
        let conn2 = Rc::new(TestConn::default());
        assert!(factory.establish(&conn2));
        assert_eq!(f2.established.get(), 1);
    }

    #[test]
    fn test_requester_reports_current_destination() {
        let (factory, connector) = setup();

        let f1 = TestObserverFactory::new("some.host");
        connector.connect(Rc::clone(&f1) as Rc<dyn HttpClientObserverFactory>);

        let requester = factory.pending.borrow()[0].clone();
        assert_eq!(&*requester.hostname(), "some.host");
        assert_eq!(requester.port(), 80);
    }
}
