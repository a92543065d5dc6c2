//! Request queue, response matcher and retry/timeout engine.
//!
//! Single-threaded and cooperative: a host loop calls [`Scheduler::tick`]
//! repeatedly. There is exactly one outstanding in-flight request at a time;
//! everything else waits in `queue`.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use log::warn;

use crate::error::SchedulerError;
use crate::frame::{Frame, FrameCodec, MessageType};
use crate::network::NetworkStatus;
use crate::transport::Transport;

/// Outcome of inspecting an inbound frame against an in-flight request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    /// This frame completes the request.
    Ok,
    /// This frame is part of the response but more are expected; resets the
    /// attempt counter and response timer without ending the request.
    Partial,
    /// Not a response to this request; fall through to unsolicited handling.
    Wrong,
}

pub type Matcher = Box<dyn FnMut(&Frame) -> MatchResult>;
pub type SuccessCallback = Box<dyn FnOnce(&Frame)>;
pub type FailureCallback = Box<dyn FnOnce(SchedulerError)>;

/// One queued unit of work: a payload to send plus how to recognise and
/// report its response.
pub struct Request {
    pub body: Vec<u8>,
    pub message_type: MessageType,
    pub matcher: Option<Matcher>,
    pub on_success: Option<SuccessCallback>,
    pub on_failure: Option<FailureCallback>,
}

impl Request {
    pub fn new(message_type: MessageType, body: Vec<u8>) -> Self {
        Self {
            body,
            message_type,
            matcher: None,
            on_success: None,
            on_failure: None,
        }
    }

    pub fn with_matcher(mut self, matcher: Matcher) -> Self {
        self.matcher = Some(matcher);
        self
    }

    pub fn on_success(mut self, cb: SuccessCallback) -> Self {
        self.on_success = Some(cb);
        self
    }

    pub fn on_failure(mut self, cb: FailureCallback) -> Self {
        self.on_failure = Some(cb);
        self
    }

    fn fail(self, err: SchedulerError) {
        if let Some(cb) = self.on_failure {
            cb(err);
        }
    }
}

struct InFlight {
    request: Request,
    response_deadline: Instant,
    remaining_attempts: u32,
}

/// Drives one appliance session's queue against a [`Transport`].
pub struct Scheduler {
    codec: FrameCodec,
    transport: Box<dyn Transport>,
    queue: VecDeque<Request>,
    in_flight: Option<InFlight>,
    spacing_until: Option<Instant>,
    period: Duration,
    timeout: Duration,
    num_attempts: u32,
    on_request: Option<Box<dyn FnMut(Frame)>>,
    on_idle: Option<Box<dyn FnMut() -> Option<Request>>>,
    network_status: Option<Box<dyn FnMut() -> NetworkStatus>>,
}

impl Scheduler {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            codec: FrameCodec::new(),
            transport,
            queue: VecDeque::new(),
            in_flight: None,
            spacing_until: None,
            period: Duration::from_millis(1000),
            timeout: Duration::from_millis(2000),
            num_attempts: 3,
            on_request: None,
            on_idle: None,
            network_status: None,
        }
    }

    pub fn set_period(&mut self, period: Duration) {
        self.period = period;
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub fn set_attempts(&mut self, attempts: u32) {
        self.num_attempts = attempts.max(1);
    }

    pub fn set_on_request(&mut self, cb: Box<dyn FnMut(Frame)>) {
        self.on_request = Some(cb);
    }

    pub fn set_on_idle(&mut self, cb: Box<dyn FnMut() -> Option<Request>>) {
        self.on_idle = Some(cb);
    }

    pub fn set_network_status_provider(&mut self, cb: Box<dyn FnMut() -> NetworkStatus>) {
        self.network_status = Some(cb);
    }

    /// Replaces the transport, cancelling the in-flight request and clearing
    /// the queue (each with a `Cancelled` failure callback).
    pub fn set_transport(&mut self, transport: Box<dyn Transport>) {
        self.cancel_all();
        self.transport = transport;
    }

    pub fn enqueue(&mut self, request: Request) {
        self.queue.push_back(request);
    }

    /// Places `request` at the head of the queue. Cannot preempt an already
    /// in-flight request.
    pub fn enqueue_priority(&mut self, request: Request) {
        self.queue.push_front(request);
    }

    fn cancel_all(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.request.fail(SchedulerError::Cancelled);
        }
        for request in self.queue.drain(..) {
            request.fail(SchedulerError::Cancelled);
        }
        self.spacing_until = None;
    }

    /// Advance the scheduler. Must be called repeatedly by the host loop.
    pub fn tick(&mut self, now: Instant) {
        while let Some(byte) = self.transport.read_byte() {
            if let Some(frame) = self.codec.feed(byte) {
                self.dispatch(frame, now);
            }
        }

        if let Some(in_flight) = &self.in_flight {
            if now < in_flight.response_deadline {
                return;
            }
            self.on_response_timeout(now);
            return;
        }

        if let Some(until) = self.spacing_until {
            if now < until {
                return;
            }
            self.spacing_until = None;
        }

        if self.queue.is_empty() {
            if let Some(hook) = &mut self.on_idle {
                if let Some(request) = hook() {
                    self.queue.push_back(request);
                }
            }
            return;
        }

        let request = self.queue.pop_front().expect("queue checked non-empty");
        self.send(request, now);
    }

    fn send(&mut self, request: Request, now: Instant) {
        let bytes = self.codec.emit(request.message_type, &request.body);
        self.transport.write(&bytes);
        self.spacing_until = Some(now + self.period);

        if request.matcher.is_some() {
            self.in_flight = Some(InFlight {
                response_deadline: now + self.timeout,
                remaining_attempts: self.num_attempts,
                request,
            });
        }
        // No matcher: fire-and-forget, request is simply dropped.
    }

    fn on_response_timeout(&mut self, now: Instant) {
        let mut in_flight = self.in_flight.take().expect("checked Some by caller");
        in_flight.remaining_attempts -= 1;
        if in_flight.remaining_attempts == 0 {
            let message_type = in_flight.request.message_type;
            warn!("request of type {:?} exhausted retries", message_type);
            in_flight.request.fail(SchedulerError::RequestFailed { message_type });
            self.spacing_until = Some(now + self.period);
            return;
        }

        let bytes = self.codec.emit(in_flight.request.message_type, &in_flight.request.body);
        self.transport.write(&bytes);
        in_flight.response_deadline = now + self.timeout;
        self.in_flight = Some(in_flight);
    }

    fn dispatch(&mut self, frame: Frame, now: Instant) {
        if let Some(in_flight) = &mut self.in_flight {
            if let Some(matcher) = &mut in_flight.request.matcher {
                match matcher(&frame) {
                    MatchResult::Ok => {
                        let in_flight = self.in_flight.take().expect("checked Some above");
                        if let Some(cb) = in_flight.request.on_success {
                            cb(&frame);
                        }
                        return;
                    }
                    MatchResult::Partial => {
                        in_flight.remaining_attempts = self.num_attempts;
                        in_flight.response_deadline = now + self.timeout;
                        return;
                    }
                    MatchResult::Wrong => {
                        // fall through to unsolicited handling below
                    }
                }
            }
        }

        if frame.message_type == MessageType::NotifyNetworkStatus {
            return;
        }

        if frame.message_type == MessageType::GetNetworkStatus {
            if let Some(provider) = &mut self.network_status {
                let status = provider();
                let body = status.to_payload();
                let bytes = self.codec.emit(MessageType::NotifyNetworkStatus, &body);
                self.transport.write(&bytes);
            }
            return;
        }

        if let Some(handler) = &mut self.on_request {
            handler(frame);
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct NullTransport;
    impl Transport for NullTransport {
        fn read_byte(&mut self) -> Option<u8> {
            None
        }
        fn write(&mut self, _bytes: &[u8]) {}
    }

    struct RecordingTransport {
        written: Rc<RefCell<Vec<Vec<u8>>>>,
    }
    impl Transport for RecordingTransport {
        fn read_byte(&mut self) -> Option<u8> {
            None
        }
        fn write(&mut self, bytes: &[u8]) {
            self.written.borrow_mut().push(bytes.to_vec());
        }
    }

    #[test]
    fn retries_exhaust_and_fail_after_num_attempts() {
        let written = Rc::new(RefCell::new(Vec::new()));
        let transport = RecordingTransport {
            written: written.clone(),
        };
        let mut scheduler = Scheduler::new(Box::new(transport));
        scheduler.set_timeout(Duration::from_millis(100));
        scheduler.set_attempts(3);

        let failed = Rc::new(RefCell::new(false));
        let failed_clone = failed.clone();
        let request = Request::new(MessageType::Query, vec![0x41])
            .with_matcher(Box::new(|_frame| MatchResult::Wrong))
            .on_failure(Box::new(move |_err| {
                *failed_clone.borrow_mut() = true;
            }));
        scheduler.enqueue(request);

        let start = Instant::now();
        let mut now = start;
        while now <= start + Duration::from_millis(300) {
            scheduler.tick(now);
            now += Duration::from_millis(10);
        }

        assert_eq!(written.borrow().len(), 3);
        assert!(*failed.borrow());

        // Outbound frames differ only by the id byte (offset 6).
        let bytes = written.borrow();
        let ids: Vec<u8> = bytes.iter().map(|f| f[6]).collect();
        assert_eq!(ids.len(), 3);
        assert!(ids.iter().all(|id| *id != 0));
        for pair in bytes.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert_eq!(a.len(), b.len());
            let checksum_idx = a[1] as usize;
            // id (offset 6) and the trailing checksum (which covers the id) are
            // the only bytes expected to change between retries.
            let differs_only_at_id_and_checksum = a
                .iter()
                .enumerate()
                .all(|(i, byte)| i == 6 || i == checksum_idx || *byte == b[i]);
            assert!(differs_only_at_id_and_checksum);
        }
    }

    #[test]
    fn matcher_less_request_produces_no_callback() {
        let mut scheduler = Scheduler::new(Box::new(NullTransport));
        let request = Request::new(MessageType::Control, vec![0x40]);
        scheduler.enqueue(request);
        scheduler.tick(Instant::now());
        // Nothing to assert beyond "it didn't panic" -- the request carries
        // no callbacks, so there is nothing to observe.
    }

    #[test]
    fn cancellation_fires_on_transport_replacement() {
        let mut scheduler = Scheduler::new(Box::new(NullTransport));
        let cancelled = Rc::new(RefCell::new(false));
        let cancelled_clone = cancelled.clone();
        let request = Request::new(MessageType::Query, vec![0x41])
            .with_matcher(Box::new(|_| MatchResult::Wrong))
            .on_failure(Box::new(move |err| {
                if matches!(err, SchedulerError::Cancelled) {
                    *cancelled_clone.borrow_mut() = true;
                }
            }));
        scheduler.enqueue(request);
        scheduler.tick(Instant::now());
        scheduler.set_transport(Box::new(NullTransport));
        assert!(*cancelled.borrow());
    }
}
