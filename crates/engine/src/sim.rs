//! A scripted host for driving the engine deterministically.
//!
//! Tests preload the event queue, run the executor, and then inspect which
//! subscriptions and sends the strategies produced. Tokens are assigned
//! from 1 in send order, so a script can name the token of the n-th send up
//! front.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use host_core::{Event, Host, Interrupt, RequestPayload, ResponsePayload, Token};
use rust_decimal::Decimal;

/// Scripted [`Host`] implementation.
pub struct SimHost {
    events: RefCell<VecDeque<Event>>,
    subscriptions: RefCell<Vec<(RequestPayload, Duration)>>,
    sent: RefCell<Vec<RequestPayload>>,
    next_token: Cell<u64>,
    started: Instant,
}

impl SimHost {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            events: RefCell::new(VecDeque::new()),
            subscriptions: RefCell::new(Vec::new()),
            sent: RefCell::new(Vec::new()),
            next_token: Cell::new(1),
            started: Instant::now(),
        })
    }

    /// Queue a successful fetcher response for `url`.
    pub fn push_fetcher(&self, url: &str, content: &str) {
        self.push_event(Event::Fetcher(Arc::new(ResponsePayload::from_http(
            url, None, 200, content,
        ))));
    }

    /// Queue an errored fetcher response for `url`.
    pub fn push_fetcher_error(&self, url: &str, status: u16, content: &str) {
        self.push_event(Event::Fetcher(Arc::new(ResponsePayload::from_http(
            url, None, status, content,
        ))));
    }

    /// Queue a send response for the `token`-th send (1-based).
    pub fn push_send_response(&self, token: u64, payload: ResponsePayload) {
        let token = Token::from_u64(token).expect("token must be non-zero");
        self.push_event(Event::SendResponse {
            token,
            payload: Arc::new(payload),
        });
    }

    pub fn push_signal(&self, interrupt: Interrupt) {
        self.push_event(Event::Signal(interrupt));
    }

    pub fn push_event(&self, event: Event) {
        self.events.borrow_mut().push_back(event);
    }

    /// Every subscription the engine requested, in request order.
    pub fn subscriptions(&self) -> Vec<(RequestPayload, Duration)> {
        self.subscriptions.borrow().clone()
    }

    /// Every on-demand request the engine sent, in send order.
    pub fn sent_requests(&self) -> Vec<RequestPayload> {
        self.sent.borrow().clone()
    }
}

#[async_trait(?Send)]
impl Host for SimHost {
    fn subscribe(&self, request: RequestPayload, period: Duration) {
        self.subscriptions.borrow_mut().push((request, period));
    }

    fn send(&self, request: RequestPayload) -> Token {
        let token = Token::from_u64(self.next_token.get()).expect("token counter starts at 1");
        self.next_token.set(self.next_token.get() + 1);
        self.sent.borrow_mut().push(request);
        token
    }

    async fn next_event(&self) -> Event {
        // Release the queue borrow before suspending.
        let next = self.events.borrow_mut().pop_front();
        match next {
            Some(event) => event,
            // The script is exhausted; block forever like a quiet host.
            None => std::future::pending().await,
        }
    }

    fn millis(&self) -> Decimal {
        Decimal::try_from(self.started.elapsed().as_nanos()).unwrap_or(Decimal::MAX)
            / Decimal::new(1_000_000, 0)
    }
}
