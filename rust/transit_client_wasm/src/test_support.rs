// Fakes for every seam. Clones share state so a test can keep a handle
// after moving one into the code under test.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::executor::block_on;

use crate::cache::cache_key;
use crate::error::{HttpError, LiveError, TranslateError};
use crate::http::{HttpClient, HttpResponse};
use crate::live::connection::SocketEvents;
use crate::live::message::BusLocation;
use crate::live::poller::LocationSource;
use crate::live::transport::{Connector, LocalTask, Scheduler, Socket, TimerId};
use crate::service::TranslationProvider;

#[derive(Clone, Default)]
pub struct FakeHttpClient {
    responses: Rc<RefCell<VecDeque<Result<HttpResponse, HttpError>>>>,
    requests: Rc<RefCell<Vec<String>>>,
}

impl FakeHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, status: u16, body: &str) {
        self.responses.borrow_mut().push_back(Ok(HttpResponse {
            status,
            body: body.to_string(),
        }));
    }

    pub fn fail(&self, reason: &str) {
        self.responses
            .borrow_mut()
            .push_back(Err(HttpError::Network(reason.to_string())));
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

#[async_trait(?Send)]
impl HttpClient for FakeHttpClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, HttpError> {
        self.requests.borrow_mut().push(url.to_string());
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(HttpError::Network("no scripted response".to_string())))
    }
}

#[derive(Clone, Default)]
pub struct FakeProvider {
    translations: Rc<RefCell<HashMap<String, String>>>,
    failing: Rc<Cell<bool>>,
    yield_once: Rc<Cell<bool>>,
    calls: Rc<Cell<usize>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, text: &str, target_lang: &str, translated: &str) -> Self {
        self.translations
            .borrow_mut()
            .insert(cache_key(text, target_lang), translated.to_string());
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    /// Each request stays pending for one poll before answering, so a
    /// batch keeps several requests in flight at once.
    pub fn set_yield_once(&self, yield_once: bool) {
        self.yield_once.set(yield_once);
    }

    pub fn call_count(&self) -> usize {
        self.calls.get()
    }
}

#[derive(Default)]
struct YieldOnce {
    yielded: bool,
}

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            return Poll::Ready(());
        }
        self.yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

#[async_trait(?Send)]
impl TranslationProvider for FakeProvider {
    fn service_name(&self) -> &str {
        "fake"
    }

    async fn translate(
        &self,
        text: &str,
        _source_lang: &str,
        target_lang: &str,
    ) -> Result<String, TranslateError> {
        self.calls.set(self.calls.get() + 1);
        if self.yield_once.get() {
            YieldOnce::default().await;
        }
        if self.failing.get() {
            return Err(HttpError::Network("offline".to_string()).into());
        }
        self.translations
            .borrow()
            .get(&cache_key(text, target_lang))
            .cloned()
            .ok_or_else(|| TranslateError::MalformedResponse("nothing scripted".to_string()))
    }
}

#[derive(Clone, Default)]
pub struct FakeLocationSource {
    results: Rc<RefCell<VecDeque<Result<Vec<BusLocation>, LiveError>>>>,
    fetches: Rc<Cell<usize>>,
}

impl FakeLocationSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, result: Result<Vec<BusLocation>, LiveError>) {
        self.results.borrow_mut().push_back(result);
    }

    pub fn fetches(&self) -> usize {
        self.fetches.get()
    }
}

#[async_trait(?Send)]
impl LocationSource for FakeLocationSource {
    async fn fetch(&self) -> Result<Vec<BusLocation>, LiveError> {
        self.fetches.set(self.fetches.get() + 1);
        self.results
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

struct SocketRecord {
    url: String,
    events: SocketEvents,
    sent: Vec<String>,
    open: bool,
    closed_by_client: bool,
    on_send: Option<Rc<dyn Fn()>>,
}

/// Test-side view of one socket: drives server/browser events.
#[derive(Clone)]
pub struct FakeSocketHandle(Rc<RefCell<SocketRecord>>);

impl FakeSocketHandle {
    fn events(&self) -> SocketEvents {
        self.0.borrow().events.clone()
    }

    pub fn url(&self) -> String {
        self.0.borrow().url.clone()
    }

    pub fn open(&self) {
        self.0.borrow_mut().open = true;
        self.events().opened();
    }

    pub fn message(&self, raw: &str) {
        self.events().message(raw);
    }

    pub fn close(&self) {
        self.0.borrow_mut().open = false;
        self.events().closed();
    }

    pub fn error(&self) {
        self.events().errored("error");
    }

    pub fn sent(&self) -> Vec<String> {
        self.0.borrow().sent.clone()
    }

    pub fn was_closed(&self) -> bool {
        self.0.borrow().closed_by_client
    }

    /// Runs `hook` inside every `send_text`, before the frame is recorded.
    pub fn on_send(&self, hook: impl Fn() + 'static) {
        self.0.borrow_mut().on_send = Some(Rc::new(hook));
    }
}

struct FakeSocket(Rc<RefCell<SocketRecord>>);

impl Socket for FakeSocket {
    fn send_text(&self, text: &str) -> Result<(), LiveError> {
        let hook = {
            let record = self.0.borrow();
            if !record.open {
                return Err(LiveError::Send("socket not open".to_string()));
            }
            record.on_send.clone()
        };
        if let Some(hook) = hook {
            hook();
        }
        self.0.borrow_mut().sent.push(text.to_string());
        Ok(())
    }

    fn close(&self) {
        let mut record = self.0.borrow_mut();
        record.open = false;
        record.closed_by_client = true;
    }

    fn is_open(&self) -> bool {
        self.0.borrow().open
    }
}

#[derive(Clone, Default)]
pub struct FakeConnector {
    sockets: Rc<RefCell<Vec<FakeSocketHandle>>>,
    refuse: Rc<Cell<bool>>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refuse(&self, refuse: bool) {
        self.refuse.set(refuse);
    }

    pub fn opened_count(&self) -> usize {
        self.sockets.borrow().len()
    }

    pub fn last(&self) -> FakeSocketHandle {
        self.sockets
            .borrow()
            .last()
            .cloned()
            .expect("no socket opened yet")
    }
}

impl Connector for FakeConnector {
    fn open(&self, url: &str, events: SocketEvents) -> Result<Box<dyn Socket>, LiveError> {
        if self.refuse.get() {
            return Err(LiveError::Open {
                url: url.to_string(),
                reason: "refused".to_string(),
            });
        }
        let record = Rc::new(RefCell::new(SocketRecord {
            url: url.to_string(),
            events,
            sent: Vec::new(),
            open: false,
            closed_by_client: false,
            on_send: None,
        }));
        self.sockets
            .borrow_mut()
            .push(FakeSocketHandle(record.clone()));
        Ok(Box::new(FakeSocket(record)))
    }
}

struct Timer {
    id: TimerId,
    delay_ms: u32,
    task: Box<dyn FnOnce()>,
}

/// Timers fire only when the test says so.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    timers: Rc<RefCell<Vec<Timer>>>,
    next_id: Rc<Cell<u64>>,
    cancelled: Rc<RefCell<Vec<TimerId>>>,
    spawned: Rc<RefCell<VecDeque<LocalTask>>>,
    ignore_cancel: Rc<Cell<bool>>,
    fail_schedule: Rc<Cell<bool>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates a timer that was already queued when cancel ran.
    pub fn ignore_cancel(&self, ignore: bool) {
        self.ignore_cancel.set(ignore);
    }

    pub fn fail_schedule(&self, fail: bool) {
        self.fail_schedule.set(fail);
    }

    pub fn pending(&self) -> usize {
        self.timers.borrow().len()
    }

    pub fn delays(&self) -> Vec<u32> {
        self.timers.borrow().iter().map(|t| t.delay_ms).collect()
    }

    pub fn cancelled(&self) -> Vec<TimerId> {
        self.cancelled.borrow().clone()
    }

    pub fn fire_next(&self) -> bool {
        let timer = {
            let mut timers = self.timers.borrow_mut();
            if timers.is_empty() {
                return false;
            }
            timers.remove(0)
        };
        (timer.task)();
        true
    }

    pub fn run_spawned(&self) {
        loop {
            let task = self.spawned.borrow_mut().pop_front();
            match task {
                Some(task) => block_on(task),
                None => break,
            }
        }
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> Result<TimerId, LiveError> {
        if self.fail_schedule.get() {
            return Err(LiveError::Timer("scheduler unavailable".to_string()));
        }
        let id = TimerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.timers.borrow_mut().push(Timer {
            id,
            delay_ms,
            task,
        });
        Ok(id)
    }

    fn cancel(&self, id: TimerId) {
        self.cancelled.borrow_mut().push(id);
        if !self.ignore_cancel.get() {
            self.timers.borrow_mut().retain(|t| t.id != id);
        }
    }

    fn spawn(&self, task: LocalTask) {
        self.spawned.borrow_mut().push_back(task);
    }
}
