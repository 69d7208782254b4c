// Polling fallback for bus locations when no live socket is available.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::Deserialize;

use crate::config::PollerConfig;
use crate::error::LiveError;
use crate::http::HttpClient;
use crate::live::message::{BusLocation, LiveMessage};
use crate::live::transport::{Scheduler, TimerId};
use crate::live::EventHandler;

#[async_trait(?Send)]
pub trait LocationSource {
    async fn fetch(&self) -> Result<Vec<BusLocation>, LiveError>;
}

/// Reads `[ {...}, ... ]` or `{ "locations": [ ... ] }` from a URL.
pub struct HttpLocationSource<C> {
    client: C,
    url: String,
}

impl<C: HttpClient> HttpLocationSource<C> {
    pub fn new(client: C, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LocationsBody {
    List(Vec<BusLocation>),
    Wrapped { locations: Vec<BusLocation> },
}

pub fn parse_locations(body: &str) -> Result<Vec<BusLocation>, LiveError> {
    let locations = match serde_json::from_str(body)? {
        LocationsBody::List(locations) => locations,
        LocationsBody::Wrapped { locations } => locations,
    };
    Ok(locations)
}

#[async_trait(?Send)]
impl<C: HttpClient> LocationSource for HttpLocationSource<C> {
    async fn fetch(&self) -> Result<Vec<BusLocation>, LiveError> {
        let response = self.client.get(&self.url).await?;
        if !response.is_success() {
            return Err(LiveError::Status(response.status));
        }
        parse_locations(&response.body)
    }
}

struct PollerState {
    running: bool,
    generation: u64,
    pending: Option<TimerId>,
    handlers: Vec<EventHandler>,
    polls: u64,
}

struct PollerShared {
    source: Box<dyn LocationSource>,
    scheduler: Box<dyn Scheduler>,
    interval_ms: u32,
    state: RefCell<PollerState>,
}

/// Fetches locations immediately on `start`, then every `poll_interval_ms`
/// after the previous fetch settles. A failed fetch is logged and the next
/// one is still scheduled.
#[derive(Clone)]
pub struct LocationPoller {
    shared: Rc<PollerShared>,
}

impl LocationPoller {
    pub fn new(
        config: &PollerConfig,
        source: impl LocationSource + 'static,
        scheduler: impl Scheduler + 'static,
    ) -> Self {
        Self {
            shared: Rc::new(PollerShared {
                source: Box::new(source),
                scheduler: Box::new(scheduler),
                interval_ms: config.poll_interval_ms,
                state: RefCell::new(PollerState {
                    running: false,
                    generation: 0,
                    pending: None,
                    handlers: Vec::new(),
                    polls: 0,
                }),
            }),
        }
    }

    pub fn start(&self) {
        let generation = {
            let mut state = self.shared.state.borrow_mut();
            if state.running {
                return;
            }
            state.running = true;
            state.generation += 1;
            state.generation
        };
        info!("location polling started every {}ms", self.shared.interval_ms);
        spawn_poll(&self.shared, generation);
    }

    pub fn stop(&self) {
        let pending = {
            let mut state = self.shared.state.borrow_mut();
            if !state.running {
                return;
            }
            state.running = false;
            state.generation += 1;
            state.pending.take()
        };
        if let Some(id) = pending {
            self.shared.scheduler.cancel(id);
        }
        info!("location polling stopped");
    }

    pub fn is_running(&self) -> bool {
        self.shared.state.borrow().running
    }

    /// Completed polls, successful or not.
    pub fn polls(&self) -> u64 {
        self.shared.state.borrow().polls
    }

    pub fn subscribe(&self, handler: impl Fn(&LiveMessage) + 'static) {
        self.shared
            .state
            .borrow_mut()
            .handlers
            .push(Rc::new(handler));
    }
}

fn is_current(shared: &PollerShared, generation: u64) -> bool {
    let state = shared.state.borrow();
    state.running && state.generation == generation
}

fn spawn_poll(shared: &Rc<PollerShared>, generation: u64) {
    let shared_for_task = shared.clone();
    shared.scheduler.spawn(Box::pin(async move {
        poll_once(&shared_for_task, generation).await;
    }));
}

async fn poll_once(shared: &Rc<PollerShared>, generation: u64) {
    let result = shared.source.fetch().await;
    if !is_current(shared, generation) {
        debug!("discarding location poll result after stop");
        return;
    }

    let handlers = {
        let mut state = shared.state.borrow_mut();
        state.polls += 1;
        state.handlers.clone()
    };
    match result {
        Ok(locations) => {
            debug!("polled {} bus locations", locations.len());
            for location in locations {
                let message = LiveMessage::BusLocation(location);
                for handler in &handlers {
                    handler(&message);
                }
            }
        }
        Err(err) => warn!("location poll failed: {}", err),
    }

    // A handler may have stopped the poller.
    if is_current(shared, generation) {
        schedule_next(shared, generation);
    }
}

fn schedule_next(shared: &Rc<PollerShared>, generation: u64) {
    let weak: Weak<PollerShared> = Rc::downgrade(shared);
    let task = Box::new(move || {
        if let Some(shared) = weak.upgrade() {
            if is_current(&shared, generation) {
                shared.state.borrow_mut().pending = None;
                spawn_poll(&shared, generation);
            }
        }
    });
    match shared.scheduler.schedule(shared.interval_ms, task) {
        Ok(id) => shared.state.borrow_mut().pending = Some(id),
        Err(err) => {
            warn!("location polling halted, could not schedule: {}", err);
            shared.state.borrow_mut().running = false;
        }
    }
}
