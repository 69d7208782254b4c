// Self-healing live channel for bus locations, booking updates and
// notifications.
//
// Every socket gets a generation number. Closing, replacing or losing a
// socket bumps the generation, so late events from an old socket (the
// browser reports close after error, or after we closed it ourselves) are
// ignored instead of being counted twice.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::{debug, info, warn};
use serde::Serialize;

use crate::config::LiveConfig;
use crate::live::message::LiveMessage;
use crate::live::state::{ConnectionState, ReconnectBudget};
use crate::live::transport::{Connector, Scheduler, Socket, TimerId};
use crate::live::{EventHandler, StateHandler};

struct Inner {
    url: String,
    state: ConnectionState,
    budget: ReconnectBudget,
    socket: Option<Rc<dyn Socket>>,
    generation: u64,
    pending: Option<TimerId>,
    latest: Option<LiveMessage>,
    event_handlers: Vec<EventHandler>,
    state_handlers: Vec<StateHandler>,
}

struct Shared {
    inner: RefCell<Inner>,
    connector: Box<dyn Connector>,
    scheduler: Box<dyn Scheduler>,
}

/// Handle given to a [`Connector`] for reporting socket events.
#[derive(Clone)]
pub struct SocketEvents {
    shared: Weak<Shared>,
    generation: u64,
}

impl SocketEvents {
    pub fn opened(&self) {
        if let Some(shared) = self.shared.upgrade() {
            handle_open(&shared, self.generation);
        }
    }

    pub fn message(&self, raw: &str) {
        if let Some(shared) = self.shared.upgrade() {
            handle_message(&shared, self.generation, raw);
        }
    }

    pub fn closed(&self) {
        if let Some(shared) = self.shared.upgrade() {
            handle_closed(&shared, self.generation);
        }
    }

    /// Errors take the same path as a close.
    pub fn errored(&self, reason: &str) {
        if let Some(shared) = self.shared.upgrade() {
            if is_current(&shared, self.generation) {
                warn!("live socket error: {}", reason);
            }
            handle_closed(&shared, self.generation);
        }
    }
}

#[derive(Clone)]
pub struct LiveConnection {
    shared: Rc<Shared>,
}

impl LiveConnection {
    pub fn new(
        config: &LiveConfig,
        connector: impl Connector + 'static,
        scheduler: impl Scheduler + 'static,
    ) -> Self {
        let inner = Inner {
            url: config.url.clone(),
            state: ConnectionState::Disconnected,
            budget: ReconnectBudget::new(config.max_attempts, config.interval_ms),
            socket: None,
            generation: 0,
            pending: None,
            latest: None,
            event_handlers: Vec::new(),
            state_handlers: Vec::new(),
        };
        Self {
            shared: Rc::new(Shared {
                inner: RefCell::new(inner),
                connector: Box::new(connector),
                scheduler: Box::new(scheduler),
            }),
        }
    }

    /// Opens a fresh socket with a fresh reconnect budget, replacing any
    /// current socket or pending reconnect.
    pub fn connect(&self) {
        self.shared.inner.borrow_mut().budget.reset();
        open_socket(&self.shared);
    }

    /// Cancels a pending reconnect and closes the socket. Nothing reconnects
    /// until `connect` is called again.
    pub fn disconnect(&self) {
        let (socket, pending) = {
            let mut inner = self.shared.inner.borrow_mut();
            inner.generation += 1;
            (inner.socket.take(), inner.pending.take())
        };
        if let Some(id) = pending {
            self.shared.scheduler.cancel(id);
            debug!("cancelled pending reconnect");
        }
        if let Some(socket) = socket {
            socket.close();
        }
        set_state(&self.shared, ConnectionState::Disconnected);
        info!("live channel disconnected");
    }

    /// Fire-and-forget: only sent while connected, dropped otherwise.
    pub fn send<T: Serialize + ?Sized>(&self, message: &T) -> bool {
        let socket = {
            let inner = self.shared.inner.borrow();
            if inner.state != ConnectionState::Connected {
                debug!("dropping outbound message while {}", inner.state);
                return false;
            }
            inner.socket.clone()
        };
        let socket = match socket {
            Some(socket) if socket.is_open() => socket,
            _ => {
                debug!("dropping outbound message, socket not open");
                return false;
            }
        };
        let text = match serde_json::to_string(message) {
            Ok(text) => text,
            Err(err) => {
                warn!("outbound message not serializable: {}", err);
                return false;
            }
        };
        match socket.send_text(&text) {
            Ok(()) => true,
            Err(err) => {
                warn!("outbound message dropped: {}", err);
                false
            }
        }
    }

    pub fn subscribe(&self, handler: impl Fn(&LiveMessage) + 'static) {
        self.shared
            .inner
            .borrow_mut()
            .event_handlers
            .push(Rc::new(handler));
    }

    pub fn on_state_change(&self, handler: impl Fn(ConnectionState) + 'static) {
        self.shared
            .inner
            .borrow_mut()
            .state_handlers
            .push(Rc::new(handler));
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.inner.borrow().state
    }

    pub fn attempts_made(&self) -> u32 {
        self.shared.inner.borrow().budget.attempts_made()
    }

    pub fn has_pending_reconnect(&self) -> bool {
        self.shared.inner.borrow().pending.is_some()
    }

    pub fn latest(&self) -> Option<LiveMessage> {
        self.shared.inner.borrow().latest.clone()
    }

    pub fn url(&self) -> String {
        self.shared.inner.borrow().url.clone()
    }
}

fn is_current(shared: &Shared, generation: u64) -> bool {
    shared.inner.borrow().generation == generation
}

fn open_socket(shared: &Rc<Shared>) {
    let (url, generation, previous, pending) = {
        let mut inner = shared.inner.borrow_mut();
        inner.generation += 1;
        (
            inner.url.clone(),
            inner.generation,
            inner.socket.take(),
            inner.pending.take(),
        )
    };
    if let Some(id) = pending {
        shared.scheduler.cancel(id);
    }
    if let Some(previous) = previous {
        previous.close();
    }

    set_state(shared, ConnectionState::Connecting);
    debug!("opening live socket to {}", url);

    let events = SocketEvents {
        shared: Rc::downgrade(shared),
        generation,
    };
    match shared.connector.open(&url, events) {
        Ok(socket) => {
            let mut inner = shared.inner.borrow_mut();
            if inner.generation == generation {
                inner.socket = Some(Rc::from(socket));
            } else {
                drop(inner);
                socket.close();
            }
        }
        Err(err) => {
            warn!("live socket could not be opened: {}", err);
            handle_closed(shared, generation);
        }
    }
}

fn handle_open(shared: &Rc<Shared>, generation: u64) {
    {
        let mut inner = shared.inner.borrow_mut();
        if inner.generation != generation {
            return;
        }
        inner.budget.reset();
    }
    set_state(shared, ConnectionState::Connected);
    info!("live channel connected");
}

fn handle_message(shared: &Rc<Shared>, generation: u64, raw: &str) {
    if !is_current(shared, generation) {
        return;
    }
    let message = match LiveMessage::parse(raw) {
        Ok(LiveMessage::Unknown(kind)) => {
            debug!("ignoring live message of unknown type {:?}", kind);
            return;
        }
        Ok(message) => message,
        Err(err) => {
            warn!("ignoring malformed live message: {}", err);
            return;
        }
    };
    let handlers = {
        let mut inner = shared.inner.borrow_mut();
        inner.latest = Some(message.clone());
        inner.event_handlers.clone()
    };
    for handler in handlers {
        handler(&message);
    }
}

fn handle_closed(shared: &Rc<Shared>, generation: u64) {
    let (socket, retry) = {
        let mut inner = shared.inner.borrow_mut();
        if inner.generation != generation {
            return;
        }
        inner.generation += 1;
        let retry = if inner.budget.try_consume() {
            Some((
                inner.budget.attempts_made(),
                inner.budget.max_attempts(),
                inner.budget.interval_ms(),
                inner.generation,
            ))
        } else {
            None
        };
        (inner.socket.take(), retry)
    };
    drop(socket);
    set_state(shared, ConnectionState::Disconnected);

    let Some((attempt, max_attempts, interval_ms, retry_generation)) = retry else {
        warn!(
            "live channel down, reconnect budget of {} attempts exhausted",
            shared.inner.borrow().budget.max_attempts()
        );
        return;
    };
    // A state handler may have called disconnect() or connect().
    if !is_current(shared, retry_generation) {
        return;
    }

    let weak = Rc::downgrade(shared);
    let task = Box::new(move || {
        if let Some(shared) = weak.upgrade() {
            reconnect(&shared, retry_generation);
        }
    });
    match shared.scheduler.schedule(interval_ms, task) {
        Ok(id) => {
            {
                let mut inner = shared.inner.borrow_mut();
                if inner.generation != retry_generation {
                    drop(inner);
                    shared.scheduler.cancel(id);
                    return;
                }
                inner.pending = Some(id);
            }
            set_state(shared, ConnectionState::Connecting);
            info!(
                "live channel lost, reconnect {}/{} in {}ms",
                attempt, max_attempts, interval_ms
            );
        }
        Err(err) => warn!("could not schedule reconnect: {}", err),
    }
}

fn reconnect(shared: &Rc<Shared>, generation: u64) {
    {
        let mut inner = shared.inner.borrow_mut();
        // Superseded by disconnect() or an explicit connect().
        if inner.generation != generation {
            return;
        }
        inner.pending = None;
    }
    open_socket(shared);
}

fn set_state(shared: &Shared, state: ConnectionState) {
    let handlers = {
        let mut inner = shared.inner.borrow_mut();
        if inner.state == state {
            return;
        }
        inner.state = state;
        inner.state_handlers.clone()
    };
    for handler in handlers {
        handler(state);
    }
}
