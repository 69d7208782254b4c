// Seams between the connection logic and the event loop it runs on.

use std::future::Future;
use std::pin::Pin;

use crate::error::LiveError;
use crate::live::connection::SocketEvents;

pub type LocalTask = Pin<Box<dyn Future<Output = ()>>>;

pub trait Socket {
    fn send_text(&self, text: &str) -> Result<(), LiveError>;
    /// Must not report events synchronously.
    fn close(&self);
    fn is_open(&self) -> bool;
}

pub trait Connector {
    /// Starts a handshake. Progress is reported later through `events`.
    fn open(&self, url: &str, events: SocketEvents) -> Result<Box<dyn Socket>, LiveError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

pub trait Scheduler {
    fn schedule(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> Result<TimerId, LiveError>;
    fn cancel(&self, id: TimerId);
    fn spawn(&self, task: LocalTask);
}
