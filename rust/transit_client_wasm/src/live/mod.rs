pub mod browser;
pub mod connection;
pub mod message;
pub mod poller;
pub mod state;
pub mod transport;

use std::rc::Rc;

pub use connection::{LiveConnection, SocketEvents};
pub use message::{BookingUpdate, BusLocation, LiveMessage, Notification};
pub use poller::{HttpLocationSource, LocationPoller, LocationSource};
pub use state::{ConnectionState, ReconnectBudget};
pub use transport::{Connector, LocalTask, Scheduler, Socket, TimerId};

pub type EventHandler = Rc<dyn Fn(&LiveMessage)>;
pub type StateHandler = Rc<dyn Fn(ConnectionState)>;
