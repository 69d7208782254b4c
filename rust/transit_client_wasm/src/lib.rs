mod bindings;
pub mod cache;
pub mod config;
pub mod error;
pub mod google;
pub mod http;
pub mod live;
pub mod logging;
pub mod service;
pub mod session;
pub mod storage;
pub mod translator;
mod utils;

#[cfg(test)]
mod test_support;

pub use bindings::{WasmLiveConnection, WasmLocationPoller, WasmSession, WasmTranslator};
pub use config::{LiveConfig, PollerConfig, TranslatorConfig};
pub use error::{ConfigError, HttpError, LiveError, StorageError, TranslateError};
pub use google::GoogleService;
pub use live::{ConnectionState, LiveConnection, LiveMessage, LocationPoller};
pub use service::TranslationProvider;
pub use session::{DriverAssignment, Session};
pub use storage::{KeyValueStore, LocalStorageStore, MemoryStore};
pub use translator::Translator;
