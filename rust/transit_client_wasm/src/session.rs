// Small pieces of per-browser session state kept next to the translation
// cache: the active UI language and the driver's bus assignment.

use std::rc::Rc;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::storage::KeyValueStore;
use crate::utils::{id_string, optional_id_string};

pub const LANGUAGE_KEY: &str = "language";
pub const DRIVER_ASSIGNMENT_KEY: &str = "driver_assignment";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverAssignment {
    #[serde(alias = "driver_id", deserialize_with = "id_string")]
    pub driver_id: String,
    #[serde(alias = "bus_id", deserialize_with = "id_string")]
    pub bus_id: String,
    #[serde(
        default,
        alias = "route_id",
        deserialize_with = "optional_id_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub route_id: Option<String>,
}

#[derive(Clone)]
pub struct Session {
    store: Rc<dyn KeyValueStore>,
}

impl Session {
    pub fn new(store: Rc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn language(&self) -> Option<String> {
        match self.store.get(LANGUAGE_KEY) {
            Ok(language) => language.filter(|code| !code.trim().is_empty()),
            Err(err) => {
                warn!("could not read active language: {}", err);
                None
            }
        }
    }

    pub fn set_language(&self, code: &str) -> Result<(), StorageError> {
        self.store.set(LANGUAGE_KEY, code)
    }

    /// Unreadable assignments are treated as absent.
    pub fn driver_assignment(&self) -> Option<DriverAssignment> {
        let raw = match self.store.get(DRIVER_ASSIGNMENT_KEY) {
            Ok(raw) => raw?,
            Err(err) => {
                warn!("could not read driver assignment: {}", err);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(assignment) => Some(assignment),
            Err(err) => {
                warn!("ignoring corrupt driver assignment: {}", err);
                None
            }
        }
    }

    pub fn set_driver_assignment(&self, assignment: &DriverAssignment) -> Result<(), StorageError> {
        let raw = serde_json::to_string(assignment)?;
        self.store.set(DRIVER_ASSIGNMENT_KEY, &raw)
    }

    pub fn clear_driver_assignment(&self) -> Result<(), StorageError> {
        self.store.remove(DRIVER_ASSIGNMENT_KEY)
    }
}
